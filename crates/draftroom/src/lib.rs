// Library root: re-exports all modules so integration tests and the service
// binary can reach the crate's public API.

pub mod config;
pub mod db;
pub mod draft;
pub mod error;
pub mod events;
pub mod players;
pub mod store;
