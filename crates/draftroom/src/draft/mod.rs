// Draft engine: turn order, roster eligibility, pick execution and the clock.

pub mod clock;
pub mod eligibility;
pub mod executor;
pub mod league;
pub mod lock;
pub mod order;
pub mod pick;
pub mod roster;
pub mod schedule;
pub mod selector;
