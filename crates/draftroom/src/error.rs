// Draft operation errors.

use thiserror::Error;

use crate::draft::league::{DraftStatus, LeagueId, PlayerId, TeamId};

/// Broad class of a [`DraftError`], for callers that map errors onto a
/// transport (HTTP status, event payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The wrong team tried to pick.
    IllegalTurn,
    /// The request conflicts with current draft state.
    Conflict,
    /// The draft is not in a state that allows the operation.
    NotActive,
    NotFound,
    Storage,
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("league {0} not found")]
    LeagueNotFound(LeagueId),

    #[error("team {0} not found")]
    TeamNotFound(TeamId),

    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("draft is {status}, not active")]
    NotActive { status: DraftStatus },

    #[error("draft is {status}, not completed")]
    NotCompleted { status: DraftStatus },

    #[error("cannot move draft from {from} to {to}")]
    InvalidTransition { from: DraftStatus, to: DraftStatus },

    #[error("not your turn: team {expected} is on the clock")]
    NotYourTurn { expected: TeamId, attempted: TeamId },

    #[error("pick {requested} is stale; the draft is on pick {current}")]
    StaleTurn { requested: u32, current: u32 },

    #[error("player {0} has already been drafted")]
    AlreadyDrafted(PlayerId),

    #[error("no open roster slot accepts position {position}")]
    NoEligibleSlot { position: String },

    #[error("all {total} picks have been made")]
    DraftFull { total: u32 },

    #[error("draft order is invalid: {0}")]
    InvalidDraftOrder(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DraftError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DraftError::NotYourTurn { .. } => ErrorKind::IllegalTurn,
            DraftError::StaleTurn { .. }
            | DraftError::AlreadyDrafted(_)
            | DraftError::NoEligibleSlot { .. }
            | DraftError::DraftFull { .. }
            | DraftError::InvalidDraftOrder(_) => ErrorKind::Conflict,
            DraftError::NotActive { .. }
            | DraftError::NotCompleted { .. }
            | DraftError::InvalidTransition { .. } => ErrorKind::NotActive,
            DraftError::LeagueNotFound(_)
            | DraftError::TeamNotFound(_)
            | DraftError::PlayerNotFound(_) => ErrorKind::NotFound,
            DraftError::Storage(_) => ErrorKind::Storage,
        }
    }
}

pub type DraftResult<T> = Result<T, DraftError>;
