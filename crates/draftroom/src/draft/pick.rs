// Individual pick records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::league::{LeagueId, PlayerId, TeamId};
use super::order::PickSlot;

/// A committed draft pick. Immutable apart from `roster_slot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub id: i64,
    pub league_id: LeagueId,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    /// Sequential pick number across the whole draft (1-indexed).
    pub overall_pick: u32,
    pub round: u32,
    pub pick_in_round: u32,
    /// Index into the league's `roster_slots`, assigned after the draft.
    /// Best Ball leagues may use indices past the nominal roster length.
    pub roster_slot: Option<u32>,
    /// Position of the drafted player, denormalized for roster math.
    pub position: String,
    pub created_at: DateTime<Utc>,
}

/// A pick about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPick {
    pub league_id: LeagueId,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub overall_pick: u32,
    pub round: u32,
    pub pick_in_round: u32,
}

impl NewPick {
    pub fn new(league_id: LeagueId, team_id: TeamId, player_id: PlayerId, slot: PickSlot) -> Self {
        NewPick {
            league_id,
            team_id,
            player_id,
            overall_pick: slot.overall_pick,
            round: slot.round,
            pick_in_round: slot.pick_in_round,
        }
    }
}

/// Who is making a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickActor {
    /// A team owner picking on their own turn.
    Manual { team_id: TeamId },
    /// The commissioner assigning a player to whichever team holds the turn.
    /// `turn` pins the overall pick the commissioner is editing.
    Commissioner { turn: Option<u32> },
    /// The draft clock picking for the team on the clock. `expected_turn` is
    /// the overall pick the clock saw expire; if the draft has moved on by the
    /// time the lock is held, the attempt is stale.
    Auto { expected_turn: u32 },
}

impl PickActor {
    pub fn label(&self) -> &'static str {
        match self {
            PickActor::Manual { .. } => "manual",
            PickActor::Commissioner { .. } => "commissioner",
            PickActor::Auto { .. } => "auto",
        }
    }
}
