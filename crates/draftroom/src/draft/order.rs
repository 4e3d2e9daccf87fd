// Snake draft turn order.
//
// Round 1 runs draft position 1 -> N, round 2 runs N -> 1, and so on. Pick
// submission and pick validation both go through `pick_slot`, so the two can
// never disagree about whose turn it is.

use serde::{Deserialize, Serialize};

/// Where an overall pick falls in a snake draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickSlot {
    pub overall_pick: u32,
    /// 1-based round.
    pub round: u32,
    /// 1-based pick within the round.
    pub pick_in_round: u32,
    /// 0-based index into the teams ordered by ascending draft position.
    pub team_index: usize,
}

impl PickSlot {
    /// Odd rounds run in draft-position order; even rounds run reversed.
    pub fn is_forward(&self) -> bool {
        self.round % 2 == 1
    }
}

/// Map an overall pick number to its round, pick-in-round and team index.
///
/// Returns `None` for `overall_pick == 0` or `team_count == 0`.
pub fn pick_slot(overall_pick: u32, team_count: u32) -> Option<PickSlot> {
    if overall_pick == 0 || team_count == 0 {
        return None;
    }
    let round = overall_pick.div_ceil(team_count);
    let pick_in_round = ((overall_pick - 1) % team_count) + 1;
    let forward = round % 2 == 1;
    let team_index = if forward {
        pick_in_round - 1
    } else {
        team_count - pick_in_round
    };
    Some(PickSlot {
        overall_pick,
        round,
        pick_in_round,
        team_index: team_index as usize,
    })
}

/// Total picks in a draft of `rounds` rounds.
pub fn total_picks(rounds: u32, team_count: u32) -> u32 {
    rounds.saturating_mul(team_count)
}
