// Roster construction and slot assignment.
//
// Two consumers share the same tier table (`ASSIGNMENT_PASSES`):
// - `RosterFill` runs while the draft is live. It places each pick greedily,
//   in pick order, into the first tier with room, and never places anyone
//   in IL. A pick with no other room holds an open IL slot instead, so the
//   final pass is guaranteed a slot for it.
// - `assign_roster_slots` runs once per team after the draft. It sweeps tier
//   by tier across all unassigned picks, so exact-position fits win over
//   flex fits regardless of draft order.

use std::collections::BTreeSet;

use super::eligibility::{fits, SlotTier, ASSIGNMENT_PASSES};
use super::pick::Pick;

/// Draft-time view of which roster slots a team has filled.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterFill {
    slots: Vec<String>,
    /// Slot index per input player, `None` if the player found no room.
    placements: Vec<Option<usize>>,
    filled: BTreeSet<usize>,
    /// IL slots spoken for by picks that found no other room.
    held: BTreeSet<usize>,
}

impl RosterFill {
    /// Greedily place `positions` (in pick order) into `slots`.
    ///
    /// Slot assignment priority per player:
    /// 1. Exact position or position group (C, 1B, OF, INF, ...)
    /// 2. UT for hitters, P for pitchers
    /// 3. Bench
    ///
    /// IL slots stay open for manual placement. A player with nowhere else
    /// to go holds one (see [`RosterFill::held`]).
    pub fn build<S: AsRef<str>>(positions: &[S], slots: &[String], is_best_ball: bool) -> Self {
        Self::build_with_passes(positions, slots, is_best_ball, &ASSIGNMENT_PASSES)
    }

    /// Same as [`RosterFill::build`] with a caller-supplied tier order.
    /// `Reserve` tiers in `passes` are ignored.
    pub fn build_with_passes<S: AsRef<str>>(
        positions: &[S],
        slots: &[String],
        is_best_ball: bool,
        passes: &[SlotTier],
    ) -> Self {
        let mut filled = BTreeSet::new();
        let mut placements = Vec::with_capacity(positions.len());

        for position in positions {
            let position = position.as_ref();
            let placed = passes
                .iter()
                .filter(|tier| **tier != SlotTier::Reserve)
                .find_map(|&tier| {
                    slots.iter().enumerate().position(|(idx, slot)| {
                        !filled.contains(&idx)
                            && SlotTier::of(slot) == tier
                            && fits(position, slot, is_best_ball)
                    })
                });
            if let Some(idx) = placed {
                filled.insert(idx);
            }
            placements.push(placed);
        }

        let overflow = placements.iter().filter(|p| p.is_none()).count();
        let held = slots
            .iter()
            .enumerate()
            .filter(|(idx, slot)| {
                !filled.contains(idx) && SlotTier::of(slot) == SlotTier::Reserve
            })
            .map(|(idx, _)| idx)
            .take(overflow)
            .collect();

        RosterFill {
            slots: slots.to_vec(),
            placements,
            filled,
            held,
        }
    }

    /// Indices of slots holding a player.
    pub fn filled(&self) -> &BTreeSet<usize> {
        &self.filled
    }

    /// IL slot indices held for players that fit nowhere else.
    pub fn held(&self) -> &BTreeSet<usize> {
        &self.held
    }

    fn is_open(&self, idx: usize) -> bool {
        !self.filled.contains(&idx) && !self.held.contains(&idx)
    }

    /// Where each input player landed.
    pub fn placements(&self) -> &[Option<usize>] {
        &self.placements
    }

    /// Labels of slots still open, in roster order.
    pub fn open_slots(&self) -> Vec<String> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.is_open(*idx))
            .map(|(_, slot)| slot.clone())
            .collect()
    }

    /// Whether a player at `position` can still be added. Open IL slots
    /// count, since those are filled by hand, unless an earlier pick
    /// already holds them.
    pub fn can_accept(&self, position: &str, is_best_ball: bool) -> bool {
        self.slots
            .iter()
            .enumerate()
            .any(|(idx, slot)| self.is_open(idx) && fits(position, slot, is_best_ball))
    }

    /// Number of open slots, IL included.
    pub fn empty_count(&self) -> usize {
        self.slots.len() - self.filled.len() - self.held.len()
    }
}

/// A roster slot chosen for a pick by [`assign_roster_slots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment {
    pub pick_id: i64,
    pub roster_slot: u32,
}

/// Assign roster slot indices to a team's picks after the draft.
///
/// `picks` must be in draft order. Picks that already carry a slot keep it
/// and reserve that index. Returns only the new assignments, so a fully
/// assigned roster yields an empty vec.
///
/// Best Ball leagues put anything left over into indices past the nominal
/// roster length (an unranked bench). Elsewhere leftovers stay unassigned.
pub fn assign_roster_slots(
    picks: &[Pick],
    slots: &[String],
    is_best_ball: bool,
    passes: &[SlotTier],
) -> Vec<SlotAssignment> {
    let mut used: BTreeSet<u32> = picks.iter().filter_map(|p| p.roster_slot).collect();
    let mut pending: Vec<&Pick> = picks.iter().filter(|p| p.roster_slot.is_none()).collect();
    let mut assignments = Vec::new();

    for &tier in passes {
        pending.retain(|pick| {
            let slot = slots.iter().enumerate().find(|(idx, label)| {
                !used.contains(&(*idx as u32))
                    && SlotTier::of(label) == tier
                    && fits(&pick.position, label, is_best_ball)
            });
            match slot {
                Some((idx, _)) => {
                    used.insert(idx as u32);
                    assignments.push(SlotAssignment {
                        pick_id: pick.id,
                        roster_slot: idx as u32,
                    });
                    false
                }
                None => true,
            }
        });
    }

    if is_best_ball {
        let mut next = slots.len() as u32;
        for pick in pending.drain(..) {
            while used.contains(&next) {
                next += 1;
            }
            used.insert(next);
            assignments.push(SlotAssignment {
                pick_id: pick.id,
                roster_slot: next,
            });
        }
    }

    assignments
}
