// Roster slot eligibility: which player positions a slot label accepts.

use serde::{Deserialize, Serialize};

/// Every position a drafted player can carry, in priority order for
/// best-available fallbacks.
pub const STANDARD_POSITIONS: [&str; 12] = [
    "C", "1B", "2B", "3B", "SS", "OF", "LF", "CF", "RF", "DH", "SP", "RP",
];

/// Non-pitcher positions (what a UT slot accepts).
pub const HITTER_POSITIONS: [&str; 10] = ["C", "1B", "2B", "3B", "SS", "OF", "LF", "CF", "RF", "DH"];

pub const OUTFIELD_POSITIONS: [&str; 4] = ["OF", "LF", "CF", "RF"];
pub const INFIELD_POSITIONS: [&str; 4] = ["1B", "2B", "3B", "SS"];
pub const PITCHER_POSITIONS: [&str; 2] = ["SP", "RP"];

/// How a slot label participates in roster assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotTier {
    /// Exact position (C, 1B, SP, ...) or position group (OF, INF).
    Position,
    /// UT for hitters, P for pitchers.
    Flex,
    /// BN: anyone.
    Bench,
    /// IL: anyone, but only placed by the final roster pass or by hand.
    Reserve,
}

impl SlotTier {
    pub fn of(slot: &str) -> SlotTier {
        match normalize(slot).as_str() {
            "BN" | "BE" => SlotTier::Bench,
            "IL" | "DL" => SlotTier::Reserve,
            "UT" | "UTIL" | "P" => SlotTier::Flex,
            _ => SlotTier::Position,
        }
    }
}

/// Order in which slot tiers are tried, both while the draft runs and when
/// slots are assigned after it ends. The draft-time tracker skips `Reserve`.
pub const ASSIGNMENT_PASSES: [SlotTier; 4] = [
    SlotTier::Position,
    SlotTier::Flex,
    SlotTier::Bench,
    SlotTier::Reserve,
];

fn normalize(label: &str) -> String {
    label.trim().to_ascii_uppercase()
}

pub fn is_pitcher(position: &str) -> bool {
    matches!(normalize(position).as_str(), "SP" | "RP" | "P")
}

/// Whether a player at `position` may occupy a slot labelled `slot`.
pub fn fits(position: &str, slot: &str, is_best_ball: bool) -> bool {
    let pos = normalize(position);
    let pos = pos.as_str();
    match normalize(slot).as_str() {
        "BN" | "BE" | "IL" | "DL" => true,
        "UT" | "UTIL" => !is_pitcher(pos),
        "P" => PITCHER_POSITIONS.contains(&pos),
        "OF" => {
            OUTFIELD_POSITIONS.contains(&pos) || (is_best_ball && matches!(pos, "DH" | "UT" | "UTIL"))
        }
        "INF" => INFIELD_POSITIONS.contains(&pos),
        exact => pos == exact,
    }
}

/// All player positions a slot label accepts.
pub fn expand_slot(slot: &str) -> Vec<String> {
    let owned = |list: &[&str]| list.iter().map(|p| p.to_string()).collect::<Vec<_>>();
    match normalize(slot).as_str() {
        "BN" | "BE" | "IL" | "DL" => owned(&STANDARD_POSITIONS),
        "UT" | "UTIL" => owned(&HITTER_POSITIONS),
        "P" => owned(&PITCHER_POSITIONS),
        "OF" => owned(&OUTFIELD_POSITIONS),
        "INF" => owned(&INFIELD_POSITIONS),
        exact => vec![exact.to_string()],
    }
}

/// Flatten open slot labels into the positions a team may still draft,
/// deduplicated, in slot order. Best Ball has no fixed lineup, so every
/// standard position stays eligible regardless of occupancy.
pub fn eligible_positions(open_slots: &[String], is_best_ball: bool) -> Vec<String> {
    if is_best_ball {
        return STANDARD_POSITIONS.iter().map(|p| p.to_string()).collect();
    }
    let mut positions: Vec<String> = Vec::new();
    for slot in open_slots {
        for pos in expand_slot(slot) {
            if !positions.contains(&pos) {
                positions.push(pos);
            }
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOTS: [&str; 12] = ["C", "1B", "2B", "3B", "SS", "OF", "INF", "UT", "SP", "RP", "P", "BN"];

    fn fitting(position: &str, best_ball: bool) -> Vec<&'static str> {
        SLOTS
            .iter()
            .chain(["IL"].iter())
            .copied()
            .filter(|slot| fits(position, slot, best_ball))
            .collect()
    }

    #[test]
    fn starting_pitcher_fits_pitching_and_meta_slots() {
        assert_eq!(fitting("SP", false), vec!["SP", "P", "BN", "IL"]);
    }

    #[test]
    fn outfielder_fits_outfield_utility_and_meta_slots() {
        assert_eq!(fitting("OF", false), vec!["OF", "UT", "BN", "IL"]);
    }

    #[test]
    fn infielders_fit_inf_group() {
        for pos in ["1B", "2B", "3B", "SS"] {
            assert!(fits(pos, "INF", false), "{pos} should fit INF");
        }
        assert!(!fits("C", "INF", false));
        assert!(!fits("OF", "INF", false));
    }

    #[test]
    fn specific_outfield_positions_fit_of() {
        for pos in ["LF", "CF", "RF"] {
            assert!(fits(pos, "OF", false));
        }
    }

    #[test]
    fn designated_hitter_fits_of_only_in_best_ball() {
        assert!(!fits("DH", "OF", false));
        assert!(fits("DH", "OF", true));
        assert!(fits("DH", "UT", false));
    }

    #[test]
    fn relief_pitcher_rejected_from_utility() {
        assert!(!fits("RP", "UT", false));
        assert!(fits("RP", "P", false));
        assert!(!fits("RP", "SP", false));
    }

    #[test]
    fn labels_are_case_insensitive() {
        assert!(fits("ss", "SS", false));
        assert!(fits("of", "of", false));
        assert!(fits("sp", "bn", false));
    }

    #[test]
    fn tiers_classify_labels() {
        assert_eq!(SlotTier::of("C"), SlotTier::Position);
        assert_eq!(SlotTier::of("OF"), SlotTier::Position);
        assert_eq!(SlotTier::of("INF"), SlotTier::Position);
        assert_eq!(SlotTier::of("UT"), SlotTier::Flex);
        assert_eq!(SlotTier::of("P"), SlotTier::Flex);
        assert_eq!(SlotTier::of("BN"), SlotTier::Bench);
        assert_eq!(SlotTier::of("IL"), SlotTier::Reserve);
    }

    #[test]
    fn expand_group_slots() {
        assert_eq!(expand_slot("P"), vec!["SP", "RP"]);
        assert_eq!(expand_slot("INF"), vec!["1B", "2B", "3B", "SS"]);
        assert_eq!(expand_slot("c"), vec!["C"]);
        assert_eq!(expand_slot("UT").len(), HITTER_POSITIONS.len());
    }

    #[test]
    fn eligible_positions_dedupes_in_slot_order() {
        let open = vec!["OF".to_string(), "UT".to_string(), "SP".to_string()];
        let positions = eligible_positions(&open, false);
        assert_eq!(&positions[..4], &["OF", "LF", "CF", "RF"]);
        assert_eq!(positions.iter().filter(|p| *p == "OF").count(), 1);
        assert!(positions.contains(&"C".to_string()));
        assert_eq!(positions.last().map(String::as_str), Some("SP"));
        assert!(!positions.contains(&"RP".to_string()));
    }

    #[test]
    fn eligible_positions_best_ball_ignores_open_slots() {
        let positions = eligible_positions(&[], true);
        assert_eq!(positions.len(), STANDARD_POSITIONS.len());
    }

    #[test]
    fn eligible_positions_empty_when_roster_full() {
        assert!(eligible_positions(&[], false).is_empty());
    }
}
