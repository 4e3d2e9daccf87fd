// Head-to-head matchup schedule (round robin, circle method).

use serde::{Deserialize, Serialize};

use super::league::{LeagueId, TeamId};

/// One week's pairing between two teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    pub league_id: LeagueId,
    /// 1-based week.
    pub week: u32,
    pub team_a: TeamId,
    pub team_b: TeamId,
}

/// One round of a round robin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub pairings: Vec<(TeamId, TeamId)>,
    /// The team sitting out this round, for odd team counts.
    pub bye: Option<TeamId>,
}

/// Generate one full rotation: `n - 1` rounds for an even count, `n` rounds
/// for an odd count (a bye seat makes it even). Every pair meets once.
pub fn round_robin(teams: &[TeamId]) -> Vec<Round> {
    if teams.len() < 2 {
        return Vec::new();
    }

    let mut seats: Vec<Option<TeamId>> = teams.iter().copied().map(Some).collect();
    if seats.len() % 2 == 1 {
        seats.push(None);
    }
    let n = seats.len();
    let last = n - 1;

    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let mut round = Round {
            pairings: Vec::with_capacity(n / 2),
            bye: None,
        };
        for i in 0..n / 2 {
            match (seats[i], seats[last - i]) {
                (Some(a), Some(b)) => round.pairings.push((a, b)),
                (Some(team), None) | (None, Some(team)) => round.bye = Some(team),
                (None, None) => {}
            }
        }
        rounds.push(round);
        seats[1..].rotate_right(1);
    }
    rounds
}

/// Lay rounds out over `weeks` weeks, replaying the rotation as needed.
pub fn build_schedule(league_id: LeagueId, teams: &[TeamId], weeks: u32) -> Vec<Matchup> {
    let rounds = round_robin(teams);
    if rounds.is_empty() {
        return Vec::new();
    }
    (0..weeks)
        .flat_map(|w| {
            let round = &rounds[w as usize % rounds.len()];
            round.pairings.iter().map(move |&(team_a, team_b)| Matchup {
                league_id,
                week: w + 1,
                team_a,
                team_b,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn unordered(a: TeamId, b: TeamId) -> (TeamId, TeamId) {
        (a.min(b), a.max(b))
    }

    fn all_pairs(teams: &[TeamId]) -> HashSet<(TeamId, TeamId)> {
        let mut pairs = HashSet::new();
        for (i, &a) in teams.iter().enumerate() {
            for &b in &teams[i + 1..] {
                pairs.insert(unordered(a, b));
            }
        }
        pairs
    }

    #[test]
    fn five_teams_meet_once_with_one_bye_per_round() {
        let teams = [11, 12, 13, 14, 15];
        let rounds = round_robin(&teams);
        assert_eq!(rounds.len(), 5);

        let mut seen = Vec::new();
        for round in &rounds {
            assert_eq!(round.pairings.len(), 2);
            assert!(round.bye.is_some());
            seen.extend(round.pairings.iter().map(|&(a, b)| unordered(a, b)));
        }
        let unique: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(seen.len(), unique.len(), "a pair met twice");
        assert_eq!(unique, all_pairs(&teams));

        let byes: HashSet<_> = rounds.iter().filter_map(|r| r.bye).collect();
        assert_eq!(byes.len(), 5, "every team sits out exactly once");
    }

    #[test]
    fn even_count_has_no_byes() {
        let teams = [1, 2, 3, 4, 5, 6];
        let rounds = round_robin(&teams);
        assert_eq!(rounds.len(), 5);
        for round in &rounds {
            assert_eq!(round.pairings.len(), 3);
            assert!(round.bye.is_none());
            let mut playing: Vec<TeamId> =
                round.pairings.iter().flat_map(|&(a, b)| [a, b]).collect();
            playing.sort_unstable();
            assert_eq!(playing, teams.to_vec());
        }
    }

    #[test]
    fn first_round_pairs_outside_in() {
        let rounds = round_robin(&[1, 2, 3, 4]);
        assert_eq!(rounds[0].pairings, vec![(1, 4), (2, 3)]);
        // Seat 0 stays fixed; the rest rotate one seat.
        assert_eq!(rounds[1].pairings, vec![(1, 3), (4, 2)]);
    }

    #[test]
    fn too_few_teams_yield_nothing() {
        assert!(round_robin(&[]).is_empty());
        assert!(round_robin(&[1]).is_empty());
        assert!(build_schedule(1, &[1], 10).is_empty());
    }

    #[test]
    fn schedule_replays_rotation_cyclically() {
        let teams = [1, 2, 3, 4];
        let schedule = build_schedule(9, &teams, 7);
        assert_eq!(schedule.len(), 14);
        let week = |w: u32| -> Vec<(TeamId, TeamId)> {
            schedule
                .iter()
                .filter(|m| m.week == w)
                .map(|m| (m.team_a, m.team_b))
                .collect()
        };
        assert_eq!(week(1), week(4));
        assert_eq!(week(3), week(6));
        assert_eq!(week(1), week(7));
        assert!(schedule.iter().all(|m| m.league_id == 9));
    }
}
