// League and team records as seen by the draft engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type LeagueId = i64;
pub type TeamId = i64;
pub type PlayerId = i64;

/// Where a league is in its draft lifecycle.
///
/// Transitions: `Pending -> Active -> (Paused <-> Active)* -> Completed`.
/// `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Pending,
    Active,
    Paused,
    Completed,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Pending => "pending",
            DraftStatus::Active => "active",
            DraftStatus::Paused => "paused",
            DraftStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(DraftStatus::Pending),
            "active" => Some(DraftStatus::Active),
            "paused" => Some(DraftStatus::Paused),
            "completed" => Some(DraftStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// League format. Only Best Ball changes draft behavior: it has no fixed
/// lineup, so roster occupancy never restricts a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeagueFormat {
    Redraft,
    #[serde(rename = "Best Ball")]
    BestBall,
    Keeper,
    Dynasty,
}

impl LeagueFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueFormat::Redraft => "Redraft",
            LeagueFormat::BestBall => "Best Ball",
            LeagueFormat::Keeper => "Keeper",
            LeagueFormat::Dynasty => "Dynasty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redraft" => Some(LeagueFormat::Redraft),
            "best ball" | "bestball" | "best_ball" => Some(LeagueFormat::BestBall),
            "keeper" => Some(LeagueFormat::Keeper),
            "dynasty" => Some(LeagueFormat::Dynasty),
            _ => None,
        }
    }

    pub fn is_best_ball(&self) -> bool {
        matches!(self, LeagueFormat::BestBall)
    }
}

impl fmt::Display for LeagueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the league is scored once the season starts. Only head-to-head
/// leagues get a matchup schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringType {
    HeadToHead,
    Roto,
}

impl ScoringType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringType::HeadToHead => "head_to_head",
            ScoringType::Roto => "roto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "head_to_head" | "h2h" => Some(ScoringType::HeadToHead),
            "roto" => Some(ScoringType::Roto),
            _ => None,
        }
    }
}

/// Draft-relevant state of a league.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub status: DraftStatus,
    /// When the current turn's clock began. `None` while not active.
    pub pick_started_at: Option<DateTime<Utc>>,
    pub seconds_per_pick: u32,
    pub team_count: u32,
    /// Ordered roster slot labels, e.g. `["C", "1B", "OF", "OF", "UT", "BN"]`.
    pub roster_slots: Vec<String>,
    pub format: LeagueFormat,
    /// Deeper roster for Best Ball; overrides the slot count as round count.
    pub max_roster_size: Option<u32>,
    pub scoring: ScoringType,
    /// Season used to scope ADP rankings.
    pub season: i32,
    /// Number of weeks the matchup schedule must cover.
    pub season_weeks: u32,
}

impl League {
    /// Number of draft rounds.
    pub fn rounds(&self) -> u32 {
        let slots = self.roster_slots.len() as u32;
        match (self.format, self.max_roster_size) {
            (LeagueFormat::BestBall, Some(max)) if max > 0 => max,
            _ => slots,
        }
    }

    pub fn is_best_ball(&self) -> bool {
        self.format.is_best_ball()
    }

    /// Whether the turn that started at `pick_started_at` has run out.
    pub fn turn_expired(&self, now: DateTime<Utc>) -> bool {
        match self.pick_started_at {
            Some(started) => {
                let elapsed = now.signed_duration_since(started).num_seconds();
                elapsed >= i64::from(self.seconds_per_pick)
            }
            None => false,
        }
    }
}

/// A team participating in a league's draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub league_id: LeagueId,
    pub name: String,
    /// 1-based position in the first round.
    pub draft_position: u32,
    /// CPU-controlled: picks immediately when on the clock.
    pub is_automated: bool,
}

/// A draftable player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Organization abbreviation, e.g. "SEA".
    pub team: String,
    /// Canonical position label, e.g. "SS", "SP", "OF".
    pub position: String,
    /// Organization level, e.g. "MLB" or "AAA".
    pub level: String,
    /// Raw performance score used when no ADP is available.
    pub score: f64,
}
