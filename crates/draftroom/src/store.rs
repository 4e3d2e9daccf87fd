// Persistence and ranking port used by the draft engine.
//
// The engine never talks to a database directly. `db::Database` is the SQLite
// implementation; anything else that can answer these queries works too.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::draft::league::{DraftStatus, League, LeagueFormat, LeagueId, Player, PlayerId, Team};
use crate::draft::pick::{NewPick, Pick};
use crate::draft::schedule::Matchup;

/// Result of inserting a pick.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Pick),
    /// The (league, overall pick) or (league, player) pair already exists.
    Duplicate,
}

/// Filter for the ADP ranking query.
#[derive(Debug, Clone)]
pub struct RankQuery<'a> {
    pub league_id: LeagueId,
    pub positions: &'a [String],
    pub format: LeagueFormat,
    pub season: i32,
    /// Restrict to players at this organization level (e.g. "MLB").
    pub level: Option<&'a str>,
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn league(&self, league_id: LeagueId) -> Result<Option<League>>;

    /// Ids of leagues whose draft status is active.
    async fn active_league_ids(&self) -> Result<Vec<LeagueId>>;

    /// Set the draft status and the turn clock start together.
    async fn set_draft_status(
        &self,
        league_id: LeagueId,
        status: DraftStatus,
        pick_started_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    async fn set_pick_started_at(
        &self,
        league_id: LeagueId,
        pick_started_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Teams ordered by ascending draft position.
    async fn teams(&self, league_id: LeagueId) -> Result<Vec<Team>>;

    /// Rewrite draft positions: `order[i]` gets position `i + 1`.
    async fn set_draft_order(&self, league_id: LeagueId, order: &[i64]) -> Result<()>;

    /// Picks ordered by overall pick.
    async fn picks(&self, league_id: LeagueId) -> Result<Vec<Pick>>;

    async fn insert_pick(&self, pick: &NewPick) -> Result<InsertOutcome>;

    async fn set_roster_slot(&self, pick_id: i64, roster_slot: u32) -> Result<()>;

    async fn player(&self, player_id: PlayerId) -> Result<Option<Player>>;

    /// Best undrafted player by ADP (ascending), ties by name.
    async fn best_ranked_player(&self, query: &RankQuery<'_>) -> Result<Option<Player>>;

    /// Best undrafted player by raw score (descending), ties by name.
    /// `position: None` searches every position.
    async fn best_scored_player(
        &self,
        league_id: LeagueId,
        position: Option<&str>,
    ) -> Result<Option<Player>>;

    /// Recompute ADP for (format, season) from every completed draft.
    /// Returns the number of players ranked.
    async fn recalculate_adp(&self, format: LeagueFormat, season: i32) -> Result<usize>;

    async fn matchups(&self, league_id: LeagueId) -> Result<Vec<Matchup>>;

    /// Delete the league's schedule and insert `matchups` in its place.
    async fn replace_matchups(&self, league_id: LeagueId, matchups: &[Matchup]) -> Result<()>;
}
