// Candidate selection for auto-picks and best-available suggestions.
//
// The picking team's open slots are expanded into eligible positions, then
// three sources are tried in order until one yields a player:
// ADP ranking (MLB level first), per-position raw score, best score overall.

use anyhow::Result;
use tracing::debug;

use super::eligibility::eligible_positions;
use super::league::{League, Player};
use crate::store::{DraftStore, RankQuery};

/// Level preferred by the ranking step before falling back to any level.
pub const PREFERRED_LEVEL: &str = "MLB";

// ---------------------------------------------------------------------------
// Selection source
// ---------------------------------------------------------------------------

/// Which step of the selection order produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    /// Best ADP among eligible positions at the preferred level.
    Ranked,
    /// Best ADP among eligible positions at any level.
    RankedAnyLevel,
    /// Best raw score at one eligible position.
    PositionScore,
    /// Best raw score regardless of position.
    BestOverall,
}

impl SelectionSource {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionSource::Ranked => "ranked",
            SelectionSource::RankedAnyLevel => "ranked-any-level",
            SelectionSource::PositionScore => "position-score",
            SelectionSource::BestOverall => "best-overall",
        }
    }
}

/// A player chosen by [`select_candidate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub player: Player,
    pub source: SelectionSource,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Pick the best undrafted player for a team whose open slots are
/// `open_slots`.
///
/// Returns `None` only when no undrafted player remains at all, which means
/// the player pool is exhausted.
pub async fn select_candidate(
    store: &dyn DraftStore,
    league: &League,
    open_slots: &[String],
) -> Result<Option<Candidate>> {
    let positions = eligible_positions(open_slots, league.is_best_ball());

    if !positions.is_empty() {
        let mut query = RankQuery {
            league_id: league.id,
            positions: &positions,
            format: league.format,
            season: league.season,
            level: Some(PREFERRED_LEVEL),
        };
        if let Some(player) = store.best_ranked_player(&query).await? {
            return Ok(Some(Candidate {
                player,
                source: SelectionSource::Ranked,
            }));
        }

        query.level = None;
        if let Some(player) = store.best_ranked_player(&query).await? {
            return Ok(Some(Candidate {
                player,
                source: SelectionSource::RankedAnyLevel,
            }));
        }

        for position in &positions {
            if let Some(player) = store.best_scored_player(league.id, Some(position)).await? {
                return Ok(Some(Candidate {
                    player,
                    source: SelectionSource::PositionScore,
                }));
            }
        }
    }

    debug!(
        "league {}: no eligible candidate for open slots {:?}, taking best overall",
        league.id, open_slots
    );
    Ok(store
        .best_scored_player(league.id, None)
        .await?
        .map(|player| Candidate {
            player,
            source: SelectionSource::BestOverall,
        }))
}
