// Draft events for the real-time notification layer.
//
// The engine publishes on a broadcast bus; whatever fans events out to
// browsers (SSE, websocket) subscribes. Publishing with no subscribers is
// not an error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::draft::league::{DraftStatus, LeagueId, PlayerId, TeamId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DraftEvent {
    /// Emitted right after a pick is committed.
    #[serde(rename_all = "camelCase")]
    Pick {
        league_id: LeagueId,
        overall_pick: u32,
        player_id: PlayerId,
        team_id: TeamId,
    },
    /// Emitted on every draft status transition.
    #[serde(rename_all = "camelCase")]
    DraftStatus {
        league_id: LeagueId,
        status: DraftStatus,
    },
    /// Emitted when team membership or draft order changes.
    #[serde(rename_all = "camelCase")]
    TeamsUpdate { league_id: LeagueId },
}

impl DraftEvent {
    pub fn league_id(&self) -> LeagueId {
        match self {
            DraftEvent::Pick { league_id, .. }
            | DraftEvent::DraftStatus { league_id, .. }
            | DraftEvent::TeamsUpdate { league_id } => *league_id,
        }
    }
}

/// Broadcast bus for [`DraftEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DraftEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        EventBus { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: DraftEvent) {
        if self.tx.send(event).is_err() {
            debug!("draft event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(256)
    }
}
