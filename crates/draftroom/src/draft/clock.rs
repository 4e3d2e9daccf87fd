// Draft clock: background task that advances idle turns.
//
// Every poll interval the clock walks all active leagues. A league whose
// turn has expired (or whose team on the clock is CPU-controlled) gets an
// auto-pick. While the next team is also automated the clock keeps going,
// pausing `auto_pick_stagger` between picks, up to `max_chained_picks`.
//
// Each league advances in its own task. A league still chaining from an
// earlier scan is skipped until that chain ends.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::executor::{DraftRoom, PickOutcome};
use super::league::{DraftStatus, LeagueId};
use crate::config::ClockConfig;
use crate::error::{DraftResult, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSettings {
    pub poll_interval: Duration,
    pub auto_pick_stagger: Duration,
    pub max_chained_picks: u32,
}

impl Default for ClockSettings {
    fn default() -> Self {
        ClockSettings {
            poll_interval: Duration::from_secs(3),
            auto_pick_stagger: Duration::from_millis(1200),
            max_chained_picks: 64,
        }
    }
}

impl From<&ClockConfig> for ClockSettings {
    fn from(config: &ClockConfig) -> Self {
        ClockSettings {
            poll_interval: config.poll_interval(),
            auto_pick_stagger: config.auto_pick_stagger(),
            max_chained_picks: config.max_chained_picks,
        }
    }
}

/// Totals for one pass over the active leagues.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub leagues: usize,
    pub picks: u32,
    pub failures: usize,
    /// Leagues skipped because an earlier scan is still advancing them.
    pub busy: usize,
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DraftClock {
    room: DraftRoom,
    settings: ClockSettings,
    scanning: Arc<AtomicBool>,
    advancing: Arc<Mutex<HashSet<LeagueId>>>,
}

/// Clears the scanning flag when dispatch ends, however it ends.
struct ScanFlag<'a>(&'a AtomicBool);

impl Drop for ScanFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Marks a league as being advanced; released when its task ends.
struct Advancing {
    league_id: LeagueId,
    set: Arc<Mutex<HashSet<LeagueId>>>,
}

impl Advancing {
    fn claim(set: &Arc<Mutex<HashSet<LeagueId>>>, league_id: LeagueId) -> Option<Advancing> {
        let claimed = set
            .lock()
            .expect("clock league set poisoned")
            .insert(league_id);
        claimed.then(|| Advancing {
            league_id,
            set: Arc::clone(set),
        })
    }
}

impl Drop for Advancing {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.league_id);
        }
    }
}

impl DraftClock {
    pub fn new(room: DraftRoom, settings: ClockSettings) -> Self {
        DraftClock {
            room,
            settings,
            scanning: Arc::new(AtomicBool::new(false)),
            advancing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    /// Spawn the periodic scan loop. The first scan runs one full interval
    /// after start. Scans run as their own tasks so a long chain never
    /// holds up the next tick.
    pub fn start(&self) -> ClockHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let clock = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(clock.settings.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            info!(
                "Draft clock started (every {:?})",
                clock.settings.poll_interval
            );

            let mut scans = JoinSet::new();
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let clock = clock.clone();
                        scans.spawn(async move {
                            if let Some(summary) = clock.scan_once().await {
                                if summary.picks > 0 || summary.failures > 0 {
                                    debug!(
                                        "clock scan: {} leagues, {} picks, {} failures, {} busy",
                                        summary.leagues, summary.picks, summary.failures, summary.busy
                                    );
                                }
                            }
                        });
                    }
                    Some(done) = scans.join_next(), if !scans.is_empty() => {
                        if let Err(e) = done {
                            error!("clock scan task failed: {}", e);
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            while let Some(done) = scans.join_next().await {
                if let Err(e) = done {
                    error!("clock scan task failed: {}", e);
                }
            }
            info!("Draft clock stopped");
        });

        ClockHandle { stop_tx, task }
    }

    /// Run one pass over every active league, advancing each in its own
    /// task, and wait for them all. Returns `None` if another scan is still
    /// dispatching.
    pub async fn scan_once(&self) -> Option<ScanSummary> {
        if self.scanning.swap(true, Ordering::AcqRel) {
            debug!("clock scan already in progress, skipping");
            return None;
        }
        let flag = ScanFlag(&self.scanning);

        let mut summary = ScanSummary::default();
        let league_ids = match self.room.store().active_league_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("clock scan: failed to list active leagues: {:#}", e);
                summary.failures += 1;
                return Some(summary);
            }
        };

        let mut tasks = JoinSet::new();
        for league_id in league_ids {
            let Some(claim) = Advancing::claim(&self.advancing, league_id) else {
                summary.busy += 1;
                continue;
            };
            summary.leagues += 1;
            let clock = self.clone();
            tasks.spawn(async move {
                let _claim = claim;
                (league_id, clock.advance_league(league_id).await)
            });
        }
        drop(flag);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(picks))) => summary.picks += picks,
                Ok((league_id, Err(e))) => {
                    error!("clock scan: league {} failed: {}", league_id, e);
                    summary.failures += 1;
                }
                Err(e) => {
                    error!("clock scan: league task failed: {}", e);
                    summary.failures += 1;
                }
            }
        }
        Some(summary)
    }

    /// Auto-pick for one league as long as its team on the clock is due.
    /// Returns the number of picks made.
    async fn advance_league(&self, league_id: LeagueId) -> DraftResult<u32> {
        let mut made = 0;

        loop {
            let Some(league) = self.room.store().league(league_id).await? else {
                return Ok(made);
            };
            if league.status != DraftStatus::Active {
                return Ok(made);
            }

            let Some(turn) = self.room.next_turn(league_id).await? else {
                warn!(
                    "league {}: active with every pick made, completing draft",
                    league_id
                );
                self.room.force_complete(league_id).await?;
                return Ok(made);
            };

            if league.pick_started_at.is_none() {
                if self.room.ensure_turn_clock(league_id).await? {
                    info!("league {}: turn clock started", league_id);
                }
                return Ok(made);
            }

            if !turn.team.is_automated && !league.turn_expired(Utc::now()) {
                return Ok(made);
            }
            if made >= self.settings.max_chained_picks {
                debug!(
                    "league {}: chained pick limit reached, resuming next scan",
                    league_id
                );
                return Ok(made);
            }
            if made > 0 {
                tokio::time::sleep(self.settings.auto_pick_stagger).await;
            }

            match self.room.auto_pick(league_id, turn.slot.overall_pick).await {
                Ok(PickOutcome::Picked { draft_complete, .. }) => {
                    made += 1;
                    if draft_complete {
                        return Ok(made);
                    }
                }
                Ok(PickOutcome::Exhausted) | Ok(PickOutcome::Raced) => return Ok(made),
                Err(e) if matches!(e.kind(), ErrorKind::Conflict | ErrorKind::NotActive) => {
                    debug!("league {}: auto-pick skipped: {}", league_id, e);
                    return Ok(made);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owns the running clock task.
#[derive(Debug)]
pub struct ClockHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ClockHandle {
    /// Signal the clock to stop and wait for it. A scan in progress is
    /// allowed to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Draft clock task failed: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
