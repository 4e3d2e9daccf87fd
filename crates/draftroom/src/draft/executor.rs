// Pick execution and draft lifecycle.
//
// `DraftRoom` is the single entry point for anything that changes a league's
// draft: picks from owners, the commissioner, and the clock, plus status
// transitions. Every mutation runs under the league's `DraftLocks` guard; the
// `*_locked` helpers take the guard by reference to make that explicit.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::eligibility::ASSIGNMENT_PASSES;
use super::league::{DraftStatus, League, LeagueId, PlayerId, ScoringType, Team, TeamId};
use super::lock::{DraftLocks, LeagueGuard};
use super::order::{pick_slot, total_picks, PickSlot};
use super::pick::{NewPick, Pick, PickActor};
use super::roster::{assign_roster_slots, RosterFill};
use super::schedule::{build_schedule, Matchup};
use super::selector::{select_candidate, Candidate};
use crate::error::{DraftError, DraftResult};
use crate::events::{DraftEvent, EventBus};
use crate::store::{DraftStore, InsertOutcome};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to an accepted pick attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// The pick was recorded. `draft_complete` is set when it was the last one.
    Picked { pick: Pick, draft_complete: bool },
    /// No undrafted player was left, so the draft was completed early.
    Exhausted,
    /// Another pick claimed the same slot or player first. Nothing changed.
    Raced,
}

/// The pick that is up next in an unfinished draft.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub slot: PickSlot,
    pub team: Team,
    pub total_picks: u32,
}

// ---------------------------------------------------------------------------
// DraftRoom
// ---------------------------------------------------------------------------

struct Inner {
    store: Arc<dyn DraftStore>,
    locks: DraftLocks,
    events: EventBus,
}

/// Runs drafts for any number of leagues. Cheap to clone.
#[derive(Clone)]
pub struct DraftRoom {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for DraftRoom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftRoom")
            .field("locks", &self.inner.locks)
            .finish_non_exhaustive()
    }
}

impl DraftRoom {
    pub fn new(store: Arc<dyn DraftStore>, events: EventBus) -> Self {
        DraftRoom {
            inner: Arc::new(Inner {
                store,
                locks: DraftLocks::new(),
                events,
            }),
        }
    }

    pub fn store(&self) -> &dyn DraftStore {
        self.inner.store.as_ref()
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn locks(&self) -> &DraftLocks {
        &self.inner.locks
    }

    async fn load_league(&self, league_id: LeagueId) -> DraftResult<League> {
        self.store()
            .league(league_id)
            .await?
            .ok_or(DraftError::LeagueNotFound(league_id))
    }

    // -- Picks ------------------------------------------------------------

    /// Execute one pick for `actor`.
    ///
    /// With `player_id: None` the best candidate for the team on the clock is
    /// chosen (see [`select_candidate`]).
    pub async fn make_pick(
        &self,
        league_id: LeagueId,
        actor: PickActor,
        player_id: Option<PlayerId>,
    ) -> DraftResult<PickOutcome> {
        let guard = self.inner.locks.acquire(league_id).await;
        self.pick_locked(&guard, actor, player_id).await
    }

    /// A team owner picks `player_id` on their own turn.
    pub async fn manual_pick(
        &self,
        league_id: LeagueId,
        team_id: TeamId,
        player_id: PlayerId,
    ) -> DraftResult<PickOutcome> {
        self.make_pick(league_id, PickActor::Manual { team_id }, Some(player_id))
            .await
    }

    /// The commissioner assigns `player_id` to whichever team is on the
    /// clock. Allowed while paused.
    pub async fn commissioner_pick(
        &self,
        league_id: LeagueId,
        player_id: PlayerId,
        turn: Option<u32>,
    ) -> DraftResult<PickOutcome> {
        self.make_pick(league_id, PickActor::Commissioner { turn }, Some(player_id))
            .await
    }

    /// Pick the best candidate for the team on the clock, provided the draft
    /// is still on `expected_turn`.
    pub async fn auto_pick(&self, league_id: LeagueId, expected_turn: u32) -> DraftResult<PickOutcome> {
        self.make_pick(league_id, PickActor::Auto { expected_turn }, None)
            .await
    }

    async fn pick_locked(
        &self,
        guard: &LeagueGuard,
        actor: PickActor,
        player_id: Option<PlayerId>,
    ) -> DraftResult<PickOutcome> {
        let store = self.store();
        let league = self.load_league(guard.league_id()).await?;

        let allowed = match actor {
            PickActor::Commissioner { .. } => {
                matches!(league.status, DraftStatus::Active | DraftStatus::Paused)
            }
            _ => league.status == DraftStatus::Active,
        };
        if !allowed {
            return Err(DraftError::NotActive {
                status: league.status,
            });
        }

        let teams = store.teams(league.id).await?;
        let picks = store.picks(league.id).await?;
        let total = total_picks(league.rounds(), teams.len() as u32);
        let next = picks.len() as u32 + 1;
        if next > total {
            return Err(DraftError::DraftFull { total });
        }
        let slot = pick_slot(next, teams.len() as u32)
            .ok_or_else(|| DraftError::InvalidDraftOrder("league has no teams".into()))?;
        let team = &teams[slot.team_index];

        match actor {
            PickActor::Manual { team_id } if team_id != team.id => {
                return Err(DraftError::NotYourTurn {
                    expected: team.id,
                    attempted: team_id,
                });
            }
            PickActor::Commissioner { turn: Some(requested) }
            | PickActor::Auto {
                expected_turn: requested,
            } if requested != next => {
                return Err(DraftError::StaleTurn {
                    requested,
                    current: next,
                });
            }
            _ => {}
        }

        let fill = team_fill(&league, &picks, team.id);

        let player = match player_id {
            Some(id) => store
                .player(id)
                .await?
                .ok_or(DraftError::PlayerNotFound(id))?,
            None => {
                let candidate = select_candidate(store, &league, &fill.open_slots())
                    .await?
                    .filter(|c| league.is_best_ball() || fill.can_accept(&c.player.position, false));
                match candidate {
                    Some(Candidate { player, source }) => {
                        debug!(
                            "league {}: selected {} ({}) via {}",
                            league.id,
                            player.name,
                            player.position,
                            source.label()
                        );
                        player
                    }
                    None => {
                        warn!(
                            "league {}: no legal player left for {} at pick {}, completing draft",
                            league.id, team.name, next
                        );
                        self.complete_locked(guard, &league).await?;
                        return Ok(PickOutcome::Exhausted);
                    }
                }
            }
        };

        if picks.iter().any(|p| p.player_id == player.id) {
            return Err(DraftError::AlreadyDrafted(player.id));
        }

        if !league.is_best_ball() && !fill.can_accept(&player.position, false) {
            return Err(DraftError::NoEligibleSlot {
                position: player.position.clone(),
            });
        }

        let new_pick = NewPick::new(league.id, team.id, player.id, slot);
        let pick = match store.insert_pick(&new_pick).await? {
            InsertOutcome::Inserted(pick) => pick,
            InsertOutcome::Duplicate => {
                warn!(
                    "league {}: duplicate pick {} for player {} ignored",
                    league.id, next, player.id
                );
                return Ok(PickOutcome::Raced);
            }
        };

        info!(
            "league {}: pick {} (round {}, #{}) {} -> {} [{}]",
            league.id,
            pick.overall_pick,
            pick.round,
            pick.pick_in_round,
            team.name,
            player.name,
            actor.label()
        );
        self.inner.events.publish(DraftEvent::Pick {
            league_id: league.id,
            overall_pick: pick.overall_pick,
            player_id: pick.player_id,
            team_id: pick.team_id,
        });

        let draft_complete = next == total;
        if draft_complete {
            self.complete_locked(guard, &league).await?;
        } else if league.status == DraftStatus::Active {
            store
                .set_pick_started_at(league.id, Some(Utc::now()))
                .await?;
        }

        Ok(PickOutcome::Picked {
            pick,
            draft_complete,
        })
    }

    /// The team on the clock, or `None` once every pick has been made.
    pub async fn next_turn(&self, league_id: LeagueId) -> DraftResult<Option<Turn>> {
        let league = self.load_league(league_id).await?;
        let teams = self.store().teams(league_id).await?;
        let made = self.store().picks(league_id).await?.len() as u32;
        let total = total_picks(league.rounds(), teams.len() as u32);
        if made >= total {
            return Ok(None);
        }
        let Some(slot) = pick_slot(made + 1, teams.len() as u32) else {
            return Ok(None);
        };
        Ok(Some(Turn {
            slot,
            team: teams[slot.team_index].clone(),
            total_picks: total,
        }))
    }

    /// Suggest the best available player for `team_id` without picking.
    pub async fn best_available(
        &self,
        league_id: LeagueId,
        team_id: TeamId,
    ) -> DraftResult<Option<Candidate>> {
        let league = self.load_league(league_id).await?;
        let teams = self.store().teams(league_id).await?;
        if !teams.iter().any(|t| t.id == team_id) {
            return Err(DraftError::TeamNotFound(team_id));
        }
        let picks = self.store().picks(league_id).await?;
        let fill = team_fill(&league, &picks, team_id);
        Ok(select_candidate(self.store(), &league, &fill.open_slots()).await?)
    }

    // -- Lifecycle --------------------------------------------------------

    /// Move a pending draft to active and start the first turn's clock.
    ///
    /// Requires at least two teams holding draft positions `1..=N`.
    pub async fn start_draft(&self, league_id: LeagueId) -> DraftResult<()> {
        let guard = self.inner.locks.acquire(league_id).await;
        let league = self.load_league(guard.league_id()).await?;
        if league.status != DraftStatus::Pending {
            return Err(DraftError::InvalidTransition {
                from: league.status,
                to: DraftStatus::Active,
            });
        }
        if league.roster_slots.is_empty() {
            return Err(DraftError::InvalidDraftOrder(
                "league has no roster slots".into(),
            ));
        }
        let teams = self.store().teams(league_id).await?;
        if teams.len() < 2 {
            return Err(DraftError::InvalidDraftOrder(format!(
                "need at least 2 teams, found {}",
                teams.len()
            )));
        }
        if let Some((idx, team)) = teams
            .iter()
            .enumerate()
            .find(|(idx, team)| team.draft_position != *idx as u32 + 1)
        {
            return Err(DraftError::InvalidDraftOrder(format!(
                "team {} holds draft position {}, expected {}",
                team.id,
                team.draft_position,
                idx + 1
            )));
        }

        self.set_status_locked(&guard, DraftStatus::Active, true).await?;
        info!(
            "league {}: draft started ({} teams, {} rounds)",
            league_id,
            teams.len(),
            league.rounds()
        );
        Ok(())
    }

    /// Stop the clock. Commissioner picks are still accepted.
    pub async fn pause_draft(&self, league_id: LeagueId) -> DraftResult<()> {
        self.transition(league_id, DraftStatus::Active, DraftStatus::Paused)
            .await
    }

    /// Restart the clock with a fresh turn.
    pub async fn resume_draft(&self, league_id: LeagueId) -> DraftResult<()> {
        self.transition(league_id, DraftStatus::Paused, DraftStatus::Active)
            .await
    }

    async fn transition(
        &self,
        league_id: LeagueId,
        from: DraftStatus,
        to: DraftStatus,
    ) -> DraftResult<()> {
        let guard = self.inner.locks.acquire(league_id).await;
        let league = self.load_league(league_id).await?;
        if league.status != from {
            return Err(DraftError::InvalidTransition {
                from: league.status,
                to,
            });
        }
        self.set_status_locked(&guard, to, to == DraftStatus::Active)
            .await?;
        info!("league {}: draft {} -> {}", league_id, from, to);
        Ok(())
    }

    async fn set_status_locked(
        &self,
        guard: &LeagueGuard,
        status: DraftStatus,
        start_clock: bool,
    ) -> DraftResult<()> {
        let started = start_clock.then(Utc::now);
        self.store()
            .set_draft_status(guard.league_id(), status, started)
            .await?;
        self.inner.events.publish(DraftEvent::DraftStatus {
            league_id: guard.league_id(),
            status,
        });
        Ok(())
    }

    /// Start the turn clock of an active league whose clock was never set.
    /// Returns whether it was started.
    pub async fn ensure_turn_clock(&self, league_id: LeagueId) -> DraftResult<bool> {
        let _guard = self.inner.locks.acquire(league_id).await;
        let league = self.load_league(league_id).await?;
        if league.status != DraftStatus::Active || league.pick_started_at.is_some() {
            return Ok(false);
        }
        self.store()
            .set_pick_started_at(league_id, Some(Utc::now()))
            .await?;
        Ok(true)
    }

    /// Rewrite the first-round order before the draft starts. `order` must
    /// list every team in the league exactly once.
    pub async fn set_draft_order(&self, league_id: LeagueId, order: &[TeamId]) -> DraftResult<()> {
        let _guard = self.inner.locks.acquire(league_id).await;
        let league = self.load_league(league_id).await?;
        if league.status != DraftStatus::Pending {
            return Err(DraftError::InvalidDraftOrder(format!(
                "draft is {}; order can only change while pending",
                league.status
            )));
        }

        let teams = self.store().teams(league_id).await?;
        let mut wanted: Vec<TeamId> = order.to_vec();
        let mut have: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
        wanted.sort_unstable();
        have.sort_unstable();
        if wanted != have {
            return Err(DraftError::InvalidDraftOrder(
                "order must list every team in the league exactly once".into(),
            ));
        }

        self.store().set_draft_order(league_id, order).await?;
        self.inner
            .events
            .publish(DraftEvent::TeamsUpdate { league_id });
        info!("league {}: draft order set to {:?}", league_id, order);
        Ok(())
    }

    /// Complete a running or paused draft immediately, whatever picks
    /// remain.
    pub async fn force_complete(&self, league_id: LeagueId) -> DraftResult<()> {
        let guard = self.inner.locks.acquire(league_id).await;
        let league = self.load_league(league_id).await?;
        if !matches!(league.status, DraftStatus::Active | DraftStatus::Paused) {
            return Err(DraftError::InvalidTransition {
                from: league.status,
                to: DraftStatus::Completed,
            });
        }
        self.complete_locked(&guard, &league).await
    }

    async fn complete_locked(&self, guard: &LeagueGuard, league: &League) -> DraftResult<()> {
        self.set_status_locked(guard, DraftStatus::Completed, false)
            .await?;
        info!("league {}: draft completed", league.id);

        let room = self.clone();
        let league_id = league.id;
        tokio::spawn(async move {
            room.finalize_draft(league_id).await;
        });
        Ok(())
    }

    /// Post-completion work: ADP recalculation, the matchup schedule and
    /// roster slot assignment. Each step logs its own failure and the rest
    /// still run.
    pub async fn finalize_draft(&self, league_id: LeagueId) {
        let league = match self.load_league(league_id).await {
            Ok(league) => league,
            Err(e) => {
                error!("league {}: finalize skipped: {}", league_id, e);
                return;
            }
        };

        match self
            .store()
            .recalculate_adp(league.format, league.season)
            .await
        {
            Ok(n) => info!(
                "ADP recalculated for {} {}: {} players",
                league.format, league.season, n
            ),
            Err(e) => error!("league {}: ADP recalculation failed: {:#}", league_id, e),
        }

        if league.scoring == ScoringType::HeadToHead {
            if let Err(e) = self.regenerate_schedule(league_id).await {
                error!("league {}: schedule generation failed: {}", league_id, e);
            }
        }

        if let Err(e) = self.initialize_rosters(league_id).await {
            error!("league {}: roster initialization failed: {}", league_id, e);
        }
    }

    // -- Rosters ----------------------------------------------------------

    /// Assign roster slots for every team in a completed draft. Safe to call
    /// repeatedly. Returns how many picks received a slot.
    pub async fn initialize_rosters(&self, league_id: LeagueId) -> DraftResult<usize> {
        let _guard = self.inner.locks.acquire(league_id).await;
        let league = self.load_league(league_id).await?;
        if league.status != DraftStatus::Completed {
            return Err(DraftError::NotCompleted {
                status: league.status,
            });
        }

        let teams = self.store().teams(league_id).await?;
        let picks = self.store().picks(league_id).await?;
        let mut assigned = 0;
        for team in &teams {
            let team_picks: Vec<Pick> = picks
                .iter()
                .filter(|p| p.team_id == team.id)
                .cloned()
                .collect();
            let unassigned = team_picks.iter().filter(|p| p.roster_slot.is_none()).count();
            if unassigned == 0 {
                continue;
            }

            let assignments = assign_roster_slots(
                &team_picks,
                &league.roster_slots,
                league.is_best_ball(),
                &ASSIGNMENT_PASSES,
            );
            for a in &assignments {
                self.store().set_roster_slot(a.pick_id, a.roster_slot).await?;
            }
            if assignments.len() < unassigned {
                warn!(
                    "league {}: team {} has {} picks with no legal roster slot",
                    league_id,
                    team.id,
                    unassigned - assignments.len()
                );
            }
            assigned += assignments.len();
        }

        debug!("league {}: assigned {} roster slots", league_id, assigned);
        Ok(assigned)
    }

    /// A team's picks in draft order. Once the draft is complete, missing
    /// roster slots are assigned on the way out.
    pub async fn roster(&self, league_id: LeagueId, team_id: TeamId) -> DraftResult<Vec<Pick>> {
        let league = self.load_league(league_id).await?;
        let teams = self.store().teams(league_id).await?;
        if !teams.iter().any(|t| t.id == team_id) {
            return Err(DraftError::TeamNotFound(team_id));
        }

        let team_picks = |picks: Vec<Pick>| -> Vec<Pick> {
            picks.into_iter().filter(|p| p.team_id == team_id).collect()
        };
        let picks = team_picks(self.store().picks(league_id).await?);
        if league.status == DraftStatus::Completed && picks.iter().any(|p| p.roster_slot.is_none()) {
            self.initialize_rosters(league_id).await?;
            return Ok(team_picks(self.store().picks(league_id).await?));
        }
        Ok(picks)
    }

    // -- Schedule ---------------------------------------------------------

    /// Replace the league's matchup schedule with a fresh round robin over
    /// `season_weeks`. Roto leagues get no schedule.
    pub async fn regenerate_schedule(&self, league_id: LeagueId) -> DraftResult<Vec<Matchup>> {
        let _guard = self.inner.locks.acquire(league_id).await;
        let league = self.load_league(league_id).await?;
        if league.scoring != ScoringType::HeadToHead {
            debug!("league {}: {} scoring has no schedule", league_id, league.scoring.as_str());
            return Ok(Vec::new());
        }

        let team_ids: Vec<TeamId> = self
            .store()
            .teams(league_id)
            .await?
            .iter()
            .map(|t| t.id)
            .collect();
        let matchups = build_schedule(league_id, &team_ids, league.season_weeks);
        self.store().replace_matchups(league_id, &matchups).await?;
        info!(
            "league {}: scheduled {} matchups over {} weeks",
            league_id,
            matchups.len(),
            league.season_weeks
        );
        Ok(matchups)
    }

    /// The league's schedule, generated on demand for a completed
    /// head-to-head league that has none yet.
    pub async fn schedule(&self, league_id: LeagueId) -> DraftResult<Vec<Matchup>> {
        let league = self.load_league(league_id).await?;
        let matchups = self.store().matchups(league_id).await?;
        if matchups.is_empty()
            && league.status == DraftStatus::Completed
            && league.scoring == ScoringType::HeadToHead
        {
            return self.regenerate_schedule(league_id).await;
        }
        Ok(matchups)
    }
}

/// Draft-time fill of one team's roster from the league's picks.
fn team_fill(league: &League, picks: &[Pick], team_id: TeamId) -> RosterFill {
    let positions: Vec<&str> = picks
        .iter()
        .filter(|p| p.team_id == team_id)
        .map(|p| p.position.as_str())
        .collect();
    RosterFill::build(&positions, &league.roster_slots, league.is_best_ball())
}
