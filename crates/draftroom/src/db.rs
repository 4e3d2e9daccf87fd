// SQLite persistence layer for leagues, players, picks and matchups.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::draft::league::{
    DraftStatus, League, LeagueFormat, LeagueId, Player, PlayerId, ScoringType, Team, TeamId,
};
use crate::draft::pick::{NewPick, Pick};
use crate::draft::schedule::Matchup;
use crate::players::{AdpRecord, PlayerRecord};
use crate::store::{DraftStore, InsertOutcome, RankQuery};

/// Settings for a league created through [`Database::create_league`].
#[derive(Debug, Clone)]
pub struct NewLeague {
    pub name: String,
    pub seconds_per_pick: u32,
    pub roster_slots: Vec<String>,
    pub format: LeagueFormat,
    pub max_roster_size: Option<u32>,
    pub scoring: ScoringType,
    pub season: i32,
    pub season_weeks: u32,
}

/// SQLite-backed draft storage.
pub struct Database {
    conn: Mutex<Connection>,
}

const LEAGUE_COLUMNS: &str = "l.id, l.name, l.status, l.pick_started_at, l.seconds_per_pick,
     (SELECT COUNT(*) FROM teams t WHERE t.league_id = l.id),
     l.roster_slots, l.format, l.max_roster_size, l.scoring, l.season, l.season_weeks";

const PICK_COLUMNS: &str = "pk.id, pk.league_id, pk.team_id, pk.player_id, pk.overall_pick,
     pk.round, pk.pick_in_round, pk.roster_slot, p.position, pk.created_at";

const PLAYER_COLUMNS: &str = "p.id, p.name, p.team, p.position, p.level, p.score";

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS leagues (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                name             TEXT NOT NULL,
                status           TEXT NOT NULL DEFAULT 'pending',
                pick_started_at  TEXT,
                seconds_per_pick INTEGER NOT NULL,
                roster_slots     TEXT NOT NULL,
                format           TEXT NOT NULL,
                max_roster_size  INTEGER,
                scoring          TEXT NOT NULL,
                season           INTEGER NOT NULL,
                season_weeks     INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS teams (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id      INTEGER NOT NULL REFERENCES leagues(id),
                name           TEXT NOT NULL,
                draft_position INTEGER NOT NULL,
                is_automated   INTEGER NOT NULL DEFAULT 0,
                UNIQUE(league_id, draft_position)
            );

            CREATE TABLE IF NOT EXISTS players (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                name     TEXT NOT NULL,
                team     TEXT NOT NULL,
                position TEXT NOT NULL,
                level    TEXT NOT NULL DEFAULT 'MLB',
                score    REAL NOT NULL DEFAULT 0,
                UNIQUE(name, team)
            );

            CREATE TABLE IF NOT EXISTS player_adp (
                player_id INTEGER NOT NULL REFERENCES players(id),
                format    TEXT NOT NULL,
                season    INTEGER NOT NULL,
                adp       REAL NOT NULL,
                PRIMARY KEY (player_id, format, season)
            );

            CREATE TABLE IF NOT EXISTS picks (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id     INTEGER NOT NULL REFERENCES leagues(id),
                team_id       INTEGER NOT NULL REFERENCES teams(id),
                player_id     INTEGER NOT NULL REFERENCES players(id),
                overall_pick  INTEGER NOT NULL,
                round         INTEGER NOT NULL,
                pick_in_round INTEGER NOT NULL,
                roster_slot   INTEGER,
                created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                UNIQUE(league_id, overall_pick),
                UNIQUE(league_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS matchups (
                league_id INTEGER NOT NULL REFERENCES leagues(id),
                week      INTEGER NOT NULL,
                team_a    INTEGER NOT NULL REFERENCES teams(id),
                team_b    INTEGER NOT NULL REFERENCES teams(id),
                PRIMARY KEY (league_id, week, team_a)
            );

            CREATE INDEX IF NOT EXISTS idx_leagues_status ON leagues(status);
            CREATE INDEX IF NOT EXISTS idx_player_adp_scope ON player_adp(format, season, adp);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Seeding (league/team/player management lives outside the engine)
    // ------------------------------------------------------------------

    /// Create a league in `pending` status. Returns its id.
    pub fn create_league(&self, league: &NewLeague) -> Result<LeagueId> {
        let conn = self.conn();
        let slots_json =
            serde_json::to_string(&league.roster_slots).context("failed to serialize roster slots")?;
        conn.execute(
            "INSERT INTO leagues
                (name, seconds_per_pick, roster_slots, format, max_roster_size, scoring, season, season_weeks)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                league.name,
                league.seconds_per_pick,
                slots_json,
                league.format.as_str(),
                league.max_roster_size,
                league.scoring.as_str(),
                league.season,
                league.season_weeks,
            ],
        )
        .context("failed to create league")?;
        Ok(conn.last_insert_rowid())
    }

    /// Add a team to a league at the given draft position. Returns its id.
    pub fn add_team(
        &self,
        league_id: LeagueId,
        name: &str,
        draft_position: u32,
        is_automated: bool,
    ) -> Result<TeamId> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO teams (league_id, name, draft_position, is_automated)
             VALUES (?1, ?2, ?3, ?4)",
            params![league_id, name, draft_position, is_automated],
        )
        .context("failed to add team")?;
        Ok(conn.last_insert_rowid())
    }

    /// Flip a team between human and CPU control.
    pub fn set_team_automated(&self, team_id: TeamId, is_automated: bool) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE teams SET is_automated = ?1 WHERE id = ?2",
            params![is_automated, team_id],
        )
        .context("failed to update team automation")?;
        Ok(())
    }

    /// Insert a player or update their record if a `(name, team)` row already
    /// exists. Returns the player's row id in a single atomic statement.
    pub fn upsert_player(&self, player: &PlayerRecord) -> Result<PlayerId> {
        let conn = self.conn();
        upsert_player_on(&conn, player)
    }

    /// Set a player's ADP for (format, season), replacing any prior value.
    pub fn set_adp(&self, player_id: PlayerId, format: LeagueFormat, season: i32, adp: f64) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO player_adp (player_id, format, season, adp)
             VALUES (?1, ?2, ?3, ?4)",
            params![player_id, format.as_str(), season, adp],
        )
        .context("failed to set ADP")?;
        Ok(())
    }

    /// Import a player pool and its ADP rankings in a single transaction.
    /// ADP rows whose (name, team) is not in the pool are skipped. Returns
    /// (players upserted, rankings stored).
    pub fn import_pool(&self, players: &[PlayerRecord], rankings: &[AdpRecord]) -> Result<(usize, usize)> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;

        for player in players {
            upsert_player_on(&tx, player)?;
        }

        let mut ranked = 0;
        for ranking in rankings {
            let player_id: Option<PlayerId> = tx
                .query_row(
                    "SELECT id FROM players WHERE name = ?1 AND team = ?2",
                    params![ranking.name, ranking.team],
                    |row| row.get(0),
                )
                .optional()
                .context("failed to look up ranked player")?;
            let Some(player_id) = player_id else {
                continue;
            };
            tx.execute(
                "INSERT OR REPLACE INTO player_adp (player_id, format, season, adp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![player_id, ranking.format.as_str(), ranking.season, ranking.adp],
            )
            .context("failed to store ADP in batch")?;
            ranked += 1;
        }

        tx.commit().context("failed to commit import")?;
        Ok((players.len(), ranked))
    }

    /// Look up a stored ADP value.
    pub fn adp(&self, player_id: PlayerId, format: LeagueFormat, season: i32) -> Result<Option<f64>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT adp FROM player_adp WHERE player_id = ?1 AND format = ?2 AND season = ?3",
            params![player_id, format.as_str(), season],
            |row| row.get(0),
        )
        .optional()
        .context("failed to read ADP")
    }
}

fn upsert_player_on(conn: &Connection, player: &PlayerRecord) -> Result<PlayerId> {
    conn.query_row(
        "INSERT INTO players (name, team, position, level, score)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(name, team) DO UPDATE SET
            position = excluded.position,
            level    = excluded.level,
            score    = excluded.score
         RETURNING id",
        params![
            player.name,
            player.team,
            player.position.to_ascii_uppercase(),
            player.level,
            player.score,
        ],
        |row| row.get(0),
    )
    .context("failed to upsert player")
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad timestamp '{raw}': {e}")))
}

fn league_from_row(row: &Row<'_>) -> rusqlite::Result<League> {
    let status: String = row.get(2)?;
    let started: Option<String> = row.get(3)?;
    let slots_json: String = row.get(6)?;
    let format: String = row.get(7)?;
    let scoring: String = row.get(9)?;

    Ok(League {
        id: row.get(0)?,
        name: row.get(1)?,
        status: DraftStatus::parse(&status)
            .ok_or_else(|| conversion_error(2, format!("unknown draft status '{status}'")))?,
        pick_started_at: started.as_deref().map(|s| parse_timestamp(3, s)).transpose()?,
        seconds_per_pick: row.get(4)?,
        team_count: row.get(5)?,
        roster_slots: serde_json::from_str(&slots_json)
            .map_err(|e| conversion_error(6, format!("bad roster slots: {e}")))?,
        format: LeagueFormat::parse(&format)
            .ok_or_else(|| conversion_error(7, format!("unknown format '{format}'")))?,
        max_roster_size: row.get(8)?,
        scoring: ScoringType::parse(&scoring)
            .ok_or_else(|| conversion_error(9, format!("unknown scoring '{scoring}'")))?,
        season: row.get(10)?,
        season_weeks: row.get(11)?,
    })
}

fn pick_from_row(row: &Row<'_>) -> rusqlite::Result<Pick> {
    let created: String = row.get(9)?;
    Ok(Pick {
        id: row.get(0)?,
        league_id: row.get(1)?,
        team_id: row.get(2)?,
        player_id: row.get(3)?,
        overall_pick: row.get(4)?,
        round: row.get(5)?,
        pick_in_round: row.get(6)?,
        roster_slot: row.get(7)?,
        position: row.get(8)?,
        created_at: parse_timestamp(9, &created)?,
    })
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        team: row.get(2)?,
        position: row.get(3)?,
        level: row.get(4)?,
        score: row.get(5)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

// ---------------------------------------------------------------------------
// DraftStore
// ---------------------------------------------------------------------------

#[async_trait]
impl DraftStore for Database {
    async fn league(&self, league_id: LeagueId) -> Result<Option<League>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {LEAGUE_COLUMNS} FROM leagues l WHERE l.id = ?1"),
            params![league_id],
            league_from_row,
        )
        .optional()
        .context("failed to load league")
    }

    async fn active_league_ids(&self) -> Result<Vec<LeagueId>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id FROM leagues WHERE status = 'active' ORDER BY id")
            .context("failed to prepare active leagues query")?;
        let ids = stmt
            .query_map([], |row| row.get(0))
            .context("failed to query active leagues")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map active league rows")?;
        Ok(ids)
    }

    async fn set_draft_status(
        &self,
        league_id: LeagueId,
        status: DraftStatus,
        pick_started_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE leagues SET status = ?1, pick_started_at = ?2 WHERE id = ?3",
            params![status.as_str(), pick_started_at.map(|t| t.to_rfc3339()), league_id],
        )
        .context("failed to update draft status")?;
        Ok(())
    }

    async fn set_pick_started_at(
        &self,
        league_id: LeagueId,
        pick_started_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE leagues SET pick_started_at = ?1 WHERE id = ?2",
            params![pick_started_at.map(|t| t.to_rfc3339()), league_id],
        )
        .context("failed to update pick clock")?;
        Ok(())
    }

    async fn teams(&self, league_id: LeagueId) -> Result<Vec<Team>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, league_id, name, draft_position, is_automated
                 FROM teams WHERE league_id = ?1 ORDER BY draft_position",
            )
            .context("failed to prepare teams query")?;
        let teams = stmt
            .query_map(params![league_id], |row| {
                Ok(Team {
                    id: row.get(0)?,
                    league_id: row.get(1)?,
                    name: row.get(2)?,
                    draft_position: row.get(3)?,
                    is_automated: row.get(4)?,
                })
            })
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team rows")?;
        Ok(teams)
    }

    async fn set_draft_order(&self, league_id: LeagueId, order: &[TeamId]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        // Park every position out of the way first so the UNIQUE constraint
        // holds at each step of the rewrite.
        tx.execute(
            "UPDATE teams SET draft_position = -draft_position WHERE league_id = ?1",
            params![league_id],
        )
        .context("failed to park draft positions")?;
        for (idx, team_id) in order.iter().enumerate() {
            tx.execute(
                "UPDATE teams SET draft_position = ?1 WHERE id = ?2 AND league_id = ?3",
                params![idx as u32 + 1, team_id, league_id],
            )
            .context("failed to set draft position")?;
        }
        tx.commit().context("failed to commit draft order")?;
        Ok(())
    }

    async fn picks(&self, league_id: LeagueId) -> Result<Vec<Pick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PICK_COLUMNS} FROM picks pk JOIN players p ON p.id = pk.player_id
                 WHERE pk.league_id = ?1 ORDER BY pk.overall_pick"
            ))
            .context("failed to prepare picks query")?;
        let picks = stmt
            .query_map(params![league_id], pick_from_row)
            .context("failed to query picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pick rows")?;
        Ok(picks)
    }

    async fn insert_pick(&self, pick: &NewPick) -> Result<InsertOutcome> {
        let conn = self.conn();
        let inserted = conn.execute(
            "INSERT INTO picks (league_id, team_id, player_id, overall_pick, round, pick_in_round)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                pick.league_id,
                pick.team_id,
                pick.player_id,
                pick.overall_pick,
                pick.round,
                pick.pick_in_round,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(InsertOutcome::Duplicate),
            Err(e) => return Err(e).context("failed to insert pick"),
        }

        let id = conn.last_insert_rowid();
        let stored = conn
            .query_row(
                &format!(
                    "SELECT {PICK_COLUMNS} FROM picks pk JOIN players p ON p.id = pk.player_id
                     WHERE pk.id = ?1"
                ),
                params![id],
                pick_from_row,
            )
            .context("failed to read back inserted pick")?;
        Ok(InsertOutcome::Inserted(stored))
    }

    async fn set_roster_slot(&self, pick_id: i64, roster_slot: u32) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE picks SET roster_slot = ?1 WHERE id = ?2",
            params![roster_slot, pick_id],
        )
        .context("failed to set roster slot")?;
        Ok(())
    }

    async fn player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PLAYER_COLUMNS} FROM players p WHERE p.id = ?1"),
            params![player_id],
            player_from_row,
        )
        .optional()
        .context("failed to load player")
    }

    async fn best_ranked_player(&self, query: &RankQuery<'_>) -> Result<Option<Player>> {
        if query.positions.is_empty() {
            return Ok(None);
        }
        let mut sql = format!(
            "SELECT {PLAYER_COLUMNS} FROM players p
             JOIN player_adp a ON a.player_id = p.id
             WHERE a.format = ? AND a.season = ?
               AND p.position IN ({})
               AND p.id NOT IN (SELECT player_id FROM picks WHERE league_id = ?)",
            placeholders(query.positions.len())
        );
        let mut values: Vec<Value> = vec![
            Value::Text(query.format.as_str().to_string()),
            Value::Integer(i64::from(query.season)),
        ];
        values.extend(query.positions.iter().map(|p| Value::Text(p.to_ascii_uppercase())));
        values.push(Value::Integer(query.league_id));
        if let Some(level) = query.level {
            sql.push_str(" AND p.level = ?");
            values.push(Value::Text(level.to_string()));
        }
        sql.push_str(" ORDER BY a.adp ASC, p.name ASC LIMIT 1");

        let conn = self.conn();
        conn.query_row(&sql, params_from_iter(values), player_from_row)
            .optional()
            .context("failed to query best ranked player")
    }

    async fn best_scored_player(
        &self,
        league_id: LeagueId,
        position: Option<&str>,
    ) -> Result<Option<Player>> {
        let mut sql = format!(
            "SELECT {PLAYER_COLUMNS} FROM players p
             WHERE p.id NOT IN (SELECT player_id FROM picks WHERE league_id = ?)"
        );
        let mut values = vec![Value::Integer(league_id)];
        if let Some(position) = position {
            sql.push_str(" AND p.position = ?");
            values.push(Value::Text(position.to_ascii_uppercase()));
        }
        sql.push_str(" ORDER BY p.score DESC, p.name ASC LIMIT 1");

        let conn = self.conn();
        conn.query_row(&sql, params_from_iter(values), player_from_row)
            .optional()
            .context("failed to query best scored player")
    }

    async fn recalculate_adp(&self, format: LeagueFormat, season: i32) -> Result<usize> {
        let conn = self.conn();
        let ranked = conn
            .execute(
                "INSERT INTO player_adp (player_id, format, season, adp)
                 SELECT pk.player_id, ?1, ?2, AVG(pk.overall_pick)
                 FROM picks pk JOIN leagues l ON l.id = pk.league_id
                 WHERE l.status = 'completed' AND l.format = ?1 AND l.season = ?2
                 GROUP BY pk.player_id
                 ON CONFLICT(player_id, format, season) DO UPDATE SET adp = excluded.adp",
                params![format.as_str(), season],
            )
            .context("failed to recalculate ADP")?;
        Ok(ranked)
    }

    async fn matchups(&self, league_id: LeagueId) -> Result<Vec<Matchup>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT league_id, week, team_a, team_b FROM matchups
                 WHERE league_id = ?1 ORDER BY week, rowid",
            )
            .context("failed to prepare matchups query")?;
        let matchups = stmt
            .query_map(params![league_id], |row| {
                Ok(Matchup {
                    league_id: row.get(0)?,
                    week: row.get(1)?,
                    team_a: row.get(2)?,
                    team_b: row.get(3)?,
                })
            })
            .context("failed to query matchups")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map matchup rows")?;
        Ok(matchups)
    }

    async fn replace_matchups(&self, league_id: LeagueId, matchups: &[Matchup]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM matchups WHERE league_id = ?1", params![league_id])
            .context("failed to delete matchups")?;
        for m in matchups {
            tx.execute(
                "INSERT INTO matchups (league_id, week, team_a, team_b) VALUES (?1, ?2, ?3, ?4)",
                params![league_id, m.week, m.team_a, m.team_b],
            )
            .context("failed to insert matchup")?;
        }
        tx.commit().context("failed to commit matchups")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn new_league(slots: &[&str]) -> NewLeague {
        NewLeague {
            name: "Test League".to_string(),
            seconds_per_pick: 90,
            roster_slots: slots.iter().map(|s| s.to_string()).collect(),
            format: LeagueFormat::Redraft,
            max_roster_size: None,
            scoring: ScoringType::HeadToHead,
            season: 2026,
            season_weeks: 20,
        }
    }

    fn player(name: &str, position: &str, level: &str, score: f64) -> PlayerRecord {
        PlayerRecord {
            name: name.to_string(),
            team: "SEA".to_string(),
            position: position.to_string(),
            level: level.to_string(),
            score,
        }
    }

    /// Helper: league with two teams and a handful of players.
    fn seeded() -> (Database, LeagueId, TeamId, TeamId) {
        let db = test_db();
        let league = db.create_league(&new_league(&["C", "OF"])).unwrap();
        let t1 = db.add_team(league, "Vorticists", 1, false).unwrap();
        let t2 = db.add_team(league, "Mudcats", 2, true).unwrap();
        (db, league, t1, t2)
    }

    fn new_pick(league: LeagueId, team: TeamId, player: PlayerId, overall: u32) -> NewPick {
        NewPick {
            league_id: league,
            team_id: team,
            player_id: player,
            overall_pick: overall,
            round: 1,
            pick_in_round: overall,
        }
    }

    // ------------------------------------------------------------------
    // Schema / open
    // ------------------------------------------------------------------

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in ["leagues", "teams", "players", "player_adp", "picks", "matchups"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    // ------------------------------------------------------------------
    // Leagues and teams
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn league_round_trip() {
        let (db, league_id, _, _) = seeded();
        let league = db.league(league_id).await.unwrap().unwrap();
        assert_eq!(league.status, DraftStatus::Pending);
        assert_eq!(league.roster_slots, vec!["C", "OF"]);
        assert_eq!(league.team_count, 2);
        assert_eq!(league.format, LeagueFormat::Redraft);
        assert_eq!(league.scoring, ScoringType::HeadToHead);
        assert!(league.pick_started_at.is_none());

        assert!(db.league(league_id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_and_clock_persist() {
        let (db, league_id, _, _) = seeded();
        let started = Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap();
        db.set_draft_status(league_id, DraftStatus::Active, Some(started))
            .await
            .unwrap();

        let league = db.league(league_id).await.unwrap().unwrap();
        assert_eq!(league.status, DraftStatus::Active);
        assert_eq!(league.pick_started_at, Some(started));
        assert_eq!(db.active_league_ids().await.unwrap(), vec![league_id]);

        db.set_pick_started_at(league_id, None).await.unwrap();
        let league = db.league(league_id).await.unwrap().unwrap();
        assert!(league.pick_started_at.is_none());
    }

    #[tokio::test]
    async fn teams_ordered_by_draft_position() {
        let db = test_db();
        let league = db.create_league(&new_league(&["C"])).unwrap();
        let late = db.add_team(league, "Late", 3, false).unwrap();
        let early = db.add_team(league, "Early", 1, true).unwrap();
        let mid = db.add_team(league, "Mid", 2, false).unwrap();

        let ids: Vec<TeamId> = db.teams(league).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![early, mid, late]);
        assert!(db.teams(league).await.unwrap()[0].is_automated);
    }

    #[tokio::test]
    async fn set_draft_order_rewrites_positions() {
        let (db, league, t1, t2) = seeded();
        db.set_draft_order(league, &[t2, t1]).await.unwrap();
        let teams = db.teams(league).await.unwrap();
        assert_eq!(teams[0].id, t2);
        assert_eq!(teams[0].draft_position, 1);
        assert_eq!(teams[1].id, t1);
        assert_eq!(teams[1].draft_position, 2);
    }

    // ------------------------------------------------------------------
    // Picks
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn insert_and_load_picks() {
        let (db, league, t1, t2) = seeded();
        let catcher = db.upsert_player(&player("Cal Raleigh", "C", "MLB", 80.0)).unwrap();
        let fielder = db.upsert_player(&player("Julio Rodriguez", "cf", "MLB", 85.0)).unwrap();

        let first = db.insert_pick(&new_pick(league, t1, catcher, 1)).await.unwrap();
        assert!(matches!(first, InsertOutcome::Inserted(ref p) if p.overall_pick == 1));
        db.insert_pick(&new_pick(league, t2, fielder, 2)).await.unwrap();

        let picks = db.picks(league).await.unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].player_id, catcher);
        assert_eq!(picks[0].position, "C");
        assert_eq!(picks[1].position, "CF");
        assert!(picks[1].roster_slot.is_none());
    }

    #[tokio::test]
    async fn duplicate_overall_pick_is_reported_not_raised() {
        let (db, league, t1, t2) = seeded();
        let a = db.upsert_player(&player("A", "C", "MLB", 1.0)).unwrap();
        let b = db.upsert_player(&player("B", "C", "MLB", 1.0)).unwrap();

        db.insert_pick(&new_pick(league, t1, a, 1)).await.unwrap();
        let again = db.insert_pick(&new_pick(league, t2, b, 1)).await.unwrap();
        assert_eq!(again, InsertOutcome::Duplicate);
        assert_eq!(db.picks(league).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_player_is_reported_not_raised() {
        let (db, league, t1, t2) = seeded();
        let a = db.upsert_player(&player("A", "C", "MLB", 1.0)).unwrap();

        db.insert_pick(&new_pick(league, t1, a, 1)).await.unwrap();
        let again = db.insert_pick(&new_pick(league, t2, a, 2)).await.unwrap();
        assert_eq!(again, InsertOutcome::Duplicate);
    }

    #[tokio::test]
    async fn insert_pick_for_unknown_player_is_an_error() {
        let (db, league, t1, _) = seeded();
        assert!(db.insert_pick(&new_pick(league, t1, 999, 1)).await.is_err());
    }

    #[tokio::test]
    async fn roster_slot_persists() {
        let (db, league, t1, _) = seeded();
        let a = db.upsert_player(&player("A", "C", "MLB", 1.0)).unwrap();
        let InsertOutcome::Inserted(pick) = db.insert_pick(&new_pick(league, t1, a, 1)).await.unwrap() else {
            panic!("expected insert");
        };
        db.set_roster_slot(pick.id, 0).await.unwrap();
        assert_eq!(db.picks(league).await.unwrap()[0].roster_slot, Some(0));
    }

    // ------------------------------------------------------------------
    // Players and rankings
    // ------------------------------------------------------------------

    #[test]
    fn upsert_player_returns_same_id() {
        let db = test_db();
        let id1 = db.upsert_player(&player("Trea Turner", "SS", "MLB", 70.0)).unwrap();
        let id2 = db.upsert_player(&player("Trea Turner", "2B", "MLB", 72.0)).unwrap();
        assert_eq!(id1, id2);
    }

    #[tokio::test]
    async fn best_ranked_player_orders_by_adp_and_skips_drafted() {
        let (db, league, t1, _) = seeded();
        let top = db.upsert_player(&player("Top", "OF", "MLB", 10.0)).unwrap();
        let second = db.upsert_player(&player("Second", "LF", "MLB", 99.0)).unwrap();
        let pitcher = db.upsert_player(&player("Arm", "SP", "MLB", 99.0)).unwrap();
        db.set_adp(top, LeagueFormat::Redraft, 2026, 1.5).unwrap();
        db.set_adp(second, LeagueFormat::Redraft, 2026, 3.0).unwrap();
        db.set_adp(pitcher, LeagueFormat::Redraft, 2026, 0.5).unwrap();

        let positions = vec!["OF".to_string(), "LF".to_string()];
        let query = RankQuery {
            league_id: league,
            positions: &positions,
            format: LeagueFormat::Redraft,
            season: 2026,
            level: Some("MLB"),
        };
        assert_eq!(db.best_ranked_player(&query).await.unwrap().unwrap().id, top);

        db.insert_pick(&new_pick(league, t1, top, 1)).await.unwrap();
        assert_eq!(db.best_ranked_player(&query).await.unwrap().unwrap().id, second);

        let other_season = RankQuery { season: 2025, ..query.clone() };
        assert!(db.best_ranked_player(&other_season).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn best_ranked_player_level_filter() {
        let (db, league, _, _) = seeded();
        let prospect = db.upsert_player(&player("Prospect", "C", "AAA", 1.0)).unwrap();
        db.set_adp(prospect, LeagueFormat::Redraft, 2026, 2.0).unwrap();

        let positions = vec!["C".to_string()];
        let mut query = RankQuery {
            league_id: league,
            positions: &positions,
            format: LeagueFormat::Redraft,
            season: 2026,
            level: Some("MLB"),
        };
        assert!(db.best_ranked_player(&query).await.unwrap().is_none());
        query.level = None;
        assert_eq!(db.best_ranked_player(&query).await.unwrap().unwrap().id, prospect);
    }

    #[tokio::test]
    async fn best_scored_player_breaks_ties_by_name() {
        let (db, league, _, _) = seeded();
        db.upsert_player(&player("Zed", "C", "MLB", 50.0)).unwrap();
        let abe = db.upsert_player(&player("Abe", "C", "MLB", 50.0)).unwrap();
        let ace = db.upsert_player(&player("Ace", "SP", "MLB", 90.0)).unwrap();

        let best_c = db.best_scored_player(league, Some("C")).await.unwrap().unwrap();
        assert_eq!(best_c.id, abe);
        let best_any = db.best_scored_player(league, None).await.unwrap().unwrap();
        assert_eq!(best_any.id, ace);
        assert!(db.best_scored_player(league, Some("RP")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recalculate_adp_averages_completed_drafts() {
        let db = test_db();
        let p = db.upsert_player(&player("Star", "SS", "MLB", 90.0)).unwrap();
        let q = db.upsert_player(&player("Other", "SS", "MLB", 80.0)).unwrap();

        for (overall, status) in [(1, DraftStatus::Completed), (3, DraftStatus::Completed), (9, DraftStatus::Active)] {
            let league = db.create_league(&new_league(&["SS"])).unwrap();
            let team = db.add_team(league, "T", 1, false).unwrap();
            db.insert_pick(&new_pick(league, team, p, overall)).await.unwrap();
            db.set_draft_status(league, status, None).await.unwrap();
        }

        let ranked = db.recalculate_adp(LeagueFormat::Redraft, 2026).await.unwrap();
        assert_eq!(ranked, 1);
        assert_eq!(db.adp(p, LeagueFormat::Redraft, 2026).unwrap(), Some(2.0));
        assert_eq!(db.adp(q, LeagueFormat::Redraft, 2026).unwrap(), None);
        assert_eq!(db.adp(p, LeagueFormat::BestBall, 2026).unwrap(), None);
    }

    #[test]
    fn import_pool_links_rankings_by_name_and_team() {
        let db = test_db();
        let players = vec![player("Star", "SS", "MLB", 90.0)];
        let rankings = vec![
            AdpRecord {
                name: "Star".into(),
                team: "SEA".into(),
                format: LeagueFormat::Redraft,
                season: 2026,
                adp: 3.5,
            },
            AdpRecord {
                name: "Ghost".into(),
                team: "SEA".into(),
                format: LeagueFormat::Redraft,
                season: 2026,
                adp: 1.0,
            },
        ];
        assert_eq!(db.import_pool(&players, &rankings).unwrap(), (1, 1));
        let id = db.upsert_player(&players[0]).unwrap();
        assert_eq!(db.adp(id, LeagueFormat::Redraft, 2026).unwrap(), Some(3.5));
    }

    // ------------------------------------------------------------------
    // Matchups
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn replace_matchups_swaps_whole_schedule() {
        let (db, league, t1, t2) = seeded();
        let week = |w| Matchup { league_id: league, week: w, team_a: t1, team_b: t2 };
        db.replace_matchups(league, &[week(1), week(2), week(3)]).await.unwrap();
        assert_eq!(db.matchups(league).await.unwrap().len(), 3);

        db.replace_matchups(league, &[week(1)]).await.unwrap();
        assert_eq!(db.matchups(league).await.unwrap(), vec![week(1)]);
    }
}
