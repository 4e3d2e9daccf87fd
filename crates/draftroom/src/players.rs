// Player pool and ADP loading from CSV.
//
// Pool CSV columns: Name, Team, POS, Level, Score
// ADP CSV columns:  Name, Team, Format, Season, ADP
// Extra columns are ignored. Malformed rows are skipped with a warning.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::draft::eligibility::STANDARD_POSITIONS;
use crate::draft::league::LeagueFormat;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A player row ready to upsert into the player pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub position: String,
    pub level: String,
    pub score: f64,
}

/// An ADP ranking for a player, keyed by name and team.
#[derive(Debug, Clone, PartialEq)]
pub struct AdpRecord {
    pub name: String,
    pub team: String,
    pub format: LeagueFormat,
    pub season: i32,
    pub adp: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawPlayer {
    Name: String,
    #[serde(default)]
    Team: String,
    POS: String,
    #[serde(default = "default_level")]
    Level: String,
    #[serde(default)]
    Score: f64,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

fn default_level() -> String {
    "MLB".to_string()
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawAdp {
    Name: String,
    #[serde(default)]
    Team: String,
    Format: String,
    Season: i32,
    ADP: f64,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayer>() {
        match result {
            Ok(raw) => {
                let position = raw.POS.trim().to_ascii_uppercase();
                if !STANDARD_POSITIONS.contains(&position.as_str()) {
                    warn!("skipping player '{}': unknown POS '{}'", raw.Name.trim(), raw.POS);
                    continue;
                }
                if !raw.Score.is_finite() {
                    warn!("skipping player '{}': non-finite score", raw.Name.trim());
                    continue;
                }
                players.push(PlayerRecord {
                    name: raw.Name.trim().to_string(),
                    team: raw.Team.trim().to_string(),
                    position,
                    level: raw.Level.trim().to_ascii_uppercase(),
                    score: raw.Score,
                });
            }
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
            }
        }
    }
    Ok(players)
}

fn load_adp_from_reader<R: Read>(rdr: R) -> Result<Vec<AdpRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut rankings = Vec::new();
    for result in reader.deserialize::<RawAdp>() {
        match result {
            Ok(raw) => {
                let Some(format) = LeagueFormat::parse(&raw.Format) else {
                    warn!("skipping ADP entry for '{}': unknown format '{}'", raw.Name.trim(), raw.Format);
                    continue;
                };
                if !raw.ADP.is_finite() || raw.ADP <= 0.0 {
                    warn!("skipping ADP entry for '{}': invalid value {}", raw.Name.trim(), raw.ADP);
                    continue;
                }
                rankings.push(AdpRecord {
                    name: raw.Name.trim().to_string(),
                    team: raw.Team.trim().to_string(),
                    format,
                    season: raw.Season,
                    adp: raw.ADP,
                });
            }
            Err(e) => {
                warn!("skipping malformed ADP row: {}", e);
            }
        }
    }
    Ok(rankings)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

pub fn load_players(path: &Path) -> Result<Vec<PlayerRecord>, ImportError> {
    let file = open(path)?;
    load_players_from_reader(file).map_err(|source| ImportError::Csv {
        path: path.display().to_string(),
        source,
    })
}

pub fn load_adp(path: &Path) -> Result<Vec<AdpRecord>, ImportError> {
    let file = open(path)?;
    load_adp_from_reader(file).map_err(|source| ImportError::Csv {
        path: path.display().to_string(),
        source,
    })
}

fn open(path: &Path) -> Result<std::fs::File, ImportError> {
    std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_player_pool() {
        let csv = "Name,Team,POS,Level,Score,Age\n\
                   Julio Rodriguez,SEA,cf,MLB,88.5,25\n\
                   Paul Skenes,PIT,SP,mlb,91.0,24\n";
        let players = load_players_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].position, "CF");
        assert_eq!(players[0].team, "SEA");
        assert_eq!(players[1].level, "MLB");
        assert_eq!(players[1].score, 91.0);
    }

    #[test]
    fn level_defaults_to_mlb() {
        let csv = "Name,Team,POS,Score\nSomeone,NYY,C,10\n";
        let players = load_players_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(players[0].level, "MLB");
    }

    #[test]
    fn skips_unknown_positions_and_bad_rows() {
        let csv = "Name,Team,POS,Level,Score\n\
                   Good Player,BOS,SS,MLB,50\n\
                   Mystery,BOS,XX,MLB,50\n\
                   Broken,BOS,C,MLB,not-a-number\n";
        let players = load_players_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Good Player");
    }

    #[test]
    fn parses_adp_rankings() {
        let csv = "Name,Team,Format,Season,ADP\n\
                   Paul Skenes,PIT,Redraft,2026,4.5\n\
                   Paul Skenes,PIT,Best Ball,2026,6.1\n\
                   Nobody,PIT,Auction,2026,1.0\n\
                   Zero,PIT,Redraft,2026,0\n";
        let rankings = load_adp_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[0].format, LeagueFormat::Redraft);
        assert_eq!(rankings[1].format, LeagueFormat::BestBall);
        assert_eq!(rankings[1].adp, 6.1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_players(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
