// Configuration loading and parsing (draftroom.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// draftroom.toml structs
// ---------------------------------------------------------------------------

const CONFIG_FILE: &str = "draftroom.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub clock: ClockConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub players: PlayersConfig,
}

/// `[clock]`: timing of the background draft clock.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    pub poll_interval_ms: u64,
    pub auto_pick_stagger_ms: u64,
    pub max_chained_picks: u32,
}

impl ClockConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn auto_pick_stagger(&self) -> Duration {
        Duration::from_millis(self.auto_pick_stagger_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// `[players]`: optional CSV files imported at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayersConfig {
    #[serde(default)]
    pub pool_csv: Option<String>,
    #[serde(default)]
    pub adp_csv: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/draftroom.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` which does.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/draftroom.toml` to `config/` unless a config file is
/// already there. Returns the path written, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no config/{CONFIG_FILE} or defaults/{CONFIG_FILE} in {}",
                base_dir.display()
            ),
        });
    }

    let copy = || -> std::io::Result<()> {
        std::fs::create_dir_all(base_dir.join("config"))?;
        std::fs::copy(&source, &target)?;
        Ok(())
    };
    copy().map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", source.display()),
    })?;
    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Copies the default config file first if needed.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let clock = &config.clock;
    let clock_fields: &[(&str, u64)] = &[
        ("clock.poll_interval_ms", clock.poll_interval_ms),
        ("clock.max_chained_picks", u64::from(clock.max_chained_picks)),
    ];
    for (name, val) in clock_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if clock.auto_pick_stagger_ms >= clock.poll_interval_ms {
        return Err(ConfigError::ValidationError {
            field: "clock.auto_pick_stagger_ms".into(),
            message: format!(
                "must be shorter than clock.poll_interval_ms ({}), got {}",
                clock.poll_interval_ms, clock.auto_pick_stagger_ms
            ),
        });
    }

    if config.database.path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.players.adp_csv.is_some() && config.players.pool_csv.is_none() {
        return Err(ConfigError::ValidationError {
            field: "players.adp_csv".into(),
            message: "requires players.pool_csv".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
