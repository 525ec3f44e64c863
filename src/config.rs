// ⚙️ Game Configuration - policy constants as data
//
// The reset hour moves with daylight saving (17:00 UTC in winter, 16:00 UTC
// in summer), so it lives here and not in code.

use crate::error::{GameError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// SELECTION MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Day index → explicit answer table
    Indexed,

    /// Day key → hashed seed → catalog index, with repeat avoidance
    Seeded,
}

// ============================================================================
// GAME CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// UTC hour at which a new game day starts (0-23)
    pub reset_hour_utc: u32,

    /// First game day; day index 0 starts here
    pub launch: DateTime<Utc>,

    /// How the daily answer is chosen
    pub selection: SelectionMode,

    /// Previous days whose answers are excluded by the seeded strategy
    pub repeat_window_days: u32,

    /// Attempts needed before the hint unlocks
    pub hint_threshold: u32,

    /// Guess cap per day (one per compared attribute)
    pub max_guesses: u32,

    /// Wrap the indexed answer table instead of falling back to random
    pub wrap_answer_table: bool,

    /// Namespace prefix for every persisted key
    pub storage_prefix: String,

    /// Expiry of the persisted "last known day" marker
    pub day_key_ttl_hours: i64,

    pub catalog_path: PathBuf,
    pub answers_path: PathBuf,
    pub database_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            reset_hour_utc: 17,
            launch: default_launch(),
            selection: SelectionMode::Seeded,
            repeat_window_days: 7,
            hint_threshold: 5,
            max_guesses: 8,
            wrap_answer_table: false,
            storage_prefix: "catdle_".to_string(),
            day_key_ttl_hours: 25,
            catalog_path: PathBuf::from("data/cats.csv"),
            answers_path: PathBuf::from("data/answers.csv"),
            database_path: PathBuf::from("catdle.db"),
        }
    }
}

/// 2026-01-14 17:00:00 UTC
fn default_launch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_768_410_000, 0).single().unwrap_or_default()
}

impl GameConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: GameConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config, falling back to defaults when missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.reset_hour_utc >= 24 {
            return Err(GameError::invalid_config(format!(
                "reset_hour_utc must be < 24, got {}",
                self.reset_hour_utc
            )));
        }
        if self.max_guesses == 0 {
            return Err(GameError::invalid_config("max_guesses must be > 0"));
        }
        if self.day_key_ttl_hours <= 0 {
            return Err(GameError::invalid_config("day_key_ttl_hours must be > 0"));
        }
        Ok(())
    }

    pub fn day_key_ttl(&self) -> Duration {
        Duration::hours(self.day_key_ttl_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.reset_hour_utc, 17);
        assert_eq!(config.hint_threshold, 5);
        assert_eq!(config.max_guesses, 8);
        assert_eq!(config.repeat_window_days, 7);
        assert_eq!(config.selection, SelectionMode::Seeded);
        assert_eq!(config.launch, Utc.with_ymd_and_hms(2026, 1, 14, 17, 0, 0).unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GameConfig = toml::from_str(
            r#"
            reset_hour_utc = 16
            selection = "indexed"
            "#,
        )
        .unwrap();

        assert_eq!(config.reset_hour_utc, 16);
        assert_eq!(config.selection, SelectionMode::Indexed);
        assert_eq!(config.storage_prefix, "catdle_");
        assert_eq!(config.launch, GameConfig::default().launch);
    }

    #[test]
    fn test_launch_parses_rfc3339() {
        let config: GameConfig = toml::from_str(r#"launch = "2025-06-01T16:00:00Z""#).unwrap();
        assert_eq!(
            config.launch,
            Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_validate_rejects_bad_reset_hour() {
        let config = GameConfig {
            reset_hour_utc: 24,
            ..GameConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reset_hour_utc"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = GameConfig::load_or_default(Path::new("does/not/exist.toml"));
        assert_eq!(config.reset_hour_utc, 17);
    }
}
