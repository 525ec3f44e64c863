// ⚠️ Error Types - Everything that can go wrong below the play path
//
// None of these are fatal to a game session: callers on the play path log
// them and fall back to defaults. They surface only from loaders, storage
// setup, and configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    /// Persistence backend errors (SQLite)
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// JSON encoding/decoding errors (stored values, JSON catalogs)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV catalog / answer table errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system errors
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML configuration
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration that parsed but makes no sense
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Catalog source that could not be interpreted
    #[error("Catalog error: {0}")]
    Catalog(String),
}

pub type Result<T> = std::result::Result<T, GameError>;

impl GameError {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn catalog<S: Into<String>>(msg: S) -> Self {
        Self::Catalog(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GameError::invalid_config("reset_hour_utc must be < 24");
        assert_eq!(
            err.to_string(),
            "Invalid config: reset_hour_utc must be < 24"
        );
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: GameError = json_err.into();
        assert!(matches!(err, GameError::Json(_)));
    }
}
