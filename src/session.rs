// 📋 Session State Tracker - guesses, attempts, hint eligibility
//
// State machine for one game day (or one infinite round):
//
//   Idle (0 guesses)
//     → Guessing (1..threshold-1, hint locked)
//     → HintUnlocked (>= threshold)
//     → Won (guessed the secret, terminal)
//
// Without a win, guesses keep being accepted until the cap.
//
// Persisted values are untrusted on the way back in: anything with the wrong
// shape or out of range is dropped and replaced by its default. A storage
// failure is logged and play continues on the in-memory state.

use crate::config::GameConfig;
use crate::entities::Cat;
use crate::parser::sanitize_input;
use crate::storage::Storage;
use crate::temporal::DayKey;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Key namespace of the daily game
pub const DAILY_NAMESPACE: &str = "";

/// Key namespace of infinite mode, untouched by daily rollover
pub const INFINITE_NAMESPACE: &str = "infinite_";

const KEY_SELECTED: &str = "selectedCats";
const KEY_ATTEMPTS: &str = "attempts";
const KEY_HINT: &str = "hintAvailable";
const KEY_GAME_DAY: &str = "game_day";
const KEY_ANSWER: &str = "answer";

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Idle,
    Guessing,
    HintUnlocked,
    Won,
}

impl GamePhase {
    pub fn as_str(&self) -> &str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Guessing => "guessing",
            GamePhase::HintUnlocked => "hint_unlocked",
            GamePhase::Won => "won",
        }
    }
}

/// Result of submitting one guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuessOutcome {
    Correct,
    Incorrect,

    /// Name already guessed; nothing changed
    Duplicate,

    /// Round already won or out of guesses; nothing changed
    Closed,
}

impl GuessOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, GuessOutcome::Correct)
    }

    /// Did this guess change the session?
    pub fn was_recorded(&self) -> bool {
        matches!(self, GuessOutcome::Correct | GuessOutcome::Incorrect)
    }
}

/// Snapshot of one session's progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub selected_names: Vec<String>,
    pub attempts: u32,
    pub hint_available: bool,
}

// ============================================================================
// SESSION TRACKER
// ============================================================================

#[derive(Debug, Clone)]
pub struct SessionTracker {
    namespace: String,
    hint_threshold: u32,
    max_guesses: u32,
    state: SessionState,
}

impl SessionTracker {
    pub fn new(namespace: impl Into<String>, hint_threshold: u32, max_guesses: u32) -> Self {
        SessionTracker {
            namespace: namespace.into(),
            hint_threshold,
            max_guesses,
            state: SessionState::default(),
        }
    }

    pub fn daily(config: &GameConfig) -> Self {
        Self::new(DAILY_NAMESPACE, config.hint_threshold, config.max_guesses)
    }

    pub fn infinite(config: &GameConfig) -> Self {
        Self::new(INFINITE_NAMESPACE, config.hint_threshold, config.max_guesses)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn selected_names(&self) -> &[String] {
        &self.state.selected_names
    }

    pub fn attempts(&self) -> u32 {
        self.state.attempts
    }

    pub fn hint_available(&self) -> bool {
        self.state.hint_available
    }

    pub fn max_guesses(&self) -> u32 {
        self.max_guesses
    }

    pub fn has_guessed(&self, name: &str) -> bool {
        self.state.selected_names.iter().any(|n| n == name)
    }

    pub fn is_won(&self, secret: &Cat) -> bool {
        self.has_guessed(&secret.name)
    }

    pub fn is_closed(&self, secret: &Cat) -> bool {
        self.is_won(secret) || self.state.attempts >= self.max_guesses
    }

    pub fn phase(&self, secret: &Cat) -> GamePhase {
        if self.is_won(secret) {
            GamePhase::Won
        } else if self.state.hint_available {
            GamePhase::HintUnlocked
        } else if self.state.attempts == 0 {
            GamePhase::Idle
        } else {
            GamePhase::Guessing
        }
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Record a guess against the secret and persist the new state
    pub fn record_guess(
        &mut self,
        storage: &mut dyn Storage,
        guess: &Cat,
        secret: &Cat,
    ) -> GuessOutcome {
        if self.is_closed(secret) {
            return GuessOutcome::Closed;
        }

        let name = sanitize_input(&guess.name);
        if self.has_guessed(&name) {
            tracing::debug!("Ignoring duplicate guess: {}", name);
            return GuessOutcome::Duplicate;
        }

        self.state.selected_names.push(name);
        self.state.attempts += 1;
        if self.state.attempts >= self.hint_threshold {
            self.state.hint_available = true;
        }
        self.persist(storage);

        if guess.name == secret.name {
            GuessOutcome::Correct
        } else {
            GuessOutcome::Incorrect
        }
    }

    /// Clear progress in memory and in storage
    pub fn reset(&mut self, storage: &mut dyn Storage) {
        self.state = SessionState::default();
        for key in [KEY_SELECTED, KEY_ATTEMPTS, KEY_HINT] {
            let key = self.key(key);
            if let Err(e) = storage.remove(&key) {
                tracing::warn!("Failed to remove {}: {}", key, e);
            }
        }
    }

    /// The secret's hint payload, only once unlocked
    pub fn hint(&self, secret: &Cat) -> Option<String> {
        if self.state.hint_available {
            Some(secret.source.clone())
        } else {
            None
        }
    }

    /// Compare the persisted day marker with `today`; on mismatch wipe this
    /// namespace's progress and store the new marker. Returns true when a
    /// wipe happened.
    pub fn check_rollover(&mut self, storage: &mut dyn Storage, today: DayKey, ttl: Duration) -> bool {
        let key = self.key(KEY_GAME_DAY);
        let last_day = match storage.get(&key) {
            Ok(value) => value.and_then(|v| v.as_str().and_then(|s| s.parse::<DayKey>().ok())),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                None
            }
        };

        if last_day == Some(today) {
            return false;
        }

        match last_day {
            Some(last) => tracing::info!("Game day rolled over: {} → {}", last, today),
            None => tracing::debug!("No known game day, starting {}", today),
        }

        self.reset(storage);
        if let Err(e) = storage.set(&key, json!(today.to_string()), Some(ttl)) {
            tracing::warn!("Failed to store {}: {}", key, e);
        }
        true
    }

    /// Restore progress from storage, discarding anything malformed
    pub fn load(&mut self, storage: &mut dyn Storage) {
        let selected = self.read(storage, KEY_SELECTED);
        let attempts = self.read(storage, KEY_ATTEMPTS);
        let hint = self.read(storage, KEY_HINT);

        let selected_names = self.validate_names(selected);
        let mut attempts = self.validate_attempts(attempts);
        let mut hint_available = match hint {
            None => false,
            Some(Value::Bool(b)) => b,
            Some(other) => {
                tracing::warn!("Discarding malformed hint flag: {}", other);
                false
            }
        };

        let guessed = selected_names.len() as u32;
        if attempts < guessed {
            attempts = guessed;
        }
        if attempts >= self.hint_threshold {
            hint_available = true;
        }

        self.state = SessionState {
            selected_names,
            attempts,
            hint_available,
        };
    }

    /// Persisted answer name (infinite rounds)
    pub fn stored_answer(&self, storage: &mut dyn Storage) -> Option<String> {
        self.read(storage, KEY_ANSWER)
            .and_then(|v| v.as_str().map(sanitize_input))
            .filter(|name| !name.is_empty())
    }

    pub fn store_answer(&self, storage: &mut dyn Storage, name: &str) {
        let key = self.key(KEY_ANSWER);
        if let Err(e) = storage.set(&key, json!(name), None) {
            tracing::warn!("Failed to store {}: {}", key, e);
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.namespace, name)
    }

    fn read(&self, storage: &mut dyn Storage, name: &str) -> Option<Value> {
        let key = self.key(name);
        match storage.get(&key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn persist(&self, storage: &mut dyn Storage) {
        let writes = [
            (KEY_SELECTED, json!(self.state.selected_names)),
            (KEY_ATTEMPTS, json!(self.state.attempts)),
            (KEY_HINT, json!(self.state.hint_available)),
        ];
        for (name, value) in writes {
            let key = self.key(name);
            if let Err(e) = storage.set(&key, value, None) {
                tracing::warn!("Failed to persist {}: {}", key, e);
            }
        }
    }

    fn validate_names(&self, value: Option<Value>) -> Vec<String> {
        let items = match value {
            None => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                tracing::warn!("Discarding malformed guess list: {}", other);
                return Vec::new();
            }
        };

        let mut names: Vec<String> = Vec::new();
        for name in items.iter().filter_map(Value::as_str).map(sanitize_input) {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names.truncate(self.max_guesses as usize);
        names
    }

    /// Accepts a number or a numeric string
    fn validate_attempts(&self, value: Option<Value>) -> u32 {
        let count = match &value {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        match count {
            Some(n) if n <= self.max_guesses as u64 => n as u32,
            _ => {
                if let Some(other) = value {
                    tracing::warn!("Discarding malformed attempt count: {}", other);
                }
                0
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
