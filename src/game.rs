// 🎮 Game - the core surface the presentation layer talks to
//
// Wires the day clock, the catalog, the answer selector, the session tracker
// and persistence into one object. Two modes:
//
//   Daily     → one shared answer per game day, state keyed by day
//   Infinite  → a fresh random answer per round, independent state
//
// Every call is synchronous and runs to completion. Nothing here fails:
// anomalies are logged and the game degrades to a fresh state.

use crate::comparison::{compare, AttributeVerdict};
use crate::config::{GameConfig, SelectionMode};
use crate::entities::{Cat, CatRegistry};
use crate::error::Result;
use crate::parser::{load_answer_table, load_catalog};
use crate::selector::{AnswerSelector, SelectionContext};
use crate::session::{GamePhase, GuessOutcome, SessionTracker};
use crate::storage::{SqliteStorage, Storage};
use crate::temporal::{DayClock, DayKey, SharedClock, SystemClock};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Daily,
    Infinite,
}

impl GameMode {
    pub fn as_str(&self) -> &str {
        match self {
            GameMode::Daily => "daily",
            GameMode::Infinite => "infinite",
        }
    }
}

/// One guessed cat with its verdict row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessFeedback {
    pub cat: Cat,
    pub verdicts: Vec<AttributeVerdict>,
    pub correct: bool,
}

/// Progress at a glance; the answer is revealed once the round is over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub phase: GamePhase,
    pub attempts: u32,
    pub max_guesses: u32,
    pub answer: Option<String>,
}

/// Result of submitting a guess by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessReport {
    pub outcome: GuessOutcome,

    /// Present when the guess was recorded
    pub feedback: Option<GuessFeedback>,
}

// ============================================================================
// GAME
// ============================================================================

pub struct Game {
    config: GameConfig,
    day_clock: DayClock,
    catalog: CatRegistry,
    daily_selector: AnswerSelector,
    random_selector: AnswerSelector,
    storage: Box<dyn Storage>,
    mode: GameMode,
    session: SessionTracker,

    /// Day the current state belongs to
    day_key: DayKey,
    secret: Cat,
    history: Vec<GuessFeedback>,
}

impl Game {
    pub fn new(
        config: GameConfig,
        clock: SharedClock,
        catalog: CatRegistry,
        daily_selector: AnswerSelector,
        storage: Box<dyn Storage>,
        mode: GameMode,
    ) -> Self {
        let day_clock = DayClock::new(clock, config.reset_hour_utc, config.launch);
        let session = match mode {
            GameMode::Daily => SessionTracker::daily(&config),
            GameMode::Infinite => SessionTracker::infinite(&config),
        };
        let day_key = day_clock.current_day_key();

        let mut game = Game {
            config,
            day_clock,
            catalog,
            daily_selector,
            random_selector: AnswerSelector::random(),
            storage,
            mode,
            session,
            day_key,
            secret: Cat::placeholder(),
            history: Vec::new(),
        };
        game.initialize();
        game
    }

    /// Production wiring: wall clock, catalog and answer table from disk,
    /// SQLite persistence at the configured path
    pub fn open(config: GameConfig, mode: GameMode) -> Result<Self> {
        let clock: SharedClock = Arc::new(SystemClock);
        let catalog = load_catalog(&config.catalog_path);

        let answers = match config.selection {
            SelectionMode::Indexed => match load_answer_table(&config.answers_path) {
                Ok(answers) => answers,
                Err(e) => {
                    tracing::warn!(
                        "Could not read answer table {}: {}",
                        config.answers_path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            SelectionMode::Seeded => Vec::new(),
        };
        let selector = AnswerSelector::from_config(&config, answers);

        let storage = SqliteStorage::open(
            &config.database_path,
            config.storage_prefix.clone(),
            clock.clone(),
        )?;

        Ok(Self::new(config, clock, catalog, selector, Box::new(storage), mode))
    }

    fn initialize(&mut self) {
        match self.mode {
            GameMode::Daily => self.start_day(),
            GameMode::Infinite => self.restore_round(),
        }
    }

    /// Load today's answer and state, wiping stale state from another day
    fn start_day(&mut self) {
        self.day_key = self.day_clock.current_day_key();
        self.session.check_rollover(
            self.storage.as_mut(),
            self.day_key,
            self.config.day_key_ttl(),
        );
        self.session.load(self.storage.as_mut());
        self.secret = self.daily_selector.select(&self.today(), &self.catalog);
        self.rebuild_history();

        tracing::debug!(
            "Day {} ready ({} attempts so far)",
            self.day_key,
            self.session.attempts()
        );
    }

    /// Restore the stored infinite round, or start one
    fn restore_round(&mut self) {
        self.session.load(self.storage.as_mut());

        let stored = self
            .session
            .stored_answer(self.storage.as_mut())
            .and_then(|name| self.catalog.find_by_name(&name).cloned());

        match stored {
            Some(secret) => {
                self.secret = secret;
                self.rebuild_history();
            }
            None => {
                self.new_round();
            }
        }
    }

    fn today(&self) -> SelectionContext {
        SelectionContext::new(self.day_key, self.day_clock.days_since_launch())
    }

    /// Recompute the verdict rows for the persisted guess names
    fn rebuild_history(&mut self) {
        self.history = self
            .session
            .selected_names()
            .iter()
            .filter_map(|name| match self.catalog.find_by_name(name) {
                Some(cat) => Some(feedback_for(cat, &self.secret)),
                None => {
                    tracing::warn!("Guessed cat no longer in catalog: {}", name);
                    None
                }
            })
            .collect();
    }

    /// Roll over to the new day if the reset boundary passed.
    ///
    /// Queries take `&self` and report the day the state belongs to, so
    /// long-lived holders call this before reading.
    pub fn refresh(&mut self) -> bool {
        if self.mode == GameMode::Daily && self.day_clock.current_day_key() != self.day_key {
            self.rollover();
            return true;
        }
        false
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn day_clock(&self) -> &DayClock {
        &self.day_clock
    }

    pub fn all_entities(&self) -> &[Cat] {
        self.catalog.all()
    }

    pub fn catalog(&self) -> &CatRegistry {
        &self.catalog
    }

    pub fn selected_names(&self) -> &[String] {
        self.session.selected_names()
    }

    pub fn current_secret(&self) -> &Cat {
        &self.secret
    }

    pub fn attempts(&self) -> u32 {
        self.session.attempts()
    }

    pub fn hint_available(&self) -> bool {
        self.session.hint_available()
    }

    pub fn guesses_left(&self) -> u32 {
        self.session.max_guesses().saturating_sub(self.session.attempts())
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase(&self.secret)
    }

    pub fn is_won(&self) -> bool {
        self.session.is_won(&self.secret)
    }

    pub fn is_over(&self) -> bool {
        self.session.is_closed(&self.secret)
    }

    /// Verdict rows in guess order
    pub fn history(&self) -> &[GuessFeedback] {
        &self.history
    }

    pub fn hint(&self) -> Option<String> {
        self.session.hint(&self.secret)
    }

    /// Game day the current state belongs to
    pub fn day_key(&self) -> DayKey {
        self.day_key
    }

    pub fn time_until_reset(&self) -> Duration {
        self.day_clock.time_until_next_reset()
    }

    /// Previous game day's answer, the placeholder before launch
    pub fn yesterdays_answer(&self) -> Cat {
        let today = SelectionContext::new(
            self.day_clock.current_day_key(),
            self.day_clock.days_since_launch(),
        );
        if today.day_index <= 0 {
            return Cat::placeholder();
        }
        self.daily_selector.select(&today.previous(), &self.catalog)
    }

    /// Name search that hides already-guessed cats
    pub fn search(&self, query: &str) -> Vec<&Cat> {
        self.catalog.search(query, self.session.selected_names())
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            phase: self.phase(),
            attempts: self.attempts(),
            max_guesses: self.session.max_guesses(),
            answer: if self.is_over() {
                Some(self.secret.name.clone())
            } else {
                None
            },
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Record a guess and return whether it named the secret
    pub fn record_guess(&mut self, guess: &Cat) -> GuessOutcome {
        self.refresh();

        let outcome = self
            .session
            .record_guess(self.storage.as_mut(), guess, &self.secret);
        if outcome.was_recorded() {
            self.history.push(feedback_for(guess, &self.secret));
        }
        outcome
    }

    /// Look a name up in the catalog and guess it, None for unknown names
    pub fn guess_by_name(&mut self, name: &str) -> Option<GuessReport> {
        let cat = self.catalog.find_by_name(name.trim())?.clone();
        let outcome = self.record_guess(&cat);
        let feedback = if outcome.was_recorded() {
            self.history.last().cloned()
        } else {
            None
        };
        Some(GuessReport { outcome, feedback })
    }

    pub fn reset(&mut self) {
        self.refresh();
        self.session.reset(self.storage.as_mut());
        self.history.clear();
        tracing::info!("{} progress reset", self.mode.as_str());
    }

    /// Start a fresh infinite round; no effect in daily mode
    pub fn new_round(&mut self) -> bool {
        if self.mode != GameMode::Infinite {
            tracing::warn!("new_round requested in daily mode, ignoring");
            return false;
        }

        self.session.reset(self.storage.as_mut());
        self.history.clear();
        self.secret = self.random_selector.select(&self.today(), &self.catalog);
        self.session.store_answer(self.storage.as_mut(), &self.secret.name);
        tracing::debug!("New infinite round started");
        true
    }

    /// Reload for the current day; called when the countdown expires
    pub fn rollover(&mut self) {
        match self.mode {
            GameMode::Daily => self.start_day(),
            GameMode::Infinite => {}
        }
    }
}

fn feedback_for(guess: &Cat, secret: &Cat) -> GuessFeedback {
    GuessFeedback {
        cat: guess.clone(),
        verdicts: compare(guess, secret),
        correct: guess.name == secret.name,
    }
}

// ============================================================================
// TESTS
// ============================================================================
