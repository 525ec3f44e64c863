// Catdle - Core Library
// Exposes the game core for the terminal UI, the API server, and tests

pub mod error;
pub mod config;
pub mod temporal;    // Day Clock - reset-hour day keys, countdown math
pub mod entities;    // Cat records and the catalog registry
pub mod parser;      // Catalog normalization (CSV / JSON)
pub mod comparison;  // Per-attribute verdicts
pub mod selector;    // Daily answer strategies
pub mod storage;     // TTL key-value persistence
pub mod session;     // Guesses, attempts, hint eligibility
pub mod countdown;   // Cancelable reset countdown
pub mod game;        // Facade used by the binaries

// Re-export commonly used types
pub use error::{GameError, Result};
pub use config::{GameConfig, SelectionMode};
pub use temporal::{
    Clock, SharedClock, SystemClock, FixedClock,
    DayKey, DayClock, format_countdown,
};
pub use entities::{AnswerRef, Cat, CatRegistry, Form};
pub use parser::{
    CatalogParser, CatalogSource, RawCatRecord,
    detect_source, get_parser, load_catalog, load_answer_table, sanitize_input,
};
pub use comparison::{compare, Attribute, AttributeVerdict, Verdict, ATTRIBUTE_COUNT};
pub use selector::{
    AnswerSelector, AnswerStrategy, SelectionContext,
    IndexedStrategy, SeededStrategy, RandomStrategy,
};
pub use storage::{MemoryStorage, SqliteStorage, Storage, StoredItem};
pub use session::{GamePhase, GuessOutcome, SessionState, SessionTracker};
pub use countdown::{CancelHandle, Countdown, CountdownTick};
pub use game::{Game, GameMode, GameSummary, GuessFeedback, GuessReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
