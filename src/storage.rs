// 💾 Persistence - flat key-value cache with TTL
//
// Every entry carries its write time and an optional TTL. An expired entry
// reads as absent and is removed on that read. Keys are namespaced under a
// fixed prefix so `clear_all` only touches this game's entries.
//
// Concurrent writers (two tabs, two processes on one database) are
// last-write-wins. There is no locking.

use crate::error::Result;
use crate::temporal::SharedClock;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// STORAGE CONTRACT
// ============================================================================

pub trait Storage: Send {
    /// Value under `key`, None when missing, expired, or unreadable
    fn get(&mut self, key: &str) -> Result<Option<Value>>;

    fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// Remove every entry under this store's prefix
    fn clear_all(&mut self) -> Result<()>;
}

// ============================================================================
// STORED ITEM
// ============================================================================

/// On-disk envelope for one value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub value: Value,

    /// Write time, epoch milliseconds
    pub timestamp: i64,

    /// Lifetime in milliseconds, None = forever
    pub ttl: Option<i64>,
}

impl StoredItem {
    pub fn new(value: Value, written_at: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        StoredItem {
            value,
            timestamp: written_at.timestamp_millis(),
            ttl: ttl.map(|d| d.num_milliseconds()),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now.timestamp_millis() - self.timestamp > ttl,
            None => false,
        }
    }
}

// ============================================================================
// IN-MEMORY STORAGE
// ============================================================================

/// Process-local store holding JSON-encoded envelopes, the same bytes a
/// durable store would hold
pub struct MemoryStorage {
    prefix: String,
    clock: SharedClock,
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new(prefix: impl Into<String>, clock: SharedClock) -> Self {
        MemoryStorage {
            prefix: prefix.into(),
            clock,
            entries: HashMap::new(),
        }
    }

    /// Write raw bytes under a key, bypassing the envelope
    pub fn insert_raw(&mut self, key: &str, raw: impl Into<String>) {
        self.entries.insert(self.full_key(key), raw.into());
    }

    /// Raw bytes stored under a key
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(&self.full_key(key)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl Storage for MemoryStorage {
    fn get(&mut self, key: &str) -> Result<Option<Value>> {
        let full_key = self.full_key(key);
        let raw = match self.entries.get(&full_key) {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match decode_item(key, raw, self.clock.now()) {
            Some(value) => Ok(Some(value)),
            None => {
                self.entries.remove(&full_key);
                Ok(None)
            }
        }
    }

    fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let item = StoredItem::new(value, self.clock.now(), ttl);
        let raw = serde_json::to_string(&item)?;
        self.entries.insert(self.full_key(key), raw);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(&self.full_key(key));
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        let prefix = self.prefix.clone();
        self.entries.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }
}

// ============================================================================
// SQLITE STORAGE
// ============================================================================

pub struct SqliteStorage {
    prefix: String,
    clock: SharedClock,
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) a database file
    pub fn open(path: &Path, prefix: impl Into<String>, clock: SharedClock) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, prefix, clock)
    }

    pub fn in_memory(prefix: impl Into<String>, clock: SharedClock) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, prefix, clock)
    }

    pub fn with_connection(
        conn: Connection,
        prefix: impl Into<String>,
        clock: SharedClock,
    ) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStorage {
            prefix: prefix.into(),
            clock,
            conn,
        })
    }

    /// Write raw bytes under a key, bypassing the envelope
    pub fn insert_raw(&mut self, key: &str, raw: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, item) VALUES (?1, ?2)",
            params![self.full_key(key), raw],
        )?;
        Ok(())
    }

    /// Count entries under this store's prefix
    pub fn count(&self) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM kv_store WHERE substr(key, 1, ?2) = ?1",
            params![self.prefix, self.prefix.chars().count() as i64],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL keeps reads going while another process writes; in-memory
    // databases silently stay in "memory" mode
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            item TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl Storage for SqliteStorage {
    fn get(&mut self, key: &str) -> Result<Option<Value>> {
        let full_key = self.full_key(key);
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT item FROM kv_store WHERE key = ?1",
                params![full_key],
                |row| row.get(0),
            )
            .optional()?;

        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match decode_item(key, &raw, self.clock.now()) {
            Some(value) => Ok(Some(value)),
            None => {
                self.conn
                    .execute("DELETE FROM kv_store WHERE key = ?1", params![full_key])?;
                Ok(None)
            }
        }
    }

    fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let item = StoredItem::new(value, self.clock.now(), ttl);
        let raw = serde_json::to_string(&item)?;
        self.conn.execute(
            "INSERT INTO kv_store (key, item) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET item = excluded.item, updated_at = CURRENT_TIMESTAMP",
            params![self.full_key(key), raw],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![self.full_key(key)])?;
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.conn.execute(
            "DELETE FROM kv_store WHERE substr(key, 1, ?2) = ?1",
            params![self.prefix, self.prefix.chars().count() as i64],
        )?;
        Ok(())
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Unwrap an envelope; None (and a diagnostic) when malformed or expired
fn decode_item(key: &str, raw: &str, now: DateTime<Utc>) -> Option<Value> {
    let item: StoredItem = match serde_json::from_str(raw) {
        Ok(item) => item,
        Err(e) => {
            tracing::warn!("Discarding unreadable stored value for {}: {}", key, e);
            return None;
        }
    };

    if item.is_expired(now) {
        tracing::debug!("Stored value for {} expired", key);
        return None;
    }

    Some(item.value)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::FixedClock;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn clock() -> Arc<FixedClock> {
        FixedClock::shared(Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap())
    }

    fn exercise_contract(store: &mut dyn Storage, clock: &FixedClock) {
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("attempts", json!(3), None).unwrap();
        assert_eq!(store.get("attempts").unwrap(), Some(json!(3)));

        store.set("attempts", json!(4), None).unwrap();
        assert_eq!(store.get("attempts").unwrap(), Some(json!(4)));

        store.set("game_day", json!("2026-02-01"), Some(Duration::hours(25))).unwrap();
        clock.advance(Duration::hours(24));
        assert_eq!(store.get("game_day").unwrap(), Some(json!("2026-02-01")));
        clock.advance(Duration::hours(2));
        assert_eq!(store.get("game_day").unwrap(), None);

        store.remove("attempts").unwrap();
        assert_eq!(store.get("attempts").unwrap(), None);

        store.set("a", json!(["x"]), None).unwrap();
        store.set("b", json!(true), None).unwrap();
        store.clear_all().unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn test_stored_item_expiry() {
        let written = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        let item = StoredItem::new(json!(1), written, Some(Duration::seconds(10)));

        assert!(!item.is_expired(written + Duration::seconds(10)));
        assert!(item.is_expired(written + Duration::seconds(11)));

        let forever = StoredItem::new(json!(1), written, None);
        assert!(!forever.is_expired(written + Duration::days(3650)));
    }

    #[test]
    fn test_memory_storage_contract() {
        let clock = clock();
        let mut store = MemoryStorage::new("catdle_", clock.clone());
        exercise_contract(&mut store, &clock);
    }

    #[test]
    fn test_sqlite_storage_contract() {
        let clock = clock();
        let mut store = SqliteStorage::in_memory("catdle_", clock.clone()).unwrap();
        exercise_contract(&mut store, &clock);
    }

    #[test]
    fn test_memory_storage_uses_prefix() {
        let mut store = MemoryStorage::new("catdle_", clock());
        store.set("attempts", json!(2), None).unwrap();

        let raw = store.raw("attempts").unwrap();
        let item: StoredItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.value, json!(2));
        assert_eq!(item.ttl, None);
    }

    #[test]
    fn test_memory_storage_discards_malformed_json() {
        let mut store = MemoryStorage::new("catdle_", clock());
        store.insert_raw("selectedCats", "{not json");

        assert_eq!(store.get("selectedCats").unwrap(), None);
        assert!(store.raw("selectedCats").is_none());
    }

    #[test]
    fn test_sqlite_storage_discards_malformed_json() {
        let mut store = SqliteStorage::in_memory("catdle_", clock()).unwrap();
        store.insert_raw("attempts", "[1, 2").unwrap();

        assert_eq!(store.get("attempts").unwrap(), None);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_sqlite_clear_all_keeps_other_namespaces() {
        let clock = clock();
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn.execute(
            "INSERT INTO kv_store (key, item) VALUES ('other_key', '{}')",
            [],
        )
        .unwrap();

        let mut store = SqliteStorage::with_connection(conn, "catdle_", clock).unwrap();
        store.set("attempts", json!(1), None).unwrap();
        assert_eq!(store.count().unwrap(), 1);

        store.clear_all().unwrap();
        assert_eq!(store.count().unwrap(), 0);

        let others: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(others, 1);
    }
}
