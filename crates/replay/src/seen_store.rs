//! SQLite-backed seen-set.
//!
//! Keys are cached in memory so `has` never touches the database. Writes go
//! through immediately; a failed write is logged and the key stays cached
//! for the rest of the process.

use chrono::Utc;
use opal_core::{Error, Result, SeenSet};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reported_bids (
    key         TEXT PRIMARY KEY,
    auction_id  TEXT NOT NULL,
    reported_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS reported_bids_auction ON reported_bids (auction_id);
";

fn storage_err(e: rusqlite::Error) -> Error {
    Error::storage(e.to_string())
}

/// Auction id of a seen-set key (`{auction_id}:{amount}:{bidder_name}`).
fn auction_of(key: &str) -> &str {
    let mut parts = key.rsplitn(3, ':');
    let _bidder = parts.next();
    let _amount = parts.next();
    parts.next().unwrap_or(key)
}

/// Seen-set persisted in SQLite.
pub struct SqliteSeenSet {
    conn: Connection,
    cache: HashSet<String>,
}

impl SqliteSeenSet {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::with_connection(conn)
    }

    /// In-memory database, for tests and dry runs.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(storage_err)?;
        let cache = {
            let mut stmt = conn
                .prepare("SELECT key FROM reported_bids")
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(storage_err)?;
            rows.collect::<rusqlite::Result<HashSet<String>>>()
                .map_err(storage_err)?
        };
        Ok(Self { conn, cache })
    }

    /// Number of reported keys.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Keys reported for one auction, oldest first.
    pub fn reported_for(&self, auction_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT key FROM reported_bids WHERE auction_id = ?1 \
                 ORDER BY reported_at, rowid",
            )
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![auction_id], |row| row.get::<_, String>(0))
            .map_err(storage_err)?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(storage_err)
    }

    /// Drop every key of one auction. Returns the number of rows removed.
    pub fn forget_auction(&mut self, auction_id: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM reported_bids WHERE auction_id = ?1",
                params![auction_id],
            )
            .map_err(storage_err)?;
        self.cache.retain(|key| auction_of(key) != auction_id);
        Ok(removed)
    }
}

impl SeenSet for SqliteSeenSet {
    fn has(&self, key: &str) -> bool {
        self.cache.contains(key)
    }

    fn add(&mut self, key: &str) {
        if !self.cache.insert(key.to_string()) {
            return;
        }
        let written = self.conn.execute(
            "INSERT OR IGNORE INTO reported_bids (key, auction_id, reported_at) \
             VALUES (?1, ?2, ?3)",
            params![key, auction_of(key), Utc::now().to_rfc3339()],
        );
        if let Err(e) = written {
            warn!(key, error = %e, "Failed to persist reported bid");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::seen_key;

    #[test]
    fn test_auction_of() {
        assert_eq!(auction_of("a1:45:John Smith"), "a1");
        assert_eq!(auction_of("group:post:9:12.5:Jane Doe"), "group:post:9");
        assert_eq!(auction_of("bare"), "bare");
    }

    #[test]
    fn test_add_and_has() {
        let mut seen = SqliteSeenSet::in_memory().unwrap();
        let key = seen_key("a1", 45.0, "John Smith");
        assert!(!seen.has(&key));

        seen.add(&key);
        seen.add(&key);
        assert!(seen.has(&key));
        assert_eq!(seen.len(), 1);
        assert_eq!(seen.reported_for("a1").unwrap(), vec![key]);
    }

    #[test]
    fn test_forget_auction() {
        let mut seen = SqliteSeenSet::in_memory().unwrap();
        seen.add(&seen_key("a1", 45.0, "John Smith"));
        seen.add(&seen_key("a1", 50.0, "Jane Doe"));
        seen.add(&seen_key("a10", 60.0, "Mary Jones"));

        assert_eq!(seen.forget_auction("a1").unwrap(), 2);
        assert!(!seen.has(&seen_key("a1", 45.0, "John Smith")));
        assert!(seen.has(&seen_key("a10", 60.0, "Mary Jones")));
        assert!(seen.reported_for("a1").unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let path = std::env::temp_dir().join(format!("opal-seen-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);

        {
            let mut seen = SqliteSeenSet::open(&path).unwrap();
            seen.add(&seen_key("a1", 380.0, "Jane Doe"));
        }

        let seen = SqliteSeenSet::open(&path).unwrap();
        assert!(seen.has("a1:380:Jane Doe"));
        assert_eq!(seen.len(), 1);

        drop(seen);
        let _ = std::fs::remove_file(&path);
    }
}
