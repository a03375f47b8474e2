//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per item
        CREATE TABLE items (
            id INTEGER PRIMARY KEY,           -- allocated from 1, never reused
            owner BLOB NOT NULL,              -- 32 bytes
            author BLOB NOT NULL,             -- 32 bytes
            created_at INTEGER NOT NULL,      -- Unix ms
            donation BLOB NOT NULL,           -- 16 bytes, big-endian u128
            fingerprint BLOB NOT NULL,        -- 32 bytes, Blake3 of content
            attachment TEXT,                  -- nullable external reference
            upvotes INTEGER NOT NULL DEFAULT 0
        );

        -- Explicit editors
        CREATE TABLE editors (
            item_id INTEGER NOT NULL REFERENCES items(id),
            account BLOB NOT NULL,
            PRIMARY KEY (item_id, account)
        );

        -- Voter sets, one row per (item, account)
        CREATE TABLE voters (
            item_id INTEGER NOT NULL REFERENCES items(id),
            account BLOB NOT NULL,
            PRIMARY KEY (item_id, account)
        );

        -- Vanity names, first claim wins
        CREATE TABLE names (
            name_hash BLOB PRIMARY KEY,       -- 32 bytes
            item_id INTEGER NOT NULL REFERENCES items(id)
        );

        -- Singleton allocator and treasury row
        CREATE TABLE counters (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            next_id INTEGER NOT NULL,
            total_donations BLOB NOT NULL,    -- 16 bytes, big-endian u128
            balance BLOB NOT NULL             -- 16 bytes, big-endian u128
        );

        INSERT INTO counters (id, next_id, total_donations, balance)
        VALUES (1, 1, zeroblob(16), zeroblob(16));

        CREATE INDEX idx_names_item ON names(item_id);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in ["items", "editors", "voters", "names", "counters", "schema_migrations"] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM counters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (99, 0)",
            [],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}
