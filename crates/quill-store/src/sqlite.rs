//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the Quill registry. It uses
//! rusqlite with bundled SQLite behind a mutex.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use quill_core::{AccountId, Amount, Fingerprint, ItemId, ItemRecord, NameHash};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Counters, Mutation, Store, WriteBatch};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file (and missing parent directories) and runs
    /// migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&conn)
    }

    /// Execute a blocking operation that needs mutable access.
    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&mut conn)
    }
}

// Helpers to convert column blobs into fixed-width values

fn blob32(row: &rusqlite::Row<'_>, idx: usize, name: &str) -> rusqlite::Result<[u8; 32]> {
    let bytes: Vec<u8> = row.get(idx)?;
    bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, name.into(), Type::Blob))
}

fn amount_column(row: &rusqlite::Row<'_>, idx: usize, name: &str) -> rusqlite::Result<Amount> {
    let bytes: Vec<u8> = row.get(idx)?;
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, name.into(), Type::Blob))?;
    Ok(Amount::from_be_bytes(arr))
}

fn item_id_column(row: &rusqlite::Row<'_>, idx: usize, name: &str) -> rusqlite::Result<ItemId> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw)
        .ok()
        .and_then(ItemId::new)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(idx, name.into(), Type::Integer))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRecord> {
    let upvotes: i64 = row.get(6)?;
    Ok(ItemRecord {
        owner: AccountId::from_bytes(blob32(row, 0, "owner")?),
        author: AccountId::from_bytes(blob32(row, 1, "author")?),
        created_at: row.get(2)?,
        donation: amount_column(row, 3, "donation")?,
        fingerprint: Fingerprint::from_bytes(blob32(row, 4, "fingerprint")?),
        attachment: row.get(5)?,
        upvotes: upvotes as u64,
    })
}

fn row_to_counters(row: &rusqlite::Row<'_>) -> rusqlite::Result<Counters> {
    Ok(Counters {
        next_id: item_id_column(row, 0, "next_id")?,
        total_donations: amount_column(row, 1, "total_donations")?,
        balance: amount_column(row, 2, "balance")?,
    })
}

fn load_counters(conn: &Connection) -> Result<Counters> {
    conn.query_row(
        "SELECT next_id, total_donations, balance FROM counters WHERE id = 1",
        [],
        row_to_counters,
    )
    .map_err(StoreError::from)
}

fn item_exists(tx: &Transaction<'_>, id: ItemId) -> Result<bool> {
    let exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1)",
        params![id.get() as i64],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn require_item(tx: &Transaction<'_>, id: ItemId) -> Result<()> {
    if item_exists(tx, id)? {
        Ok(())
    } else {
        Err(StoreError::NotFound(id.to_string()))
    }
}

/// Apply one item mutation inside an open transaction.
fn apply_mutation(tx: &Transaction<'_>, mutation: Mutation) -> Result<()> {
    match mutation {
        Mutation::InsertItem { id, record } => {
            if item_exists(tx, id)? {
                return Err(StoreError::Conflict(format!("item {} already exists", id)));
            }
            tx.execute(
                "INSERT INTO items (
                    id, owner, author, created_at, donation, fingerprint, attachment, upvotes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id.get() as i64,
                    record.owner.as_bytes().as_slice(),
                    record.author.as_bytes().as_slice(),
                    record.created_at,
                    record.donation.to_be_bytes().as_slice(),
                    record.fingerprint.as_bytes().as_slice(),
                    record.attachment,
                    record.upvotes as i64,
                ],
            )?;
        }
        Mutation::SetFingerprint { id, fingerprint } => {
            let changed = tx.execute(
                "UPDATE items SET fingerprint = ?2 WHERE id = ?1",
                params![id.get() as i64, fingerprint.as_bytes().as_slice()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        Mutation::SetAttachment { id, reference } => {
            let changed = tx.execute(
                "UPDATE items SET attachment = ?2 WHERE id = ?1",
                params![id.get() as i64, reference],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        Mutation::AddEditor { id, account } => {
            require_item(tx, id)?;
            tx.execute(
                "INSERT OR IGNORE INTO editors (item_id, account) VALUES (?1, ?2)",
                params![id.get() as i64, account.as_bytes().as_slice()],
            )?;
        }
        Mutation::RemoveEditor { id, account } => {
            require_item(tx, id)?;
            tx.execute(
                "DELETE FROM editors WHERE item_id = ?1 AND account = ?2",
                params![id.get() as i64, account.as_bytes().as_slice()],
            )?;
        }
        Mutation::ClaimName { name_hash, id } => {
            require_item(tx, id)?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO names (name_hash, item_id) VALUES (?1, ?2)",
                params![name_hash.as_bytes().as_slice(), id.get() as i64],
            )?;
            if inserted == 0 {
                return Err(StoreError::Conflict(format!(
                    "name {:?} already claimed",
                    name_hash
                )));
            }
        }
        Mutation::AddVoter { id, account } => {
            require_item(tx, id)?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO voters (item_id, account) VALUES (?1, ?2)",
                params![id.get() as i64, account.as_bytes().as_slice()],
            )?;
            if inserted == 0 {
                return Err(StoreError::Conflict(format!(
                    "{} already voted on {}",
                    account, id
                )));
            }
            tx.execute(
                "UPDATE items SET upvotes = upvotes + 1 WHERE id = ?1",
                params![id.get() as i64],
            )?;
        }
        Mutation::SetNextId(_)
        | Mutation::Receive(_)
        | Mutation::Debit(_)
        | Mutation::Refund(_) => {}
    }
    Ok(())
}

impl Store for SqliteStore {
    fn get_item(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT owner, author, created_at, donation, fingerprint, attachment, upvotes
                 FROM items WHERE id = ?1",
                params![id.get() as i64],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    fn has_item(&self, id: ItemId) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1)",
                params![id.get() as i64],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn is_editor(&self, id: ItemId, account: &AccountId) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM editors WHERE item_id = ?1 AND account = ?2)",
                params![id.get() as i64, account.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn editors(&self, id: ItemId) -> Result<Vec<AccountId>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT account FROM editors WHERE item_id = ?1 ORDER BY account")?;

            let editors = stmt
                .query_map(params![id.get() as i64], |row| {
                    Ok(AccountId::from_bytes(blob32(row, 0, "account")?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(editors)
        })
    }

    fn has_voted(&self, id: ItemId, account: &AccountId) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM voters WHERE item_id = ?1 AND account = ?2)",
                params![id.get() as i64, account.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    fn voter_count(&self, id: ItemId) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM voters WHERE item_id = ?1",
                params![id.get() as i64],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    fn resolve_name(&self, name_hash: &NameHash) -> Result<Option<ItemId>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT item_id FROM names WHERE name_hash = ?1",
                params![name_hash.as_bytes().as_slice()],
                |row| item_id_column(row, 0, "item_id"),
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    fn counters(&self) -> Result<Counters> {
        self.with_conn(load_counters)
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut counters = load_counters(&tx)?;
            let before = counters;

            for mutation in batch {
                counters.apply(&mutation)?;
                apply_mutation(&tx, mutation)?;
            }

            if counters != before {
                tx.execute(
                    "UPDATE counters SET next_id = ?1, total_donations = ?2, balance = ?3
                     WHERE id = 1",
                    params![
                        counters.next_id.get() as i64,
                        counters.total_donations.to_be_bytes().as_slice(),
                        counters.balance.to_be_bytes().as_slice(),
                    ],
                )?;
            }

            // Dropping an uncommitted transaction rolls it back, so any early
            // return above leaves the database untouched.
            tx.commit()?;
            Ok(())
        })
    }
}
