//! Error types for the store module.

use quill_core::Amount;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A mutation targeted an item that does not exist.
    #[error("item not found: {0}")]
    NotFound(String),

    /// A uniqueness rule would be broken (name already claimed, duplicate vote).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A debit exceeds the pooled balance.
    #[error("insufficient balance: have {balance}, need {requested}")]
    InsufficientBalance { balance: Amount, requested: Amount },

    /// A counter would overflow.
    #[error("counter overflow: {0}")]
    Overflow(&'static str),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
