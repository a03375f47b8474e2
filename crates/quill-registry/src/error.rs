//! Error types for the Registry.

use std::fmt;

use quill_core::{AccountId, Amount, ItemId, ValidationError};
use quill_perms::PermsError;
use quill_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::TransferError;

/// Coarse classification of a failed operation.
///
/// Every error maps to exactly one kind. Callers that only need to branch
/// on the category match on this instead of on [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidInput,
    Conflict,
    TransferFailed,
    ReentrancyRejected,
    /// Backend fault unrelated to the request.
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Conflict => "conflict",
            ErrorKind::TransferFailed => "transfer failed",
            ErrorKind::ReentrancyRejected => "reentrancy rejected",
            ErrorKind::Storage => "storage",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during Registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Permission error.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// Item not found.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// Name already bound to an item.
    #[error("name {name:?} already claimed by {existing}")]
    NameTaken { name: String, existing: ItemId },

    /// Account already upvoted the item.
    #[error("{voter} already upvoted {id}")]
    AlreadyVoted { id: ItemId, voter: AccountId },

    /// Only the beneficiary may withdraw.
    #[error("not the beneficiary: {0}")]
    NotBeneficiary(AccountId),

    /// A tip must carry value.
    #[error("tip requires attached value")]
    ZeroValue,

    /// Nothing to withdraw.
    #[error("balance is empty")]
    EmptyBalance,

    /// Id space exhausted.
    #[error("item id space exhausted")]
    IdsExhausted,

    /// Outbound value transfer failed.
    #[error("transfer of {amount} to {to} failed: {source}")]
    Transfer {
        to: AccountId,
        amount: Amount,
        #[source]
        source: TransferError,
    },

    /// A guarded operation was entered while another was in flight.
    #[error("reentrant call rejected")]
    Reentrancy,
}

impl RegistryError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::Validation(_)
            | RegistryError::ZeroValue
            | RegistryError::EmptyBalance
            | RegistryError::IdsExhausted => ErrorKind::InvalidInput,
            RegistryError::Store(e) => match e {
                StoreError::NotFound(_) => ErrorKind::NotFound,
                StoreError::Conflict(_) => ErrorKind::Conflict,
                StoreError::InsufficientBalance { .. } | StoreError::Overflow(_) => {
                    ErrorKind::InvalidInput
                }
                StoreError::Database(_)
                | StoreError::InvalidData(_)
                | StoreError::Migration(_)
                | StoreError::Io(_) => ErrorKind::Storage,
            },
            RegistryError::Permission(_) | RegistryError::NotBeneficiary(_) => {
                ErrorKind::Unauthorized
            }
            RegistryError::ItemNotFound(_) => ErrorKind::NotFound,
            RegistryError::NameTaken { .. } | RegistryError::AlreadyVoted { .. } => {
                ErrorKind::Conflict
            }
            RegistryError::Transfer { .. } => ErrorKind::TransferFailed,
            RegistryError::Reentrancy => ErrorKind::ReentrancyRejected,
        }
    }
}

/// Result type for Registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
