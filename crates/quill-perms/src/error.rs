//! Error types for the permissions module.

use quill_core::AccountId;
use thiserror::Error;

use crate::policy::Action;

/// Errors that can occur during permission checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// The caller holds no role that permits the action.
    #[error("permission denied: {caller} may not {action}")]
    PermissionDenied { action: Action, caller: AccountId },
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
