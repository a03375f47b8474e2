//! Role resolution and the action table.

use std::fmt;

use quill_core::{AccountId, ItemRecord};
use serde::{Deserialize, Serialize};

use crate::error::{PermsError, Result};

/// A mutation that requires a relationship to the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Replace the content fingerprint.
    Edit,
    /// Add or remove editors.
    ManageEditors,
    /// Bind a vanity name to the item.
    ClaimName,
    /// Set the attachment reference.
    Attach,
}

impl Action {
    /// All gated actions.
    pub const ALL: [Action; 4] = [
        Action::Edit,
        Action::ManageEditors,
        Action::ClaimName,
        Action::Attach,
    ];

    /// Check whether `roles` is enough for this action.
    pub fn permits(&self, roles: &Roles) -> bool {
        if roles.owner {
            return true;
        }
        match self {
            Action::Edit => roles.editor,
            Action::Attach => roles.editor || roles.author,
            Action::ManageEditors | Action::ClaimName => false,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Edit => "edit",
            Action::ManageEditors => "manage editors",
            Action::ClaimName => "claim a name",
            Action::Attach => "attach",
        };
        f.write_str(s)
    }
}

/// How a caller relates to one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Roles {
    pub owner: bool,
    pub author: bool,
    pub editor: bool,
}

impl Roles {
    /// Resolve a caller's roles against a record.
    ///
    /// `is_editor` comes from the store's editor set, which never holds
    /// the owner.
    pub fn resolve(record: &ItemRecord, caller: &AccountId, is_editor: bool) -> Self {
        Self {
            owner: record.owner == *caller,
            author: record.author == *caller,
            editor: is_editor,
        }
    }

    /// True when the caller has no relationship to the item at all.
    #[cfg(test)]
    fn is_stranger(&self) -> bool {
        !(self.owner || self.author || self.editor)
    }
}

/// Check `action` against `roles`, naming `caller` in the error.
pub fn authorize(action: Action, roles: &Roles, caller: &AccountId) -> Result<()> {
    if action.permits(roles) {
        Ok(())
    } else {
        Err(PermsError::PermissionDenied {
            action,
            caller: *caller,
        })
    }
}
