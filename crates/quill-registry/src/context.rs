//! Per-call facts supplied by the execution environment.

use quill_core::{AccountId, Amount, Timestamp};

/// Who is calling, with how much value attached, at what time.
///
/// The registry trusts these values; authenticating the caller and escrowing
/// the attached value is the environment's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub value: Amount,
    pub timestamp: Timestamp,
}

impl CallContext {
    /// A call with no attached value.
    pub fn new(caller: AccountId, timestamp: Timestamp) -> Self {
        Self {
            caller,
            value: 0,
            timestamp,
        }
    }

    /// Attach value to the call.
    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}
