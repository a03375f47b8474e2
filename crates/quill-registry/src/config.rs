//! Registry configuration.

use quill_core::AccountId;
use serde::{Deserialize, Serialize};

/// Configuration fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// The only account allowed to withdraw pooled funds.
    pub beneficiary: AccountId,
}

impl RegistryConfig {
    pub fn new(beneficiary: AccountId) -> Self {
        Self { beneficiary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_config() {
        let beneficiary = AccountId::from_bytes([7; 32]);
        let json = format!(r#"{{ "beneficiary": {} }}"#, serde_json::to_string(&beneficiary).unwrap());
        let config: RegistryConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, RegistryConfig::new(beneficiary));
    }
}
