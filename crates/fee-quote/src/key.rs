//! Cache keys for fee queries

use bridge_core::CanonicalAddress;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash of the parameters that identify a gas-payment quote
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteKey(String);

impl QuoteKey {
    /// sha256 over `domain | gas_limit | hook_id` (empty when no custom hook)
    pub fn new(domain: u32, gas_limit: u64, hook_id: Option<&CanonicalAddress>) -> Self {
        let hook = hook_id.map(|h| h.to_hex()).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(format!("{domain}|{gas_limit}|{hook}").as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
