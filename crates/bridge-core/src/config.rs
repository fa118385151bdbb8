//! Configuration types for the Hub bridge toolkit

use serde::{Deserialize, Serialize};

use crate::Network;

/// Toolkit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Network (mainnet or testnet)
    #[serde(default)]
    pub network: Network,

    /// How long a fetched fee quote stays valid
    #[serde(default = "default_quote_ttl_secs")]
    pub quote_ttl_secs: u64,

    /// Relative timeout applied to relayed transfers
    #[serde(default = "default_ibc_timeout_minutes")]
    pub ibc_timeout_minutes: u64,
}

fn default_quote_ttl_secs() -> u64 {
    60
}

fn default_ibc_timeout_minutes() -> u64 {
    60
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            quote_ttl_secs: default_quote_ttl_secs(),
            ibc_timeout_minutes: default_ibc_timeout_minutes(),
        }
    }
}

impl BridgeConfig {
    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            ..Self::default()
        }
    }

    /// IBC timeout in nanoseconds relative to `now_nanos`
    pub fn timeout_timestamp(&self, now_nanos: u64) -> u64 {
        now_nanos.saturating_add(self.ibc_timeout_minutes.saturating_mul(60_000_000_000))
    }
}
