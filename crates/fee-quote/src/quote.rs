//! Fee-quote shapes
//!
//! Values supplied by the Hub fee-quoting collaborator. Amounts are integer
//! base units carried as decimal strings; rates are decimal fractions
//! (`"0.001"` = 0.1 %), except `eibc_percent` which is in percent units
//! (`"0.15"` = 0.15 %).

use bridge_core::CanonicalAddress;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::key::QuoteKey;

fn zero_rate() -> String {
    "0".to_string()
}

/// Interchain gas payment quote for one outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgpQuote {
    /// Destination protocol domain
    pub domain: u32,
    pub gas_limit: u64,
    #[serde(default)]
    pub hook_id: Option<CanonicalAddress>,
    /// Fee in `fee_denom` base units
    #[serde(with = "bridge_core::decimal_amount")]
    pub fee: BigUint,
    pub fee_denom: String,
}

impl IgpQuote {
    /// Cache key for the query this quote answers
    pub fn key(&self) -> QuoteKey {
        QuoteKey::new(self.domain, self.gas_limit, self.hook_id.as_ref())
    }
}

/// Bridging fee rates charged by the token router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFeeQuote {
    /// Charged when tokens arrive on the Hub
    #[serde(default = "zero_rate")]
    pub inbound_rate: String,
    /// Charged when tokens leave the Hub
    #[serde(default = "zero_rate")]
    pub outbound_rate: String,
}

impl Default for BridgeFeeQuote {
    fn default() -> Self {
        Self {
            inbound_rate: zero_rate(),
            outbound_rate: zero_rate(),
        }
    }
}

/// Incentivized-withdrawal fee parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EibcQuote {
    /// Fulfiller fee in percent units
    #[serde(default = "zero_rate")]
    pub eibc_percent: String,
    /// Delayed-settlement fee as a fraction
    #[serde(default = "zero_rate")]
    pub delayed_ack_rate: String,
}

impl Default for EibcQuote {
    fn default() -> Self {
        Self {
            eibc_percent: zero_rate(),
            delayed_ack_rate: zero_rate(),
        }
    }
}

/// Everything a transfer needs priced, bundled for the router
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    /// Outbound gas payment; required whenever the Hub sends an envelope
    #[serde(default)]
    pub igp: Option<IgpQuote>,
    #[serde(default)]
    pub bridge: BridgeFeeQuote,
    /// Required for routes from an incentivized-withdrawal chain
    #[serde(default)]
    pub eibc: Option<EibcQuote>,
}
