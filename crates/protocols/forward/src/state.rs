//! Serializable state types for frontend communication

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use bridge_core::{ChainDescriptor, Network, Registry};

use crate::calculator::ForwardingPlan;
use crate::route::RouteKind;

/// Overall bridge state sent to the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubBridgeState {
    pub network: Network,
    pub supported_chains: Vec<ChainInfo>,
    pub available_tokens: Vec<BridgeTokenInfo>,
}

/// Chain info for the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub name: String,
    pub display_name: String,
    /// "hub", "direct" or "indirect"
    pub kind: String,
    /// Expected address format, for input hints
    pub address_hint: String,
}

/// Token info for the frontend (simplified from TokenDescriptor)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeTokenInfo {
    pub symbol: String,
    pub decimals: u32,
    pub chains: Vec<String>,
}

/// Fee breakdown for a forwarded transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeFeeInfo {
    pub route_kind: RouteKind,
    /// Everything taken before the Hub (human-readable)
    pub hop1_fee: String,
    /// Bridging fee on the outbound leg (human-readable)
    pub outbound_fee: String,
    /// Gas payment in `fee_denom` base units
    pub igp_fee_raw: String,
    pub fee_denom: String,
    /// Amount the recipient will receive (human-readable)
    pub receiving_amount: String,
    /// Raw amount the recipient will receive
    pub receiving_amount_raw: String,
}

impl ChainInfo {
    fn from_chain(chain: &bridge_core::Chain) -> Self {
        let kind = match chain.descriptor {
            ChainDescriptor::Hub { .. } => "hub",
            ChainDescriptor::DirectChain { .. } => "direct",
            ChainDescriptor::IndirectChain { .. } => "indirect",
        };
        Self {
            name: chain.name.clone(),
            display_name: chain.display_name.clone(),
            kind: kind.to_string(),
            address_hint: chain.descriptor.address_format().describe(),
        }
    }
}

/// Snapshot of the registry for `network`
pub fn bridge_state(registry: &Registry, network: Network) -> HubBridgeState {
    let supported_chains = registry.chains.iter().map(ChainInfo::from_chain).collect();

    let available_tokens = registry
        .tokens
        .iter()
        .map(|t| BridgeTokenInfo {
            symbol: t.symbol.clone(),
            decimals: t.decimals,
            chains: registry
                .chains_for_token(&t.symbol, network)
                .into_iter()
                .map(String::from)
                .collect(),
        })
        .collect();

    HubBridgeState {
        network,
        supported_chains,
        available_tokens,
    }
}

/// Render base units with `decimals` places, trailing zeros trimmed
pub fn format_amount(amount: &BigUint, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = BigUint::from(10u32).pow(decimals);
    let whole = amount / &scale;
    let frac = amount % &scale;
    if frac.is_zero() {
        return whole.to_string();
    }
    let digits = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Fee breakdown of `plan` for a token with `decimals` places
pub fn fee_info(plan: &ForwardingPlan, decimals: u32) -> BridgeFeeInfo {
    BridgeFeeInfo {
        route_kind: plan.route_kind,
        hop1_fee: format_amount(&plan.hop1_fees.total(), decimals),
        outbound_fee: format_amount(&plan.hop2_fees.outbound_fee, decimals),
        igp_fee_raw: plan.hop2_fees.igp_fee.to_string(),
        fee_denom: plan.hop2_fees.fee_denom.clone(),
        receiving_amount: format_amount(&plan.recipient_receives, decimals),
        receiving_amount_raw: plan.recipient_receives.to_string(),
    }
}
