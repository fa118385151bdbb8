//! Chain and token registry
//!
//! Read-only lookup tables supplied by configuration. Loaded from JSON, with a
//! hardcoded fallback for when no registry file is available.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{BridgeError, EntityKind, Result};
use crate::types::{
    AddressFormat, CanonicalAddress, Chain, ChainDescriptor, Network, Settlement, TokenDescriptor,
};

/// Name of the Hub chain in the fallback registry
pub const HUB_CHAIN: &str = "dymension";

/// Complete registry of chains and tokens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    pub chains: Vec<Chain>,
    pub tokens: Vec<TokenDescriptor>,
}

impl Registry {
    /// Parse a registry from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| BridgeError::invalid_format("registry JSON", e.to_string()))
    }

    pub fn chain(&self, name: &str) -> Result<&Chain> {
        self.chains
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| BridgeError::unknown(EntityKind::Chain, name))
    }

    pub fn token(&self, symbol: &str) -> Result<&TokenDescriptor> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| BridgeError::unknown(EntityKind::Token, symbol))
    }

    /// The single Hub chain
    pub fn hub(&self) -> Result<&Chain> {
        self.chains
            .iter()
            .find(|c| c.descriptor.is_hub())
            .ok_or_else(|| BridgeError::unknown(EntityKind::Chain, "hub"))
    }

    /// Tokens that resolve to an address on `chain`
    pub fn tokens_for_chain(&self, chain: &str, network: Network) -> Vec<&TokenDescriptor> {
        self.tokens
            .iter()
            .filter(|t| t.is_available_on(chain, network))
            .collect()
    }

    /// Chains a token is available on, sorted
    pub fn chains_for_token(&self, symbol: &str, network: Network) -> Vec<&str> {
        let mut chains: Vec<&str> = self
            .chains
            .iter()
            .filter(|c| {
                self.token(symbol)
                    .map(|t| t.is_available_on(&c.name, network))
                    .unwrap_or(false)
            })
            .map(|c| c.name.as_str())
            .collect();
        chains.sort_unstable();
        chains
    }
}

fn evm_chain(name: &str, display: &str, domain: u32, testnet: Option<u32>) -> Chain {
    Chain {
        name: name.to_string(),
        display_name: display.to_string(),
        descriptor: ChainDescriptor::DirectChain {
            protocol_domain: domain,
            testnet_domain: testnet,
            address_format: AddressFormat::Evm,
        },
    }
}

fn indirect_chain(
    name: &str,
    display: &str,
    channel_out: &str,
    channel_in: &str,
    prefix: &str,
    settlement: Settlement,
) -> Chain {
    Chain {
        name: name.to_string(),
        display_name: display.to_string(),
        descriptor: ChainDescriptor::IndirectChain {
            forward_channel_out: channel_out.to_string(),
            forward_channel_in: channel_in.to_string(),
            address_format: AddressFormat::Bech32 {
                prefix: prefix.to_string(),
            },
            settlement,
        },
    }
}

fn addresses(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(chain, addr)| (chain.to_string(), addr.to_string()))
        .collect()
}

/// Hardcoded fallback registry (in case no registry file is configured)
pub fn fallback_registry() -> Registry {
    let chains = vec![
        Chain {
            name: HUB_CHAIN.to_string(),
            display_name: "Dymension".to_string(),
            descriptor: ChainDescriptor::Hub {
                protocol_domain: 1_570_310_961,
                testnet_domain: 482_195_613,
                bech32_prefix: "dym".to_string(),
            },
        },
        evm_chain("ethereum", "Ethereum", 1, Some(11_155_111)),
        evm_chain("base", "Base", 8453, Some(84_532)),
        evm_chain("bsc", "BNB Smart Chain", 56, Some(97)),
        Chain {
            name: "solana".to_string(),
            display_name: "Solana".to_string(),
            descriptor: ChainDescriptor::DirectChain {
                protocol_domain: 1_399_811_149,
                testnet_domain: Some(1_399_811_150),
                address_format: AddressFormat::Base58Pubkey,
            },
        },
        Chain {
            name: "kaspa".to_string(),
            display_name: "Kaspa".to_string(),
            descriptor: ChainDescriptor::DirectChain {
                protocol_domain: 80_808_082,
                testnet_domain: Some(80_808_083),
                address_format: AddressFormat::KaspaBech32m,
            },
        },
        indirect_chain(
            "osmosis",
            "Osmosis",
            "channel-2",
            "channel-19774",
            "osmo",
            Settlement::Relayed,
        ),
        indirect_chain(
            "rollapp",
            "RollApp",
            "channel-31",
            "channel-0",
            "ethm",
            Settlement::Incentivized,
        ),
    ];

    // Hub-side router identifiers are configuration constants, not derived.
    let usdc_id = [0x11u8; 32];
    let kas_id = [0x22u8; 32];

    let tokens = vec![
        TokenDescriptor {
            symbol: "USDC".to_string(),
            decimals: 6,
            canonical_id: CanonicalAddress::new(usdc_id),
            addresses: addresses(&[
                (HUB_CHAIN, "ibc/B3504E092456BA618CC28AC671A71FB08C6CA0FD0BE7C8A5B5A3E2DD933CC9E4"),
                ("ethereum", "0x2a4a8bc4a8b2f6b6d9d3c7e2a8e0f4f1b6c9d3e2"),
                ("base", "0x4b3f6c9d2e1a8b7c6d5e4f3a2b1c0d9e8f7a6b5c"),
                ("solana", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
                ("osmosis", "ibc/6490A7EAB61059BFC1CDDEB05917DD70BDF3A611654162A1A47DB930D40D8AF4"),
                ("rollapp", "ibc/B3504E092456BA618CC28AC671A71FB08C6CA0FD0BE7C8A5B5A3E2DD933CC9E4"),
            ]),
            testnet_addresses: HashMap::new(),
        },
        TokenDescriptor {
            symbol: "KAS".to_string(),
            decimals: 8,
            canonical_id: CanonicalAddress::new(kas_id),
            addresses: addresses(&[
                (
                    HUB_CHAIN,
                    "hyperlane/0x2222222222222222222222222222222222222222222222222222222222222222",
                ),
                ("kaspa", "kaspa:prztt2hd2txge07syjvhaz5j6l9ql6djhc9equela058rjm6vww0uwre5dulh"),
                ("base", "0x9c8b7a6f5e4d3c2b1a0f9e8d7c6b5a4f3e2d1c0b"),
            ]),
            testnet_addresses: HashMap::new(),
        },
    ];

    Registry { chains, tokens }
}
