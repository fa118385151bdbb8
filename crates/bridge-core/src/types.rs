//! Core type definitions for the Hub bridge toolkit

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::errors::{BridgeError, EntityKind, Result};

/// 32-byte chain-agnostic address identifier.
///
/// Every chain's native address is normalized into this form before it is
/// embedded in a wire message. Shorter native payloads are left-padded with
/// zero bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CanonicalAddress(pub [u8; 32]);

impl CanonicalAddress {
    pub const LEN: usize = 32;

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Left-pad a payload of at most 32 bytes.
    pub fn from_padded(payload: &[u8]) -> Option<Self> {
        if payload.len() > Self::LEN {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes[Self::LEN - payload.len()..].copy_from_slice(payload);
        Some(Self(bytes))
    }

    /// Parse a 64-character hex string, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 64 {
            return Err(BridgeError::invalid_format(
                "canonical address",
                format!("expected 64 hex characters, got {}", stripped.len()),
            ));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(stripped, &mut bytes).map_err(|e| {
            BridgeError::invalid_format("canonical address", format!("invalid hex: {e}"))
        })?;
        Ok(Self(bytes))
    }

    /// `0x`-prefixed lowercase hex (66 characters)
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalAddress({})", self.to_hex())
    }
}

impl Serialize for CanonicalAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CanonicalAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Native address encoding of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AddressFormat {
    /// `0x` + 40 hex characters
    Evm,
    /// Cosmos-style bech32 with a fixed human-readable prefix
    Bech32 { prefix: String },
    /// 32-byte public key in base58
    Base58Pubkey,
    /// `kaspa:` / `kaspatest:` bech32m-style schnorr address
    KaspaBech32m,
}

impl AddressFormat {
    /// Human-readable description used in validation errors
    pub fn describe(&self) -> String {
        match self {
            Self::Evm => "0x-prefixed 40-character hex address".to_string(),
            Self::Bech32 { prefix } => format!("bech32 address with '{prefix}' prefix"),
            Self::Base58Pubkey => "base58-encoded 32-byte public key".to_string(),
            Self::KaspaBech32m => "kaspa: or kaspatest: address".to_string(),
        }
    }
}

/// How funds arriving from an indirect chain settle on the Hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Settlement {
    /// Plain relayed transfer, no fee taken on arrival
    #[default]
    Relayed,
    /// Incentivized withdrawal: a fulfiller fronts the funds for a fee
    Incentivized,
}

/// Chain classification. Every chain has exactly one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChainDescriptor {
    /// The central settlement chain
    #[serde(rename_all = "camelCase")]
    Hub {
        protocol_domain: u32,
        testnet_domain: u32,
        bech32_prefix: String,
    },
    /// Reachable from the Hub through the envelope protocol
    #[serde(rename_all = "camelCase")]
    DirectChain {
        protocol_domain: u32,
        #[serde(default)]
        testnet_domain: Option<u32>,
        address_format: AddressFormat,
    },
    /// Reachable only through the second transport after landing on the Hub
    #[serde(rename_all = "camelCase")]
    IndirectChain {
        /// Hub-side channel towards this chain
        forward_channel_out: String,
        /// This chain's channel towards the Hub
        forward_channel_in: String,
        address_format: AddressFormat,
        #[serde(default)]
        settlement: Settlement,
    },
}

impl ChainDescriptor {
    pub fn is_hub(&self) -> bool {
        matches!(self, Self::Hub { .. })
    }

    /// Protocol domain for the given network; `None` for indirect chains.
    pub fn domain(&self, network: Network) -> Option<u32> {
        match (self, network) {
            (Self::Hub { protocol_domain, .. }, Network::Mainnet) => Some(*protocol_domain),
            (Self::Hub { testnet_domain, .. }, Network::Testnet) => Some(*testnet_domain),
            (Self::DirectChain { protocol_domain, .. }, Network::Mainnet) => {
                Some(*protocol_domain)
            }
            (
                Self::DirectChain {
                    protocol_domain,
                    testnet_domain,
                    ..
                },
                Network::Testnet,
            ) => Some(testnet_domain.unwrap_or(*protocol_domain)),
            (Self::IndirectChain { .. }, _) => None,
        }
    }

    pub fn address_format(&self) -> AddressFormat {
        match self {
            Self::Hub { bech32_prefix, .. } => AddressFormat::Bech32 {
                prefix: bech32_prefix.clone(),
            },
            Self::DirectChain { address_format, .. }
            | Self::IndirectChain { address_format, .. } => address_format.clone(),
        }
    }
}

/// A named chain from the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub name: String,
    pub display_name: String,
    pub descriptor: ChainDescriptor,
}

impl Chain {
    /// Protocol domain, required for envelope transfers
    pub fn require_domain(&self, network: Network) -> Result<u32> {
        self.descriptor
            .domain(network)
            .ok_or_else(|| BridgeError::unknown(EntityKind::Chain, format!("{} domain", self.name)))
    }
}

/// A bridgeable token and its per-chain native addresses / denoms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub symbol: String,
    pub decimals: u32,
    /// Hub-side token identifier used in transfer instructions
    pub canonical_id: CanonicalAddress,
    /// chain name -> native address or denom (may be partial)
    pub addresses: HashMap<String, String>,
    #[serde(default)]
    pub testnet_addresses: HashMap<String, String>,
}

impl TokenDescriptor {
    /// Resolve the token's address on `chain`, preferring testnet overrides on testnet.
    pub fn address_on(&self, chain: &str, network: Network) -> Result<&str> {
        let override_addr = match network {
            Network::Testnet => self.testnet_addresses.get(chain),
            Network::Mainnet => None,
        };
        override_addr
            .or_else(|| self.addresses.get(chain))
            .map(String::as_str)
            .ok_or_else(|| {
                BridgeError::unknown(
                    EntityKind::TokenAddress,
                    format!("{} on {}", self.symbol, chain),
                )
            })
    }

    pub fn is_available_on(&self, chain: &str, network: Network) -> bool {
        self.address_on(chain, network).is_ok()
    }
}

/// Constants
pub mod constants {
    /// Envelope format version
    pub const ENVELOPE_VERSION: u8 = 3;

    /// Fixed-point scale used for fractional rates (10^18)
    pub const RATE_SCALE_DECIMALS: u32 = 18;

    /// Port used for relayed transfers
    pub const TRANSFER_PORT: &str = "transfer";
}
