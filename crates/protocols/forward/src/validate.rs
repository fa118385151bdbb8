//! Address validation for transfer endpoints

use bridge_codec::{encode_from_base58_pubkey, encode_from_bech32, encode_from_bech32m_schnorr};
use bridge_core::{AddressFormat, BridgeError, CanonicalAddress, Chain, Network, Result};

fn kaspa_prefix(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "kaspa:",
        Network::Testnet => "kaspatest:",
    }
}

/// Check `address` against `chain`'s native format.
///
/// The error names the format that was expected.
pub fn validate_address(chain: &Chain, address: &str, network: Network, role: &str) -> Result<()> {
    let format = chain.descriptor.address_format();
    let fail = |reason: String| {
        BridgeError::invalid_format(
            format!("{} {role}", chain.display_name),
            format!("expected {}: {reason}", format.describe()),
        )
    };

    if address.is_empty() {
        return Err(fail("address is empty".to_string()));
    }

    match &format {
        AddressFormat::Evm => {
            let hex_part = address
                .strip_prefix("0x")
                .ok_or_else(|| fail("missing '0x' prefix".to_string()))?;
            if hex_part.len() != 40 {
                return Err(fail(format!("got {} hex characters", hex_part.len())));
            }
            if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(fail("contains non-hex characters".to_string()));
            }
        }
        AddressFormat::Bech32 { prefix } => {
            encode_from_bech32(address, Some(prefix.as_str())).map_err(|e| fail(e.to_string()))?;
        }
        AddressFormat::Base58Pubkey => {
            if !(32..=44).contains(&address.len()) {
                return Err(fail(format!("length {} outside 32-44", address.len())));
            }
            encode_from_base58_pubkey(address).map_err(|e| fail(e.to_string()))?;
        }
        AddressFormat::KaspaBech32m => {
            let prefix = kaspa_prefix(network);
            if !address.starts_with(prefix) {
                return Err(fail(format!("{network} addresses start with '{prefix}'")));
            }
            encode_from_bech32m_schnorr(address).map_err(|e| fail(e.to_string()))?;
        }
    }

    Ok(())
}

/// Check a recipient address for the destination chain
pub fn validate_recipient(chain: &Chain, address: &str, network: Network) -> Result<()> {
    validate_address(chain, address, network, "recipient")
}

/// The Hub fallback must be a Hub address; returns its canonical form.
pub fn validate_hub_fallback(hub: &Chain, address: &str) -> Result<CanonicalAddress> {
    let AddressFormat::Bech32 { prefix } = hub.descriptor.address_format() else {
        return Err(BridgeError::invalid_format(
            "hub fallback",
            format!("{} has no bech32 prefix", hub.name),
        ));
    };
    encode_from_bech32(address, Some(prefix.as_str())).map_err(|e| {
        BridgeError::invalid_format(
            "hub fallback",
            format!("expected bech32 address with '{prefix}' prefix: {e}"),
        )
    })
}
