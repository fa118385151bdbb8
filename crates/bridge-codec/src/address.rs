//! Address normalization
//!
//! Maps every supported native address encoding to and from the 32-byte
//! [`CanonicalAddress`] embedded in wire messages. Each format is independent:
//!
//! | Format | To canonical | From canonical |
//! |---|---|---|
//! | EVM `0x…` (20 bytes) | left-pad | low 20 bytes (lossy) |
//! | Cosmos bech32 | left-pad payload | strip zero padding, re-encode |
//! | Base58 pubkey (32 bytes) | straight copy | straight copy |
//! | Kaspa `kaspa:` / `kaspatest:` | unpack 5-bit groups | none (one-way) |

use bech32::{FromBase32, ToBase32, Variant};
use bridge_core::{AddressFormat, CanonicalAddress};

use crate::error::CodecError;

/// Network prefixes accepted for Kaspa addresses
pub const KASPA_PREFIXES: [&str; 2] = ["kaspa", "kaspatest"];

const KASPA_CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const KASPA_CHECKSUM_LEN: usize = 8;

/// Cosmos account payloads are 20 bytes; the bech32 decoder never strips below this.
const MIN_BECH32_PAYLOAD: usize = 20;

/// Left-pad a 20-byte EVM address. Accepts an optional `0x` prefix and
/// mixed-case hex.
pub fn encode_from_evm(addr: &str) -> Result<CanonicalAddress, CodecError> {
    let hex_part = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);

    if hex_part.len() != 40 {
        return Err(CodecError::address(
            "EVM",
            format!("expected 40 hex characters, got {}", hex_part.len()),
        ));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(hex_part, &mut bytes)
        .map_err(|e| CodecError::address("EVM", format!("invalid hex: {e}")))?;

    Ok(CanonicalAddress::from_padded(&bytes).unwrap_or_default())
}

/// Take the low-order 20 bytes as a lowercase `0x` address.
///
/// The 12 high-order bytes are discarded without checking that they are zero,
/// so a canonical address that did not originate from an EVM address is
/// silently truncated.
pub fn decode_to_evm(c: &CanonicalAddress) -> String {
    format!("0x{}", hex::encode(&c.as_bytes()[12..]))
}

/// Decode a Cosmos bech32 address and left-pad its payload.
pub fn encode_from_bech32(
    addr: &str,
    expected_prefix: Option<&str>,
) -> Result<CanonicalAddress, CodecError> {
    if addr.is_empty() {
        return Err(CodecError::address("bech32", "address is empty"));
    }

    let (hrp, data, variant) =
        bech32::decode(addr).map_err(|e| CodecError::address("bech32", e.to_string()))?;

    if variant != Variant::Bech32 {
        return Err(CodecError::address(
            "bech32",
            "expected a bech32 checksum, found bech32m",
        ));
    }

    if let Some(prefix) = expected_prefix {
        if hrp != prefix {
            return Err(CodecError::address(
                "bech32",
                format!("expected prefix '{prefix}', found '{hrp}'"),
            ));
        }
    }

    let payload =
        Vec::<u8>::from_base32(&data).map_err(|e| CodecError::address("bech32", e.to_string()))?;

    if payload.is_empty() {
        return Err(CodecError::address("bech32", "empty payload"));
    }

    CanonicalAddress::from_padded(&payload).ok_or_else(|| {
        CodecError::address(
            "bech32",
            format!("payload is {} bytes, at most 32 allowed", payload.len()),
        )
    })
}

/// Strip leading zero bytes and re-encode with `prefix`.
///
/// Stripping stops at 20 bytes so that standard account addresses whose
/// first payload byte is zero still round-trip.
pub fn decode_to_bech32(c: &CanonicalAddress, prefix: &str) -> Result<String, CodecError> {
    let bytes = c.as_bytes();
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let start = first_nonzero.min(CanonicalAddress::LEN - MIN_BECH32_PAYLOAD);

    bech32::encode(prefix, (&bytes[start..]).to_base32(), Variant::Bech32)
        .map_err(|e| CodecError::address("bech32", format!("cannot encode with '{prefix}': {e}")))
}

/// Decode a base58 public key. Already canonical width, so this is a copy.
pub fn encode_from_base58_pubkey(addr: &str) -> Result<CanonicalAddress, CodecError> {
    if addr.is_empty() {
        return Err(CodecError::address("base58", "address is empty"));
    }

    let bytes = bs58::decode(addr)
        .into_vec()
        .map_err(|e| CodecError::address("base58", e.to_string()))?;

    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        CodecError::address("base58", format!("expected 32 bytes, got {}", bytes.len()))
    })?;

    Ok(CanonicalAddress::new(key))
}

/// Base58 rendering of a canonical address (inverse of [`encode_from_base58_pubkey`])
pub fn decode_to_base58(c: &CanonicalAddress) -> String {
    bs58::encode(c.as_bytes()).into_string()
}

/// Decode a Kaspa schnorr address into its 32-byte key.
///
/// The address is `prefix:payload` where the payload is 5-bit groups of
/// `version byte ‖ key` followed by an 8-group checksum. The version byte
/// straddles the first two groups, so groups are accumulated from the start
/// and the version byte is dropped after repacking.
///
/// One-way: no inverse is provided.
pub fn encode_from_bech32m_schnorr(addr: &str) -> Result<CanonicalAddress, CodecError> {
    let (prefix, payload) = addr
        .split_once(':')
        .ok_or_else(|| CodecError::address("kaspa", "missing ':' network separator"))?;

    if !KASPA_PREFIXES.contains(&prefix) {
        return Err(CodecError::address(
            "kaspa",
            format!("unknown network prefix '{prefix}', expected kaspa or kaspatest"),
        ));
    }

    if payload.len() <= KASPA_CHECKSUM_LEN + 1 {
        return Err(CodecError::address(
            "kaspa",
            format!("payload too short ({} characters)", payload.len()),
        ));
    }

    let groups = payload
        .bytes()
        .map(|c| {
            KASPA_CHARSET
                .iter()
                .position(|&x| x == c)
                .map(|p| p as u8)
                .ok_or_else(|| {
                    CodecError::address("kaspa", format!("invalid character '{}'", c as char))
                })
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let checksum_input = prefix
        .bytes()
        .map(|c| c & 0x1f)
        .chain(std::iter::once(0))
        .chain(groups.iter().copied());
    if kaspa_polymod(checksum_input) != 0 {
        return Err(CodecError::address("kaspa", "checksum mismatch"));
    }

    let data = &groups[..groups.len() - KASPA_CHECKSUM_LEN];
    let bytes = repack_5_to_8(data)?;

    let (_version, key) = bytes
        .split_first()
        .ok_or_else(|| CodecError::address("kaspa", "empty payload"))?;

    let key: [u8; 32] = key.try_into().map_err(|_| {
        CodecError::address(
            "kaspa",
            format!("expected a 32-byte key after repacking, got {}", key.len()),
        )
    })?;

    Ok(CanonicalAddress::new(key))
}

/// Kaspa address to its canonical `0x`-prefixed hex form (66 characters)
pub fn kaspa_address_to_canonical(addr: &str) -> Result<String, CodecError> {
    encode_from_bech32m_schnorr(addr).map(|c| c.to_hex())
}

/// True if `s` is exactly 64 hex characters after an optional `0x`
pub fn is_canonical(s: &str) -> bool {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    stripped.len() == 64 && stripped.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize a native address according to its chain's format
pub fn encode_native(addr: &str, format: &AddressFormat) -> Result<CanonicalAddress, CodecError> {
    match format {
        AddressFormat::Evm => encode_from_evm(addr),
        AddressFormat::Bech32 { prefix } => encode_from_bech32(addr, Some(prefix.as_str())),
        AddressFormat::Base58Pubkey => encode_from_base58_pubkey(addr),
        AddressFormat::KaspaBech32m => encode_from_bech32m_schnorr(addr),
    }
}

/// Explicit 5-bit to 8-bit accumulation. Leftover padding must be under one
/// group and all zero.
fn repack_5_to_8(groups: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(groups.len() * 5 / 8);

    for &group in groups {
        acc = (acc << 5) | u32::from(group);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }

    if bits >= 5 || acc != 0 {
        return Err(CodecError::address("kaspa", "non-zero padding bits"));
    }

    Ok(out)
}

fn kaspa_polymod(values: impl Iterator<Item = u8>) -> u64 {
    const GENERATORS: [u64; 5] = [
        0x98_f2bc_8e61,
        0x79_b76d_99e2,
        0xf3_3e5f_b3c4,
        0xae_2eab_e2a8,
        0x1e_4f43_e470,
    ];

    let mut c: u64 = 1;
    for d in values {
        let c0 = c >> 35;
        c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(d);
        for (i, generator) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 == 1 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}
