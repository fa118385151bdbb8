//! Interchain message envelope and token-transfer body
//!
//! Envelope layout (77-byte header, body runs to the end of the buffer):
//! ```text
//! version (1) | nonce (4, BE) | origin (4, BE) | sender (32)
//!   | destination (4, BE) | recipient (32) | body
//! ```
//!
//! TransferBody layout:
//! ```text
//! recipient (32) | amount (32, BE u256) | metadata
//! ```

use bridge_core::constants::ENVELOPE_VERSION;
use bridge_core::CanonicalAddress;
use num_bigint::BigUint;
use tiny_keccak::{Hasher, Keccak};

use crate::error::CodecError;

/// Size of the fixed envelope header
pub const HEADER_LEN: usize = 1 + 4 + 4 + 32 + 4 + 32;

/// Size of the fixed transfer body prefix (recipient + amount)
pub const TRANSFER_BODY_PREFIX_LEN: usize = 64;

/// keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_address(bytes: &[u8], at: usize) -> CanonicalAddress {
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes[at..at + 32]);
    CanonicalAddress::new(out)
}

/// Interchain message. Built once per transfer and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    version: u8,
    nonce: u32,
    origin_domain: u32,
    sender: CanonicalAddress,
    destination_domain: u32,
    recipient: CanonicalAddress,
    body: Vec<u8>,
}

impl Envelope {
    pub fn new(
        nonce: u32,
        origin_domain: u32,
        sender: CanonicalAddress,
        destination_domain: u32,
        recipient: CanonicalAddress,
        body: Vec<u8>,
    ) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            nonce,
            origin_domain,
            sender,
            destination_domain,
            recipient,
            body,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn origin_domain(&self) -> u32 {
        self.origin_domain
    }

    pub fn sender(&self) -> &CanonicalAddress {
        &self.sender
    }

    pub fn destination_domain(&self) -> u32 {
        self.destination_domain
    }

    pub fn recipient(&self) -> &CanonicalAddress {
        &self.recipient
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.body.len());
        out.push(self.version);
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.origin_domain.to_be_bytes());
        out.extend_from_slice(self.sender.as_bytes());
        out.extend_from_slice(&self.destination_domain.to_be_bytes());
        out.extend_from_slice(self.recipient.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::Truncated {
                what: "envelope header",
                needed: HEADER_LEN,
                available: bytes.len(),
            });
        }
        Ok(Self {
            version: bytes[0],
            nonce: read_u32(bytes, 1),
            origin_domain: read_u32(bytes, 5),
            sender: read_address(bytes, 9),
            destination_domain: read_u32(bytes, 41),
            recipient: read_address(bytes, 45),
            body: bytes[HEADER_LEN..].to_vec(),
        })
    }

    /// Interchain message identifier: keccak-256 of the encoded envelope
    pub fn message_id(&self) -> [u8; 32] {
        keccak256(&self.encode())
    }

    pub fn message_id_hex(&self) -> String {
        format!("0x{}", hex::encode(self.message_id()))
    }
}

/// Token-transfer payload carried in an envelope body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBody {
    recipient: CanonicalAddress,
    amount: BigUint,
    metadata: Vec<u8>,
}

impl TransferBody {
    /// Fails when `amount` does not fit in 256 bits.
    pub fn new(
        recipient: CanonicalAddress,
        amount: BigUint,
        metadata: Vec<u8>,
    ) -> Result<Self, CodecError> {
        if amount.bits() > 256 {
            return Err(CodecError::AmountOverflow {
                amount: amount.to_string(),
            });
        }
        Ok(Self {
            recipient,
            amount,
            metadata,
        })
    }

    pub fn recipient(&self) -> &CanonicalAddress {
        &self.recipient
    }

    pub fn amount(&self) -> &BigUint {
        &self.amount
    }

    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TRANSFER_BODY_PREFIX_LEN + self.metadata.len());
        out.extend_from_slice(self.recipient.as_bytes());

        let amount = self.amount.to_bytes_be();
        let mut word = [0u8; 32];
        word[32 - amount.len()..].copy_from_slice(&amount);
        out.extend_from_slice(&word);

        out.extend_from_slice(&self.metadata);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < TRANSFER_BODY_PREFIX_LEN {
            return Err(CodecError::Truncated {
                what: "transfer body",
                needed: TRANSFER_BODY_PREFIX_LEN,
                available: bytes.len(),
            });
        }
        Ok(Self {
            recipient: read_address(bytes, 0),
            amount: BigUint::from_bytes_be(&bytes[32..64]),
            metadata: bytes[TRANSFER_BODY_PREFIX_LEN..].to_vec(),
        })
    }
}
