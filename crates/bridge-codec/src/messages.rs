//! Forwarding and transfer messages
//!
//! Field numbers and wire types match the Hub's generated schema. All 32-byte
//! identifiers (token ids, recipients, hook ids) are written as 66-character
//! `0x`-prefixed hex strings, never as raw bytes.
//!
//! ```text
//! Coin                      { denom: string = 1, amount: string = 2 }
//! RemoteTransferInstruction { sender = 1, token_id = 2, destination_domain: varint = 3,
//!                             recipient = 4, amount = 5, custom_hook_id = 6,
//!                             gas_limit = 7, max_fee: Coin = 8, custom_hook_metadata = 9 }
//! IbcTransferInstruction    { source_port = 1, source_channel = 2, token: Coin = 3,
//!                             sender = 4, receiver = 5, timeout_height: Height = 6,
//!                             timeout_timestamp: varint = 7, memo = 8 }
//! ForwardToDirectChain      { transfer: RemoteTransferInstruction = 1 }
//! ForwardToIndirectChain    { transfer: IbcTransferInstruction = 1 }
//! ForwardingMetadata        { forward_to_indirect: bytes = 1, (2 reserved),
//!                             forward_to_direct: bytes = 3 }
//! CompletionHookCall        { name: string = 1, data: bytes = 2 }
//! ```

use bridge_core::CanonicalAddress;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::proto::{ProtoReader, ProtoWriter};

/// Protobuf type URL of a Hub-originated envelope transfer
pub const MSG_REMOTE_TRANSFER_TYPE_URL: &str = "/hyperlane.warp.v1.MsgRemoteTransfer";
/// Protobuf type URL of a relayed transfer
pub const MSG_IBC_TRANSFER_TYPE_URL: &str = "/ibc.applications.transfer.v1.MsgTransfer";

fn parse_canonical(field: u32, value: &str) -> Result<CanonicalAddress, CodecError> {
    if value.len() != 66 || !value.starts_with("0x") {
        return Err(CodecError::malformed(
            "identifier field",
            format!("field {field}: expected 66-character 0x hex, got {} characters", value.len()),
        ));
    }
    CanonicalAddress::from_hex(value)
        .map_err(|e| CodecError::malformed("identifier field", format!("field {field}: {e}")))
}

fn parse_amount(field: u32, value: &str) -> Result<BigUint, CodecError> {
    if value.is_empty() {
        return Ok(BigUint::default());
    }
    value
        .parse::<BigUint>()
        .map_err(|e| CodecError::malformed("amount field", format!("field {field}: {e}")))
}

/// Token amount with its denomination
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "bridge_core::decimal_amount")]
    pub amount: BigUint,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: BigUint) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        ProtoWriter::new()
            .string(1, &self.denom)
            .string(2, &self.amount.to_string())
            .finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut coin = Coin::default();
        for field in ProtoReader::new(bytes) {
            let (number, value) = field?;
            match number {
                1 => coin.denom = value.as_string(1)?,
                2 => coin.amount = parse_amount(2, &value.as_string(2)?)?,
                _ => {}
            }
        }
        Ok(coin)
    }
}

/// Envelope-protocol transfer executed by the Hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTransferInstruction {
    /// Hub account; left empty inside forwarding hooks, where the Hub fills it in
    pub sender: String,
    pub token_id: CanonicalAddress,
    pub destination_domain: u32,
    pub recipient: CanonicalAddress,
    pub amount: BigUint,
    pub custom_hook_id: Option<CanonicalAddress>,
    pub gas_limit: BigUint,
    pub max_fee: Coin,
    pub custom_hook_metadata: Option<String>,
}

impl RemoteTransferInstruction {
    pub fn encode(&self) -> Vec<u8> {
        let hook_id = self.custom_hook_id.map(|h| h.to_hex());
        ProtoWriter::new()
            .string(1, &self.sender)
            .string(2, &self.token_id.to_hex())
            .uint(3, u64::from(self.destination_domain))
            .string(4, &self.recipient.to_hex())
            .string(5, &self.amount.to_string())
            .string(6, hook_id.as_deref().unwrap_or_default())
            .string(7, &self.gas_limit.to_string())
            .message(8, &self.max_fee.encode())
            .string(9, self.custom_hook_metadata.as_deref().unwrap_or_default())
            .finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut sender = String::new();
        let mut token_id = None;
        let mut destination_domain = 0u32;
        let mut recipient = None;
        let mut amount = BigUint::default();
        let mut custom_hook_id = None;
        let mut gas_limit = BigUint::default();
        let mut max_fee = Coin::default();
        let mut custom_hook_metadata = None;

        for field in ProtoReader::new(bytes) {
            let (number, value) = field?;
            match number {
                1 => sender = value.as_string(1)?,
                2 => token_id = Some(parse_canonical(2, &value.as_string(2)?)?),
                3 => {
                    destination_domain = u32::try_from(value.as_u64(3)?).map_err(|_| {
                        CodecError::malformed("destination domain", "exceeds u32")
                    })?
                }
                4 => recipient = Some(parse_canonical(4, &value.as_string(4)?)?),
                5 => amount = parse_amount(5, &value.as_string(5)?)?,
                6 => custom_hook_id = Some(parse_canonical(6, &value.as_string(6)?)?),
                7 => gas_limit = parse_amount(7, &value.as_string(7)?)?,
                8 => max_fee = Coin::decode(value.as_bytes(8)?)?,
                9 => custom_hook_metadata = Some(value.as_string(9)?),
                _ => {}
            }
        }

        Ok(Self {
            sender,
            token_id: token_id
                .ok_or_else(|| CodecError::malformed("remote transfer", "missing token_id"))?,
            destination_domain,
            recipient: recipient
                .ok_or_else(|| CodecError::malformed("remote transfer", "missing recipient"))?,
            amount,
            custom_hook_id,
            gas_limit,
            max_fee,
            custom_hook_metadata,
        })
    }
}

/// Relay timeout height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Height {
    pub revision_number: u64,
    pub revision_height: u64,
}

impl Height {
    pub fn encode(&self) -> Vec<u8> {
        ProtoWriter::new()
            .uint(1, self.revision_number)
            .uint(2, self.revision_height)
            .finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut height = Height::default();
        for field in ProtoReader::new(bytes) {
            let (number, value) = field?;
            match number {
                1 => height.revision_number = value.as_u64(1)?,
                2 => height.revision_height = value.as_u64(2)?,
                _ => {}
            }
        }
        Ok(height)
    }
}

/// Relayed (channel-based) token transfer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IbcTransferInstruction {
    pub source_port: String,
    pub source_channel: String,
    pub token: Coin,
    pub sender: String,
    pub receiver: String,
    pub timeout_height: Height,
    pub timeout_timestamp: u64,
    pub memo: String,
}

impl IbcTransferInstruction {
    pub fn encode(&self) -> Vec<u8> {
        ProtoWriter::new()
            .string(1, &self.source_port)
            .string(2, &self.source_channel)
            .message(3, &self.token.encode())
            .string(4, &self.sender)
            .string(5, &self.receiver)
            .message(6, &self.timeout_height.encode())
            .uint(7, self.timeout_timestamp)
            .string(8, &self.memo)
            .finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut msg = IbcTransferInstruction::default();
        for field in ProtoReader::new(bytes) {
            let (number, value) = field?;
            match number {
                1 => msg.source_port = value.as_string(1)?,
                2 => msg.source_channel = value.as_string(2)?,
                3 => msg.token = Coin::decode(value.as_bytes(3)?)?,
                4 => msg.sender = value.as_string(4)?,
                5 => msg.receiver = value.as_string(5)?,
                6 => msg.timeout_height = Height::decode(value.as_bytes(6)?)?,
                7 => msg.timeout_timestamp = value.as_u64(7)?,
                8 => msg.memo = value.as_string(8)?,
                _ => {}
            }
        }
        Ok(msg)
    }
}

/// Hub instruction: continue over the envelope protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardToDirectChain {
    pub transfer: RemoteTransferInstruction,
}

impl ForwardToDirectChain {
    pub fn encode(&self) -> Vec<u8> {
        ProtoWriter::new()
            .message(1, &self.transfer.encode())
            .finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let inner = single_message_field(bytes, "forward to direct chain")?;
        Ok(Self {
            transfer: RemoteTransferInstruction::decode(inner)?,
        })
    }
}

/// Hub instruction: continue over the relay transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardToIndirectChain {
    pub transfer: IbcTransferInstruction,
}

impl ForwardToIndirectChain {
    pub fn encode(&self) -> Vec<u8> {
        ProtoWriter::new()
            .message(1, &self.transfer.encode())
            .finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let inner = single_message_field(bytes, "forward to indirect chain")?;
        Ok(Self {
            transfer: IbcTransferInstruction::decode(inner)?,
        })
    }
}

fn single_message_field<'a>(bytes: &'a [u8], what: &'static str) -> Result<&'a [u8], CodecError> {
    let mut found = None;
    for field in ProtoReader::new(bytes) {
        let (number, value) = field?;
        if number == 1 {
            found = Some(value.as_bytes(1)?);
        }
    }
    found.ok_or_else(|| CodecError::malformed(what, "missing field 1"))
}

/// Forwarding instruction carried in a transfer body's metadata.
///
/// At most one of the two sub-fields is populated; each holds a pre-encoded
/// `ForwardTo*` message. Field 2 is reserved and never written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForwardingMetadata {
    pub forward_to_indirect: Option<Vec<u8>>,
    pub forward_to_direct: Option<Vec<u8>>,
}

impl ForwardingMetadata {
    pub fn to_direct(forward: &ForwardToDirectChain) -> Self {
        Self {
            forward_to_indirect: None,
            forward_to_direct: Some(forward.encode()),
        }
    }

    pub fn to_indirect(forward: &ForwardToIndirectChain) -> Self {
        Self {
            forward_to_indirect: Some(forward.encode()),
            forward_to_direct: None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        ProtoWriter::new()
            .optional_bytes(1, self.forward_to_indirect.as_deref())
            .optional_bytes(3, self.forward_to_direct.as_deref())
            .finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut metadata = ForwardingMetadata::default();
        for field in ProtoReader::new(bytes) {
            let (number, value) = field?;
            match number {
                1 => metadata.forward_to_indirect = Some(value.as_bytes(1)?.to_vec()),
                3 => metadata.forward_to_direct = Some(value.as_bytes(3)?.to_vec()),
                _ => {}
            }
        }
        if metadata.forward_to_indirect.is_some() && metadata.forward_to_direct.is_some() {
            return Err(CodecError::malformed(
                "forwarding metadata",
                "both onward instructions are set",
            ));
        }
        Ok(metadata)
    }
}

/// Named hook invoked by the Hub once a relayed transfer completes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionHookCall {
    pub name: String,
    pub data: Vec<u8>,
}

impl CompletionHookCall {
    pub fn encode(&self) -> Vec<u8> {
        ProtoWriter::new()
            .string(1, &self.name)
            .bytes(2, &self.data)
            .finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut call = CompletionHookCall::default();
        for field in ProtoReader::new(bytes) {
            let (number, value) = field?;
            match number {
                1 => call.name = value.as_string(1)?,
                2 => call.data = value.as_bytes(2)?.to_vec(),
                _ => {}
            }
        }
        Ok(call)
    }
}
