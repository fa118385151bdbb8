//! Bridge-codec: address normalization and interchain wire formats
//!
//! Every chain's native address is mapped to a 32-byte canonical identifier
//! before it is embedded in a message. Two binary formats are produced: the
//! fixed-layout envelope with its token-transfer body, and the hand-framed
//! protobuf messages the Hub uses for forwarding instructions.

pub mod address;
pub mod envelope;
pub mod error;
pub mod hook;
pub mod messages;
pub mod proto;

pub use address::{
    decode_to_base58, decode_to_bech32, decode_to_evm, encode_from_base58_pubkey,
    encode_from_bech32, encode_from_bech32m_schnorr, encode_from_evm, encode_native,
    is_canonical, kaspa_address_to_canonical,
};
pub use envelope::{keccak256, Envelope, TransferBody, HEADER_LEN};
pub use error::CodecError;
pub use hook::{
    withdrawal_memo, CompletionMemo, HOOK_FORWARD_TO_DIRECT, HOOK_FORWARD_TO_INDIRECT,
};
pub use messages::{
    Coin, CompletionHookCall, ForwardToDirectChain, ForwardToIndirectChain, ForwardingMetadata,
    Height, IbcTransferInstruction, RemoteTransferInstruction, MSG_IBC_TRANSFER_TYPE_URL,
    MSG_REMOTE_TRANSFER_TYPE_URL,
};
