//! Codec errors

use bridge_core::BridgeError;

/// Errors from address normalization and wire encoding/decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid {format} address: {reason}")]
    InvalidAddress { format: &'static str, reason: String },

    #[error("Truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Amount {amount} does not fit in 256 bits")]
    AmountOverflow { amount: String },

    #[error("Field {field}: unexpected wire type {wire_type}")]
    UnexpectedWireType { field: u32, wire_type: u8 },

    #[error("Invalid UTF-8 in field {field}")]
    InvalidUtf8 { field: u32 },

    #[error("Malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },
}

impl CodecError {
    pub(crate) fn address(format: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            format,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            reason: reason.into(),
        }
    }

    fn subject(&self) -> String {
        match self {
            Self::InvalidAddress { format, .. } => format!("{format} address"),
            Self::Truncated { what, .. } | Self::Malformed { what, .. } => what.to_string(),
            Self::AmountOverflow { .. } => "amount".to_string(),
            Self::UnexpectedWireType { .. } | Self::InvalidUtf8 { .. } => {
                "protobuf message".to_string()
            }
        }
    }
}

impl From<CodecError> for BridgeError {
    fn from(e: CodecError) -> Self {
        BridgeError::invalid_format(e.subject(), e.to_string())
    }
}
