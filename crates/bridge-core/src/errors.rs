//! Error types for the Hub bridge toolkit

use num_bigint::BigUint;
use std::fmt;
use thiserror::Error;

/// Kind of registry entity a lookup failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Chain,
    Token,
    TokenAddress,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chain => "chain",
            Self::Token => "token",
            Self::TokenAddress => "token address",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by the interchain transfer core.
///
/// Every variant is terminal and detected locally. Nothing in the core retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("Invalid {what}: {reason}")]
    InvalidFormat { what: String, reason: String },

    #[error("Unknown {kind}: {name}")]
    UnknownEntity { kind: EntityKind, name: String },

    #[error("Insufficient budget: need {required}, have {available} (short by {shortfall})")]
    InsufficientBudget {
        required: BigUint,
        available: BigUint,
        shortfall: BigUint,
    },

    #[error("No forwarding path from {from} to {to}")]
    UnsupportedRoute { from: String, to: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Send amount did not converge after {iterations} refinements")]
    NoConvergence { iterations: usize },
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    pub fn invalid_format(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            what: what.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::UnknownEntity {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }

    /// Budget error for `available < required`, carrying the exact shortfall.
    pub fn insufficient_budget(required: BigUint, available: BigUint) -> Self {
        let shortfall = if required > available {
            &required - &available
        } else {
            BigUint::default()
        };
        Self::InsufficientBudget {
            required,
            available,
            shortfall,
        }
    }

    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "invalid_format",
            Self::UnknownEntity { .. } => "unknown_entity",
            Self::InsufficientBudget { .. } => "insufficient_budget",
            Self::UnsupportedRoute { .. } => "unsupported_route",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::NoConvergence { .. } => "no_convergence",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidFormat { .. } | Self::InvalidAmount { .. } => 400,
            Self::UnknownEntity { .. } => 404,
            Self::InsufficientBudget { .. } | Self::UnsupportedRoute { .. } => 422,
            Self::NoConvergence { .. } => 500,
        }
    }
}
