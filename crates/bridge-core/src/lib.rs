//! bridge-core: Shared types, errors, registry and configuration
//!
//! This crate provides the foundational types used across the Hub bridge workspace.

pub mod config;
pub mod decimal_amount;
pub mod errors;
pub mod registry;
pub mod types;

pub use config::*;
pub use errors::*;
pub use registry::{fallback_registry, Registry, HUB_CHAIN};
pub use types::*;
