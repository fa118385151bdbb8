//! Hub forwarding constants

use num_bigint::BigUint;

use bridge_core::constants::RATE_SCALE_DECIMALS;

/// Upper bound on inverse-fee refinement passes
pub const MAX_REFINEMENTS: usize = 10;

/// Native denomination of Hub gas payments
pub const HUB_FEE_DENOM: &str = "adym";

/// Token router call on EVM sources, plain transfer
pub const EVM_TRANSFER_REMOTE: &str = "transferRemote";
/// Token router call on EVM sources, with forwarding metadata
pub const EVM_TRANSFER_REMOTE_MEMO: &str = "transferRemoteMemo";
/// Warp program instruction on Solana sources, plain transfer
pub const SOLANA_TRANSFER_REMOTE: &str = "transfer_remote";
/// Warp program instruction on Solana sources, with forwarding metadata
pub const SOLANA_TRANSFER_REMOTE_MEMO: &str = "transfer_remote_memo";

/// Fixed-point scale for rates (10^18)
pub fn rate_scale() -> BigUint {
    BigUint::from(10u32).pow(RATE_SCALE_DECIMALS)
}
