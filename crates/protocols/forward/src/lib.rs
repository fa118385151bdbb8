//! Hub Forwarding
//!
//! Moves tokens between chains that only share a connection to the Hub. A
//! transfer either starts or ends on the Hub (one hop), or lands on the Hub and
//! is forwarded onward in the same operation (two hops).
//!
//! The first hop's fees come out of the input amount. Whatever reaches the Hub
//! is the Hub budget, which has to cover the outbound gas payment, the
//! outbound bridging fee and the forwarded amount.

pub mod calculator;
pub mod constants;
pub mod rate;
pub mod route;
pub mod state;
pub mod tx_builder;
pub mod validate;

pub use calculator::{
    amount_after_fee, bridging_fee, eibc_withdrawal, forward, send_amount_for_desired,
    send_amount_for_desired_forward, EibcWithdrawal, ForwardingPlan, Hop1Fees, Hop1Rates,
    Hop2Fees, Hop2Params,
};
pub use rate::Rate;
pub use route::{classify_route, Route, RouteKind, RouteMode, RoutePath};
pub use state::{
    bridge_state, fee_info, format_amount, BridgeFeeInfo, BridgeTokenInfo, ChainInfo,
    HubBridgeState,
};
pub use tx_builder::{
    build_transfer, CallArg, ContractCall, CosmosMsg, KaspaDeposit, TransferBuildResult,
    TransferPayload, TransferRequest, TransferSummary,
};
pub use validate::{validate_address, validate_hub_fallback, validate_recipient};
