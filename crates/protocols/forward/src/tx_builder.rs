//! Transfer payload builder
//!
//! Turns a transfer request into an unsigned, chain-native payload:
//!
//! - `ContractCall`: token-router call on EVM and Solana sources
//! - `KaspaDeposit`: escrow payment carrying an encoded envelope
//! - `CosmosMsg`: protobuf message for the Hub or a relay-connected chain
//!
//! Two-hop routes embed the Hub's onward instruction in the first hop: as
//! `ForwardingMetadata` in the transfer body for envelope sources, or as a
//! completion-hook memo for relayed sources. Signing and broadcast are left to
//! the caller.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::Serialize;

use bridge_codec::{
    decode_to_bech32, encode_from_bech32, encode_from_bech32m_schnorr, encode_native,
    withdrawal_memo, Coin, CompletionHookCall, CompletionMemo, Envelope, ForwardToDirectChain,
    ForwardToIndirectChain, ForwardingMetadata, Height, IbcTransferInstruction,
    RemoteTransferInstruction, TransferBody, MSG_IBC_TRANSFER_TYPE_URL,
    MSG_REMOTE_TRANSFER_TYPE_URL,
};
use bridge_core::constants::TRANSFER_PORT;
use bridge_core::{
    AddressFormat, BridgeConfig, BridgeError, CanonicalAddress, Chain, ChainDescriptor, Network,
    Registry, Result, Settlement, TokenDescriptor,
};
use fee_quote::{FeeQuote, IgpQuote};

use crate::calculator::{
    amount_after_fee, bridging_fee, eibc_withdrawal, forward, ForwardingPlan, Hop1Rates,
    Hop2Params,
};
use crate::constants::{
    EVM_TRANSFER_REMOTE, EVM_TRANSFER_REMOTE_MEMO, HUB_FEE_DENOM, SOLANA_TRANSFER_REMOTE,
    SOLANA_TRANSFER_REMOTE_MEMO,
};
use crate::rate::Rate;
use crate::route::{classify_route, Route, RouteKind, RoutePath};
use crate::validate::{validate_address, validate_hub_fallback, validate_recipient};

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }
}

/// Request to build a transfer
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Token symbol
    pub token: String,
    /// Amount in token base units
    pub amount: BigUint,
    pub from_chain: String,
    pub to_chain: String,
    /// Sender's address on the source chain
    pub sender: String,
    /// Recipient's address on the destination chain
    pub recipient: String,
    /// Hub account that receives the funds if forwarding fails. Derived from
    /// the sender for bech32 sources when absent.
    pub hub_fallback: Option<String>,
    /// Native value attached to source contract calls (source-side gas payment)
    pub source_gas_payment: BigUint,
    /// Envelope nonce for deposits that carry a raw envelope
    pub nonce: u32,
    /// Current time, for relay timeouts
    pub now_nanos: u64,
}

/// Typed argument of a contract call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CallArg {
    Uint32(u32),
    Uint256(#[serde(serialize_with = "bridge_core::decimal_amount::serialize")] BigUint),
    Bytes32(CanonicalAddress),
    Bytes(#[serde(serialize_with = "hex_bytes::serialize")] Vec<u8>),
}

/// Token-router call on a smart-contract chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCall {
    pub chain: String,
    /// Router contract (EVM) or warp program (Solana)
    pub contract: String,
    pub method: String,
    pub args: Vec<CallArg>,
    /// Native value sent with the call
    #[serde(serialize_with = "bridge_core::decimal_amount::serialize")]
    pub value: BigUint,
}

/// Payment to the Kaspa escrow carrying an encoded envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KaspaDeposit {
    pub escrow: String,
    #[serde(serialize_with = "bridge_core::decimal_amount::serialize")]
    pub amount: BigUint,
    #[serde(serialize_with = "hex_bytes::serialize")]
    pub payload: Vec<u8>,
    pub message_id: String,
}

/// Protobuf message for a Cosmos-style chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmosMsg {
    pub chain: String,
    pub type_url: String,
    #[serde(serialize_with = "hex_bytes::serialize")]
    pub value: Vec<u8>,
}

/// Unsigned payload for the source chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransferPayload {
    ContractCall(ContractCall),
    KaspaDeposit(KaspaDeposit),
    CosmosMsg(CosmosMsg),
}

impl TransferPayload {
    fn describe(&self) -> (&'static str, usize) {
        match self {
            Self::ContractCall(call) => ("contract call", call.args.len()),
            Self::KaspaDeposit(deposit) => ("kaspa deposit", deposit.payload.len()),
            Self::CosmosMsg(msg) => ("cosmos msg", msg.value.len()),
        }
    }
}

/// Summary of a transfer for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub token: String,
    pub route: Route,
    #[serde(serialize_with = "bridge_core::decimal_amount::serialize")]
    pub amount: BigUint,
    pub recipient: String,
    #[serde(serialize_with = "bridge_core::decimal_amount::serialize")]
    pub recipient_receives: BigUint,
    /// Fee budget paid out of the Hub leg, in `fee_denom`
    #[serde(serialize_with = "bridge_core::decimal_amount::option::serialize")]
    pub max_fee: Option<BigUint>,
    pub fee_denom: Option<String>,
    pub hub_fallback: Option<String>,
}

/// Result of building a transfer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBuildResult {
    pub payload: TransferPayload,
    pub summary: TransferSummary,
    /// Present for two-hop routes
    pub plan: Option<ForwardingPlan>,
}

impl std::fmt::Display for TransferBuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Transfer {} {} from {} to {} ({})",
            self.summary.amount,
            self.summary.token,
            self.summary.route.from,
            self.summary.route.to,
            self.summary.recipient
        )
    }
}

/// Resolved inputs shared by the route builders
struct BuildContext<'a> {
    request: &'a TransferRequest,
    config: &'a BridgeConfig,
    network: Network,
    token: &'a TokenDescriptor,
    from: &'a Chain,
    to: &'a Chain,
    hub: &'a Chain,
}

/// Onward instruction the Hub executes for a two-hop route
enum HubForward {
    Direct(ForwardToDirectChain),
    Indirect(ForwardToIndirectChain),
}

struct Built {
    payload: TransferPayload,
    recipient_receives: BigUint,
    max_fee: Option<(BigUint, String)>,
    hub_fallback: Option<String>,
    plan: Option<ForwardingPlan>,
}

/// Build the unsigned payload for a transfer.
///
/// Validation runs before any routing: the token must exist on both
/// endpoints, and sender and recipient must match their chains' formats.
pub fn build_transfer(
    registry: &Registry,
    config: &BridgeConfig,
    request: &TransferRequest,
    quote: &FeeQuote,
) -> Result<TransferBuildResult> {
    if request.amount.is_zero() {
        return Err(BridgeError::invalid_amount("amount must be positive"));
    }

    let network = config.network;
    let from = registry.chain(&request.from_chain)?;
    let to = registry.chain(&request.to_chain)?;
    let hub = registry.hub()?;
    let token = registry.token(&request.token)?;

    token.address_on(&from.name, network)?;
    token.address_on(&to.name, network)?;
    validate_address(from, &request.sender, network, "sender")?;
    validate_recipient(to, &request.recipient, network)?;

    let route = classify_route(from, to)?;
    tracing::info!(
        token = %token.symbol,
        from = %from.name,
        to = %to.name,
        path = ?route.path,
        "Building transfer"
    );

    let ctx = BuildContext {
        request,
        config,
        network,
        token,
        from,
        to,
        hub,
    };

    let built = match route.path {
        RoutePath::FromHub => build_from_hub(&ctx, quote)?,
        RoutePath::ToHub => build_to_hub(&ctx, quote)?,
        RoutePath::ViaHub(kind) => build_via_hub(&ctx, kind, quote)?,
    };

    let (kind, size) = built.payload.describe();
    tracing::debug!(payload = kind, size, "Built transfer payload");

    let (max_fee, fee_denom) = match built.max_fee {
        Some((fee, denom)) => (Some(fee), Some(denom)),
        None => (None, None),
    };

    Ok(TransferBuildResult {
        payload: built.payload,
        summary: TransferSummary {
            token: token.symbol.clone(),
            route,
            amount: request.amount.clone(),
            recipient: request.recipient.clone(),
            recipient_receives: built.recipient_receives,
            max_fee,
            fee_denom,
            hub_fallback: built.hub_fallback,
        },
        plan: built.plan,
    })
}

fn parse_rate(value: &str) -> Result<Rate> {
    Rate::from_decimal_str(value)
}

/// IGP quote for `domain`; required whenever the Hub sends an envelope
fn require_igp(quote: &FeeQuote, domain: u32) -> Result<&IgpQuote> {
    let igp = quote.igp.as_ref().ok_or_else(|| {
        BridgeError::invalid_format("fee quote", format!("missing IGP quote for domain {domain}"))
    })?;
    if igp.domain != domain {
        return Err(BridgeError::invalid_format(
            "fee quote",
            format!("IGP quote is for domain {}, destination is {domain}", igp.domain),
        ));
    }
    Ok(igp)
}

fn relay_channel<'a>(chain: &'a Chain, outbound: bool) -> Result<&'a str> {
    match &chain.descriptor {
        ChainDescriptor::IndirectChain {
            forward_channel_out,
            forward_channel_in,
            ..
        } => Ok(if outbound {
            forward_channel_out.as_str()
        } else {
            forward_channel_in.as_str()
        }),
        _ => Err(BridgeError::UnsupportedRoute {
            from: chain.name.clone(),
            to: "relay transport".to_string(),
        }),
    }
}

/// Envelope transfer executed by the Hub towards the destination chain
fn hub_remote_transfer(
    ctx: &BuildContext<'_>,
    sender: String,
    amount: BigUint,
    igp: &IgpQuote,
    max_fee: BigUint,
) -> Result<RemoteTransferInstruction> {
    let destination_domain = ctx.to.require_domain(ctx.network)?;
    let recipient = encode_native(&ctx.request.recipient, &ctx.to.descriptor.address_format())?;
    Ok(RemoteTransferInstruction {
        sender,
        token_id: ctx.token.canonical_id,
        destination_domain,
        recipient,
        amount,
        custom_hook_id: igp.hook_id,
        gas_limit: BigUint::from(igp.gas_limit),
        max_fee: Coin::new(igp.fee_denom.clone(), max_fee),
        custom_hook_metadata: None,
    })
}

/// Relayed transfer out of the Hub towards the destination chain
fn hub_relay_transfer(
    ctx: &BuildContext<'_>,
    sender: String,
    amount: BigUint,
) -> Result<IbcTransferInstruction> {
    Ok(IbcTransferInstruction {
        source_port: TRANSFER_PORT.to_string(),
        source_channel: relay_channel(ctx.to, true)?.to_string(),
        token: Coin::new(ctx.token.address_on(&ctx.hub.name, ctx.network)?, amount),
        sender,
        receiver: ctx.request.recipient.clone(),
        timeout_height: Height::default(),
        timeout_timestamp: ctx.config.timeout_timestamp(ctx.request.now_nanos),
        memo: String::new(),
    })
}

fn build_from_hub(ctx: &BuildContext<'_>, quote: &FeeQuote) -> Result<Built> {
    let amount = ctx.request.amount.clone();

    match &ctx.to.descriptor {
        ChainDescriptor::IndirectChain { .. } => {
            let msg = hub_relay_transfer(ctx, ctx.request.sender.clone(), amount.clone())?;
            Ok(Built {
                payload: TransferPayload::CosmosMsg(CosmosMsg {
                    chain: ctx.hub.name.clone(),
                    type_url: MSG_IBC_TRANSFER_TYPE_URL.to_string(),
                    value: msg.encode(),
                }),
                recipient_receives: amount,
                max_fee: None,
                hub_fallback: None,
                plan: None,
            })
        }
        _ => {
            let domain = ctx.to.require_domain(ctx.network)?;
            let igp = require_igp(quote, domain)?;
            let outbound = parse_rate(&quote.bridge.outbound_rate)?;
            let max_fee = &igp.fee + bridging_fee(&amount, &outbound);

            let msg = hub_remote_transfer(
                ctx,
                ctx.request.sender.clone(),
                amount.clone(),
                igp,
                max_fee.clone(),
            )?;
            Ok(Built {
                payload: TransferPayload::CosmosMsg(CosmosMsg {
                    chain: ctx.hub.name.clone(),
                    type_url: MSG_REMOTE_TRANSFER_TYPE_URL.to_string(),
                    value: msg.encode(),
                }),
                recipient_receives: amount,
                max_fee: Some((max_fee, igp.fee_denom.clone())),
                hub_fallback: None,
                plan: None,
            })
        }
    }
}

/// Source-chain call delivering `amount` to `hub_recipient` over the envelope
/// protocol, optionally carrying forwarding metadata.
fn envelope_source_payload(
    ctx: &BuildContext<'_>,
    hub_recipient: CanonicalAddress,
    amount: &BigUint,
    metadata: Option<Vec<u8>>,
) -> Result<TransferPayload> {
    let hub_domain = ctx.hub.require_domain(ctx.network)?;
    let router = ctx.token.address_on(&ctx.from.name, ctx.network)?;

    let contract_call = |method: &str| {
        let mut args = vec![
            CallArg::Uint32(hub_domain),
            CallArg::Bytes32(hub_recipient),
            CallArg::Uint256(amount.clone()),
        ];
        if let Some(bytes) = &metadata {
            args.push(CallArg::Bytes(bytes.clone()));
        }
        TransferPayload::ContractCall(ContractCall {
            chain: ctx.from.name.clone(),
            contract: router.to_string(),
            method: method.to_string(),
            args,
            value: ctx.request.source_gas_payment.clone(),
        })
    };

    match ctx.from.descriptor.address_format() {
        AddressFormat::Evm => Ok(contract_call(if metadata.is_some() {
            EVM_TRANSFER_REMOTE_MEMO
        } else {
            EVM_TRANSFER_REMOTE
        })),
        AddressFormat::Base58Pubkey => Ok(contract_call(if metadata.is_some() {
            SOLANA_TRANSFER_REMOTE_MEMO
        } else {
            SOLANA_TRANSFER_REMOTE
        })),
        AddressFormat::KaspaBech32m => {
            let body = TransferBody::new(
                hub_recipient,
                amount.clone(),
                metadata.clone().unwrap_or_default(),
            )?;
            let envelope = Envelope::new(
                ctx.request.nonce,
                ctx.from.require_domain(ctx.network)?,
                encode_from_bech32m_schnorr(&ctx.request.sender)?,
                hub_domain,
                ctx.token.canonical_id,
                body.encode(),
            );
            Ok(TransferPayload::KaspaDeposit(KaspaDeposit {
                escrow: router.to_string(),
                amount: amount.clone(),
                message_id: envelope.message_id_hex(),
                payload: envelope.encode(),
            }))
        }
        AddressFormat::Bech32 { .. } => Err(BridgeError::UnsupportedRoute {
            from: ctx.from.name.clone(),
            to: ctx.hub.name.clone(),
        }),
    }
}

/// Relayed transfer from an indirect source into the Hub
fn relay_source_payload(
    ctx: &BuildContext<'_>,
    receiver: String,
    memo: String,
) -> Result<TransferPayload> {
    let msg = IbcTransferInstruction {
        source_port: TRANSFER_PORT.to_string(),
        source_channel: relay_channel(ctx.from, false)?.to_string(),
        token: Coin::new(
            ctx.token.address_on(&ctx.from.name, ctx.network)?,
            ctx.request.amount.clone(),
        ),
        sender: ctx.request.sender.clone(),
        receiver,
        timeout_height: Height::default(),
        timeout_timestamp: ctx.config.timeout_timestamp(ctx.request.now_nanos),
        memo,
    };
    Ok(TransferPayload::CosmosMsg(CosmosMsg {
        chain: ctx.from.name.clone(),
        type_url: MSG_IBC_TRANSFER_TYPE_URL.to_string(),
        value: msg.encode(),
    }))
}

/// Single hop into the Hub. The recipient gets what is left after the
/// inbound fee, or after the withdrawal fees for an incentivized source.
fn build_to_hub(ctx: &BuildContext<'_>, quote: &FeeQuote) -> Result<Built> {
    let amount = &ctx.request.amount;
    let (payload, recipient_receives) = match &ctx.from.descriptor {
        ChainDescriptor::IndirectChain {
            settlement: Settlement::Incentivized,
            ..
        } => {
            let eibc = quote.eibc.as_ref().ok_or_else(|| {
                BridgeError::invalid_format(
                    "fee quote",
                    format!("missing withdrawal fee quote for {}", ctx.from.name),
                )
            })?;
            let withdrawal = eibc_withdrawal(
                amount,
                &parse_rate(&eibc.eibc_percent)?,
                &parse_rate(&eibc.delayed_ack_rate)?,
            )?;
            tracing::debug!(
                eibc_fee = %withdrawal.eibc_fee,
                bridging_fee = %withdrawal.bridging_fee,
                "Priced incentivized withdrawal"
            );
            let memo = withdrawal_memo(&withdrawal.eibc_fee)?;
            (
                relay_source_payload(ctx, ctx.request.recipient.clone(), memo)?,
                withdrawal.recipient_receives,
            )
        }
        ChainDescriptor::IndirectChain { .. } => (
            relay_source_payload(ctx, ctx.request.recipient.clone(), String::new())?,
            amount.clone(),
        ),
        _ => {
            let inbound = parse_rate(&quote.bridge.inbound_rate)?;
            let recipient =
                encode_native(&ctx.request.recipient, &ctx.hub.descriptor.address_format())?;
            (
                envelope_source_payload(ctx, recipient, amount, None)?,
                amount_after_fee(amount, &inbound)?,
            )
        }
    };

    Ok(Built {
        payload,
        recipient_receives,
        max_fee: None,
        hub_fallback: None,
        plan: None,
    })
}

/// Caller-supplied fallback, or the sender re-prefixed for bech32 sources
fn resolve_hub_fallback(ctx: &BuildContext<'_>) -> Result<String> {
    if let Some(fallback) = &ctx.request.hub_fallback {
        return Ok(fallback.clone());
    }
    let hub_format = ctx.hub.descriptor.address_format();
    match (ctx.from.descriptor.address_format(), hub_format) {
        (AddressFormat::Bech32 { prefix }, AddressFormat::Bech32 { prefix: hub_prefix }) => {
            let canonical = encode_from_bech32(&ctx.request.sender, Some(prefix.as_str()))?;
            Ok(decode_to_bech32(&canonical, &hub_prefix)?)
        }
        _ => Err(BridgeError::invalid_format(
            "hub fallback",
            format!(
                "a {} fallback address is required for transfers from {}",
                ctx.hub.display_name, ctx.from.display_name
            ),
        )),
    }
}

fn build_via_hub(ctx: &BuildContext<'_>, kind: RouteKind, quote: &FeeQuote) -> Result<Built> {
    let fallback = resolve_hub_fallback(ctx)?;
    let fallback_canonical = validate_hub_fallback(ctx.hub, &fallback)?;

    let hop1 = Hop1Rates {
        inbound_rate: parse_rate(&quote.bridge.inbound_rate)?,
        eibc_percent: match (&quote.eibc, kind) {
            (Some(eibc), _) => parse_rate(&eibc.eibc_percent)?,
            (None, RouteKind::IncentivizedHubDirect) => {
                return Err(BridgeError::invalid_format(
                    "fee quote",
                    format!("missing withdrawal fee quote for {}", ctx.from.name),
                ))
            }
            (None, _) => Rate::zero(),
        },
        delayed_ack_rate: match &quote.eibc {
            Some(eibc) => parse_rate(&eibc.delayed_ack_rate)?,
            None => Rate::zero(),
        },
    };

    let igp = if kind.is_fee_exempt() {
        None
    } else {
        Some(require_igp(quote, ctx.to.require_domain(ctx.network)?)?)
    };
    let hop2 = match igp {
        Some(igp) => Hop2Params {
            igp_fee: igp.fee.clone(),
            outbound_rate: parse_rate(&quote.bridge.outbound_rate)?,
            fee_hook_id: igp.hook_id,
            fee_denom: igp.fee_denom.clone(),
        },
        None => Hop2Params {
            fee_denom: HUB_FEE_DENOM.to_string(),
            ..Hop2Params::default()
        },
    };

    let plan = forward(&ctx.request.amount, kind, &hop1, &hop2)?;
    tracing::info!(
        route_kind = %kind,
        hub_budget = %plan.hub_budget,
        forward_amount = %plan.forward_amount,
        max_fee = %plan.max_fee,
        "Planned forwarding"
    );

    let onward = match igp {
        Some(igp) => HubForward::Direct(ForwardToDirectChain {
            transfer: hub_remote_transfer(
                ctx,
                String::new(),
                plan.forward_amount.clone(),
                igp,
                plan.max_fee.clone(),
            )?,
        }),
        None => HubForward::Indirect(ForwardToIndirectChain {
            transfer: hub_relay_transfer(ctx, String::new(), plan.forward_amount.clone())?,
        }),
    };

    let payload = match (&ctx.from.descriptor, onward) {
        (ChainDescriptor::IndirectChain { .. }, HubForward::Direct(onward)) => {
            let call = CompletionHookCall::forward_to_direct(&onward);
            let memo = match kind {
                RouteKind::IncentivizedHubDirect => CompletionMemo::Incentivized {
                    fee: plan.hop1_fees.eibc_fee.clone().unwrap_or_default(),
                    call,
                },
                _ => CompletionMemo::Relayed { call },
            };
            relay_source_payload(ctx, fallback.clone(), memo.to_json()?)?
        }
        (ChainDescriptor::IndirectChain { .. }, HubForward::Indirect(_)) => {
            return Err(BridgeError::UnsupportedRoute {
                from: ctx.from.name.clone(),
                to: ctx.to.name.clone(),
            })
        }
        (_, onward) => {
            let metadata = match onward {
                HubForward::Direct(f) => ForwardingMetadata::to_direct(&f),
                HubForward::Indirect(f) => ForwardingMetadata::to_indirect(&f),
            };
            envelope_source_payload(
                ctx,
                fallback_canonical,
                &ctx.request.amount,
                Some(metadata.encode()),
            )?
        }
    };

    Ok(Built {
        payload,
        recipient_receives: plan.recipient_receives.clone(),
        max_fee: Some((plan.max_fee.clone(), plan.hop2_fees.fee_denom.clone())),
        hub_fallback: Some(fallback),
        plan: Some(plan),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_codec::{decode_to_base58, CodecError};
    use bridge_core::{fallback_registry, EntityKind};
    use fee_quote::{BridgeFeeQuote, EibcQuote};

    const EVM_ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08";
    const HUB_ADDR: &str = "dym1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5dlqcrj";
    const HUB_ADDR_2: &str = "dym1z5tpwxqergd3c8g7ruszzg3rysjjvfeg665kty";
    const OSMO_ADDR: &str = "osmo1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5helwsw";
    const ROLLAPP_ADDR: &str = "ethm1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5yvzu97";
    const SOLANA_ADDR: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
    const KASPA_ADDR: &str = "kaspa:prztt2hd2txge07syjvhaz5j6l9ql6djhc9equela058rjm6vww0uwre5dulh";

    fn request(
        token: &str,
        from: &str,
        to: &str,
        sender: &str,
        recipient: &str,
    ) -> TransferRequest {
        TransferRequest {
            token: token.to_string(),
            amount: BigUint::from(1_000_000u32),
            from_chain: from.to_string(),
            to_chain: to.to_string(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            hub_fallback: None,
            source_gas_payment: BigUint::from(42u32),
            nonce: 5,
            now_nanos: 1_000,
        }
    }

    fn quote(domain: u32) -> FeeQuote {
        FeeQuote {
            igp: Some(IgpQuote {
                domain,
                gas_limit: 200_000,
                hook_id: None,
                fee: BigUint::from(1_000u32),
                fee_denom: "adym".to_string(),
            }),
            bridge: BridgeFeeQuote {
                inbound_rate: "0.001".to_string(),
                outbound_rate: "0.001".to_string(),
            },
            eibc: None,
        }
    }

    fn build(request: &TransferRequest, quote: &FeeQuote) -> Result<TransferBuildResult> {
        build_transfer(&fallback_registry(), &BridgeConfig::default(), request, quote)
    }

    fn cosmos(payload: &TransferPayload) -> &CosmosMsg {
        match payload {
            TransferPayload::CosmosMsg(msg) => msg,
            other => panic!("expected cosmos msg, got {other:?}"),
        }
    }

    fn contract(payload: &TransferPayload) -> &ContractCall {
        match payload {
            TransferPayload::ContractCall(call) => call,
            other => panic!("expected contract call, got {other:?}"),
        }
    }

    #[test]
    fn test_from_hub_to_direct_chain() {
        let req = request("USDC", "dymension", "base", HUB_ADDR, EVM_ADDR);
        let result = build(&req, &quote(8453)).unwrap();

        let msg = cosmos(&result.payload);
        assert_eq!(msg.type_url, MSG_REMOTE_TRANSFER_TYPE_URL);
        let decoded = RemoteTransferInstruction::decode(&msg.value).unwrap();
        assert_eq!(decoded.sender, HUB_ADDR);
        assert_eq!(decoded.destination_domain, 8453);
        assert_eq!(decoded.recipient, bridge_codec::encode_from_evm(EVM_ADDR).unwrap());
        assert_eq!(decoded.amount, BigUint::from(1_000_000u32));
        // igp + 0.1 % outbound
        assert_eq!(decoded.max_fee.amount, BigUint::from(2_000u32));
        assert_eq!(result.summary.recipient_receives, BigUint::from(1_000_000u32));
        assert!(result.plan.is_none());
    }

    #[test]
    fn test_from_hub_to_indirect_chain() {
        let req = request("USDC", "dymension", "osmosis", HUB_ADDR, OSMO_ADDR);
        let result = build(&req, &FeeQuote::default()).unwrap();

        let msg = cosmos(&result.payload);
        assert_eq!(msg.type_url, MSG_IBC_TRANSFER_TYPE_URL);
        let decoded = IbcTransferInstruction::decode(&msg.value).unwrap();
        assert_eq!(decoded.source_channel, "channel-2");
        assert_eq!(decoded.receiver, OSMO_ADDR);
        assert_eq!(decoded.timeout_timestamp, 1_000 + 3_600_000_000_000);
        assert!(decoded.memo.is_empty());
    }

    #[test]
    fn test_from_hub_requires_matching_igp_quote() {
        let req = request("USDC", "dymension", "base", HUB_ADDR, EVM_ADDR);
        assert!(build(&req, &FeeQuote::default()).is_err());
        assert!(build(&req, &quote(1)).is_err());
    }

    #[test]
    fn test_evm_to_hub() {
        let req = request("USDC", "base", "dymension", EVM_ADDR, HUB_ADDR);
        let result = build(&req, &FeeQuote::default()).unwrap();

        let call = contract(&result.payload);
        assert_eq!(call.method, EVM_TRANSFER_REMOTE);
        assert_eq!(call.value, BigUint::from(42u32));
        assert_eq!(call.args[0], CallArg::Uint32(1_570_310_961));
        assert_eq!(
            call.args[1],
            CallArg::Bytes32(encode_from_bech32(HUB_ADDR, Some("dym")).unwrap())
        );
        assert_eq!(call.args[2], CallArg::Uint256(BigUint::from(1_000_000u32)));
        assert_eq!(call.args.len(), 3);
    }

    #[test]
    fn test_kaspa_to_hub_envelope() {
        let req = request("KAS", "kaspa", "dymension", KASPA_ADDR, HUB_ADDR);
        let result = build(&req, &FeeQuote::default()).unwrap();

        let TransferPayload::KaspaDeposit(deposit) = &result.payload else {
            panic!("expected kaspa deposit");
        };
        assert_eq!(deposit.escrow, KASPA_ADDR);
        let envelope = Envelope::decode(&deposit.payload).unwrap();
        assert_eq!(envelope.nonce(), 5);
        assert_eq!(envelope.origin_domain(), 80_808_082);
        assert_eq!(envelope.destination_domain(), 1_570_310_961);
        assert_eq!(envelope.recipient(), &CanonicalAddress::new([0x22; 32]));
        assert_eq!(deposit.message_id, envelope.message_id_hex());

        let body = TransferBody::decode(envelope.body()).unwrap();
        assert_eq!(body.recipient(), &encode_from_bech32(HUB_ADDR, None).unwrap());
        assert_eq!(body.amount(), &BigUint::from(1_000_000u32));
        assert!(body.metadata().is_empty());
    }

    #[test]
    fn test_direct_to_hub_applies_inbound_fee() {
        let mut q = FeeQuote::default();
        q.bridge.inbound_rate = "0.01".to_string();
        let req = request("USDC", "base", "dymension", EVM_ADDR, HUB_ADDR);
        let result = build(&req, &q).unwrap();

        assert_eq!(result.summary.recipient_receives, BigUint::from(990_000u32));
        // The source still sends the full amount
        let call = contract(&result.payload);
        assert_eq!(call.args[2], CallArg::Uint256(BigUint::from(1_000_000u32)));
    }

    #[test]
    fn test_incentivized_withdrawal_to_hub() {
        let mut q = FeeQuote::default();
        q.eibc = Some(EibcQuote {
            eibc_percent: "0.15".to_string(),
            delayed_ack_rate: "0.001".to_string(),
        });
        let req = request("USDC", "rollapp", "dymension", ROLLAPP_ADDR, HUB_ADDR);
        let result = build(&req, &q).unwrap();

        assert_eq!(result.summary.recipient_receives, BigUint::from(997_500u32));
        let decoded = IbcTransferInstruction::decode(&cosmos(&result.payload).value).unwrap();
        assert_eq!(decoded.source_channel, "channel-0");
        assert_eq!(decoded.receiver, HUB_ADDR);
        assert_eq!(decoded.token.amount, BigUint::from(1_000_000u32));
        assert_eq!(decoded.memo, r#"{"eibc":{"fee":"1500"}}"#);
    }

    #[test]
    fn test_incentivized_withdrawal_to_hub_requires_eibc_quote() {
        let req = request("USDC", "rollapp", "dymension", ROLLAPP_ADDR, HUB_ADDR);
        let err = build(&req, &FeeQuote::default()).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidFormat { ref what, .. } if what == "fee quote"));
    }

    #[test]
    fn test_indirect_to_hub() {
        let req = request("USDC", "osmosis", "dymension", OSMO_ADDR, HUB_ADDR);
        let result = build(&req, &FeeQuote::default()).unwrap();
        let decoded = IbcTransferInstruction::decode(&cosmos(&result.payload).value).unwrap();
        assert_eq!(decoded.source_channel, "channel-19774");
        assert_eq!(decoded.receiver, HUB_ADDR);
        assert!(decoded.memo.is_empty());
        assert_eq!(result.summary.recipient_receives, BigUint::from(1_000_000u32));
    }

    #[test]
    fn test_evm_to_solana_via_hub() {
        let mut req = request("USDC", "base", "solana", EVM_ADDR, SOLANA_ADDR);
        req.hub_fallback = Some(HUB_ADDR_2.to_string());
        let result = build(&req, &quote(1_399_811_149)).unwrap();

        let plan = result.plan.clone().unwrap();
        assert_eq!(plan.route_kind, RouteKind::DirectHubDirect);
        assert_eq!(plan.hop1_fees.inbound_fee, BigUint::from(1_000u32));
        assert!(&plan.max_fee + &plan.forward_amount <= plan.hub_budget);

        let call = contract(&result.payload);
        assert_eq!(call.method, EVM_TRANSFER_REMOTE_MEMO);
        assert_eq!(
            call.args[1],
            CallArg::Bytes32(encode_from_bech32(HUB_ADDR_2, None).unwrap())
        );
        let CallArg::Bytes(metadata) = &call.args[3] else {
            panic!("expected metadata argument");
        };
        let metadata = ForwardingMetadata::decode(metadata).unwrap();
        assert!(metadata.forward_to_indirect.is_none());
        let onward = ForwardToDirectChain::decode(&metadata.forward_to_direct.unwrap()).unwrap();
        assert_eq!(onward.transfer.destination_domain, 1_399_811_149);
        assert_eq!(decode_to_base58(&onward.transfer.recipient), SOLANA_ADDR);
        assert_eq!(onward.transfer.amount, plan.forward_amount);
        assert_eq!(onward.transfer.max_fee.amount, plan.max_fee);
        assert_eq!(result.summary.hub_fallback.as_deref(), Some(HUB_ADDR_2));
    }

    #[test]
    fn test_evm_to_indirect_is_fee_exempt() {
        let mut req = request("USDC", "base", "osmosis", EVM_ADDR, OSMO_ADDR);
        req.hub_fallback = Some(HUB_ADDR.to_string());
        // IGP quote for another domain is ignored on a fee-exempt leg
        let result = build(&req, &quote(8453)).unwrap();

        let plan = result.plan.unwrap();
        assert_eq!(plan.max_fee, BigUint::zero());
        assert_eq!(plan.forward_amount, BigUint::from(999_000u32));

        let CallArg::Bytes(metadata) = &contract(&result.payload).args[3] else {
            panic!("expected metadata argument");
        };
        let metadata = ForwardingMetadata::decode(metadata).unwrap();
        let onward =
            ForwardToIndirectChain::decode(&metadata.forward_to_indirect.unwrap()).unwrap();
        assert_eq!(onward.transfer.source_channel, "channel-2");
        assert_eq!(onward.transfer.receiver, OSMO_ADDR);
        assert_eq!(onward.transfer.token.amount, BigUint::from(999_000u32));
    }

    #[test]
    fn test_kaspa_via_hub_carries_metadata() {
        let mut req = request("KAS", "kaspa", "base", KASPA_ADDR, EVM_ADDR);
        req.hub_fallback = Some(HUB_ADDR.to_string());
        let result = build(&req, &quote(8453)).unwrap();

        let TransferPayload::KaspaDeposit(deposit) = &result.payload else {
            panic!("expected kaspa deposit");
        };
        let envelope = Envelope::decode(&deposit.payload).unwrap();
        let body = TransferBody::decode(envelope.body()).unwrap();
        assert_eq!(body.recipient(), &encode_from_bech32(HUB_ADDR, None).unwrap());
        let metadata = ForwardingMetadata::decode(body.metadata()).unwrap();
        assert!(metadata.forward_to_direct.is_some());
    }

    #[test]
    fn test_relayed_source_derives_fallback_and_memo() {
        let req = request("USDC", "osmosis", "base", OSMO_ADDR, EVM_ADDR);
        let result = build(&req, &quote(8453)).unwrap();

        assert_eq!(result.summary.hub_fallback.as_deref(), Some(HUB_ADDR));
        let decoded = IbcTransferInstruction::decode(&cosmos(&result.payload).value).unwrap();
        assert_eq!(decoded.receiver, HUB_ADDR);
        assert_eq!(decoded.source_channel, "channel-19774");

        let memo = CompletionMemo::from_json(&decoded.memo).unwrap();
        let CompletionMemo::Relayed { call } = memo else {
            panic!("expected relayed memo");
        };
        let onward = ForwardToDirectChain::decode(&call.data).unwrap();
        assert_eq!(onward.transfer.destination_domain, 8453);
        // No hop 1 fee on a relayed source
        assert_eq!(result.plan.unwrap().hub_budget, BigUint::from(1_000_000u32));
    }

    #[test]
    fn test_incentivized_source_memo() {
        let mut q = quote(8453);
        q.eibc = Some(EibcQuote {
            eibc_percent: "0.15".to_string(),
            delayed_ack_rate: "0.001".to_string(),
        });
        let req = request("USDC", "rollapp", "base", ROLLAPP_ADDR, EVM_ADDR);
        let result = build(&req, &q).unwrap();

        let decoded = IbcTransferInstruction::decode(&cosmos(&result.payload).value).unwrap();
        assert_eq!(decoded.source_channel, "channel-0");
        let memo = CompletionMemo::from_json(&decoded.memo).unwrap();
        let CompletionMemo::Incentivized { fee, .. } = memo else {
            panic!("expected incentivized memo");
        };
        assert_eq!(fee, BigUint::from(1_500u32));
        assert_eq!(result.plan.unwrap().hub_budget, BigUint::from(997_500u32));
    }

    #[test]
    fn test_incentivized_source_requires_eibc_quote() {
        let req = request("USDC", "rollapp", "base", ROLLAPP_ADDR, EVM_ADDR);
        assert!(build(&req, &quote(8453)).is_err());
    }

    #[test]
    fn test_missing_fallback_fails_before_fee_math() {
        let req = request("USDC", "base", "solana", EVM_ADDR, SOLANA_ADDR);
        // No IGP quote either: the fallback check must fire first
        let err = build(&req, &FeeQuote::default()).unwrap_err();
        match err {
            BridgeError::InvalidFormat { what, .. } => assert_eq!(what, "hub fallback"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_must_be_hub_address() {
        let mut req = request("USDC", "base", "solana", EVM_ADDR, SOLANA_ADDR);
        req.hub_fallback = Some(OSMO_ADDR.to_string());
        let err = build(&req, &FeeQuote::default()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidFormat { ref what, .. } if what == "hub fallback"
        ));
    }

    #[test]
    fn test_token_must_exist_on_source() {
        let req = request("KAS", "ethereum", "dymension", EVM_ADDR, HUB_ADDR);
        assert!(matches!(
            build(&req, &FeeQuote::default()),
            Err(BridgeError::UnknownEntity {
                kind: EntityKind::TokenAddress,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_recipient() {
        let req = request("USDC", "dymension", "base", HUB_ADDR, "0x1234");
        let err = build(&req, &quote(8453)).unwrap_err();
        assert!(err.to_string().contains("0x-prefixed 40-character hex address"));
    }

    #[test]
    fn test_insufficient_budget_surfaces_shortfall() {
        let mut req = request("USDC", "base", "solana", EVM_ADDR, SOLANA_ADDR);
        req.hub_fallback = Some(HUB_ADDR.to_string());
        req.amount = BigUint::from(500u32);
        let err = build(&req, &quote(1_399_811_149)).unwrap_err();
        assert_eq!(
            err,
            BridgeError::InsufficientBudget {
                required: BigUint::from(1_001u32),
                available: BigUint::from(500u32),
                shortfall: BigUint::from(501u32),
            }
        );
    }

    #[test]
    fn test_unsupported_route() {
        let req = request("USDC", "osmosis", "rollapp", OSMO_ADDR, ROLLAPP_ADDR);
        assert!(matches!(
            build(&req, &FeeQuote::default()),
            Err(BridgeError::UnsupportedRoute { .. })
        ));
    }

    #[test]
    fn test_codec_errors_convert() {
        let err: BridgeError = CodecError::AmountOverflow {
            amount: "1".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "invalid_format");
    }

    #[test]
    fn test_result_serializes() {
        let req = request("USDC", "base", "dymension", EVM_ADDR, HUB_ADDR);
        let result = build(&req, &FeeQuote::default()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["payload"]["type"], "contractCall");
        assert_eq!(json["payload"]["args"][2]["type"], "uint256");
        assert_eq!(json["payload"]["args"][2]["value"], "1000000");
        assert_eq!(json["summary"]["recipientReceives"], "1000000");
        assert!(result.to_string().contains("USDC"));
    }
}
