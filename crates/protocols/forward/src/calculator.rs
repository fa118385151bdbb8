//! Fee/budget calculator
//!
//! Pure functions over arbitrary-precision integers. No I/O.
//!
//! # Units
//!
//! - Amounts: token base units (`BigUint`)
//! - Rates: [`Rate`], fractions scaled by 10^18
//! - `eibc_percent`: a [`Rate`] in percent units (`0.15` = 0.15 %)
//!
//! # Two-hop forwarding
//!
//! ```text
//! amount --hop1 fees--> hub_budget --igp--> budget_after_igp
//! budget_after_igp = forward_amount + outbound_fee(forward_amount)
//! max_fee          = igp + outbound_fee(forward_amount)
//! ```

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use bridge_core::{BridgeError, CanonicalAddress, Result};

use crate::constants::{rate_scale, MAX_REFINEMENTS};
use crate::rate::Rate;
use crate::route::RouteKind;

/// Bridging fee: `floor(amount * rate)`
pub fn bridging_fee(amount: &BigUint, rate: &Rate) -> BigUint {
    rate.apply(amount)
}

/// `amount - bridging_fee(amount, rate)`. Fails for rates of 1 or more.
pub fn amount_after_fee(amount: &BigUint, rate: &Rate) -> Result<BigUint> {
    if !rate.is_fraction() {
        return Err(BridgeError::invalid_amount(format!(
            "bridging rate {rate} leaves nothing to deliver"
        )));
    }
    Ok(amount - bridging_fee(amount, rate))
}

/// Smallest `amount` with `amount_after_fee(amount, rate) >= desired`.
///
/// Closed form: `floor((desired - 1) * S / (S - R)) + 1`, and 0 for a desired
/// amount of 0. Fails for rates of 1 or more.
pub fn send_amount_for_desired(desired: &BigUint, rate: &Rate) -> Result<BigUint> {
    if !rate.is_fraction() {
        return Err(BridgeError::invalid_amount(format!(
            "bridging rate {rate} leaves nothing to deliver"
        )));
    }
    if desired.is_zero() {
        return Ok(BigUint::zero());
    }
    let scale = rate_scale();
    let net_scale = &scale - rate.scaled();
    Ok((desired - 1u8) * &scale / net_scale + 1u8)
}

/// Fee in percent units: `floor(amount * percent / 100)`
fn percent_fee(amount: &BigUint, percent: &Rate) -> BigUint {
    amount * percent.scaled() / (rate_scale() * 100u8)
}

/// Breakdown of an incentivized withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EibcWithdrawal {
    #[serde(with = "bridge_core::decimal_amount")]
    pub eibc_fee: BigUint,
    #[serde(with = "bridge_core::decimal_amount")]
    pub bridging_fee: BigUint,
    #[serde(with = "bridge_core::decimal_amount")]
    pub recipient_receives: BigUint,
}

/// Both fees are taken from the original amount, not compounded.
pub fn eibc_withdrawal(
    amount: &BigUint,
    eibc_percent: &Rate,
    bridging_rate: &Rate,
) -> Result<EibcWithdrawal> {
    let eibc_fee = percent_fee(amount, eibc_percent);
    let bridging = bridging_fee(amount, bridging_rate);
    let total = &eibc_fee + &bridging;
    if total > *amount {
        return Err(BridgeError::invalid_amount(format!(
            "withdrawal fees {total} exceed amount {amount}"
        )));
    }
    Ok(EibcWithdrawal {
        recipient_receives: amount - &total,
        eibc_fee,
        bridging_fee: bridging,
    })
}

/// Rates charged on the way into the Hub
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hop1Rates {
    pub inbound_rate: Rate,
    /// Percent units
    pub eibc_percent: Rate,
    pub delayed_ack_rate: Rate,
}

/// Costs of the Hub's outbound leg
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hop2Params {
    pub igp_fee: BigUint,
    pub outbound_rate: Rate,
    pub fee_hook_id: Option<CanonicalAddress>,
    pub fee_denom: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hop1Fees {
    #[serde(with = "bridge_core::decimal_amount")]
    pub inbound_fee: BigUint,
    #[serde(default, with = "bridge_core::decimal_amount::option")]
    pub eibc_fee: Option<BigUint>,
    #[serde(default, with = "bridge_core::decimal_amount::option")]
    pub delayed_ack_fee: Option<BigUint>,
}

impl Hop1Fees {
    pub fn total(&self) -> BigUint {
        let mut total = self.inbound_fee.clone();
        if let Some(fee) = &self.eibc_fee {
            total += fee;
        }
        if let Some(fee) = &self.delayed_ack_fee {
            total += fee;
        }
        total
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hop2Fees {
    #[serde(with = "bridge_core::decimal_amount")]
    pub igp_fee: BigUint,
    #[serde(with = "bridge_core::decimal_amount")]
    pub outbound_fee: BigUint,
    pub fee_hook_id: Option<CanonicalAddress>,
    pub fee_denom: String,
}

/// Allocation of one input amount across both legs of a forwarded transfer.
///
/// For every plan `max_fee + forward_amount <= hub_budget` and
/// `hub_budget == input_amount - hop1_fees.total()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardingPlan {
    pub route_kind: RouteKind,
    #[serde(with = "bridge_core::decimal_amount")]
    pub input_amount: BigUint,
    pub hop1_fees: Hop1Fees,
    #[serde(with = "bridge_core::decimal_amount")]
    pub hub_budget: BigUint,
    pub hop2_fees: Hop2Fees,
    #[serde(with = "bridge_core::decimal_amount")]
    pub forward_amount: BigUint,
    #[serde(with = "bridge_core::decimal_amount")]
    pub max_fee: BigUint,
    #[serde(with = "bridge_core::decimal_amount")]
    pub recipient_receives: BigUint,
    #[serde(with = "bridge_core::decimal_amount")]
    pub total_deducted: BigUint,
}

fn hop1_fees(amount: &BigUint, kind: RouteKind, rates: &Hop1Rates) -> Hop1Fees {
    match kind {
        RouteKind::DirectHubDirect | RouteKind::DirectHubIndirect => Hop1Fees {
            inbound_fee: bridging_fee(amount, &rates.inbound_rate),
            ..Hop1Fees::default()
        },
        RouteKind::IncentivizedHubDirect => Hop1Fees {
            inbound_fee: BigUint::zero(),
            eibc_fee: Some(percent_fee(amount, &rates.eibc_percent)),
            delayed_ack_fee: Some(bridging_fee(amount, &rates.delayed_ack_rate)),
        },
        RouteKind::IndirectHubDirect => Hop1Fees::default(),
    }
}

/// Hub budget needed so that hop 2 forwards at least `desired`.
fn hub_budget_for(desired: &BigUint, kind: RouteKind, hop2: &Hop2Params) -> BigUint {
    if kind.is_fee_exempt() {
        return desired.clone();
    }
    let scale = rate_scale();
    let gross_scale = &scale + hop2.outbound_rate.scaled();
    // ceil(desired * (S + R) / S)
    let after_igp = (desired * gross_scale + &scale - 1u8) / &scale;
    after_igp + &hop2.igp_fee
}

/// Plan a two-hop transfer of `amount` through the Hub.
///
/// Fails with `InvalidAmount` when hop 1 consumes the whole amount, and with
/// `InsufficientBudget` (naming the shortfall) when the Hub budget cannot
/// cover the gas payment and still forward a non-zero amount.
pub fn forward(
    amount: &BigUint,
    kind: RouteKind,
    hop1: &Hop1Rates,
    hop2: &Hop2Params,
) -> Result<ForwardingPlan> {
    if amount.is_zero() {
        return Err(BridgeError::invalid_amount("amount must be positive"));
    }

    let hop1_fees = hop1_fees(amount, kind, hop1);
    let deducted = hop1_fees.total();
    if deducted >= *amount {
        return Err(BridgeError::invalid_amount(format!(
            "hop 1 fees {deducted} consume the whole amount {amount}"
        )));
    }
    let hub_budget = amount - &deducted;

    let (forward_amount, max_fee, hop2_fees) = if kind.is_fee_exempt() {
        let fees = Hop2Fees {
            fee_denom: hop2.fee_denom.clone(),
            ..Hop2Fees::default()
        };
        (hub_budget.clone(), BigUint::zero(), fees)
    } else {
        if hub_budget <= hop2.igp_fee {
            return Err(BridgeError::insufficient_budget(
                &hop2.igp_fee + 1u8,
                hub_budget,
            ));
        }
        let budget_after_igp = &hub_budget - &hop2.igp_fee;

        let scale = rate_scale();
        let forward_amount =
            &budget_after_igp * &scale / (&scale + hop2.outbound_rate.scaled());
        if forward_amount.is_zero() {
            return Err(BridgeError::insufficient_budget(
                hub_budget_for(&BigUint::one(), kind, hop2),
                hub_budget,
            ));
        }

        let outbound_fee = bridging_fee(&forward_amount, &hop2.outbound_rate);
        let max_fee = &hop2.igp_fee + &outbound_fee;
        let fees = Hop2Fees {
            igp_fee: hop2.igp_fee.clone(),
            outbound_fee,
            fee_hook_id: hop2.fee_hook_id,
            fee_denom: hop2.fee_denom.clone(),
        };
        (forward_amount, max_fee, fees)
    };

    Ok(ForwardingPlan {
        route_kind: kind,
        input_amount: amount.clone(),
        total_deducted: amount - &forward_amount,
        recipient_receives: forward_amount.clone(),
        hop1_fees,
        hub_budget,
        hop2_fees,
        forward_amount,
        max_fee,
    })
}

/// Invert hop 1: smallest input whose Hub budget reaches `hub_budget`
fn send_amount_for_hub_budget(
    hub_budget: &BigUint,
    kind: RouteKind,
    hop1: &Hop1Rates,
) -> Result<BigUint> {
    match kind {
        RouteKind::DirectHubDirect | RouteKind::DirectHubIndirect => {
            send_amount_for_desired(hub_budget, &hop1.inbound_rate)
        }
        RouteKind::IndirectHubDirect => Ok(hub_budget.clone()),
        RouteKind::IncentivizedHubDirect => {
            // Combined rate over a denominator of 100 * S
            let denom = rate_scale() * 100u8;
            let combined = hop1.eibc_percent.scaled() + hop1.delayed_ack_rate.scaled() * 100u8;
            if combined >= denom {
                return Err(BridgeError::invalid_amount(
                    "withdrawal fees leave nothing to deliver",
                ));
            }
            let net = &denom - combined;
            Ok((hub_budget * denom + &net - 1u8) / net)
        }
    }
}

fn refine(
    desired: &BigUint,
    candidate: BigUint,
    kind: RouteKind,
    hop1: &Hop1Rates,
    hop2: &Hop2Params,
    iteration: usize,
) -> Result<BigUint> {
    let shortfall = match forward(&candidate, kind, hop1, hop2) {
        Ok(plan) if plan.recipient_receives >= *desired => return Ok(candidate),
        Ok(plan) => desired - &plan.recipient_receives,
        Err(BridgeError::InsufficientBudget { shortfall, .. }) => shortfall,
        Err(e) => return Err(e),
    };

    if iteration >= MAX_REFINEMENTS {
        return Err(BridgeError::NoConvergence {
            iterations: iteration,
        });
    }

    tracing::debug!(
        iteration,
        candidate = %candidate,
        shortfall = %shortfall,
        "Refining send amount"
    );
    let next = candidate + shortfall + 1u8;
    refine(desired, next, kind, hop1, hop2, iteration + 1)
}

/// Smallest input amount whose forwarding plan delivers at least `desired`.
///
/// Hop 2 and hop 1 are inverted algebraically, then the candidate is checked
/// against [`forward`] and nudged up by the observed shortfall plus one, at
/// most [`MAX_REFINEMENTS`] times.
pub fn send_amount_for_desired_forward(
    desired: &BigUint,
    kind: RouteKind,
    hop1: &Hop1Rates,
    hop2: &Hop2Params,
) -> Result<BigUint> {
    if desired.is_zero() {
        return Err(BridgeError::invalid_amount("desired amount must be positive"));
    }
    let hub_budget = hub_budget_for(desired, kind, hop2);
    let candidate = send_amount_for_hub_budget(&hub_budget, kind, hop1)?;
    refine(desired, candidate, kind, hop1, hop2, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(s: &str) -> Rate {
        Rate::from_decimal_str(s).unwrap()
    }

    fn n(v: u128) -> BigUint {
        BigUint::from(v)
    }

    fn hop2(igp: u128, outbound: &str) -> Hop2Params {
        Hop2Params {
            igp_fee: n(igp),
            outbound_rate: rate(outbound),
            fee_hook_id: None,
            fee_denom: "adym".to_string(),
        }
    }

    fn assert_budget_invariant(plan: &ForwardingPlan) {
        assert!(&plan.max_fee + &plan.forward_amount <= plan.hub_budget);
        assert_eq!(plan.hub_budget, &plan.input_amount - plan.hop1_fees.total());
    }

    #[test]
    fn test_bridging_fee_floor() {
        let r = rate("0.001");
        assert_eq!(bridging_fee(&n(1_000_000), &r), n(1000));
        assert_eq!(bridging_fee(&n(999), &r), n(0));
        assert_eq!(bridging_fee(&n(1001), &r), n(1));
        assert_eq!(amount_after_fee(&n(1_000_000), &r).unwrap(), n(999_000));
    }

    #[test]
    fn test_bridging_fee_large_amount_is_exact() {
        // 2^53 + 1 is not representable as f64
        let amount = n((1u128 << 53) + 1) * n(1000);
        assert_eq!(bridging_fee(&amount, &rate("0.001")), n((1u128 << 53) + 1));
    }

    #[test]
    fn test_amount_after_fee_rejects_whole_rates() {
        assert!(matches!(
            amount_after_fee(&n(1000), &rate("1.5")),
            Err(BridgeError::InvalidAmount { .. })
        ));
        assert!(amount_after_fee(&n(1000), &rate("1")).is_err());
        assert_eq!(amount_after_fee(&n(1000), &rate("0.999")).unwrap(), n(1));
    }

    #[test]
    fn test_send_amount_for_desired() {
        let r = rate("0.001");
        assert_eq!(send_amount_for_desired(&n(999), &r).unwrap(), n(999));
        assert_eq!(send_amount_for_desired(&n(1000), &r).unwrap(), n(1001));
        assert_eq!(send_amount_for_desired(&n(0), &r).unwrap(), n(0));
        assert_eq!(send_amount_for_desired(&n(500), &Rate::zero()).unwrap(), n(500));
        assert!(send_amount_for_desired(&n(1), &rate("1")).is_err());
    }

    #[test]
    fn test_eibc_withdrawal() {
        let result = eibc_withdrawal(&n(1_000_000), &rate("0.15"), &rate("0.001")).unwrap();
        assert_eq!(result.eibc_fee, n(1500));
        assert_eq!(result.bridging_fee, n(1000));
        assert_eq!(result.recipient_receives, n(997_500));
    }

    #[test]
    fn test_eibc_withdrawal_fees_exceed_amount() {
        assert!(eibc_withdrawal(&n(100), &rate("80"), &rate("0.5")).is_err());
    }

    #[test]
    fn test_forward_direct_hub_direct() {
        let amount = n(100_000_000_000_000_000_000);
        let plan = forward(
            &amount,
            RouteKind::DirectHubDirect,
            &Hop1Rates::default(),
            &hop2(500_000_000_000_000_000, "0.001"),
        )
        .unwrap();

        assert_budget_invariant(&plan);
        assert_eq!(plan.hub_budget, amount);
        assert_eq!(plan.forward_amount, n(99_400_599_400_599_400_599));
        assert_eq!(plan.hop2_fees.outbound_fee, n(99_400_599_400_599_400));
        assert_eq!(plan.max_fee, n(599_400_599_400_599_400));
        assert_eq!(plan.recipient_receives, plan.forward_amount);
        assert_eq!(plan.total_deducted, &amount - &plan.forward_amount);
    }

    #[test]
    fn test_forward_inbound_fee() {
        let hop1 = Hop1Rates {
            inbound_rate: rate("0.001"),
            ..Hop1Rates::default()
        };
        let plan =
            forward(&n(1_000_000), RouteKind::DirectHubDirect, &hop1, &hop2(0, "0")).unwrap();
        assert_eq!(plan.hop1_fees.inbound_fee, n(1000));
        assert_eq!(plan.hub_budget, n(999_000));
        assert_eq!(plan.forward_amount, n(999_000));
        assert_eq!(plan.max_fee, n(0));
    }

    #[test]
    fn test_forward_incentivized_source() {
        let hop1 = Hop1Rates {
            inbound_rate: rate("0.5"),
            eibc_percent: rate("0.15"),
            delayed_ack_rate: rate("0.001"),
        };
        let plan = forward(
            &n(1_000_000),
            RouteKind::IncentivizedHubDirect,
            &hop1,
            &hop2(100, "0"),
        )
        .unwrap();
        // Inbound rate does not apply to incentivized withdrawals
        assert_eq!(plan.hop1_fees.inbound_fee, n(0));
        assert_eq!(plan.hop1_fees.eibc_fee, Some(n(1500)));
        assert_eq!(plan.hop1_fees.delayed_ack_fee, Some(n(1000)));
        assert_eq!(plan.hub_budget, n(997_500));
        assert_eq!(plan.forward_amount, n(997_400));
        assert_budget_invariant(&plan);
    }

    #[test]
    fn test_forward_relayed_source_has_no_hop1_fees() {
        let hop1 = Hop1Rates {
            inbound_rate: rate("0.01"),
            ..Hop1Rates::default()
        };
        let plan = forward(&n(5000), RouteKind::IndirectHubDirect, &hop1, &hop2(0, "0")).unwrap();
        assert_eq!(plan.hop1_fees.total(), n(0));
        assert_eq!(plan.hub_budget, n(5000));
    }

    #[test]
    fn test_forward_fee_exempt_destination() {
        let plan = forward(
            &n(10_000),
            RouteKind::DirectHubIndirect,
            &Hop1Rates::default(),
            &hop2(9_999_999, "0.5"),
        )
        .unwrap();
        assert_eq!(plan.forward_amount, n(10_000));
        assert_eq!(plan.max_fee, n(0));
        assert_eq!(plan.hop2_fees.igp_fee, n(0));
        assert_budget_invariant(&plan);
    }

    #[test]
    fn test_forward_insufficient_budget_names_shortfall() {
        let err = forward(
            &n(400),
            RouteKind::DirectHubDirect,
            &Hop1Rates::default(),
            &hop2(500, "0"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BridgeError::InsufficientBudget {
                required: n(501),
                available: n(400),
                shortfall: n(101),
            }
        );

        // Budget exactly equal to the gas payment is still insufficient
        assert!(forward(
            &n(500),
            RouteKind::DirectHubDirect,
            &Hop1Rates::default(),
            &hop2(500, "0"),
        )
        .is_err());
    }

    #[test]
    fn test_forward_rejects_zero_and_consumed_amounts() {
        let zero = forward(
            &n(0),
            RouteKind::DirectHubDirect,
            &Hop1Rates::default(),
            &hop2(0, "0"),
        );
        assert!(matches!(zero, Err(BridgeError::InvalidAmount { .. })));

        let hop1 = Hop1Rates {
            inbound_rate: rate("1"),
            ..Hop1Rates::default()
        };
        let consumed = forward(&n(100), RouteKind::DirectHubDirect, &hop1, &hop2(0, "0"));
        assert!(matches!(consumed, Err(BridgeError::InvalidAmount { .. })));
    }

    #[test]
    fn test_inverse_direct_hub_direct() {
        let hop1 = Hop1Rates {
            inbound_rate: rate("0.001"),
            ..Hop1Rates::default()
        };
        let hop2 = hop2(500_000_000_000_000_000, "0.001");
        let desired = n(50_000_000_000_000_000_000);

        let amount =
            send_amount_for_desired_forward(&desired, RouteKind::DirectHubDirect, &hop1, &hop2)
                .unwrap();
        let plan = forward(&amount, RouteKind::DirectHubDirect, &hop1, &hop2).unwrap();
        assert!(plan.recipient_receives >= desired);

        // One unit less must fall short
        let below = forward(&(amount - 1u8), RouteKind::DirectHubDirect, &hop1, &hop2).unwrap();
        assert!(below.recipient_receives < desired);
    }

    #[test]
    fn test_inverse_incentivized() {
        let hop1 = Hop1Rates {
            eibc_percent: rate("0.15"),
            delayed_ack_rate: rate("0.001"),
            ..Hop1Rates::default()
        };
        let hop2 = hop2(1000, "0.002");
        let desired = n(997_123);
        let amount = send_amount_for_desired_forward(
            &desired,
            RouteKind::IncentivizedHubDirect,
            &hop1,
            &hop2,
        )
        .unwrap();
        let plan = forward(&amount, RouteKind::IncentivizedHubDirect, &hop1, &hop2).unwrap();
        assert!(plan.recipient_receives >= desired);
    }

    #[test]
    fn test_inverse_fee_exempt_is_identity_on_hop2() {
        let amount = send_amount_for_desired_forward(
            &n(777),
            RouteKind::DirectHubIndirect,
            &Hop1Rates::default(),
            &hop2(1_000_000, "0.5"),
        )
        .unwrap();
        assert_eq!(amount, n(777));
    }

    #[test]
    fn test_refine_gives_up_after_max_refinements() {
        // A 50 % withdrawal fee halves each step's shortfall, so a far-off
        // starting candidate cannot close the gap in time
        let hop1 = Hop1Rates {
            eibc_percent: rate("50"),
            ..Hop1Rates::default()
        };
        let err = refine(
            &n(1_000_000_000),
            n(1),
            RouteKind::IncentivizedHubDirect,
            &hop1,
            &hop2(0, "0"),
            0,
        )
        .unwrap_err();
        assert_eq!(
            err,
            BridgeError::NoConvergence {
                iterations: MAX_REFINEMENTS
            }
        );
    }

    #[test]
    fn test_inverse_rejects_zero() {
        assert!(send_amount_for_desired_forward(
            &n(0),
            RouteKind::DirectHubDirect,
            &Hop1Rates::default(),
            &hop2(0, "0"),
        )
        .is_err());
    }

    #[test]
    fn test_plan_serializes_amounts_as_strings() {
        let plan = forward(
            &n(1_000),
            RouteKind::DirectHubDirect,
            &Hop1Rates::default(),
            &hop2(10, "0"),
        )
        .unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["forwardAmount"], "990");
        assert_eq!(json["maxFee"], "10");
        assert_eq!(json["routeKind"], "directHubDirect");
        assert_eq!(json["hop1Fees"]["eibcFee"], serde_json::Value::Null);
    }
}
