//! Fixed-point fractional rates
//!
//! A rate is held as an integer scaled by 10^18 and is only ever applied to
//! amounts through integer arithmetic:
//! `fee = floor(amount * scaled / 10^18)`.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use bridge_core::constants::RATE_SCALE_DECIMALS;
use bridge_core::{BridgeError, Result};

use crate::constants::rate_scale;

/// A non-negative fraction scaled by 10^18 (`0.001` is stored as `10^15`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rate {
    scaled: BigUint,
}

impl Rate {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_scaled(scaled: BigUint) -> Self {
        Self { scaled }
    }

    /// Parse a plain decimal such as `"0.001"`.
    ///
    /// Exact up to 18 fractional digits; further digits round half up.
    pub fn from_decimal_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid =
            |reason: &str| BridgeError::invalid_format("rate", format!("'{s}': {reason}"));

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() {
            return Err(invalid("missing integer part"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("expected a non-negative decimal number"));
        }

        let decimals = RATE_SCALE_DECIMALS as usize;
        let kept = &frac_part[..frac_part.len().min(decimals)];
        let padded = format!("{int_part}{kept:0<decimals$}");
        let mut scaled: BigUint = padded
            .parse()
            .map_err(|_| invalid("expected a non-negative decimal number"))?;

        if frac_part.len() > decimals && frac_part.as_bytes()[decimals] >= b'5' {
            scaled += 1u8;
        }

        Ok(Self { scaled })
    }

    /// Convert a float rate as `round(rate * 10^18)`
    pub fn from_f64(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(BridgeError::invalid_format(
                "rate",
                format!("{rate} is not a non-negative finite number"),
            ));
        }
        let scaled = (rate * 1e18).round();
        if scaled >= u128::MAX as f64 {
            return Err(BridgeError::invalid_format("rate", format!("{rate} is too large")));
        }
        Ok(Self {
            scaled: BigUint::from(scaled as u128),
        })
    }

    pub fn scaled(&self) -> &BigUint {
        &self.scaled
    }

    pub fn is_zero(&self) -> bool {
        self.scaled.is_zero()
    }

    /// True for rates strictly below 1
    pub fn is_fraction(&self) -> bool {
        self.scaled < rate_scale()
    }

    /// `floor(amount * rate)`
    pub fn apply(&self, amount: &BigUint) -> BigUint {
        amount * &self.scaled / rate_scale()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = rate_scale();
        let int = &self.scaled / &scale;
        let frac = &self.scaled % &scale;
        if frac.is_zero() {
            return write!(f, "{int}");
        }
        let digits = format!("{:0>width$}", frac.to_string(), width = RATE_SCALE_DECIMALS as usize);
        write!(f, "{int}.{}", digits.trim_end_matches('0'))
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_decimal_str(&s).map_err(serde::de::Error::custom)
    }
}
