//! Serde helpers for `BigUint` amounts as decimal strings
//!
//! Use with `#[serde(with = "bridge_core::decimal_amount")]`, or
//! `bridge_core::decimal_amount::option` for `Option<BigUint>`.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<BigUint>()
        .map_err(|e| serde::de::Error::custom(format!("invalid amount '{s}': {e}")))
}

pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<BigUint>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BigUint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| {
            s.parse::<BigUint>()
                .map_err(|e| serde::de::Error::custom(format!("invalid amount '{s}': {e}")))
        })
        .transpose()
    }
}
