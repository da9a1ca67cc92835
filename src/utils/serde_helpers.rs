//! Integer amounts cross the API boundary as base-10 strings, never as floats or hex.

use alloy_primitives::{I256, U256};
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

pub fn u256_as_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

pub fn i256_as_decimal<S: Serializer>(value: &I256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

pub fn u256_from_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let s = String::deserialize(deserializer)?;
    U256::from_str_radix(s.trim(), 10).map_err(serde::de::Error::custom)
}

pub fn i256_from_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<I256, D::Error> {
    let s = String::deserialize(deserializer)?;
    I256::from_str(s.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Amounts {
        #[serde(serialize_with = "u256_as_decimal", deserialize_with = "u256_from_decimal")]
        size: U256,
        #[serde(serialize_with = "i256_as_decimal", deserialize_with = "i256_from_decimal")]
        net: I256,
    }

    #[test]
    fn test_amounts_are_decimal_strings() -> eyre::Result<()> {
        let amounts = Amounts { size: U256::from(10u64).pow(U256::from(24u64)), net: I256::from_str("-1500")? };

        let json = serde_json::to_string(&amounts)?;
        assert_eq!(json, "{\"size\":\"1000000000000000000000000\",\"net\":\"-1500\"}");
        assert_eq!(serde_json::from_str::<Amounts>(&json)?, amounts);
        Ok(())
    }
}
