use alloy_primitives::hex;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// Route identifier. Orders by raw bytes, which gives the final ranking tie-break.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SwapPathHash(pub [u8; 32]);

impl Display for SwapPathHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode_prefixed(self.0))
    }
}

impl Debug for SwapPathHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SwapPathHash({})", hex::encode_prefixed(self.0))
    }
}

impl From<[u8; 32]> for SwapPathHash {
    fn from(hash: [u8; 32]) -> Self {
        SwapPathHash(hash)
    }
}

impl Serialize for SwapPathHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode_prefixed(self.0))
    }
}

impl<'de> Deserialize<'de> for SwapPathHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let hash: [u8; 32] = bytes.try_into().map_err(|_| serde::de::Error::custom("route id must be 32 bytes"))?;
        Ok(SwapPathHash(hash))
    }
}
