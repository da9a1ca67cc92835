use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Edge class. All pools of one class between two tokens collapse into one best-of edge.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, EnumIter, Serialize, Deserialize)]
pub enum VenueClass {
    #[strum(serialize = "v2-best")]
    #[serde(rename = "v2-best")]
    ConstantProduct,
    #[strum(serialize = "v3-best")]
    #[serde(rename = "v3-best")]
    Concentrated,
}

impl VenueClass {
    pub(crate) fn tag(&self) -> u8 {
        match self {
            VenueClass::ConstantProduct => 2,
            VenueClass::Concentrated => 3,
        }
    }
}

fn default_fee_bps() -> u32 {
    30
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VenueKind {
    /// Uniswap V2 style factory; pools are found with `getPair` and priced from reserves.
    ConstantProduct {
        factory: Address,
        #[serde(default = "default_fee_bps")]
        fee_bps: u32,
    },
    /// Uniswap V3 style quoter, one quote per fee tier.
    ConcentratedTiered { quoter: Address, fee_tiers: Vec<u32> },
    /// Algebra style quoter with a dynamic fee and no tiers.
    ConcentratedDynamic { quoter: Address },
}

/// A configured exchange instance, e.g. one DEX factory or one quoter deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub key: String,
    #[serde(flatten)]
    pub kind: VenueKind,
}

impl Venue {
    pub fn new(key: impl Into<String>, kind: VenueKind) -> Self {
        Self { key: key.into(), kind }
    }

    pub fn get_class(&self) -> VenueClass {
        match self.kind {
            VenueKind::ConstantProduct { .. } => VenueClass::ConstantProduct,
            VenueKind::ConcentratedTiered { .. } | VenueKind::ConcentratedDynamic { .. } => VenueClass::Concentrated,
        }
    }

    pub fn get_factory(&self) -> Option<Address> {
        match self.kind {
            VenueKind::ConstantProduct { factory, .. } => Some(factory),
            _ => None,
        }
    }

    pub fn get_fee_bps(&self) -> Option<u32> {
        match self.kind {
            VenueKind::ConstantProduct { fee_bps, .. } => Some(fee_bps),
            _ => None,
        }
    }

    pub fn get_quoter(&self) -> Option<Address> {
        match self.kind {
            VenueKind::ConcentratedTiered { quoter, .. } | VenueKind::ConcentratedDynamic { quoter } => Some(quoter),
            VenueKind::ConstantProduct { .. } => None,
        }
    }

    pub fn matches_key(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_class_display_round_trip() {
        assert_eq!(VenueClass::ConstantProduct.to_string(), "v2-best");
        assert_eq!(VenueClass::from_str("v3-best").unwrap(), VenueClass::Concentrated);
    }

    #[test]
    fn test_venue_accessors() {
        let v2 = Venue::new("quickswap_v2", VenueKind::ConstantProduct { factory: Address::repeat_byte(1), fee_bps: 25 });
        let v3 = Venue::new("uniswap_v3", VenueKind::ConcentratedTiered { quoter: Address::repeat_byte(2), fee_tiers: vec![500] });

        assert_eq!(v2.get_class(), VenueClass::ConstantProduct);
        assert_eq!(v2.get_fee_bps(), Some(25));
        assert_eq!(v2.get_quoter(), None);
        assert_eq!(v3.get_class(), VenueClass::Concentrated);
        assert_eq!(v3.get_factory(), None);
        assert!(v3.matches_key(" UNISWAP_V3 "));
    }

    #[test]
    fn test_venue_json_shape() -> eyre::Result<()> {
        let json = r#"{"key":"quickswap_v2","kind":"constant_product","factory":"0x5757371414417b8C6CAad45bAeF941aBc7d3Ab32"}"#;
        let venue: Venue = serde_json::from_str(json)?;
        assert_eq!(venue.get_fee_bps(), Some(30));
        Ok(())
    }
}
