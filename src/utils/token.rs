use alloy_primitives::utils::{UnitsError, format_units, parse_units};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An ERC-20 token as seen by the scanner. Identity is the address only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    address: Address,
    symbol: String,
    decimals: u8,
}

pub type TokenWrapper = Arc<Token>;

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.get_address()
    }
}

impl Eq for Token {}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address.cmp(&other.get_address())
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#})", self.symbol, self.address)
    }
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Token {
        Token { address, symbol: symbol.into(), decimals }
    }

    // For testing purposes
    pub fn random() -> Token {
        let address = Address::random();
        Token::new(address, format!("T{}", &address.to_string()[2..8]), 18)
    }

    // For testing purposes
    pub fn repeat_byte(byte: u8) -> Token {
        Token::new(Address::repeat_byte(byte), format!("T{byte:02x}"), 18)
    }

    pub fn get_symbol(&self) -> &str {
        &self.symbol
    }

    pub fn get_decimals(&self) -> u8 {
        self.decimals
    }

    pub fn get_address(&self) -> Address {
        self.address
    }

    /// Case-insensitive symbol match.
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(symbol)
    }

    /// Parse a human-readable decimal amount ("1.25") into the token's smallest unit, exactly.
    pub fn parse_amount(&self, value: &str) -> Result<U256, UnitsError> {
        Ok(parse_units(value.trim(), self.decimals)?.get_absolute())
    }

    /// Render a smallest-unit amount in human units, for logs.
    pub fn format_amount(&self, value: U256) -> String {
        format_units(value, self.decimals).unwrap_or_else(|_| value.to_string())
    }
}
