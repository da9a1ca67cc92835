use super::graph::SwapPathHash;
use super::pools::Venue;
use crate::errors::ScanError;
use crate::utils::constants::{DEFAULT_BRIDGE_SYMBOLS, STABLE_SYMBOLS, WMATIC};
use crate::utils::serde_helpers::{i256_as_decimal, i256_from_decimal, u256_as_decimal, u256_from_decimal};
use crate::utils::token::{Token, TokenWrapper};
use alloy_primitives::utils::parse_units;
use alloy_primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

/// Engine constants. Everything here is configuration rather than code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Hard cap on the universe handed to discovery
    pub universe_limit: usize,
    /// How many tokens to ask the universe provider for
    pub universe_request_limit: usize,
    pub top_mids_floor: usize,
    pub top_mids_ceiling: usize,
    pub stable_symbols: Vec<String>,
    pub default_bridge_symbols: Vec<String>,
    /// Sample sizes are `max_input / divisor`, tried in this order
    pub sample_divisors: Vec<u64>,
    pub optimizer_iterations: usize,
    pub gas_units_single: u64,
    pub gas_units_multi: u64,
    pub max_single_results: usize,
    pub max_multi_results: usize,
    /// Routes evaluated concurrently within one scan
    pub max_concurrent_routes: usize,
    /// Base scans running at once in `scan_many`
    pub max_concurrent_bases: usize,
    pub max_paths: usize,
    pub wrapped_native: Address,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            universe_limit: 160,
            universe_request_limit: 140,
            top_mids_floor: 25,
            top_mids_ceiling: 60,
            stable_symbols: STABLE_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            default_bridge_symbols: DEFAULT_BRIDGE_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            sample_divisors: vec![10, 4, 2, 1],
            optimizer_iterations: 10,
            gas_units_single: 120_000,
            gas_units_multi: 260_000,
            max_single_results: 30,
            max_multi_results: 50,
            max_concurrent_routes: 16,
            max_concurrent_bases: 3,
            max_paths: 50_000,
            wrapped_native: WMATIC,
        }
    }
}

impl ScannerSettings {
    /// `max(floor, min(ceiling, universe_len))`
    pub fn top_mids(&self, universe_len: usize) -> usize {
        self.top_mids_floor.max(self.top_mids_ceiling.min(universe_len))
    }
}

fn default_hop_limit() -> usize {
    4
}

fn default_slippage_bps() -> u32 {
    30
}

fn default_flash_fee_bps() -> u32 {
    9
}

fn default_min_net_bps() -> i64 {
    150
}

fn default_only_profitable() -> bool {
    true
}

fn default_stale_sec_ceiling() -> u64 {
    600
}

/// A scan request as it arrives from a caller. Human-unit amounts are decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Symbol or address
    pub base: String,
    /// Input ceiling in whole base-token units, e.g. "1500.5"
    pub max_input: String,
    #[serde(default = "default_hop_limit")]
    pub hop_limit: usize,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
    #[serde(default = "default_flash_fee_bps")]
    pub flash_fee_bps: u32,
    #[serde(default = "default_min_net_bps")]
    pub min_net_bps: i64,
    /// Minimum net in the base token's smallest unit
    #[serde(default)]
    pub min_net_units: Option<String>,
    #[serde(default = "default_only_profitable")]
    pub only_profitable: bool,
    #[serde(default)]
    pub venue_allow_list: Option<Vec<String>>,
    #[serde(default)]
    pub bridge_symbols: Option<Vec<String>>,
    #[serde(default = "default_stale_sec_ceiling")]
    pub stale_sec_ceiling: u64,
    #[serde(default)]
    pub gas_price_gwei: Option<String>,
    #[serde(default)]
    pub priority_fee_gwei: Option<String>,
}

impl ScanRequest {
    pub fn new(base: impl Into<String>, max_input: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            max_input: max_input.into(),
            hop_limit: default_hop_limit(),
            slippage_bps: default_slippage_bps(),
            flash_fee_bps: default_flash_fee_bps(),
            min_net_bps: default_min_net_bps(),
            min_net_units: None,
            only_profitable: default_only_profitable(),
            venue_allow_list: None,
            bridge_symbols: None,
            stale_sec_ceiling: default_stale_sec_ceiling(),
            gas_price_gwei: None,
            priority_fee_gwei: None,
        }
    }

    /// Turn the request into a validated `ScanConfig`.
    ///
    /// `known_tokens` resolves the base by address or case-insensitive symbol; `venues` is the
    /// configured registry the allow-list selects from.
    pub fn resolve(&self, known_tokens: &[Token], venues: &[Venue], settings: &ScannerSettings) -> Result<ScanConfig, ScanError> {
        let base = resolve_token(&self.base, known_tokens).ok_or_else(|| ScanError::UnknownBaseToken(self.base.clone()))?;

        let max_input = base.parse_amount(&self.max_input).map_err(|e| ScanError::invalid_amount(&self.max_input, e))?;

        let min_net_units = match &self.min_net_units {
            Some(raw) => Some(I256::from_str(raw.trim()).map_err(|e| ScanError::invalid_amount(raw, e))?),
            None => None,
        };

        let venues = match &self.venue_allow_list {
            Some(keys) => select_venues(venues, keys)?,
            None => venues.to_vec(),
        };

        let config = ScanConfig {
            base: Arc::new(base),
            max_input,
            hop_limit: self.hop_limit,
            slippage_bps: self.slippage_bps,
            flash_fee_bps: self.flash_fee_bps,
            min_net_bps: self.min_net_bps,
            min_net_units,
            only_profitable: self.only_profitable,
            venues,
            bridge_symbols: self.bridge_symbols.clone().unwrap_or_else(|| settings.default_bridge_symbols.clone()),
            stale_sec_ceiling: self.stale_sec_ceiling,
            gas_price_wei: parse_gwei(self.gas_price_gwei.as_deref())?,
            priority_fee_wei: parse_gwei(self.priority_fee_gwei.as_deref())?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn resolve_token(symbol_or_address: &str, known_tokens: &[Token]) -> Option<Token> {
    let value = symbol_or_address.trim();
    match Address::from_str(value) {
        Ok(address) => known_tokens.iter().find(|token| token.get_address() == address).cloned(),
        Err(_) => known_tokens.iter().find(|token| token.has_symbol(value)).cloned(),
    }
}

fn select_venues(venues: &[Venue], keys: &[String]) -> Result<Vec<Venue>, ScanError> {
    for key in keys {
        if !venues.iter().any(|venue| venue.matches_key(key)) {
            return Err(ScanError::UnknownVenue(key.clone()));
        }
    }
    Ok(venues.iter().filter(|venue| keys.iter().any(|key| venue.matches_key(key))).cloned().collect())
}

fn parse_gwei(value: Option<&str>) -> Result<Option<U256>, ScanError> {
    value
        .map(|raw| parse_units(raw.trim(), 9).map(|units| units.get_absolute()).map_err(|e| ScanError::invalid_amount(raw, e)))
        .transpose()
}

/// Immutable, validated input of one scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub base: TokenWrapper,
    /// Input ceiling in the base token's smallest unit
    pub max_input: U256,
    pub hop_limit: usize,
    pub slippage_bps: u32,
    pub flash_fee_bps: u32,
    pub min_net_bps: i64,
    pub min_net_units: Option<I256>,
    pub only_profitable: bool,
    pub venues: Vec<Venue>,
    pub bridge_symbols: Vec<String>,
    pub stale_sec_ceiling: u64,
    /// Overrides the source's base fee
    pub gas_price_wei: Option<U256>,
    /// Overrides the source's priority fee
    pub priority_fee_wei: Option<U256>,
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.max_input.is_zero() {
            return Err(ScanError::ZeroCeiling);
        }
        if !(2..=4).contains(&self.hop_limit) {
            return Err(ScanError::InvalidHopLimit(self.hop_limit));
        }
        if self.slippage_bps > 10_000 {
            return Err(ScanError::BpsOutOfRange { name: "slippage_bps", value: i64::from(self.slippage_bps) });
        }
        if self.flash_fee_bps > 10_000 {
            return Err(ScanError::BpsOutOfRange { name: "flash_fee_bps", value: i64::from(self.flash_fee_bps) });
        }
        // a total loss still pays the flash fee on top
        if self.min_net_bps < -(10_000 + i64::from(self.flash_fee_bps)) {
            return Err(ScanError::BpsOutOfRange { name: "min_net_bps", value: self.min_net_bps });
        }
        if self.venues.is_empty() {
            return Err(ScanError::EmptyVenueSelection);
        }
        Ok(())
    }

    /// Flash fee on `size`, rounded down.
    pub fn flash_fee(&self, size: U256) -> U256 {
        size.saturating_mul(U256::from(self.flash_fee_bps)) / U256::from(10_000u64)
    }

    /// `out - size - flash_fee(size)`
    pub fn net(&self, size: U256, amount_out: U256) -> I256 {
        signed(amount_out) - signed(size) - signed(self.flash_fee(size))
    }

    /// All configured predicates: profitability, absolute minimum, minimum bps.
    pub fn passes(&self, net: I256, net_bps: i64) -> bool {
        if self.only_profitable && !net.is_positive() {
            return false;
        }
        if let Some(min_net_units) = self.min_net_units {
            if net < min_net_units {
                return false;
            }
        }
        net_bps >= self.min_net_bps
    }
}

pub(crate) fn signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}

/// `net * 10000 / size`, truncated toward zero.
pub fn net_bps(net: I256, size: U256) -> i64 {
    if size.is_zero() {
        return 0;
    }
    let bps = net.saturating_mul(I256::try_from(10_000i64).unwrap_or_default()) / signed(size);
    i64::try_from(bps).unwrap_or(if bps.is_negative() { i64::MIN } else { i64::MAX })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteKind {
    SingleHop,
    MultiHop,
}

/// One ranked round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub kind: RouteKind,
    pub label: String,
    pub route_id: SwapPathHash,
    pub tokens: Vec<Address>,
    pub symbols: Vec<String>,
    pub venues: Vec<String>,
    #[serde(serialize_with = "u256_as_decimal", deserialize_with = "u256_from_decimal")]
    pub size: U256,
    #[serde(serialize_with = "i256_as_decimal", deserialize_with = "i256_from_decimal")]
    pub net: I256,
    pub net_bps: i64,
    /// Gas cost of the route in base-token units
    #[serde(serialize_with = "u256_as_decimal", deserialize_with = "u256_from_decimal")]
    pub gas_cost: U256,
    pub profit_per_gas: f64,
}

impl Opportunity {
    /// Net desc, profit per gas desc, route id asc.
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        other
            .net
            .cmp(&self.net)
            .then_with(|| other.profit_per_gas.total_cmp(&self.profit_per_gas))
            .then_with(|| self.route_id.cmp(&other.route_id))
    }
}

/// `net / gas_cost`; a zero gas cost divides by one.
pub fn profit_per_gas(net: I256, gas_cost: U256) -> f64 {
    let net = net.to_string().parse::<f64>().unwrap_or(0.0);
    let gas_cost = if gas_cost.is_zero() { 1.0 } else { gas_cost.to_string().parse::<f64>().unwrap_or(1.0) };
    net / gas_cost
}

pub fn rank(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(Opportunity::ranking_cmp);
}

/// Ranked output of one base scan, before it is wrapped for the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    pub single_hop: Vec<Opportunity>,
    pub multi_hop: Vec<Opportunity>,
    pub stats: ScanStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub reduced_tokens: usize,
    pub pools: usize,
    pub paths: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub chain_id: u64,
    /// Unix seconds at response time
    pub timestamp: u64,
    pub base: String,
    pub universe_count: usize,
    pub single_hop: Vec<Opportunity>,
    pub multi_hop: Vec<Opportunity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiScanResponse {
    pub chain_id: u64,
    pub timestamp: u64,
    pub bases: Vec<String>,
    pub universe_count: usize,
    pub single_hop: Vec<Opportunity>,
    pub multi_hop: Vec<Opportunity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::{USDC, default_polygon_venues, polygon_tokens};

    fn resolve(request: &ScanRequest) -> Result<ScanConfig, ScanError> {
        request.resolve(&polygon_tokens(), &default_polygon_venues(), &ScannerSettings::default())
    }

    #[test]
    fn test_request_defaults_from_json() -> eyre::Result<()> {
        let request: ScanRequest = serde_json::from_str(r#"{"base":"usdc","max_input":"1000"}"#)?;
        assert_eq!(request, ScanRequest::new("usdc", "1000"));

        let config = resolve(&request)?;
        assert_eq!(config.base.get_address(), USDC);
        assert_eq!(config.max_input, U256::from(1_000_000_000u64));
        assert_eq!(config.hop_limit, 4);
        assert_eq!(config.slippage_bps, 30);
        assert_eq!(config.flash_fee_bps, 9);
        assert_eq!(config.min_net_bps, 150);
        assert!(config.only_profitable);
        assert_eq!(config.stale_sec_ceiling, 600);
        assert_eq!(config.venues.len(), default_polygon_venues().len());
        assert_eq!(config.bridge_symbols, vec!["USDC", "USDT", "DAI", "WETH", "WMATIC"]);
        Ok(())
    }

    #[test]
    fn test_resolve_by_address_and_exact_amount() -> eyre::Result<()> {
        let request = ScanRequest::new(format!("{USDC:#x}"), "0.000001");
        let config = resolve(&request)?;
        assert_eq!(config.max_input, U256::from(1u64));
        Ok(())
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(resolve(&ScanRequest::new("NOPE", "1")), Err(ScanError::UnknownBaseToken(_))));
        assert!(matches!(resolve(&ScanRequest::new("USDC", "abc")), Err(ScanError::InvalidAmount { .. })));
        assert!(matches!(resolve(&ScanRequest::new("USDC", "0")), Err(ScanError::ZeroCeiling)));

        let request = ScanRequest { hop_limit: 5, ..ScanRequest::new("USDC", "1") };
        assert!(matches!(resolve(&request), Err(ScanError::InvalidHopLimit(5))));

        let request = ScanRequest { slippage_bps: 10_001, ..ScanRequest::new("USDC", "1") };
        assert!(matches!(resolve(&request), Err(ScanError::BpsOutOfRange { name: "slippage_bps", .. })));

        let request = ScanRequest { venue_allow_list: Some(vec!["nowhere".to_string()]), ..ScanRequest::new("USDC", "1") };
        assert!(matches!(resolve(&request), Err(ScanError::UnknownVenue(_))));

        let request = ScanRequest { venue_allow_list: Some(vec![]), ..ScanRequest::new("USDC", "1") };
        assert!(matches!(resolve(&request), Err(ScanError::EmptyVenueSelection)));
    }

    #[test]
    fn test_min_net_bps_floor_includes_flash_fee() -> eyre::Result<()> {
        let config = resolve(&ScanRequest { min_net_bps: -10_009, ..ScanRequest::new("USDC", "1") })?;
        assert_eq!(config.min_net_bps, -10_009);

        // everything lost plus the 9 bps flash fee
        let size = U256::from(10_000u64);
        let wiped = config.net(size, U256::ZERO);
        assert_eq!(net_bps(wiped, size), -10_009);
        let inspect = ScanConfig { only_profitable: false, ..config };
        assert!(inspect.passes(wiped, -10_009));

        let request = ScanRequest { min_net_bps: -10_010, ..ScanRequest::new("USDC", "1") };
        assert!(matches!(resolve(&request), Err(ScanError::BpsOutOfRange { name: "min_net_bps", .. })));
        Ok(())
    }

    #[test]
    fn test_venue_allow_list_case_insensitive() -> eyre::Result<()> {
        let request = ScanRequest { venue_allow_list: Some(vec!["QuickSwap_V2".to_string()]), ..ScanRequest::new("USDC", "1") };
        let config = resolve(&request)?;
        assert_eq!(config.venues.len(), 1);
        assert_eq!(config.venues[0].key, "quickswap_v2");
        Ok(())
    }

    #[test]
    fn test_gas_overrides_parse_exactly() -> eyre::Result<()> {
        let request = ScanRequest {
            gas_price_gwei: Some("30.5".to_string()),
            priority_fee_gwei: Some("0.000000001".to_string()),
            ..ScanRequest::new("USDC", "1")
        };
        let config = resolve(&request)?;
        assert_eq!(config.gas_price_wei, Some(U256::from(30_500_000_000u64)));
        assert_eq!(config.priority_fee_wei, Some(U256::from(1u64)));
        Ok(())
    }

    #[test]
    fn test_net_and_filters() -> eyre::Result<()> {
        let config = resolve(&ScanRequest { min_net_bps: 0, ..ScanRequest::new("USDC", "1") })?;
        let size = U256::from(10_000u64);

        // flash fee 9 bps of 10_000 is 9
        let net = config.net(size, U256::from(10_100u64));
        assert_eq!(net, I256::try_from(91i64).unwrap());
        assert_eq!(net_bps(net, size), 91);
        assert!(config.passes(net, 91));

        let loss = config.net(size, U256::from(9_000u64));
        assert_eq!(net_bps(loss, size), -1009);
        assert!(!config.passes(loss, -1009));

        let inspect = ScanConfig { only_profitable: false, min_net_bps: -20_000, ..config.clone() };
        assert!(inspect.passes(loss, -1009));

        let strict = ScanConfig { min_net_units: Some(I256::try_from(100i64).unwrap()), ..config };
        assert!(!strict.passes(net, 91));
        Ok(())
    }

    #[test]
    fn test_net_bps_truncates_toward_zero() -> eyre::Result<()> {
        assert_eq!(net_bps(I256::try_from(-1i64).unwrap(), U256::from(3u64)), -3333);
        assert_eq!(net_bps(I256::try_from(1i64).unwrap(), U256::from(3u64)), 3333);
        assert_eq!(net_bps(I256::ZERO, U256::ZERO), 0);
        Ok(())
    }

    fn opportunity(net: i64, ppg: f64, id: u8) -> Opportunity {
        Opportunity {
            kind: RouteKind::MultiHop,
            label: String::new(),
            route_id: SwapPathHash([id; 32]),
            tokens: vec![],
            symbols: vec![],
            venues: vec![],
            size: U256::from(1u64),
            net: I256::try_from(net).unwrap_or_default(),
            net_bps: 0,
            gas_cost: U256::ZERO,
            profit_per_gas: ppg,
        }
    }

    #[test]
    fn test_ranking_is_total() {
        let mut opportunities = vec![opportunity(5, 1.0, 3), opportunity(9, 0.5, 1), opportunity(5, 2.0, 2), opportunity(5, 1.0, 1)];
        rank(&mut opportunities);
        let order: Vec<u8> = opportunities.iter().map(|o| o.route_id.0[0]).collect();
        assert_eq!(order, vec![1, 2, 1, 3]);
        assert_eq!(opportunities[0].net, I256::try_from(9i64).unwrap_or_default());
    }

    #[test]
    fn test_opportunity_amounts_serialize_as_decimal_strings() -> eyre::Result<()> {
        let json = serde_json::to_value(opportunity(-42, 0.0, 7))?;
        assert_eq!(json["net"], "-42");
        assert_eq!(json["size"], "1");
        assert_eq!(json["kind"], "multi_hop");
        Ok(())
    }

    #[test]
    fn test_top_mids() {
        let settings = ScannerSettings::default();
        assert_eq!(settings.top_mids(10), 25);
        assert_eq!(settings.top_mids(40), 40);
        assert_eq!(settings.top_mids(160), 60);
    }
}
