use super::graph::{SwapPathHash, TokenGraph, find_all_cycles, swap_path::generate_swap_path_hash};
use super::optimizer::SizeOptimizer;
use super::pools::{Venue, VenueClass};
use super::quote_provider::{Edge, QuoteProvider};
use super::simulator::PathSimulator;
use super::types::{
    MultiScanResponse, Opportunity, RouteKind, ScanConfig, ScanRequest, ScanResponse, ScanResult, ScanStats, ScannerSettings,
    net_bps, profit_per_gas, rank,
};
use crate::data_sync::discovery::{LiquidityScorer, PairDiscovery};
use crate::data_sync::gas::{FixedGasPrice, GasPriceSource};
use crate::data_sync::reader::ChainDataReader;
use crate::data_sync::universe::{StaticUniverse, TokenUniverseProvider, UniverseLoader};
use crate::errors::ScanError;
use crate::utils::cache::PairCache;
use crate::utils::config_loader::{ScannerConfigFile, load_from_file};
use crate::utils::constants::{POLYGON_CHAIN_ID, default_polygon_venues, polygon_tokens};
use crate::utils::token::{Token, TokenWrapper};
use alloy_primitives::{Address, U256};
use futures::StreamExt;
use futures::stream;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// One round trip to evaluate: every leg is priced as the best of its candidate edges.
struct Route<'g> {
    kind: RouteKind,
    route_id: SwapPathHash,
    tokens: Vec<TokenWrapper>,
    legs: Vec<&'g [Arc<Edge>]>,
}

/// Per-scan values shared by every route evaluation.
struct ScanContext<'a> {
    config: &'a ScanConfig,
    simulator: PathSimulator,
    optimizer: SizeOptimizer,
    samples: Vec<U256>,
    gas_cost_single: U256,
    gas_cost_multi: U256,
}

/// Discovers, sizes and ranks round-trip routes for scan requests.
pub struct OpportunityScanner {
    discovery: PairDiscovery,
    quotes: QuoteProvider,
    universe: UniverseLoader,
    gas_source: Arc<dyn GasPriceSource>,
    settings: ScannerSettings,
    venues: Vec<Venue>,
    known_tokens: Vec<Token>,
    chain_id: u64,
}

impl OpportunityScanner {
    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn cache(&self) -> &PairCache {
        self.discovery.cache()
    }

    pub fn resolve(&self, request: &ScanRequest) -> Result<ScanConfig, ScanError> {
        request.resolve(&self.known_tokens, &self.venues, &self.settings)
    }

    pub async fn load_universe(&self) -> Result<Vec<TokenWrapper>, ScanError> {
        self.universe.load(self.settings.universe_request_limit, self.settings.universe_limit).await
    }

    /// Resolve, load the universe, scan one base.
    pub async fn scan_request(&self, request: &ScanRequest) -> Result<ScanResponse, ScanError> {
        let config = self.resolve(request)?;
        let universe = self.load_universe().await?;
        let result = self.scan(&config, &universe).await;

        Ok(ScanResponse {
            chain_id: self.chain_id,
            timestamp: unix_now(),
            base: config.base.get_symbol().to_string(),
            universe_count: universe.len(),
            single_hop: result.single_hop,
            multi_hop: result.multi_hop,
        })
    }

    /// Scan several bases against one universe and merge the rankings.
    ///
    /// Every request is resolved before any read happens, so one bad request rejects the call.
    pub async fn scan_many(&self, requests: &[ScanRequest]) -> Result<MultiScanResponse, ScanError> {
        let configs = requests.iter().map(|request| self.resolve(request)).collect::<Result<Vec<_>, _>>()?;
        let universe = self.load_universe().await?;

        let results: Vec<ScanResult> = stream::iter(configs.iter())
            .map(|config| self.scan(config, &universe))
            .buffered(self.settings.max_concurrent_bases.max(1))
            .collect()
            .await;

        let mut single_hop: Vec<Opportunity> = Vec::new();
        let mut multi_hop: Vec<Opportunity> = Vec::new();
        for result in results {
            single_hop.extend(result.single_hop);
            multi_hop.extend(result.multi_hop);
        }
        rank(&mut single_hop);
        rank(&mut multi_hop);
        single_hop.truncate(self.settings.max_single_results);
        multi_hop.truncate(self.settings.max_multi_results);

        info!("Multi-base scan over {} bases: {} single-hop, {} multi-hop", configs.len(), single_hop.len(), multi_hop.len());

        Ok(MultiScanResponse {
            chain_id: self.chain_id,
            timestamp: unix_now(),
            bases: configs.iter().map(|config| config.base.get_symbol().to_string()).collect(),
            universe_count: universe.len(),
            single_hop,
            multi_hop,
        })
    }

    /// One base scan over an already loaded universe. Read failures only shrink the result.
    pub async fn scan(&self, config: &ScanConfig, universe: &[TokenWrapper]) -> ScanResult {
        let started = Instant::now();
        let base = config.base.clone();

        let mut candidates: Vec<TokenWrapper> = universe.iter().take(self.settings.universe_limit).cloned().collect();
        if !candidates.iter().any(|token| token.get_address() == base.get_address()) {
            candidates.push(base.clone());
        }

        // Liquidity-aware mids
        let all_pools = self.discovery.discover(&candidates, &config.venues, config.stale_sec_ceiling).await;
        let scorer = LiquidityScorer::from_symbols(&candidates, &self.settings.stable_symbols);
        let scores = scorer.scores(&all_pools);
        let bridges: Vec<Address> = candidates
            .iter()
            .filter(|token| config.bridge_symbols.iter().any(|symbol| token.has_symbol(symbol)))
            .map(|token| token.get_address())
            .collect();
        let top_n = self.settings.top_mids(candidates.len());
        let reduced = scorer.select_mids(&candidates, &scores, top_n, &bridges, &base);

        let reduced_set: HashSet<Address> = reduced.iter().map(|token| token.get_address()).collect();
        let pools: Vec<_> =
            all_pools.into_iter().filter(|pool| reduced_set.contains(&pool.token0) && reduced_set.contains(&pool.token1)).collect();

        let graph = match TokenGraph::build(&reduced, &pools, &config.venues) {
            Ok(graph) => graph,
            Err(e) => {
                warn!("Token graph build failed for {}: {}", base, e);
                return ScanResult::default();
            }
        };

        let simulator = PathSimulator::new(self.quotes.clone(), config.slippage_bps);
        let (gas_cost_single, gas_cost_multi) = self.gas_costs(config, &graph).await;
        let samples: Vec<U256> = self
            .settings
            .sample_divisors
            .iter()
            .filter(|divisor| **divisor > 0)
            .map(|divisor| config.max_input / U256::from(*divisor))
            .filter(|sample| !sample.is_zero())
            .collect();

        let ctx = ScanContext {
            config,
            simulator,
            optimizer: SizeOptimizer::new(self.settings.optimizer_iterations, config.max_input),
            samples,
            gas_cost_single,
            gas_cost_multi,
        };

        // Single hop: base -> mid -> base over the best edge of any class per leg
        let single_routes: Vec<Route<'_>> = reduced
            .iter()
            .filter(|mid| mid.get_address() != base.get_address())
            .filter_map(|mid| {
                let out_legs = graph.edges_between(base.get_address(), mid.get_address());
                let back_legs = graph.edges_between(mid.get_address(), base.get_address());
                if out_legs.is_empty() || back_legs.is_empty() {
                    return None;
                }
                let tokens = vec![base.clone(), mid.clone(), base.clone()];
                Some(Route { kind: RouteKind::SingleHop, route_id: generate_swap_path_hash(&tokens, &[]), tokens, legs: vec![out_legs, back_legs] })
            })
            .collect();
        let mut single_hop = self.evaluate_routes(&ctx, single_routes).await;

        // Multi hop: enumerated cycles through their own edges
        let allowed_mids: HashSet<Address> = reduced_set.iter().copied().filter(|address| *address != base.get_address()).collect();
        let paths = match find_all_cycles(&graph, base.get_address(), &allowed_mids, config.hop_limit, self.settings.max_paths) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Path enumeration failed for {}: {}", base, e);
                Vec::new()
            }
        };
        let path_count = paths.len();
        let multi_routes: Vec<Route<'_>> = paths
            .iter()
            .map(|path| Route {
                kind: RouteKind::MultiHop,
                route_id: path.swap_path_hash,
                tokens: path.tokens.clone(),
                legs: path.edges.iter().map(std::slice::from_ref).collect(),
            })
            .collect();
        let mut multi_hop = self.evaluate_routes(&ctx, multi_routes).await;

        rank(&mut single_hop);
        rank(&mut multi_hop);
        single_hop.truncate(self.settings.max_single_results);
        multi_hop.truncate(self.settings.max_multi_results);

        let stats = ScanStats {
            reduced_tokens: reduced.len(),
            pools: pools.len(),
            paths: path_count,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            "Scan {} done: {} mids, {} pools, {} paths, {} single-hop, {} multi-hop in {}ms",
            base.get_symbol(),
            stats.reduced_tokens.saturating_sub(1),
            stats.pools,
            stats.paths,
            single_hop.len(),
            multi_hop.len(),
            stats.elapsed_ms
        );

        ScanResult { single_hop, multi_hop, stats }
    }

    async fn evaluate_routes(&self, ctx: &ScanContext<'_>, routes: Vec<Route<'_>>) -> Vec<Opportunity> {
        stream::iter(routes)
            .map(|route| self.evaluate_route(ctx, route))
            .buffered(self.settings.max_concurrent_routes.max(1))
            .filter_map(futures::future::ready)
            .collect()
            .await
    }

    /// Try the sample sizes in order. The first sample that passes every filter is refined by
    /// the optimizer in `[sample/5, 5*sample]` and becomes the route's only opportunity.
    async fn evaluate_route(&self, ctx: &ScanContext<'_>, route: Route<'_>) -> Option<Opportunity> {
        let config = ctx.config;
        let simulator = &ctx.simulator;
        let legs: &[&[Arc<Edge>]] = &route.legs;

        for &sample in &ctx.samples {
            let simulation = simulator.simulate_legs(legs, sample).await;
            if simulation.amount_out.is_zero() {
                continue;
            }
            let sample_net = config.net(sample, simulation.amount_out);
            if !config.passes(sample_net, net_bps(sample_net, sample)) {
                continue;
            }

            let lo = (sample / U256::from(5u64)).max(U256::from(1u64));
            let hi = sample.saturating_mul(U256::from(5u64)).min(config.max_input);
            let objective = move |size: U256| async move {
                let amount_out = simulator.simulate_legs(legs, size).await.amount_out;
                config.net(size, amount_out)
            };
            let optimized = ctx.optimizer.maximize(objective, lo, hi).await;

            let mut chosen = (sample, simulation);
            if optimized.net > sample_net && optimized.size != sample {
                let refined = simulator.simulate_legs(legs, optimized.size).await;
                let refined_net = config.net(optimized.size, refined.amount_out);
                if !refined.amount_out.is_zero() && refined_net > sample_net && config.passes(refined_net, net_bps(refined_net, optimized.size))
                {
                    chosen = (optimized.size, refined);
                }
            }

            let (size, simulation) = chosen;
            let net = config.net(size, simulation.amount_out);
            let bps = net_bps(net, size);
            if !config.passes(net, bps) {
                return None;
            }

            let gas_cost = match route.kind {
                RouteKind::SingleHop => ctx.gas_cost_single,
                RouteKind::MultiHop => ctx.gas_cost_multi,
            };
            let symbols: Vec<String> = route.tokens.iter().map(|token| token.get_symbol().to_string()).collect();
            let label = match route.kind {
                RouteKind::SingleHop => symbols.join("/"),
                RouteKind::MultiHop => simulation.venues.join(" -> "),
            };
            debug!("Route {} passed at size {} with net {} ({} bps)", label, size, net, bps);

            return Some(Opportunity {
                kind: route.kind,
                label,
                route_id: route.route_id,
                tokens: route.tokens.iter().map(|token| token.get_address()).collect(),
                symbols,
                venues: simulation.venues,
                size,
                net,
                net_bps: bps,
                gas_cost,
                profit_per_gas: profit_per_gas(net, gas_cost),
            });
        }
        None
    }

    /// Gas cost of a two-leg and a multi-leg route, in base-token units.
    ///
    /// A failing gas source counts as a zero price. A non-native base converts the native cost
    /// through the best constant-product edge native -> base, or keeps the raw amount without one.
    async fn gas_costs(&self, config: &ScanConfig, graph: &TokenGraph) -> (U256, U256) {
        let quote = match self.gas_source.gas_price().await {
            Ok(quote) => quote,
            Err(e) => {
                warn!("Gas price unavailable, assuming zero: {}", e);
                Default::default()
            }
        };
        let base_fee = config.gas_price_wei.unwrap_or(quote.base_fee);
        let priority_fee = config.priority_fee_wei.unwrap_or(quote.priority_fee);
        let gas_price = base_fee.saturating_add(priority_fee);

        let native_single = gas_price.saturating_mul(U256::from(self.settings.gas_units_single));
        let native_multi = gas_price.saturating_mul(U256::from(self.settings.gas_units_multi));

        let native = self.settings.wrapped_native;
        if config.base.get_address() == native || gas_price.is_zero() {
            return (native_single, native_multi);
        }

        let conversion: Vec<Arc<Edge>> = graph
            .edges_between(native, config.base.get_address())
            .iter()
            .filter(|edge| edge.class == VenueClass::ConstantProduct)
            .cloned()
            .collect();
        if conversion.is_empty() {
            debug!("No native -> {} edge, gas cost stays in native units", config.base.get_symbol());
            return (native_single, native_multi);
        }

        let convert = |amount: U256| {
            let conversion = &conversion;
            async move {
                let converted = self.quotes.best_of(conversion, amount).await.amount_out;
                if converted.is_zero() { amount } else { converted }
            }
        };
        futures::join!(convert(native_single), convert(native_multi))
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|duration| duration.as_secs()).unwrap_or_default()
}

/// Builder pattern for creating and configuring an OpportunityScanner
pub struct OpportunityScannerBuilder {
    reader: Arc<dyn ChainDataReader>,
    universe_provider: Option<Arc<dyn TokenUniverseProvider>>,
    gas_source: Option<Arc<dyn GasPriceSource>>,
    cache: Option<Arc<PairCache>>,
    settings: ScannerSettings,
    venues: Vec<Venue>,
    known_tokens: Vec<Token>,
    chain_id: u64,
}

impl OpportunityScannerBuilder {
    pub fn new(reader: Arc<dyn ChainDataReader>) -> Self {
        Self {
            reader,
            universe_provider: None,
            gas_source: None,
            cache: None,
            settings: ScannerSettings::default(),
            venues: default_polygon_venues(),
            known_tokens: Vec::new(),
            chain_id: POLYGON_CHAIN_ID,
        }
    }

    /// Settings, venues, static tokens and chain id from a loaded config file.
    pub fn with_config_file(mut self, config: &ScannerConfigFile) -> Self {
        self.settings = config.scanner.clone();
        self.venues = config.venues.clone();
        self.known_tokens = config.tokens.clone();
        self.chain_id = config.chain.chain_id;
        self
    }

    /// Load a TOML config file, expanding `${VAR}` references, and apply it.
    pub async fn with_config_path(self, path: impl Into<String>) -> Result<Self, ScanError> {
        let config: ScannerConfigFile = load_from_file(path.into()).await?;
        Ok(self.with_config_file(&config))
    }

    pub fn with_universe_provider(mut self, provider: Arc<dyn TokenUniverseProvider>) -> Self {
        self.universe_provider = Some(provider);
        self
    }

    pub fn with_gas_source(mut self, gas_source: Arc<dyn GasPriceSource>) -> Self {
        self.gas_source = Some(gas_source);
        self
    }

    /// Share a pair cache across scanners. Defaults to a fresh one.
    pub fn with_cache(mut self, cache: Arc<PairCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_settings(mut self, settings: ScannerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_venues(mut self, venues: Vec<Venue>) -> Self {
        self.venues = venues;
        self
    }

    /// Tokens a request's base can resolve to, in addition to the built-in Polygon table.
    pub fn with_known_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.known_tokens = tokens;
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn build(self) -> OpportunityScanner {
        let mut known_tokens = self.known_tokens;
        for token in polygon_tokens() {
            if !known_tokens.contains(&token) {
                known_tokens.push(token);
            }
        }

        let provider = self.universe_provider.unwrap_or_else(|| Arc::new(StaticUniverse::new(known_tokens.clone())));
        let cache = self.cache.unwrap_or_else(|| Arc::new(PairCache::new()));

        OpportunityScanner {
            discovery: PairDiscovery::new(self.reader.clone(), cache),
            quotes: QuoteProvider::new(self.reader),
            universe: UniverseLoader::new(provider),
            gas_source: self.gas_source.unwrap_or_else(|| Arc::new(FixedGasPrice::default())),
            settings: self.settings,
            venues: self.venues,
            known_tokens,
            chain_id: self.chain_id,
        }
    }
}
