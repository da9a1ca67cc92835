use super::reader::{ChainDataReader, PairQuery};
use crate::logic::graph::FastHashMap;
use crate::logic::pools::{PoolSnapshot, Venue};
use crate::utils::cache::{PairCache, PairKey};
use crate::utils::token::TokenWrapper;
use alloy_primitives::{Address, U256};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A pool address found through a factory `getPair` lookup, before its state is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredPair {
    pub address: Address,
    pub venue_key: String,
    pub fee_bps: u32,
    pub token_a: Address,
    pub token_b: Address,
}

/// Finds constant-product pools between tokens and reads their reserves.
///
/// Lookups go through the shared `PairCache` first. Failed reads degrade to "no pool".
#[derive(Clone)]
pub struct PairDiscovery {
    reader: Arc<dyn ChainDataReader>,
    cache: Arc<PairCache>,
}

impl PairDiscovery {
    pub fn new(reader: Arc<dyn ChainDataReader>, cache: Arc<PairCache>) -> Self {
        Self { reader, cache }
    }

    pub fn cache(&self) -> &PairCache {
        &self.cache
    }

    /// Every unordered token pair against every constant-product venue.
    pub async fn discover_pairs(&self, tokens: &[TokenWrapper], venues: &[Venue]) -> Vec<DiscoveredPair> {
        let by_factory: FastHashMap<Address, &Venue> =
            venues.iter().filter_map(|venue| venue.get_factory().map(|factory| (factory, venue))).collect();
        if by_factory.is_empty() {
            return Vec::new();
        }

        let mut found = Vec::new();
        let mut pending = Vec::new();

        for (i, token_a) in tokens.iter().enumerate() {
            for token_b in tokens.iter().skip(i + 1) {
                for venue in venues {
                    let Some(factory) = venue.get_factory() else { continue };
                    let query = PairQuery { factory, token_a: token_a.get_address(), token_b: token_b.get_address() };
                    match self.cache.get(&PairKey::new(factory, query.token_a, query.token_b)) {
                        Some(pool) => {
                            if !pool.is_zero() {
                                found.push(discovered(venue, query, pool));
                            }
                        }
                        None => pending.push(query),
                    }
                }
            }
        }

        debug!("Pair lookup: {} cached, {} to query", found.len(), pending.len());

        if !pending.is_empty() {
            match self.reader.get_pairs(&pending).await {
                Ok(results) => {
                    let mut failed = 0usize;
                    for (query, result) in results {
                        let Some(pool) = result else {
                            failed += 1;
                            continue;
                        };
                        self.cache.insert(PairKey::new(query.factory, query.token_a, query.token_b), pool);
                        if pool.is_zero() {
                            continue;
                        }
                        if let Some(venue) = by_factory.get(&query.factory) {
                            found.push(discovered(venue, query, pool));
                        }
                    }
                    if failed > 0 {
                        debug!("{} pair lookups failed", failed);
                    }
                }
                Err(e) => warn!("Pair lookup batch failed for {} queries: {}", pending.len(), e),
            }
        }

        info!(
            "Discovered {} pairs, cache size {} hit rate {:.2}",
            found.len(),
            self.cache.len(),
            self.cache.stats.hit_rate()
        );
        found
    }

    /// Read reserves for discovered pairs.
    ///
    /// Pools whose state read fails, whose tokens do not match the queried pair, or whose last
    /// update is older than `max_stale_secs` are dropped. A pool address seen twice is kept once.
    pub async fn read_pools(&self, pairs: &[DiscoveredPair], max_stale_secs: u64) -> Vec<PoolSnapshot> {
        let mut seen = HashSet::new();
        let unique: Vec<&DiscoveredPair> = pairs.iter().filter(|pair| seen.insert(pair.address)).collect();
        if unique.is_empty() {
            return Vec::new();
        }

        let addresses: Vec<Address> = unique.iter().map(|pair| pair.address).collect();
        let states = match self.reader.get_pool_states(&addresses).await {
            Ok(states) => states,
            Err(e) => {
                warn!("Pool state batch failed for {} pools: {}", addresses.len(), e);
                return Vec::new();
            }
        };
        let states: FastHashMap<Address, _> = states.into_iter().filter_map(|(address, state)| state.map(|s| (address, s))).collect();

        let now = match self.reader.latest_timestamp().await {
            Ok(now) => Some(now),
            Err(e) => {
                warn!("Latest timestamp unavailable, skipping staleness filter: {}", e);
                None
            }
        };

        let mut stale = 0usize;
        let mut pools = Vec::with_capacity(unique.len());
        for pair in unique {
            let Some(state) = states.get(&pair.address) else { continue };
            let matches = (state.token0 == pair.token_a && state.token1 == pair.token_b)
                || (state.token0 == pair.token_b && state.token1 == pair.token_a);
            if !matches {
                debug!("Pool {} tokens do not match its pair lookup", pair.address);
                continue;
            }

            let snapshot = PoolSnapshot {
                address: pair.address,
                venue_key: pair.venue_key.clone(),
                token0: state.token0,
                token1: state.token1,
                reserve0: state.reserve0,
                reserve1: state.reserve1,
                fee_bps: pair.fee_bps,
                last_update: state.last_update,
            };
            if let Some(now) = now {
                if snapshot.is_stale(now, max_stale_secs) {
                    stale += 1;
                    continue;
                }
            }
            pools.push(snapshot);
        }

        debug!("Read {} pools, {} stale", pools.len(), stale);
        pools
    }

    pub async fn discover(&self, tokens: &[TokenWrapper], venues: &[Venue], max_stale_secs: u64) -> Vec<PoolSnapshot> {
        let pairs = self.discover_pairs(tokens, venues).await;
        self.read_pools(&pairs, max_stale_secs).await
    }
}

fn discovered(venue: &Venue, query: PairQuery, pool: Address) -> DiscoveredPair {
    DiscoveredPair {
        address: pool,
        venue_key: venue.key.clone(),
        fee_bps: venue.get_fee_bps().unwrap_or_default(),
        token_a: query.token_a,
        token_b: query.token_b,
    }
}

/// Ranks non-stable tokens by the stable-side reserves of their direct stable pools.
#[derive(Clone, Debug, Default)]
pub struct LiquidityScorer {
    stables: HashSet<Address>,
}

impl LiquidityScorer {
    pub fn new(stables: impl IntoIterator<Item = Address>) -> Self {
        Self { stables: stables.into_iter().collect() }
    }

    /// Stables are the universe tokens carrying one of `symbols`.
    pub fn from_symbols(universe: &[TokenWrapper], symbols: &[String]) -> Self {
        Self::new(
            universe
                .iter()
                .filter(|token| symbols.iter().any(|symbol| token.has_symbol(symbol)))
                .map(|token| token.get_address()),
        )
    }

    pub fn is_stable(&self, token: Address) -> bool {
        self.stables.contains(&token)
    }

    /// Only pools with exactly one stable side contribute.
    pub fn scores(&self, pools: &[PoolSnapshot]) -> FastHashMap<Address, U256> {
        let mut scores: FastHashMap<Address, U256> = FastHashMap::default();
        for pool in pools {
            let stable0 = self.is_stable(pool.token0);
            let stable1 = self.is_stable(pool.token1);
            let (token, stable_reserve) = match (stable0, stable1) {
                (true, false) => (pool.token1, pool.reserve0),
                (false, true) => (pool.token0, pool.reserve1),
                _ => continue,
            };
            let score = scores.entry(token).or_default();
            *score = score.saturating_add(stable_reserve);
        }
        scores
    }

    /// The reduced token set: base first, then every universe token that is a top-`top_n`
    /// scorer or a bridge, in universe order.
    pub fn select_mids(
        &self,
        universe: &[TokenWrapper],
        scores: &FastHashMap<Address, U256>,
        top_n: usize,
        bridges: &[Address],
        base: &TokenWrapper,
    ) -> Vec<TokenWrapper> {
        let mut ranked: Vec<(usize, &TokenWrapper, U256)> = universe
            .iter()
            .enumerate()
            .filter_map(|(position, token)| {
                scores.get(&token.get_address()).filter(|score| !score.is_zero()).map(|score| (position, token, *score))
            })
            .collect();
        // ties keep universe order
        ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

        let mut allowed: HashSet<Address> = ranked.iter().take(top_n).map(|(_, token, _)| token.get_address()).collect();
        allowed.extend(bridges.iter().copied());

        let mut reduced = vec![base.clone()];
        reduced.extend(
            universe
                .iter()
                .filter(|token| token.get_address() != base.get_address() && allowed.contains(&token.get_address()))
                .cloned(),
        );
        reduced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sync::mock_reader::MockChainReader;
    use crate::logic::pools::VenueKind;
    use crate::utils::token::Token;
    use std::sync::atomic::Ordering;

    fn token(byte: u8, symbol: &str) -> TokenWrapper {
        Arc::new(Token::new(Address::repeat_byte(byte), symbol, 18))
    }

    fn v2(key: &str, byte: u8) -> Venue {
        Venue::new(key, VenueKind::ConstantProduct { factory: Address::repeat_byte(byte), fee_bps: 30 })
    }

    fn amount(n: u64) -> U256 {
        U256::from(n)
    }

    #[tokio::test]
    async fn test_discover_uses_cache_on_second_run() -> eyre::Result<()> {
        let (a, b, c) = (token(1, "A"), token(2, "B"), token(3, "C"));
        let venue = v2("dex", 0xf1);
        let reader = Arc::new(MockChainReader::new(1_000).with_pool(
            Address::repeat_byte(0xf1),
            Address::repeat_byte(0xaa),
            a.get_address(),
            b.get_address(),
            amount(100),
            amount(200),
            1_000,
        ));
        let discovery = PairDiscovery::new(reader.clone(), Arc::new(PairCache::new()));
        let tokens = vec![a, b, c];

        let first = discovery.discover(&tokens, &[venue.clone()], 600).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].venue_key, "dex");
        assert_eq!(reader.pair_reads.load(Ordering::SeqCst), 3);

        let second = discovery.discover(&tokens, &[venue], 600).await;
        assert_eq!(second, first);
        // absent pairs were cached as well
        assert_eq!(reader.pair_reads.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_cached() {
        let (a, b) = (token(1, "A"), token(2, "B"));
        let reader = Arc::new(MockChainReader::new(1_000).with_failing_pair(Address::repeat_byte(0xf1), a.get_address(), b.get_address()));
        let discovery = PairDiscovery::new(reader.clone(), Arc::new(PairCache::new()));

        let pairs = discovery.discover_pairs(&[a.clone(), b.clone()], &[v2("dex", 0xf1)]).await;
        assert!(pairs.is_empty());
        assert!(discovery.cache().is_empty());

        discovery.discover_pairs(&[a, b], &[v2("dex", 0xf1)]).await;
        assert_eq!(reader.pair_reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_and_failed_pools_dropped() {
        let (a, b, c) = (token(1, "A"), token(2, "B"), token(3, "C"));
        let factory = Address::repeat_byte(0xf1);
        let reader = Arc::new(
            MockChainReader::new(10_000)
                .with_pool(factory, Address::repeat_byte(0xa1), a.get_address(), b.get_address(), amount(1), amount(1), 9_500)
                .with_pool(factory, Address::repeat_byte(0xa2), a.get_address(), c.get_address(), amount(1), amount(1), 9_000)
                .with_pool(factory, Address::repeat_byte(0xa3), b.get_address(), c.get_address(), amount(1), amount(1), 9_999)
                .with_failing_pool(Address::repeat_byte(0xa3)),
        );
        let discovery = PairDiscovery::new(reader, Arc::new(PairCache::new()));

        let pools = discovery.discover(&[a, b, c], &[v2("dex", 0xf1)], 600).await;
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].address, Address::repeat_byte(0xa1));
    }

    #[tokio::test]
    async fn test_offline_reader_yields_nothing() {
        let reader = Arc::new(MockChainReader::new(0));
        reader.set_offline(true);
        let discovery = PairDiscovery::new(reader, Arc::new(PairCache::new()));
        let pools = discovery.discover(&[token(1, "A"), token(2, "B")], &[v2("dex", 0xf1)], 600).await;
        assert!(pools.is_empty());
        assert!(discovery.cache().is_empty());
    }

    fn pool(token0: &TokenWrapper, token1: &TokenWrapper, reserve0: u64, reserve1: u64) -> PoolSnapshot {
        PoolSnapshot {
            address: Address::random(),
            venue_key: "dex".to_string(),
            token0: token0.get_address(),
            token1: token1.get_address(),
            reserve0: amount(reserve0),
            reserve1: amount(reserve1),
            fee_bps: 30,
            last_update: 0,
        }
    }

    #[test]
    fn test_scores_count_stable_side_only() {
        let (usdc, dai, x, y) = (token(1, "USDC"), token(2, "DAI"), token(3, "X"), token(4, "Y"));
        let universe = vec![usdc.clone(), dai.clone(), x.clone(), y.clone()];
        let scorer = LiquidityScorer::from_symbols(&universe, &["USDC".to_string(), "DAI".to_string()]);

        let pools = vec![pool(&usdc, &x, 500, 1), pool(&x, &dai, 7, 250), pool(&usdc, &dai, 1_000, 1_000), pool(&x, &y, 10, 10)];
        let scores = scorer.scores(&pools);

        assert_eq!(scores.get(&x.get_address()), Some(&amount(750)));
        assert_eq!(scores.get(&y.get_address()), None);
        assert_eq!(scores.get(&usdc.get_address()), None);
    }

    #[test]
    fn test_select_mids_bounds_and_order() {
        let base = token(0x10, "WMATIC");
        let usdc = token(1, "USDC");
        let universe: Vec<TokenWrapper> =
            vec![base.clone(), usdc.clone(), token(2, "A"), token(3, "B"), token(4, "C"), token(5, "D")];
        let scorer = LiquidityScorer::new([usdc.get_address()]);

        let mut scores = FastHashMap::default();
        scores.insert(Address::repeat_byte(2), amount(5));
        scores.insert(Address::repeat_byte(3), amount(50));
        scores.insert(Address::repeat_byte(4), amount(20));
        scores.insert(Address::repeat_byte(5), U256::ZERO);

        let reduced = scorer.select_mids(&universe, &scores, 2, &[usdc.get_address()], &base);
        let symbols: Vec<&str> = reduced.iter().map(|t| t.get_symbol()).collect();
        assert_eq!(symbols, vec!["WMATIC", "USDC", "B", "C"]);
    }

    #[test]
    fn test_select_mids_always_contains_base() {
        let base = token(0x42, "BASE");
        let universe = vec![token(1, "A")];
        let reduced = LiquidityScorer::default().select_mids(&universe, &FastHashMap::default(), 10, &[], &base);
        assert_eq!(reduced, vec![base]);
    }
}
