use super::reader::{ChainDataReader, PairQuery, PoolState, QuoteRequest};
use crate::logic::pools::constant_product_amount_out;
use crate::utils::cache::PairKey;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use eyre::{Result, eyre};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Virtual liquidity behind a mocked quoter tier, priced with the constant-product formula.
#[derive(Clone, Copy, Debug)]
pub struct MockQuoteCurve {
    pub reserve_in: U256,
    pub reserve_out: U256,
    pub fee_bps: u32,
}

/// In-memory `ChainDataReader` for tests and benches.
///
/// Pairs, pool states and quoter curves are registered up front. Individual pools or quotes
/// can be marked as failing, and per-method item counters expose how many reads were issued.
#[derive(Debug, Default)]
pub struct MockChainReader {
    pairs: HashMap<PairKey, Address>,
    pools: HashMap<Address, PoolState>,
    // (quoter, token_in, token_out, fee)
    quotes: HashMap<(Address, Address, Address, Option<u32>), MockQuoteCurve>,
    failing_pairs: HashSet<PairKey>,
    failing_pools: HashSet<Address>,
    timestamp: u64,
    offline: AtomicBool,
    pub pair_reads: AtomicUsize,
    pub pool_reads: AtomicUsize,
    pub quote_reads: AtomicUsize,
}

impl MockChainReader {
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp, ..Self::default() }
    }

    /// Register a pair under `factory` together with its reserve snapshot.
    pub fn with_pool(
        mut self,
        factory: Address,
        pool: Address,
        token0: Address,
        token1: Address,
        reserve0: U256,
        reserve1: U256,
        last_update: u64,
    ) -> Self {
        self.pairs.insert(PairKey::new(factory, token0, token1), pool);
        self.pools.insert(pool, PoolState { token0, token1, reserve0, reserve1, last_update });
        self
    }

    /// Register a quoter tier. Both directions are priced from the same curve.
    pub fn with_quote_curve(mut self, quoter: Address, token_a: Address, token_b: Address, fee: Option<u32>, curve: MockQuoteCurve) -> Self {
        let reverse = MockQuoteCurve { reserve_in: curve.reserve_out, reserve_out: curve.reserve_in, fee_bps: curve.fee_bps };
        self.quotes.insert((quoter, token_a, token_b, fee), curve);
        self.quotes.insert((quoter, token_b, token_a, fee), reverse);
        self
    }

    pub fn with_failing_pair(mut self, factory: Address, token_a: Address, token_b: Address) -> Self {
        self.failing_pairs.insert(PairKey::new(factory, token_a, token_b));
        self
    }

    pub fn with_failing_pool(mut self, pool: Address) -> Self {
        self.failing_pools.insert(pool);
        self
    }

    /// Make every subsequent call fail as a whole.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) { Err(eyre!("mock reader offline")) } else { Ok(()) }
    }
}

#[async_trait]
impl ChainDataReader for MockChainReader {
    async fn get_pairs(&self, queries: &[PairQuery]) -> Result<Vec<(PairQuery, Option<Address>)>> {
        self.check_online()?;
        self.pair_reads.fetch_add(queries.len(), Ordering::SeqCst);

        Ok(queries
            .iter()
            .map(|query| {
                let key = PairKey::new(query.factory, query.token_a, query.token_b);
                if self.failing_pairs.contains(&key) {
                    (*query, None)
                } else {
                    (*query, Some(self.pairs.get(&key).copied().unwrap_or(Address::ZERO)))
                }
            })
            .collect())
    }

    async fn get_pool_states(&self, pools: &[Address]) -> Result<Vec<(Address, Option<PoolState>)>> {
        self.check_online()?;
        self.pool_reads.fetch_add(pools.len(), Ordering::SeqCst);

        Ok(pools
            .iter()
            .map(|pool| {
                let state = if self.failing_pools.contains(pool) { None } else { self.pools.get(pool).copied() };
                (*pool, state)
            })
            .collect())
    }

    async fn quote_exact_input(&self, requests: &[QuoteRequest]) -> Result<Vec<(QuoteRequest, Option<U256>)>> {
        self.check_online()?;
        self.quote_reads.fetch_add(requests.len(), Ordering::SeqCst);

        Ok(requests
            .iter()
            .map(|request| {
                // an unknown tier behaves like a reverting quoter
                let amount_out = self
                    .quotes
                    .get(&(request.quoter, request.token_in, request.token_out, request.fee))
                    .map(|curve| constant_product_amount_out(request.amount_in, curve.reserve_in, curve.reserve_out, curve.fee_bps));
                (*request, amount_out)
            })
            .collect())
    }

    async fn latest_timestamp(&self) -> Result<u64> {
        self.check_online()?;
        Ok(self.timestamp)
    }
}
