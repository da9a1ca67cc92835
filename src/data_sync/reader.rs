use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use eyre::Result;
use std::time::{SystemTime, UNIX_EPOCH};

/// One factory `getPair` lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PairQuery {
    pub factory: Address,
    pub token_a: Address,
    pub token_b: Address,
}

/// Raw state of a constant-product pair contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolState {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
    pub last_update: u64,
}

/// One quoter call. `fee == None` selects the tierless (Algebra) quoter signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QuoteRequest {
    pub quoter: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub fee: Option<u32>,
    pub amount_in: U256,
}

/// Batched access to chain state.
///
/// Every method returns one entry per request, paired with the request it answers. A failed
/// item is `None`; an `Err` means the whole call failed (transport down, malformed response).
#[async_trait]
pub trait ChainDataReader: Send + Sync {
    /// `Some(Address::ZERO)` means the factory has no pair, `None` means the lookup failed.
    async fn get_pairs(&self, queries: &[PairQuery]) -> Result<Vec<(PairQuery, Option<Address>)>>;

    async fn get_pool_states(&self, pools: &[Address]) -> Result<Vec<(Address, Option<PoolState>)>>;

    async fn quote_exact_input(&self, requests: &[QuoteRequest]) -> Result<Vec<(QuoteRequest, Option<U256>)>>;

    /// Reference time for the staleness filter, in unix seconds.
    async fn latest_timestamp(&self) -> Result<u64> {
        Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
    }
}
