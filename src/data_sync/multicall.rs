use super::config::ChainConfig;
use super::reader::{ChainDataReader, PairQuery, PoolState, QuoteRequest};
use super::rpc::{JsonRpcClient, parse_quantity};
use alloy_primitives::aliases::{U24, U160};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use eyre::Result;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

sol! {
    #[derive(Debug)]
    struct Call3 {
        address target;
        bool allowFailure;
        bytes callData;
    }

    #[derive(Debug)]
    struct MulticallResult {
        bool success;
        bytes returnData;
    }

    function aggregate3(Call3[] calldata calls) external payable returns (MulticallResult[] memory returnData);

    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    interface IQuoterV2 {
        struct QuoteExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        function quoteExactInputSingle(QuoteExactInputSingleParams memory params)
            external
            returns (uint256 amountOut, uint160 sqrtPriceX96After, uint32 initializedTicksCrossed, uint256 gasEstimate);
    }

    interface IAlgebraQuoter {
        function quoteExactInputSingle(address tokenIn, address tokenOut, uint256 amountIn, uint160 limitSqrtPrice)
            external
            returns (uint256 amountOut, uint16 fee);
    }
}

// token0, token1, getReserves
const CALLS_PER_POOL: usize = 3;

/// `ChainDataReader` over JSON-RPC, packing reads into Multicall3 `aggregate3` batches.
///
/// Batches run with bounded concurrency. A batch that fails as a whole marks every item in it
/// as failed; the other batches are unaffected.
#[derive(Debug, Clone)]
pub struct MulticallReader {
    client: JsonRpcClient,
    multicall_address: Address,
    max_calls_per_batch: usize,
    max_inflight_batches: usize,
}

impl MulticallReader {
    pub fn new(client: JsonRpcClient, multicall_address: Address, max_calls_per_batch: usize, max_inflight_batches: usize) -> Self {
        Self {
            client,
            multicall_address,
            max_calls_per_batch: max_calls_per_batch.max(1),
            max_inflight_batches: max_inflight_batches.max(1),
        }
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        let client = JsonRpcClient::new(config.rpc_http_url.clone(), config.http_timeout())?;
        Ok(Self::new(client, config.multicall_address, config.max_calls_per_batch, config.max_inflight_batches))
    }

    pub fn client(&self) -> &JsonRpcClient {
        &self.client
    }

    pub fn prepare_get_pair_call(query: &PairQuery) -> Call3 {
        Call3 {
            target: query.factory,
            allowFailure: true,
            callData: IUniswapV2Factory::getPairCall { tokenA: query.token_a, tokenB: query.token_b }.abi_encode().into(),
        }
    }

    pub fn prepare_pool_state_calls(pool: Address) -> [Call3; CALLS_PER_POOL] {
        let call = |data: Vec<u8>| Call3 { target: pool, allowFailure: true, callData: data.into() };
        [
            call(IUniswapV2Pair::token0Call {}.abi_encode()),
            call(IUniswapV2Pair::token1Call {}.abi_encode()),
            call(IUniswapV2Pair::getReservesCall {}.abi_encode()),
        ]
    }

    pub fn prepare_quote_call(request: &QuoteRequest) -> Call3 {
        let call_data = match request.fee {
            Some(fee) => IQuoterV2::quoteExactInputSingleCall {
                params: IQuoterV2::QuoteExactInputSingleParams {
                    tokenIn: request.token_in,
                    tokenOut: request.token_out,
                    amountIn: request.amount_in,
                    fee: U24::saturating_from(fee),
                    sqrtPriceLimitX96: U160::ZERO,
                },
            }
            .abi_encode(),
            None => IAlgebraQuoter::quoteExactInputSingleCall {
                tokenIn: request.token_in,
                tokenOut: request.token_out,
                amountIn: request.amount_in,
                limitSqrtPrice: U160::ZERO,
            }
            .abi_encode(),
        };

        Call3 { target: request.quoter, allowFailure: true, callData: call_data.into() }
    }

    /// Run `calls` through aggregate3. The output has exactly one entry per call, in call order.
    async fn aggregate(&self, calls: Vec<Call3>) -> Vec<Option<Bytes>> {
        let mut batches: Vec<Vec<Call3>> = Vec::new();
        let mut remaining = calls.into_iter();
        loop {
            let batch: Vec<Call3> = remaining.by_ref().take(self.max_calls_per_batch).collect();
            if batch.is_empty() {
                break;
            }
            batches.push(batch);
        }

        let batch_count = batches.len();
        let results: Vec<Vec<Option<Bytes>>> = stream::iter(batches.into_iter().enumerate())
            .map(|(index, batch)| self.execute_batch(index, batch))
            .buffered(self.max_inflight_batches)
            .collect()
            .await;

        debug!("Multicall finished {} batches", batch_count);
        results.into_iter().flatten().collect()
    }

    async fn execute_batch(&self, index: usize, batch: Vec<Call3>) -> Vec<Option<Bytes>> {
        let expected = batch.len();
        let multicall_data = aggregate3Call { calls: batch }.abi_encode();

        let response = match self.client.call(self.multicall_address, multicall_data.into()).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Multicall batch {} ({} calls) failed: {}", index, expected, e);
                return vec![None; expected];
            }
        };

        match aggregate3Call::abi_decode_returns(&response) {
            Ok(results) if results.len() == expected => {
                results.into_iter().map(|result| result.success.then_some(result.returnData)).collect()
            }
            Ok(results) => {
                warn!("Multicall batch {} returned {} results for {} calls", index, results.len(), expected);
                vec![None; expected]
            }
            Err(e) => {
                warn!("Failed to decode multicall batch {}: {}", index, e);
                vec![None; expected]
            }
        }
    }
}

pub fn decode_pair(data: &[u8]) -> Option<Address> {
    IUniswapV2Factory::getPairCall::abi_decode_returns(data).ok()
}

pub fn decode_pool_state(token0: &[u8], token1: &[u8], reserves: &[u8]) -> Option<PoolState> {
    let token0 = IUniswapV2Pair::token0Call::abi_decode_returns(token0).ok()?;
    let token1 = IUniswapV2Pair::token1Call::abi_decode_returns(token1).ok()?;
    let reserves = IUniswapV2Pair::getReservesCall::abi_decode_returns(reserves).ok()?;

    Some(PoolState {
        token0,
        token1,
        reserve0: U256::from(reserves.reserve0),
        reserve1: U256::from(reserves.reserve1),
        last_update: u64::from(reserves.blockTimestampLast),
    })
}

pub fn decode_quote(request: &QuoteRequest, data: &[u8]) -> Option<U256> {
    match request.fee {
        Some(_) => IQuoterV2::quoteExactInputSingleCall::abi_decode_returns(data).ok().map(|r| r.amountOut),
        None => IAlgebraQuoter::quoteExactInputSingleCall::abi_decode_returns(data).ok().map(|r| r.amountOut),
    }
}

#[async_trait]
impl ChainDataReader for MulticallReader {
    async fn get_pairs(&self, queries: &[PairQuery]) -> Result<Vec<(PairQuery, Option<Address>)>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let calls = queries.iter().map(Self::prepare_get_pair_call).collect();
        let results = self.aggregate(calls).await;

        Ok(queries.iter().copied().zip(results).map(|(query, raw)| (query, raw.as_ref().and_then(|data| decode_pair(data)))).collect())
    }

    async fn get_pool_states(&self, pools: &[Address]) -> Result<Vec<(Address, Option<PoolState>)>> {
        if pools.is_empty() {
            return Ok(Vec::new());
        }

        let calls = pools.iter().flat_map(|pool| Self::prepare_pool_state_calls(*pool)).collect();
        let results = self.aggregate(calls).await;

        Ok(pools
            .iter()
            .copied()
            .zip(results.chunks_exact(CALLS_PER_POOL))
            .map(|(pool, raw)| {
                let state = match (&raw[0], &raw[1], &raw[2]) {
                    (Some(t0), Some(t1), Some(reserves)) => decode_pool_state(t0, t1, reserves),
                    _ => None,
                };
                (pool, state)
            })
            .collect())
    }

    async fn quote_exact_input(&self, requests: &[QuoteRequest]) -> Result<Vec<(QuoteRequest, Option<U256>)>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let calls = requests.iter().map(Self::prepare_quote_call).collect();
        let results = self.aggregate(calls).await;

        Ok(requests
            .iter()
            .copied()
            .zip(results)
            .map(|(request, raw)| {
                let amount_out = raw.as_ref().and_then(|data| decode_quote(&request, data));
                (request, amount_out)
            })
            .collect())
    }

    async fn latest_timestamp(&self) -> Result<u64> {
        let block = self.client.latest_block().await?;
        let timestamp = parse_quantity(&block["timestamp"])?;
        Ok(u64::try_from(timestamp)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;
    use std::time::Duration;

    #[test]
    fn test_prepare_get_pair_call() {
        let query = PairQuery { factory: Address::repeat_byte(0x42), token_a: Address::repeat_byte(1), token_b: Address::repeat_byte(2) };
        let call = MulticallReader::prepare_get_pair_call(&query);

        assert_eq!(call.target, query.factory);
        assert!(call.allowFailure);
        // selector + two address words
        assert_eq!(call.callData.len(), 4 + 64);
        assert_eq!(&call.callData[0..4], &IUniswapV2Factory::getPairCall::SELECTOR);
    }

    #[test]
    fn test_prepare_pool_state_calls() {
        let pool = Address::repeat_byte(0x42);
        let calls = MulticallReader::prepare_pool_state_calls(pool);

        assert!(calls.iter().all(|c| c.target == pool));
        assert_eq!(&calls[2].callData[0..4], &IUniswapV2Pair::getReservesCall::SELECTOR);
    }

    #[test]
    fn test_prepare_quote_call_selects_signature() {
        let mut request = QuoteRequest {
            quoter: Address::repeat_byte(9),
            token_in: Address::repeat_byte(1),
            token_out: Address::repeat_byte(2),
            fee: Some(500),
            amount_in: U256::from(1_000u64),
        };
        let tiered = MulticallReader::prepare_quote_call(&request);
        request.fee = None;
        let dynamic = MulticallReader::prepare_quote_call(&request);

        assert_eq!(&tiered.callData[0..4], &IQuoterV2::quoteExactInputSingleCall::SELECTOR);
        assert_eq!(&dynamic.callData[0..4], &IAlgebraQuoter::quoteExactInputSingleCall::SELECTOR);
        assert_ne!(tiered.callData, dynamic.callData);
    }

    #[test]
    fn test_decode_pool_state() {
        let token0 = Address::repeat_byte(1).abi_encode();
        let token1 = Address::repeat_byte(2).abi_encode();
        let reserves = (U256::from(1_000u64), U256::from(2_000u64), U256::from(1_700_000_000u64)).abi_encode();

        let state = decode_pool_state(&token0, &token1, &reserves).unwrap();
        assert_eq!(state.token0, Address::repeat_byte(1));
        assert_eq!(state.token1, Address::repeat_byte(2));
        assert_eq!(state.reserve0, U256::from(1_000u64));
        assert_eq!(state.reserve1, U256::from(2_000u64));
        assert_eq!(state.last_update, 1_700_000_000);

        assert!(decode_pool_state(&token0, &token1, &[0u8; 5]).is_none());
    }

    #[test]
    fn test_decode_quote() {
        let request = QuoteRequest {
            quoter: Address::repeat_byte(9),
            token_in: Address::repeat_byte(1),
            token_out: Address::repeat_byte(2),
            fee: Some(3000),
            amount_in: U256::from(1_000u64),
        };
        let v2_return = (U256::from(990u64), U256::ZERO, U256::from(1u64), U256::from(80_000u64)).abi_encode();
        assert_eq!(decode_quote(&request, &v2_return), Some(U256::from(990u64)));
        assert_eq!(decode_quote(&request, &[]), None);

        let algebra = QuoteRequest { fee: None, ..request };
        let algebra_return = (U256::from(985u64), U256::from(100u64)).abi_encode();
        assert_eq!(decode_quote(&algebra, &algebra_return), Some(U256::from(985u64)));
    }

    #[tokio::test]
    async fn test_empty_requests_skip_rpc() -> Result<()> {
        let client = JsonRpcClient::new("http://127.0.0.1:1".to_string(), Duration::from_millis(10))?;
        let reader = MulticallReader::new(client, Address::repeat_byte(0x11), 0, 0);

        assert!(reader.get_pairs(&[]).await?.is_empty());
        assert!(reader.get_pool_states(&[]).await?.is_empty());
        assert!(reader.quote_exact_input(&[]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_rpc_degrades_per_item() -> Result<()> {
        let client = JsonRpcClient::new("http://127.0.0.1:1".to_string(), Duration::from_millis(200))?;
        let reader = MulticallReader::new(client, Address::repeat_byte(0x11), 2, 2);
        let pools = [Address::repeat_byte(1), Address::repeat_byte(2), Address::repeat_byte(3)];

        let states = reader.get_pool_states(&pools).await?;
        assert_eq!(states.len(), 3);
        assert!(states.iter().all(|(_, state)| state.is_none()));
        assert_eq!(states[2].0, pools[2]);
        Ok(())
    }
}
