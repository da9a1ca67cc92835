use super::rpc::{JsonRpcClient, parse_quantity};
use alloy_primitives::U256;
use async_trait::async_trait;
use eyre::{Result, eyre};
use tracing::debug;

/// Point-in-time fee snapshot, in wei per gas unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasQuote {
    pub base_fee: U256,
    pub priority_fee: U256,
}

impl GasQuote {
    pub fn new(base_fee: U256, priority_fee: U256) -> Self {
        Self { base_fee, priority_fee }
    }

    pub fn total(&self) -> U256 {
        self.base_fee.saturating_add(self.priority_fee)
    }
}

#[async_trait]
pub trait GasPriceSource: Send + Sync {
    async fn gas_price(&self) -> Result<GasQuote>;
}

/// Always returns the configured quote.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedGasPrice(pub GasQuote);

#[async_trait]
impl GasPriceSource for FixedGasPrice {
    async fn gas_price(&self) -> Result<GasQuote> {
        Ok(self.0)
    }
}

/// Reads `baseFeePerGas` from the latest block and the node's suggested tip.
///
/// Chains or nodes without EIP-1559 support fall back to `eth_gasPrice` with a zero tip.
#[derive(Clone, Debug)]
pub struct RpcGasPriceSource {
    client: JsonRpcClient,
}

impl RpcGasPriceSource {
    pub fn new(client: JsonRpcClient) -> Self {
        Self { client }
    }

    async fn eip1559_quote(&self) -> Result<GasQuote> {
        let block = self.client.latest_block().await?;
        let base_fee = block.get("baseFeePerGas").ok_or_else(|| eyre!("Latest block has no baseFeePerGas"))?;
        let base_fee = parse_quantity(base_fee)?;
        let priority_fee = self.client.max_priority_fee().await?;
        Ok(GasQuote::new(base_fee, priority_fee))
    }
}

#[async_trait]
impl GasPriceSource for RpcGasPriceSource {
    async fn gas_price(&self) -> Result<GasQuote> {
        match self.eip1559_quote().await {
            Ok(quote) => Ok(quote),
            Err(e) => {
                debug!("EIP-1559 fee read failed, using eth_gasPrice: {}", e);
                let gas_price = self.client.gas_price().await?;
                Ok(GasQuote::new(gas_price, U256::ZERO))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fixed_gas_price() -> Result<()> {
        let source = FixedGasPrice(GasQuote::new(U256::from(30_000_000_000u64), U256::from(2_000_000_000u64)));
        let quote = source.gas_price().await?;
        assert_eq!(quote.total(), U256::from(32_000_000_000u64));
        Ok(())
    }

    #[test]
    fn test_total_saturates() {
        assert_eq!(GasQuote::new(U256::MAX, U256::from(1u64)).total(), U256::MAX);
    }

    #[tokio::test]
    async fn test_rpc_source_unreachable() -> Result<()> {
        let client = JsonRpcClient::new("http://127.0.0.1:1".to_string(), Duration::from_millis(200))?;
        let source = RpcGasPriceSource::new(client);
        assert!(source.gas_price().await.is_err());
        Ok(())
    }
}
