use alloy_primitives::{Address, Bytes, U256};
use eyre::{Result, eyre};
use serde_json::Value;
use std::time::Duration;

/// Minimal JSON-RPC client for the handful of read methods the scanner needs.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http_client: reqwest::Client,
    rpc_url: String,
}

impl JsonRpcClient {
    pub fn new(rpc_url: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client, rpc_url })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let request_body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self
            .http_client
            .post(&self.rpc_url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;

        let mut response_json: Value = response.json().await?;

        if let Some(error) = response_json.get("error") {
            return Err(eyre!("RPC error in {}: {}", method, error));
        }

        match response_json.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(eyre!("Missing result in {} response", method)),
        }
    }

    /// `eth_call` against the latest block
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let params = serde_json::json!([
            {
                "to": format!("{:#x}", to),
                "data": format!("{:#x}", data)
            },
            "latest"
        ]);

        let result = self.request("eth_call", params).await?;
        let result = result.as_str().ok_or_else(|| eyre!("eth_call result is not a string"))?;

        let bytes = hex::decode(result.trim_start_matches("0x"))?;
        Ok(bytes.into())
    }

    pub async fn gas_price(&self) -> Result<U256> {
        let result = self.request("eth_gasPrice", serde_json::json!([])).await?;
        parse_quantity(&result)
    }

    pub async fn max_priority_fee(&self) -> Result<U256> {
        let result = self.request("eth_maxPriorityFeePerGas", serde_json::json!([])).await?;
        parse_quantity(&result)
    }

    /// Latest block header fields as raw JSON.
    pub async fn latest_block(&self) -> Result<Value> {
        self.request("eth_getBlockByNumber", serde_json::json!(["latest", false])).await
    }
}

/// Parse a hex `QUANTITY` ("0x1a") into a U256.
pub fn parse_quantity(value: &Value) -> Result<U256> {
    let raw = value.as_str().ok_or_else(|| eyre!("Expected hex quantity, got {}", value))?;
    let digits = raw.strip_prefix("0x").ok_or_else(|| eyre!("Quantity without 0x prefix: {}", raw))?;
    if digits.is_empty() {
        return Err(eyre!("Empty quantity"));
    }
    Ok(U256::from_str_radix(digits, 16)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() -> Result<()> {
        assert_eq!(parse_quantity(&serde_json::json!("0x1a"))?, U256::from(26u64));
        assert_eq!(parse_quantity(&serde_json::json!("0x0"))?, U256::ZERO);
        assert!(parse_quantity(&serde_json::json!("26")).is_err());
        assert!(parse_quantity(&serde_json::json!(26)).is_err());
        assert!(parse_quantity(&serde_json::json!("0x")).is_err());
        Ok(())
    }

    #[test]
    fn test_client_creation() -> Result<()> {
        let client = JsonRpcClient::new("https://polygon-rpc.com".to_string(), Duration::from_secs(5))?;
        assert_eq!(client.rpc_url(), "https://polygon-rpc.com");
        Ok(())
    }
}
