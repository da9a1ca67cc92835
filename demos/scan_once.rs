/// One scan against a live RPC endpoint.
///
/// Reads `RPC_HTTP_URL` (or `ALCHEMY_POLYGON_URL` / `ALCHEMY_KEY`) from the environment or a
/// `.env` file, optionally loads `scanner.toml`, and prints the ranked response as JSON.
///
/// ```sh
/// RUST_LOG=info cargo run --example scan_once -- USDC 1000
/// ```
use eyre::Result;
use route_scan::data_sync::{ChainConfig, JsonRpcClient, MulticallReader, RpcGasPriceSource, StaticUniverse};
use route_scan::utils::{ScannerConfigFile, load_from_file};
use route_scan::{OpportunityScannerBuilder, ScanRequest};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = std::env::args().skip(1);
    let base = args.next().unwrap_or_else(|| "USDC".to_string());
    let max_input = args.next().unwrap_or_else(|| "1000".to_string());

    let file_config = match load_from_file::<ScannerConfigFile>("scanner.toml".to_string()).await {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("No usable scanner.toml, using defaults: {}", e);
            None
        }
    };
    let chain = match &file_config {
        Some(config) => config.chain.clone(),
        None => ChainConfig::from_env()?,
    };
    info!("Using RPC {} on chain {}", chain.rpc_http_url, chain.chain_id);

    let reader = Arc::new(MulticallReader::from_config(&chain)?);
    let gas = RpcGasPriceSource::new(JsonRpcClient::new(chain.rpc_http_url.clone(), chain.http_timeout())?);

    let mut builder = OpportunityScannerBuilder::new(reader).with_gas_source(Arc::new(gas)).with_chain_id(chain.chain_id);
    if let Some(config) = &file_config {
        builder = builder.with_config_file(config);
        if !config.tokens.is_empty() {
            builder = builder.with_universe_provider(Arc::new(StaticUniverse::new(config.tokens.clone())));
        }
    }
    let scanner = builder.build();

    let response = scanner.scan_request(&ScanRequest::new(base, max_input)).await?;
    info!("{} single-hop and {} multi-hop opportunities", response.single_hop.len(), response.multi_hop.len());
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
