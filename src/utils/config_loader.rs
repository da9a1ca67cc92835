use crate::data_sync::config::ChainConfig;
use crate::logic::pools::Venue;
use crate::logic::types::ScannerSettings;
use crate::utils::constants::default_polygon_venues;
use crate::utils::token::Token;
use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::env;
use thiserror::Error;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

/// Everything a deployment configures in one TOML file.
///
/// ```toml
/// [chain]
/// rpc_http_url = "${RPC_HTTP_URL}"
///
/// [scanner]
/// universe_limit = 120
///
/// [[venues]]
/// key = "quickswap_v3"
/// kind = "concentrated_dynamic"
/// quoter = "0xa15F0D7377B2A0C0c10db057f641beD21028FC89"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfigFile {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub scanner: ScannerSettings,
    #[serde(default = "default_polygon_venues")]
    pub venues: Vec<Venue>,
    /// Static universe. Empty means the built-in Polygon table.
    #[serde(default)]
    pub tokens: Vec<Token>,
}

pub async fn load_from_file<T: DeserializeOwned>(file_name: String) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = tokio::fs::read_to_string(file_name).await?;
    let contents = expand_vars(&contents)?;
    let config: T = toml::from_str(&contents)?;
    Ok(config)
}

pub fn parse_config_str<T: DeserializeOwned>(raw_config: &str) -> Result<T, LoadConfigError> {
    let contents = expand_vars(raw_config)?;
    Ok(toml::from_str(&contents)?)
}

// Unset variables are left as-is so the TOML error points at them.
fn expand_vars(raw_config: &str) -> Result<String, LoadConfigError> {
    let re = Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}")?;
    Ok(re
        .replace_all(raw_config, |caps: &Captures| match env::var(&caps[1]) {
            Ok(val) => val,
            Err(_) => caps[0].to_string(),
        })
        .to_string())
}
