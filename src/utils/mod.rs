pub mod cache;
pub mod config_loader;
pub mod constants;
pub mod serde_helpers;
pub mod token;

pub use cache::{CacheStats, PairCache, PairKey};
pub use config_loader::{LoadConfigError, ScannerConfigFile, load_from_file, parse_config_str};
pub use constants::*;
pub use token::{Token, TokenWrapper};
