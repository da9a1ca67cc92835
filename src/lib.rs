// Two-layer architecture
pub mod data_sync; // Chain reads: pairs, reserves, quotes, gas, universe
pub mod logic; // Route discovery, simulation, sizing and ranking

pub mod errors;
pub mod utils;

pub use data_sync::{ChainConfig, ChainDataReader, GasPriceSource, MulticallReader, StaticUniverse, TokenUniverseProvider};
pub use errors::ScanError;
pub use logic::{
    MultiScanResponse, Opportunity, OpportunityScanner, OpportunityScannerBuilder, RouteKind, ScanConfig, ScanRequest, ScanResponse,
    ScannerSettings,
};
pub use utils::{PairCache, Token, TokenWrapper};
