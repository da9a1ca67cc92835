/// Route layer
///
/// Everything between a loaded universe and a ranked opportunity list:
/// - Token graph construction and cycle enumeration
/// - Leg quoting, path simulation and size search
/// - Scan orchestration over one or several base tokens
pub mod graph;
pub mod optimizer;
pub mod pools;
pub mod quote_provider;
pub mod scanner;
pub mod simulator;
pub mod types;


pub use graph::{SwapPath, SwapPathHash, TokenGraph, find_all_cycles};
pub use optimizer::{OptimizedSize, SizeOptimizer};
pub use pools::{PoolSnapshot, Venue, VenueClass, VenueKind};
pub use quote_provider::{Edge, EdgeSource, LegQuote, QuoteProvider};
pub use scanner::{OpportunityScanner, OpportunityScannerBuilder};
pub use simulator::{PathSimulator, Simulation};
pub use types::{MultiScanResponse, Opportunity, RouteKind, ScanConfig, ScanRequest, ScanResponse, ScanResult, ScannerSettings};
