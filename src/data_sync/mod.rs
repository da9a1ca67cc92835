/// Chain data layer
///
/// Reads everything the scanner needs from the chain and its surroundings:
/// - Factory pair lookups and reserve snapshots, batched through Multicall3
/// - Quoter calls for concentrated-liquidity venues
/// - Gas price and the candidate token universe
pub mod config;
pub mod discovery;
pub mod gas;
pub mod mock_reader;
pub mod multicall;
pub mod reader;
pub mod rpc;
pub mod universe;

pub use config::ChainConfig;
pub use discovery::{DiscoveredPair, LiquidityScorer, PairDiscovery};
pub use gas::{FixedGasPrice, GasPriceSource, GasQuote, RpcGasPriceSource};
pub use mock_reader::{MockChainReader, MockQuoteCurve};
pub use multicall::MulticallReader;
pub use reader::{ChainDataReader, PairQuery, PoolState, QuoteRequest};
pub use rpc::JsonRpcClient;
pub use universe::{StaticUniverse, TokenUniverseProvider, UniverseLoader};
