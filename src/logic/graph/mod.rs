pub mod path_enumerator;
pub mod swap_path;
pub mod swap_path_hash;
pub mod token_graph;

pub use path_enumerator::{MAX_CYCLE_HOPS, MIN_CYCLE_HOPS, find_all_cycles};
pub use swap_path::SwapPath;
pub use swap_path_hash::SwapPathHash;
pub use token_graph::{FastHashMap, FastHasher, TokenGraph, TokenNode};
