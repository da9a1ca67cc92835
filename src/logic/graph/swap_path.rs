use super::swap_path_hash::SwapPathHash;
use crate::logic::quote_provider::Edge;
use crate::utils::token::TokenWrapper;
use alloy_primitives::Address;
use eyre::{Result, eyre};
use sha2::digest::Update;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Clone, Debug, Default, Eq)]
pub struct SwapPath {
    // route id, stable across runs
    pub swap_path_hash: SwapPathHash,
    // internal lookup for faster contains_token
    pub tokens_map: HashSet<Address>,
    // The tokens of the path e.g. base -> mid -> base
    pub tokens: Vec<TokenWrapper>,
    // The edges of the path, one per hop
    pub edges: Vec<Arc<Edge>>,
}

impl Display for SwapPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SwapPath(edges={:?}, tokens={:?})",
            self.edges.iter().map(|e| e.class.to_string()).collect::<Vec<String>>(),
            self.tokens.iter().map(|t| t.get_symbol().to_string()).collect::<Vec<String>>()
        )
    }
}

impl SwapPath {
    /// Create a new swap path for a list of tokens and edges
    pub fn new(tokens: Vec<TokenWrapper>, edges: Vec<Arc<Edge>>) -> Result<Self> {
        if tokens.len() != edges.len() + 1 {
            return Err(eyre!("Swap path needs one more token than edges, got {} tokens and {} edges", tokens.len(), edges.len()));
        }
        let tokens_map = tokens.iter().map(|t| t.get_address()).collect();
        let swap_path_hash = generate_swap_path_hash(&tokens, &edges);

        Ok(SwapPath { swap_path_hash, tokens_map, tokens, edges })
    }

    /// Create a new swap path with only one hop
    pub fn new_first(token_from: TokenWrapper, token_to: TokenWrapper, edge: Arc<Edge>) -> Self {
        let tokens_map = HashSet::from([token_from.get_address(), token_to.get_address()]);
        let tokens = vec![token_from, token_to];
        let edges = vec![edge];
        let swap_path_hash = generate_swap_path_hash(&tokens, &edges);

        SwapPath { swap_path_hash, tokens_map, tokens, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.edges.is_empty()
    }

    pub fn tokens_count(&self) -> usize {
        self.tokens.len()
    }

    /// Push a new hop. The caller is responsible for checking that the edge starts at the last token
    pub fn push_swap_hop(&mut self, token_to: TokenWrapper, edge: Arc<Edge>) -> Result<&mut Self> {
        if self.is_empty() {
            return Err(eyre!("Swap path is empty"));
        }

        self.tokens_map.insert(token_to.get_address());
        self.tokens.push(token_to);
        self.edges.push(edge);

        self.swap_path_hash = generate_swap_path_hash(&self.tokens, &self.edges);

        Ok(self)
    }

    pub fn contains_token(&self, token: Address) -> bool {
        self.tokens_map.contains(&token)
    }

    /// The hop count of the swap path
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn first_token(&self) -> Option<&TokenWrapper> {
        self.tokens.first()
    }
}

impl Hash for SwapPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.swap_path_hash.hash(state);
    }
}

impl PartialEq for SwapPath {
    fn eq(&self, other: &Self) -> bool {
        self.swap_path_hash == other.swap_path_hash
    }
}

/// Hash the token addresses and the venue class of every edge to a sha256 hash.
/// Two paths over the same tokens through different venue classes get different ids.
pub fn generate_swap_path_hash(tokens: &[TokenWrapper], edges: &[Arc<Edge>]) -> SwapPathHash {
    let mut hasher = Sha256::new();

    for token in tokens.iter() {
        Update::update(&mut hasher, token.get_address().as_slice());
    }
    for edge in edges.iter() {
        Update::update(&mut hasher, &[edge.class.tag()]);
    }

    let hash_slice: [u8; 32] = hasher.finalize().into();
    SwapPathHash(hash_slice)
}
