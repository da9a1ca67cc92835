use crate::logic::pools::{PoolSnapshot, Venue, VenueClass};
use crate::logic::quote_provider::Edge;
use crate::utils::token::TokenWrapper;
use ahash::RandomState;
use alloy_primitives::Address;
use eyre::eyre;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

pub type FastHasher = RandomState;
/// FastHashMap using ahash
pub type FastHashMap<K, V> = HashMap<K, V, FastHasher>;

#[derive(Debug, Clone, Default)]
pub struct TokenGraph {
    // Nodes are tokens. One directed graph edge per ordered token pair, holding the best-of
    // quoting edges for that direction (at most one per venue class).
    pub graph: DiGraph<TokenNode, Vec<Arc<Edge>>, usize>,
    // token_address -> token (Keep reference for fast access of token details)
    pub tokens: FastHashMap<Address, TokenWrapper>,
    // token -> node index
    pub token_index: FastHashMap<Address, NodeIndex<usize>>,
}

impl TokenGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the quoting graph for a reduced token set.
    ///
    /// Constant-product pools collapse into one edge per direction for every pair that has at
    /// least one pool. When concentrated venues are configured, every ordered pair also gets one
    /// concentrated edge asking all of them.
    pub fn build(tokens: &[TokenWrapper], pools: &[PoolSnapshot], venues: &[Venue]) -> eyre::Result<Self> {
        let mut token_graph = TokenGraph::new();
        for token in tokens {
            token_graph.add_or_get_token_idx_by_token(token.clone());
        }

        let mut pools_by_pair: FastHashMap<(Address, Address), Vec<PoolSnapshot>> = FastHashMap::default();
        for pool in pools {
            if !token_graph.token_index.contains_key(&pool.token0) || !token_graph.token_index.contains_key(&pool.token1) {
                continue;
            }
            pools_by_pair.entry(ordered(pool.token0, pool.token1)).or_default().push(pool.clone());
        }

        let concentrated: Vec<Venue> = venues.iter().filter(|v| v.get_class() == VenueClass::Concentrated).cloned().collect();

        // iterate the token list so edge order does not depend on hashing
        for (i, token_a) in tokens.iter().enumerate() {
            for token_b in tokens.iter().skip(i + 1) {
                let (a, b) = (token_a.get_address(), token_b.get_address());
                if a == b {
                    continue;
                }
                if let Some(pair_pools) = pools_by_pair.get(&ordered(a, b)) {
                    token_graph.add_edge(Edge::constant_product(a, b, pair_pools.clone()))?;
                    token_graph.add_edge(Edge::constant_product(b, a, pair_pools.clone()))?;
                }
                if !concentrated.is_empty() {
                    token_graph.add_edge(Edge::concentrated(a, b, concentrated.clone()))?;
                    token_graph.add_edge(Edge::concentrated(b, a, concentrated.clone()))?;
                }
            }
        }

        debug!("Token graph built with {} tokens and {} directed pairs", token_graph.graph.node_count(), token_graph.graph.edge_count());
        Ok(token_graph)
    }

    pub fn add_or_get_token_idx_by_token(&mut self, arc_token: TokenWrapper) -> NodeIndex<usize> {
        *self.token_index.entry(arc_token.get_address()).or_insert_with(|| {
            let node = TokenNode::new(arc_token.clone());
            let idx = self.graph.add_node(node);
            self.tokens.insert(arc_token.get_address(), arc_token);
            idx
        })
    }

    /// Add a quoting edge. Both tokens must already be in the graph; a second edge of the same
    /// class for the same direction replaces the first.
    pub fn add_edge(&mut self, edge: Edge) -> eyre::Result<()> {
        let node_from = *self.token_index.get(&edge.from).ok_or_else(|| eyre!("Token not found in graph: {:?}", edge.from))?;
        let node_to = *self.token_index.get(&edge.to).ok_or_else(|| eyre!("Token not found in graph: {:?}", edge.to))?;
        let edge = Arc::new(edge);

        if let Some(edge_index) = self.graph.find_edge(node_from, node_to) {
            let edges = self.graph.edge_weight_mut(edge_index).ok_or_else(|| eyre!("Edge weight missing for {:?}", edge_index))?;
            match edges.iter_mut().find(|existing| existing.class == edge.class) {
                Some(existing) => *existing = edge,
                None => edges.push(edge),
            }
        } else {
            self.graph.add_edge(node_from, node_to, vec![edge]);
        }
        Ok(())
    }

    /// All quoting edges from `from` to `to`, in insertion order.
    pub fn edges_between(&self, from: Address, to: Address) -> &[Arc<Edge>] {
        let (Some(&node_from), Some(&node_to)) = (self.token_index.get(&from), self.token_index.get(&to)) else {
            return &[];
        };
        match self.graph.find_edge(node_from, node_to) {
            Some(edge_index) => self.graph.edge_weight(edge_index).map(|edges| edges.as_slice()).unwrap_or(&[]),
            None => &[],
        }
    }
}

fn ordered(a: Address, b: Address) -> (Address, Address) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenNode {
    pub token: TokenWrapper,
}

impl Display for TokenNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.token.get_address())
    }
}

impl TokenNode {
    pub fn new(token: TokenWrapper) -> Self {
        Self { token }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::pools::VenueKind;
    use crate::utils::token::Token;
    use alloy_primitives::U256;

    fn pool(token0: Address, token1: Address, venue_key: &str) -> PoolSnapshot {
        PoolSnapshot {
            address: Address::random(),
            venue_key: venue_key.to_string(),
            token0,
            token1,
            reserve0: U256::from(1_000u64),
            reserve1: U256::from(1_000u64),
            fee_bps: 30,
            last_update: 0,
        }
    }

    #[test]
    fn test_build_collapses_pools_per_direction() -> eyre::Result<()> {
        let token1 = Arc::new(Token::repeat_byte(1));
        let token2 = Arc::new(Token::repeat_byte(2));
        let token3 = Arc::new(Token::repeat_byte(3));
        let (a, b) = (token1.get_address(), token2.get_address());

        let pools = vec![pool(a, b, "quickswap_v2"), pool(b, a, "sushiswap_v2")];
        let graph = TokenGraph::build(&[token1, token2, token3], &pools, &[])?;

        assert_eq!(graph.graph.node_count(), 3);
        assert_eq!(graph.graph.edge_count(), 2);
        let forward = graph.edges_between(a, b);
        assert_eq!(forward.len(), 1);
        match &forward[0].source {
            crate::logic::quote_provider::EdgeSource::ConstantProduct(pools) => assert_eq!(pools.len(), 2),
            other => panic!("unexpected source {other:?}"),
        }
        assert!(graph.edges_between(a, Address::repeat_byte(3)).is_empty());
        Ok(())
    }

    #[test]
    fn test_build_adds_concentrated_edges_for_every_pair() -> eyre::Result<()> {
        let tokens: Vec<TokenWrapper> = (1..=3).map(|b| Arc::new(Token::repeat_byte(b))).collect();
        let venue = Venue::new("uniswap_v3", VenueKind::ConcentratedTiered { quoter: Address::repeat_byte(9), fee_tiers: vec![500] });
        let pools = vec![pool(tokens[0].get_address(), tokens[1].get_address(), "quickswap_v2")];

        let graph = TokenGraph::build(&tokens, &pools, &[venue])?;

        assert_eq!(graph.graph.edge_count(), 6);
        let classes: Vec<VenueClass> = graph.edges_between(tokens[1].get_address(), tokens[0].get_address()).iter().map(|e| e.class).collect();
        assert_eq!(classes, vec![VenueClass::ConstantProduct, VenueClass::Concentrated]);
        Ok(())
    }

    #[test]
    fn test_pools_outside_token_set_ignored() -> eyre::Result<()> {
        let token1 = Arc::new(Token::repeat_byte(1));
        let graph = TokenGraph::build(&[token1.clone()], &[pool(token1.get_address(), Address::repeat_byte(7), "dex")], &[])?;
        assert_eq!(graph.graph.edge_count(), 0);
        Ok(())
    }

    #[test]
    fn test_add_edge_requires_known_tokens() {
        let mut graph = TokenGraph::new();
        graph.add_or_get_token_idx_by_token(Arc::new(Token::repeat_byte(1)));
        let result = graph.add_edge(Edge::constant_product(Address::repeat_byte(1), Address::repeat_byte(2), vec![]));
        assert!(result.is_err());
    }
}
