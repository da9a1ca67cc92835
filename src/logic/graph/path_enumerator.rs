use super::swap_path::SwapPath;
use super::token_graph::TokenGraph;
use alloy_primitives::Address;
use eyre::eyre;
use petgraph::prelude::*;
use std::collections::HashSet;
use tracing::{debug, warn};

pub const MIN_CYCLE_HOPS: usize = 2;
pub const MAX_CYCLE_HOPS: usize = 4;

/// State of the search for all cycles through the base token.
#[derive(Debug)]
struct PathState {
    node: NodeIndex<usize>,
    current_path: SwapPath,
}

/// Find all simple cycles `base -> ... -> base` with `2..=max_hops` hops.
///
/// The search is depth-first. Intermediate tokens must be in `allowed_mids`, never repeat, and
/// are never the base; the base may only appear as the final token. Every quoting edge between
/// two tokens is a separate hop choice, so the same token sequence appears once per class
/// combination. At most `max_paths` paths are returned.
pub fn find_all_cycles(
    token_graph: &TokenGraph,
    base: Address,
    allowed_mids: &HashSet<Address>,
    max_hops: usize,
    max_paths: usize,
) -> eyre::Result<Vec<SwapPath>> {
    if !(MIN_CYCLE_HOPS..=MAX_CYCLE_HOPS).contains(&max_hops) {
        return Err(eyre!("max_hops must be within {}..={}, got {}", MIN_CYCLE_HOPS, MAX_CYCLE_HOPS, max_hops));
    }
    let Some(&base_node) = token_graph.token_index.get(&base) else {
        return Err(eyre!("Base token not found in graph: {:?}", base));
    };

    let mut all_swap_paths = Vec::new();
    let mut stack = Vec::new();

    // Seed with every first hop
    for edge in token_graph.graph.edges(base_node) {
        let Some(to_token) = token_graph.graph.node_weight(edge.target()).map(|node| node.token.clone()) else { continue };
        if !allowed_mids.contains(&to_token.get_address()) || to_token.get_address() == base {
            continue;
        }
        let Some(from_token) = token_graph.graph.node_weight(base_node).map(|node| node.token.clone()) else { continue };
        for quoting_edge in edge.weight() {
            let current_path = SwapPath::new_first(from_token.clone(), to_token.clone(), quoting_edge.clone());
            stack.push(PathState { node: edge.target(), current_path });
        }
    }

    'search: while let Some(PathState { node, current_path }) = stack.pop() {
        let hops = current_path.len();

        for edge in token_graph.graph.edges(node) {
            let Some(to_token) = token_graph.graph.node_weight(edge.target()).map(|node| node.token.clone()) else { continue };
            let to_address = to_token.get_address();

            let closes = to_address == base;
            if !closes && (hops + 1 >= max_hops || !allowed_mids.contains(&to_address) || current_path.contains_token(to_address)) {
                continue;
            }

            for quoting_edge in edge.weight() {
                let mut new_path = current_path.clone();
                new_path.push_swap_hop(to_token.clone(), quoting_edge.clone())?;

                if closes {
                    all_swap_paths.push(new_path);
                    if all_swap_paths.len() >= max_paths {
                        warn!("Path limit {} reached, enumeration truncated", max_paths);
                        break 'search;
                    }
                } else {
                    stack.push(PathState { node: edge.target(), current_path: new_path });
                }
            }
        }
    }

    debug!("Enumerated {} cycles through {:#} up to {} hops", all_swap_paths.len(), base, max_hops);
    Ok(all_swap_paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::pools::PoolSnapshot;
    use crate::utils::token::{Token, TokenWrapper};
    use alloy_primitives::U256;
    use std::sync::Arc;

    fn pool(a: Address, b: Address) -> PoolSnapshot {
        PoolSnapshot {
            address: Address::random(),
            venue_key: "dex".to_string(),
            token0: a,
            token1: b,
            reserve0: U256::from(1u64),
            reserve1: U256::from(1u64),
            fee_bps: 30,
            last_update: 0,
        }
    }

    fn five_node_graph() -> eyre::Result<(TokenGraph, Vec<TokenWrapper>, Vec<(usize, usize)>)> {
        let tokens: Vec<TokenWrapper> = (0..5u8).map(|b| Arc::new(Token::repeat_byte(b + 1))).collect();
        let links = vec![(0, 1), (0, 2), (0, 3), (1, 2), (2, 3), (3, 4), (1, 4), (2, 4)];
        let pools: Vec<PoolSnapshot> = links.iter().map(|&(a, b)| pool(tokens[a].get_address(), tokens[b].get_address())).collect();
        Ok((TokenGraph::build(&tokens, &pools, &[])?, tokens, links))
    }

    fn brute_force(links: &[(usize, usize)], allowed: &[usize], max_hops: usize) -> HashSet<Vec<usize>> {
        let connected = |a: usize, b: usize| links.iter().any(|&(x, y)| (x == a && y == b) || (x == b && y == a));
        let mut cycles = HashSet::new();
        // every sequence of distinct mids of length 1..max_hops-1
        fn extend(prefix: Vec<usize>, allowed: &[usize], depth: usize, out: &mut Vec<Vec<usize>>) {
            if !prefix.is_empty() {
                out.push(prefix.clone());
            }
            if prefix.len() == depth {
                return;
            }
            for &mid in allowed {
                if !prefix.contains(&mid) {
                    let mut next = prefix.clone();
                    next.push(mid);
                    extend(next, allowed, depth, out);
                }
            }
        }
        let mut sequences = Vec::new();
        extend(vec![], allowed, max_hops - 1, &mut sequences);
        for mids in sequences {
            let mut full = vec![0];
            full.extend(mids);
            full.push(0);
            if full.windows(2).all(|w| connected(w[0], w[1])) {
                cycles.insert(full);
            }
        }
        cycles
    }

    fn as_indices(paths: &[SwapPath], tokens: &[TokenWrapper]) -> Vec<Vec<usize>> {
        paths
            .iter()
            .map(|path| path.tokens.iter().map(|t| tokens.iter().position(|x| x == t).unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_matches_brute_force() -> eyre::Result<()> {
        let (graph, tokens, links) = five_node_graph()?;
        let allowed: HashSet<Address> = tokens.iter().skip(1).map(|t| t.get_address()).collect();

        for max_hops in 2..=4 {
            let paths = find_all_cycles(&graph, tokens[0].get_address(), &allowed, max_hops, 50_000)?;
            let found = as_indices(&paths, &tokens);
            let unique: HashSet<Vec<usize>> = found.iter().cloned().collect();

            assert_eq!(unique.len(), found.len(), "duplicate paths at max_hops={max_hops}");
            assert_eq!(unique, brute_force(&links, &[1, 2, 3, 4], max_hops), "max_hops={max_hops}");
            for path in &found {
                assert!(path.len() >= 3 && path.len() <= max_hops + 1);
                assert!(!path[1..path.len() - 1].contains(&0));
            }
        }
        Ok(())
    }

    #[test]
    fn test_respects_allowed_mids() -> eyre::Result<()> {
        let (graph, tokens, links) = five_node_graph()?;
        let allowed: HashSet<Address> = [1usize, 2].iter().map(|&i| tokens[i].get_address()).collect();

        let paths = find_all_cycles(&graph, tokens[0].get_address(), &allowed, 4, 50_000)?;
        let found: HashSet<Vec<usize>> = as_indices(&paths, &tokens).into_iter().collect();
        assert_eq!(found, brute_force(&links, &[1, 2], 4));
        Ok(())
    }

    #[test]
    fn test_deterministic_order() -> eyre::Result<()> {
        let (graph, tokens, _) = five_node_graph()?;
        let allowed: HashSet<Address> = tokens.iter().skip(1).map(|t| t.get_address()).collect();

        let first = find_all_cycles(&graph, tokens[0].get_address(), &allowed, 4, 50_000)?;
        let second = find_all_cycles(&graph, tokens[0].get_address(), &allowed, 4, 50_000)?;
        let ids = |paths: &[SwapPath]| paths.iter().map(|p| p.swap_path_hash).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        Ok(())
    }

    #[test]
    fn test_path_limit() -> eyre::Result<()> {
        let (graph, tokens, _) = five_node_graph()?;
        let allowed: HashSet<Address> = tokens.iter().skip(1).map(|t| t.get_address()).collect();

        let paths = find_all_cycles(&graph, tokens[0].get_address(), &allowed, 4, 3)?;
        assert_eq!(paths.len(), 3);
        Ok(())
    }

    #[test]
    fn test_invalid_hops_and_base() -> eyre::Result<()> {
        let (graph, tokens, _) = five_node_graph()?;
        let allowed = HashSet::new();
        assert!(find_all_cycles(&graph, tokens[0].get_address(), &allowed, 5, 10).is_err());
        assert!(find_all_cycles(&graph, Address::repeat_byte(0xee), &allowed, 3, 10).is_err());
        Ok(())
    }
}
