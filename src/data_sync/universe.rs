use crate::errors::ScanError;
use crate::utils::constants::{AAVE, BAL, CRV, DAI, LINK, SUSHI, UNI, USDC, USDT, WBTC, WETH, pinned_tokens, polygon_tokens};
use crate::utils::token::{Token, TokenWrapper};
use async_trait::async_trait;
use eyre::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Source of the ranked candidate token list.
#[async_trait]
pub trait TokenUniverseProvider: Send + Sync {
    async fn top_tokens(&self, limit: usize) -> Result<Vec<Token>>;
}

/// A fixed list, typically the `tokens` table of the config file.
#[derive(Clone, Debug)]
pub struct StaticUniverse {
    tokens: Vec<Token>,
}

impl StaticUniverse {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenUniverseProvider for StaticUniverse {
    async fn top_tokens(&self, limit: usize) -> Result<Vec<Token>> {
        Ok(self.tokens.iter().take(limit).cloned().collect())
    }
}

fn fallback_tokens() -> Vec<Token> {
    let fallback = [USDC, USDT, WETH, DAI, WBTC, LINK, AAVE, CRV, BAL, UNI, SUSHI];
    polygon_tokens().into_iter().filter(|token| fallback.contains(&token.get_address())).collect()
}

/// Wraps a provider with the pinned majors and the static fallback list.
pub struct UniverseLoader {
    provider: Arc<dyn TokenUniverseProvider>,
    pinned: Vec<Token>,
    fallback: Vec<Token>,
}

impl UniverseLoader {
    pub fn new(provider: Arc<dyn TokenUniverseProvider>) -> Self {
        Self { provider, pinned: pinned_tokens(), fallback: fallback_tokens() }
    }

    pub fn with_pinned(mut self, pinned: Vec<Token>) -> Self {
        self.pinned = pinned;
        self
    }

    /// Pinned majors first, then provider order, deduplicated by address and cut to `limit`.
    ///
    /// `request_limit` is the size asked from the provider; `limit` bounds the final list.
    pub async fn load(&self, request_limit: usize, limit: usize) -> Result<Vec<TokenWrapper>, ScanError> {
        let ranked = match self.provider.top_tokens(request_limit).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Token universe provider failed, using static fallback: {}", e);
                self.fallback.clone()
            }
        };

        let mut seen = HashSet::new();
        let universe: Vec<TokenWrapper> = self
            .pinned
            .iter()
            .cloned()
            .chain(ranked)
            .filter(|token| seen.insert(token.get_address()))
            .take(limit)
            .map(Arc::new)
            .collect();

        if universe.is_empty() {
            return Err(ScanError::UniverseUnavailable);
        }
        debug!("Universe loaded with {} tokens", universe.len());
        Ok(universe)
    }
}
