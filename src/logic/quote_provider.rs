use crate::data_sync::reader::{ChainDataReader, QuoteRequest};
use crate::logic::graph::FastHashMap;
use crate::logic::pools::{PoolSnapshot, Venue, VenueClass, VenueKind};
use alloy_primitives::{Address, U256};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::debug;

/// What an edge prices with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeSource {
    /// Reserve snapshots of every constant-product pool between the two tokens.
    ConstantProduct(Vec<PoolSnapshot>),
    /// Quoter deployments asked on demand.
    Concentrated(Vec<Venue>),
}

/// Directed best-of quoting function between two tokens for one venue class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: Address,
    pub to: Address,
    pub class: VenueClass,
    pub source: EdgeSource,
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#}->{:#})", self.class, self.from, self.to)
    }
}

impl Edge {
    pub fn constant_product(from: Address, to: Address, pools: Vec<PoolSnapshot>) -> Self {
        Self { from, to, class: VenueClass::ConstantProduct, source: EdgeSource::ConstantProduct(pools) }
    }

    pub fn concentrated(from: Address, to: Address, venues: Vec<Venue>) -> Self {
        Self { from, to, class: VenueClass::Concentrated, source: EdgeSource::Concentrated(venues) }
    }

    /// Best output across the edge's pools, all read from snapshots.
    fn quote_constant_product(&self, pools: &[PoolSnapshot], amount_in: U256) -> LegQuote {
        let mut best = LegQuote::none();
        for pool in pools {
            let amount_out = pool.get_amount_out(self.from, amount_in);
            if amount_out > best.amount_out {
                best = LegQuote { amount_out, venue: pool.venue_key.clone() };
            }
        }
        best
    }
}

/// Output of one leg and the venue (pool venue key, or `key:fee` for a tiered quoter) that won it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegQuote {
    pub amount_out: U256,
    pub venue: String,
}

impl LegQuote {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_dry(&self) -> bool {
        self.amount_out.is_zero()
    }
}

/// Prices edges. Constant-product edges are priced locally; concentrated edges batch one quoter
/// call per tier through the chain reader, and a failed tier counts as zero.
#[derive(Clone)]
pub struct QuoteProvider {
    reader: Arc<dyn ChainDataReader>,
}

impl QuoteProvider {
    pub fn new(reader: Arc<dyn ChainDataReader>) -> Self {
        Self { reader }
    }

    pub async fn quote(&self, edge: &Edge, amount_in: U256) -> LegQuote {
        if amount_in.is_zero() {
            return LegQuote::none();
        }
        match &edge.source {
            EdgeSource::ConstantProduct(pools) => edge.quote_constant_product(pools, amount_in),
            EdgeSource::Concentrated(venues) => self.quote_concentrated(edge, venues, amount_in).await,
        }
    }

    /// Best quote over several edges between the same two tokens. Ties keep the earlier edge.
    pub async fn best_of(&self, edges: &[Arc<Edge>], amount_in: U256) -> LegQuote {
        let mut best = LegQuote::none();
        for edge in edges {
            let quote = self.quote(edge, amount_in).await;
            if quote.amount_out > best.amount_out {
                best = quote;
            }
        }
        best
    }

    async fn quote_concentrated(&self, edge: &Edge, venues: &[Venue], amount_in: U256) -> LegQuote {
        let mut labels: FastHashMap<QuoteRequest, String> = FastHashMap::default();
        let mut requests = Vec::new();

        for venue in venues {
            match &venue.kind {
                VenueKind::ConcentratedTiered { quoter, fee_tiers } => {
                    for fee in fee_tiers {
                        let request = QuoteRequest { quoter: *quoter, token_in: edge.from, token_out: edge.to, fee: Some(*fee), amount_in };
                        labels.insert(request, format!("{}:{}", venue.key, fee));
                        requests.push(request);
                    }
                }
                VenueKind::ConcentratedDynamic { quoter } => {
                    let request = QuoteRequest { quoter: *quoter, token_in: edge.from, token_out: edge.to, fee: None, amount_in };
                    labels.insert(request, venue.key.clone());
                    requests.push(request);
                }
                VenueKind::ConstantProduct { .. } => {}
            }
        }
        if requests.is_empty() {
            return LegQuote::none();
        }

        let results = match self.reader.quote_exact_input(&requests).await {
            Ok(results) => results,
            Err(e) => {
                debug!("Quoter batch failed for {}: {}", edge, e);
                return LegQuote::none();
            }
        };

        let mut best = LegQuote::none();
        for (request, amount_out) in results {
            let Some(amount_out) = amount_out else { continue };
            if amount_out > best.amount_out {
                if let Some(label) = labels.get(&request) {
                    best = LegQuote { amount_out, venue: label.clone() };
                }
            }
        }
        best
    }
}
