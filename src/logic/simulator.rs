use crate::logic::graph::SwapPath;
use crate::logic::pools::BPS_DENOMINATOR;
use crate::logic::quote_provider::{Edge, QuoteProvider};
use alloy_primitives::U256;
use std::sync::Arc;

/// Result of walking an amount through a route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Simulation {
    pub amount_out: U256,
    /// Winning venue per leg. Empty when the route dried up.
    pub venues: Vec<String>,
}

impl Simulation {
    fn dry() -> Self {
        Self::default()
    }
}

/// Remove `slippage_bps` of `amount`, rounding down.
pub fn apply_haircut(amount: U256, slippage_bps: u32) -> U256 {
    let slippage = U256::from(slippage_bps.min(BPS_DENOMINATOR as u32));
    let denominator = U256::from(BPS_DENOMINATOR);
    amount.saturating_mul(denominator - slippage) / denominator
}

/// Walks amounts through routes, taking a slippage haircut after every leg.
#[derive(Clone)]
pub struct PathSimulator {
    provider: QuoteProvider,
    slippage_bps: u32,
}

impl PathSimulator {
    pub fn new(provider: QuoteProvider, slippage_bps: u32) -> Self {
        Self { provider, slippage_bps }
    }

    /// Each leg is priced as the best of its candidate edges. A leg quoting zero, or an amount
    /// haircut to zero, makes the whole route worth zero.
    pub async fn simulate_legs(&self, legs: &[&[Arc<Edge>]], amount_in: U256) -> Simulation {
        let mut amount = amount_in;
        let mut venues = Vec::with_capacity(legs.len());

        for candidates in legs {
            if amount.is_zero() {
                return Simulation::dry();
            }
            let quote = self.provider.best_of(candidates, amount).await;
            if quote.is_dry() {
                return Simulation::dry();
            }
            amount = apply_haircut(quote.amount_out, self.slippage_bps);
            venues.push(quote.venue);
        }

        if amount.is_zero() {
            return Simulation::dry();
        }
        Simulation { amount_out: amount, venues }
    }

    /// Walk the path through its own edges.
    pub async fn simulate_detailed(&self, path: &SwapPath, amount_in: U256) -> Simulation {
        let legs: Vec<&[Arc<Edge>]> = path.edges.iter().map(std::slice::from_ref).collect();
        self.simulate_legs(&legs, amount_in).await
    }

    pub async fn simulate(&self, path: &SwapPath, amount_in: U256) -> U256 {
        self.simulate_detailed(path, amount_in).await.amount_out
    }
}
