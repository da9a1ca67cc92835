use alloy_primitives::{I256, U256};
use std::future::Future;

/// Best point found by the size search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptimizedSize {
    pub size: U256,
    pub net: I256,
}

/// Bounded ternary search over an integer size range.
///
/// The search keeps the best point it has seen rather than trusting the final bracket, so a
/// flat or non-unimodal objective still yields the best probed size. Both ends of the range are
/// probed first, so the result is never worse than either of them.
#[derive(Clone, Copy, Debug)]
pub struct SizeOptimizer {
    iterations: usize,
    ceiling: U256,
}

impl SizeOptimizer {
    pub fn new(iterations: usize, ceiling: U256) -> Self {
        Self { iterations, ceiling }
    }

    pub async fn maximize<F, Fut>(&self, objective: F, lo: U256, hi: U256) -> OptimizedSize
    where
        F: Fn(U256) -> Fut,
        Fut: Future<Output = I256>,
    {
        // both ends stay inside [1, ceiling]
        let mut lo = lo.max(U256::from(1u64)).min(self.ceiling);
        let mut hi = hi.min(self.ceiling);

        if hi <= lo {
            return OptimizedSize { size: lo, net: objective(lo).await };
        }

        let (net_lo, net_hi) = futures::join!(objective(lo), objective(hi));
        let mut best = OptimizedSize { size: lo, net: net_lo };
        best.observe(hi, net_hi);

        let three = U256::from(3u64);
        let one = U256::from(1u64);
        for _ in 0..self.iterations {
            if hi <= lo {
                break;
            }
            let third = (hi - lo) / three;
            let mid1 = lo + third;
            let mid2 = hi - third;

            let (net1, net2) = futures::join!(objective(mid1), objective(mid2));
            best.observe(mid1, net1);
            best.observe(mid2, net2);

            if net1 < net2 {
                lo = mid1 + one;
            } else {
                // mid2 > lo whenever hi > lo, so this cannot underflow
                hi = mid2 - one;
            }
        }

        best
    }
}

impl OptimizedSize {
    /// Strictly better replaces; ties keep the earlier (smaller or first seen) point.
    fn observe(&mut self, size: U256, net: I256) {
        if net > self.net {
            self.size = size;
            self.net = net;
        }
    }
}
