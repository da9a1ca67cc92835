use alloy_primitives::{Address, U256, U512};
use std::fmt::{Display, Formatter};

pub const BPS_DENOMINATOR: u64 = 10_000;

/// Uniswap V2 `getAmountOut` with the fee in basis points, in exact integer arithmetic.
///
/// Zero input or an empty reserve yields zero. The result is always strictly below `reserve_out`.
pub fn constant_product_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256, fee_bps: u32) -> U256 {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() || u64::from(fee_bps) >= BPS_DENOMINATOR {
        return U256::ZERO;
    }

    let denominator_bps = U512::from(BPS_DENOMINATOR);
    let amount_in_with_fee = U512::from(amount_in) * (denominator_bps - U512::from(fee_bps)) / denominator_bps;

    let Some(numerator) = amount_in_with_fee.checked_mul(U512::from(reserve_out)) else {
        return reserve_out - U256::from(1u64);
    };
    let denominator = U512::from(reserve_in) + amount_in_with_fee;

    U256::saturating_from(numerator / denominator)
}

/// Reserve snapshot of one discovered constant-product pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub address: Address,
    pub venue_key: String,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
    pub fee_bps: u32,
    /// `blockTimestampLast` reported by the pair.
    pub last_update: u64,
}

impl Display for PoolSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(fee={})@{:#}", self.venue_key, self.fee_bps, self.address)
    }
}

impl PoolSnapshot {
    pub fn get_amount_out(&self, token_in: Address, amount_in: U256) -> U256 {
        if token_in == self.token0 {
            constant_product_amount_out(amount_in, self.reserve0, self.reserve1, self.fee_bps)
        } else if token_in == self.token1 {
            constant_product_amount_out(amount_in, self.reserve1, self.reserve0, self.fee_bps)
        } else {
            U256::ZERO
        }
    }

    pub fn get_other_token(&self, token: Address) -> Option<Address> {
        if token == self.token0 {
            Some(self.token1)
        } else if token == self.token1 {
            Some(self.token0)
        } else {
            None
        }
    }

    pub fn connects(&self, token_a: Address, token_b: Address) -> bool {
        (self.token0 == token_a && self.token1 == token_b) || (self.token0 == token_b && self.token1 == token_a)
    }

    /// A pool updated in the future (clock skew) is not stale.
    pub fn is_stale(&self, now: u64, max_stale_secs: u64) -> bool {
        now.saturating_sub(self.last_update) > max_stale_secs
    }
}
