use cast::i128;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{unwrap::UnwrapOptimized, Env};

use crate::{
    constants::{SCALAR_9, SCALAR_BPS},
    errors::PoolError,
    storage,
};

use super::{pool::Pool, Reserve, User};

pub struct PositionData {
    /// The collateral balance weighted by each reserve's liquidation threshold, denominated
    /// in the base asset
    pub collateral_base: i128,
    /// The liability balance denominated in the base asset
    pub liability_base: i128,
}

impl PositionData {
    /// Calculate the position data for a user at current prices
    ///
    /// ### Arguments
    /// * pool - The pool
    /// * user - The user to calculate the position data for
    ///
    /// ### Errors
    /// If a price for any reserve the user holds is missing or stale
    pub fn calculate_from_positions(
        e: &Env,
        pool: &mut Pool,
        user: &User,
    ) -> Result<Self, PoolError> {
        let reserve_list = storage::get_res_list(e);
        let mut collateral_base = 0;
        let mut liability_base = 0;
        for i in 0..reserve_list.len() {
            let has_collateral = user.positions.collateral.contains_key(i);
            let has_liability = user.positions.liabilities.contains_key(i);
            if !has_collateral && !has_liability {
                continue;
            }
            let reserve = pool.load_reserve(e, &reserve_list.get_unchecked(i))?;
            let asset_to_base = pool.load_price(e, &reserve.asset)?;

            if has_collateral {
                collateral_base += asset_to_base
                    .fixed_mul_floor(user.get_collateral(&reserve), reserve.scalar)
                    .unwrap_optimized()
                    .fixed_mul_floor(i128(reserve.config.liq_threshold), SCALAR_BPS)
                    .unwrap_optimized();
            }

            if has_liability {
                liability_base += asset_to_base
                    .fixed_mul_ceil(user.get_liabilities(&reserve), reserve.scalar)
                    .unwrap_optimized();
            }

            pool.cache_reserve(reserve, false);
        }

        Ok(PositionData {
            collateral_base,
            liability_base,
        })
    }

    /// Return the health factor as a ratio with 9 decimals, or i128::MAX if there are no
    /// liabilities
    pub fn as_health_factor(&self) -> i128 {
        if self.liability_base == 0 {
            return i128::MAX;
        }
        self.collateral_base
            .fixed_div_floor(self.liability_base, SCALAR_9)
            .unwrap_optimized()
    }

    /// Check if the position can be liquidated
    pub fn is_liquidatable(&self) -> bool {
        self.liability_base > 0 && self.as_health_factor() < SCALAR_9
    }

    /// Check if the position data meets the minimum health factor of 1
    ///
    /// ### Errors
    /// If the health factor is below 1
    pub fn require_healthy(&self) -> Result<(), PoolError> {
        if self.liability_base == 0 {
            return Ok(());
        }
        if self.as_health_factor() < SCALAR_9 {
            return Err(PoolError::HealthFactorViolation);
        }
        Ok(())
    }

    /// Calculate the largest amount of the reserve's asset that can be borrowed while keeping
    /// the health factor at or above 1
    ///
    /// ### Arguments
    /// * reserve - The reserve to borrow from
    /// * price - The price of the reserve's asset in the base asset
    pub fn max_borrowable(&self, reserve: &Reserve, price: i128) -> i128 {
        let headroom = self.collateral_base - self.liability_base;
        if headroom <= 0 || price <= 0 {
            return 0;
        }
        headroom
            .fixed_mul_floor(reserve.scalar, price)
            .unwrap_optimized()
    }
}
