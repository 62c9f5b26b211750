use cast::i128;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{contracttype, unwrap::UnwrapOptimized, Address, Env};

use crate::{
    constants::{SCALAR_7, SCALAR_BPS, SECONDS_PER_YEAR},
    errors::PoolError,
    storage::{self, ReserveConfig, ReserveData},
};

use super::interest::calc_rates;

#[derive(Clone)]
#[contracttype]
pub struct Reserve {
    pub asset: Address,        // the underlying asset address
    pub scalar: i128,          // scalar used for balances
    pub config: ReserveConfig, // the admin controlled configuration
    pub data: ReserveData,     // the engine controlled state
}

impl Reserve {
    /// Load a Reserve from the ledger and accrue it to the current ledger timestamp.
    ///
    /// **NOTE**: This function is not cached, and should be called from the Pool.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    ///
    /// ### Errors
    /// If the asset is not supported
    pub fn load(e: &Env, asset: &Address) -> Result<Reserve, PoolError> {
        let config = storage::get_res_config(e, asset).ok_or(PoolError::ReserveNotFound)?;
        let data = storage::get_res_data(e, asset).ok_or(PoolError::ReserveNotFound)?;
        let mut reserve = Reserve {
            asset: asset.clone(),
            scalar: 10i128.pow(config.decimals),
            config,
            data,
        };
        reserve.accrue(e.ledger().timestamp());
        Ok(reserve)
    }

    /// Store the updated reserve data to the ledger.
    pub fn store(&self, e: &Env) {
        storage::set_res_data(e, &self.asset, &self.data);
    }

    /// Accrue interest on the reserve up to `now`, compounding the indices over the elapsed time
    /// at the current rates. Does nothing if no time has passed since the last accrual.
    ///
    /// ### Arguments
    /// * `now` - The timestamp to accrue to
    pub fn accrue(&mut self, now: u64) {
        if now <= self.data.last_time {
            return;
        }
        let delta_time = i128(now - self.data.last_time);
        let period_scalar = SCALAR_7 * SECONDS_PER_YEAR;

        let prev_borrow_index = self.data.borrow_index;
        self.data.borrow_index += prev_borrow_index
            .fixed_mul_ceil(self.data.borrow_rate * delta_time, period_scalar)
            .unwrap_optimized();
        self.data.liquidity_index += self
            .data
            .liquidity_index
            .fixed_mul_floor(self.data.supply_rate * delta_time, period_scalar)
            .unwrap_optimized();

        if self.data.total_borrowed > 0 {
            let new_total_borrowed = self
                .data
                .total_borrowed
                .fixed_mul_ceil(self.data.borrow_index, prev_borrow_index)
                .unwrap_optimized();
            let interest = new_total_borrowed - self.data.total_borrowed;
            self.data.total_borrowed = new_total_borrowed;
            self.data.total_liquidity += interest;
            self.data.treasury_credit += interest
                .fixed_mul_floor(i128(self.config.reserve_factor), SCALAR_BPS)
                .unwrap_optimized();
        }
        self.data.last_time = now;
    }

    /// Recompute the borrow and supply rates from the current utilization
    pub fn update_rates(&mut self) {
        let (borrow_rate, supply_rate) = calc_rates(&self.config, self.utilization());
        self.data.borrow_rate = borrow_rate;
        self.data.supply_rate = supply_rate;
    }

    /// Fetch the current utilization rate for the reserve normalized to 7 decimals
    pub fn utilization(&self) -> i128 {
        if self.data.total_liquidity <= 0 {
            return 0;
        }
        let util = self
            .data
            .total_borrowed
            .fixed_div_floor(self.data.total_liquidity, SCALAR_7)
            .unwrap_optimized();
        util.min(SCALAR_7)
    }

    /// Fetch the amount of underlying that is supplied but not borrowed
    pub fn available_liquidity(&self) -> i128 {
        self.data.total_liquidity - self.data.total_borrowed
    }

    /// Require that the reserve accepts new deposits and borrows
    pub fn require_active(&self) -> Result<(), PoolError> {
        if !self.config.active {
            return Err(PoolError::ReserveInactive);
        }
        Ok(())
    }

    /********** Liquidity Deltas **********/

    /// Add supplied underlying to the reserve
    pub fn add_liquidity(&mut self, amount: i128) {
        self.data.total_liquidity += amount;
        self.update_rates();
    }

    /// Remove supplied underlying from the reserve
    ///
    /// ### Errors
    /// If the remaining liquidity would not cover the borrowed amount
    pub fn remove_liquidity(&mut self, amount: i128) -> Result<(), PoolError> {
        if amount > self.available_liquidity() {
            return Err(PoolError::InsufficientLiquidity);
        }
        self.data.total_liquidity -= amount;
        self.update_rates();
        Ok(())
    }

    /// Lend underlying out of the reserve
    ///
    /// ### Errors
    /// If the borrowed amount would exceed the supplied liquidity
    pub fn increase_borrowed(&mut self, amount: i128) -> Result<(), PoolError> {
        if amount > self.available_liquidity() {
            return Err(PoolError::InsufficientLiquidity);
        }
        self.data.total_borrowed += amount;
        self.update_rates();
        Ok(())
    }

    /// Return lent underlying to the reserve. Floors at zero, as per-position debt is rounded
    /// up and can sum to slightly more than the reserve's total.
    pub fn decrease_borrowed(&mut self, amount: i128) {
        self.data.total_borrowed = (self.data.total_borrowed - amount).max(0);
        self.update_rates();
    }
}
