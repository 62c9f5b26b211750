use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{contracttype, unwrap::UnwrapOptimized, Address, Env, Map};

use crate::{
    errors::PoolError,
    storage::{self, SIDE_COLLATERAL, SIDE_LIABILITY},
};

use super::Reserve;

/// A scaled balance in a reserve. The balance at any later time is the principal grown by the
/// ratio between the reserve's current index and the index recorded here.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Position {
    pub principal: i128, // the balance at the time of the last interaction
    pub index: i128,     // the reserve index at the time of the last interaction
}

impl Position {
    /// The current balance rounded down, used for collateral
    pub fn balance_floor(&self, cur_index: i128) -> i128 {
        self.principal
            .fixed_mul_floor(cur_index, self.index)
            .unwrap_optimized()
    }

    /// The current balance rounded up, used for liabilities
    pub fn balance_ceil(&self, cur_index: i128) -> i128 {
        self.principal
            .fixed_mul_ceil(cur_index, self.index)
            .unwrap_optimized()
    }
}

/// A user / contracts position's with the pool, keyed by reserve index
#[derive(Clone)]
#[contracttype]
pub struct Positions {
    pub collateral: Map<u32, Position>, // Map of Reserve Index to supplied collateral
    pub liabilities: Map<u32, Position>, // Map of Reserve Index to borrowed debt
}

impl Positions {
    /// Create an empty Positions object in the environment
    pub fn env_default(e: &Env) -> Self {
        Positions {
            collateral: Map::new(e),
            liabilities: Map::new(e),
        }
    }
}

/// The current balances of a user in a single reserve
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct PositionSummary {
    pub collateral: i128,
    pub liabilities: i128,
}

/// A user / contracts position's with the pool
#[derive(Clone)]
pub struct User {
    pub address: Address,
    pub positions: Positions,
    touched: Map<u32, Address>,
}

impl User {
    /// Load every position the user holds from the ledger
    pub fn load(e: &Env, address: &Address) -> Self {
        let mut positions = Positions::env_default(e);
        let reserve_list = storage::get_res_list(e);
        for (index, asset) in reserve_list.iter().enumerate() {
            let index = index as u32;
            if let Some(position) = storage::get_position(e, address, &asset, SIDE_COLLATERAL) {
                positions.collateral.set(index, position);
            }
            if let Some(position) = storage::get_position(e, address, &asset, SIDE_LIABILITY) {
                positions.liabilities.set(index, position);
            }
        }
        User {
            address: address.clone(),
            positions,
            touched: Map::new(e),
        }
    }

    /// Store the positions that changed since the user was loaded to the ledger
    pub fn store(&self, e: &Env) {
        for (index, asset) in self.touched.iter() {
            match self.positions.collateral.get(index) {
                Some(position) => {
                    storage::set_position(e, &self.address, &asset, SIDE_COLLATERAL, &position)
                }
                None => storage::del_position(e, &self.address, &asset, SIDE_COLLATERAL),
            }
            match self.positions.liabilities.get(index) {
                Some(position) => {
                    storage::set_position(e, &self.address, &asset, SIDE_LIABILITY, &position)
                }
                None => storage::del_position(e, &self.address, &asset, SIDE_LIABILITY),
            }
        }
    }

    /// Check if the user has any outstanding debt
    pub fn has_liabilities(&self) -> bool {
        !self.positions.liabilities.is_empty()
    }

    /// Get the current collateral balance in the reserve, in underlying tokens
    pub fn get_collateral(&self, reserve: &Reserve) -> i128 {
        match self.positions.collateral.get(reserve.config.index) {
            Some(position) => position.balance_floor(reserve.data.liquidity_index),
            None => 0,
        }
    }

    /// Get the current debt balance in the reserve, in underlying tokens
    pub fn get_liabilities(&self, reserve: &Reserve) -> i128 {
        match self.positions.liabilities.get(reserve.config.index) {
            Some(position) => position.balance_ceil(reserve.data.borrow_index),
            None => 0,
        }
    }

    /// Get the current balances in the reserve
    pub fn get_summary(&self, reserve: &Reserve) -> PositionSummary {
        PositionSummary {
            collateral: self.get_collateral(reserve),
            liabilities: self.get_liabilities(reserve),
        }
    }

    /// Add collateral to the position, rolling the existing balance forward to the
    /// reserve's current liquidity index
    pub fn add_collateral(&mut self, reserve: &Reserve, amount: i128) {
        let balance = self.get_collateral(reserve);
        self.set_collateral(reserve, balance + amount);
    }

    /// Remove collateral from the position
    ///
    /// ### Errors
    /// If the amount exceeds the current collateral balance
    pub fn remove_collateral(&mut self, reserve: &Reserve, amount: i128) -> Result<(), PoolError> {
        let balance = self.get_collateral(reserve);
        if amount > balance {
            return Err(PoolError::InsufficientBalance);
        }
        self.set_collateral(reserve, balance - amount);
        Ok(())
    }

    /// Add debt to the position, rolling the existing balance forward to the
    /// reserve's current borrow index
    pub fn add_liabilities(&mut self, reserve: &Reserve, amount: i128) {
        let balance = self.get_liabilities(reserve);
        self.set_liabilities(reserve, balance + amount);
    }

    /// Remove debt from the position
    ///
    /// ### Errors
    /// If the amount exceeds the current debt balance
    pub fn remove_liabilities(&mut self, reserve: &Reserve, amount: i128) -> Result<(), PoolError> {
        let balance = self.get_liabilities(reserve);
        if amount > balance {
            return Err(PoolError::RepayExceedsDebt);
        }
        self.set_liabilities(reserve, balance - amount);
        Ok(())
    }

    fn set_collateral(&mut self, reserve: &Reserve, balance: i128) {
        let index = reserve.config.index;
        if balance == 0 {
            self.positions.collateral.remove(index);
        } else {
            self.positions.collateral.set(
                index,
                Position {
                    principal: balance,
                    index: reserve.data.liquidity_index,
                },
            );
        }
        self.touched.set(index, reserve.asset.clone());
    }

    fn set_liabilities(&mut self, reserve: &Reserve, balance: i128) {
        let index = reserve.config.index;
        if balance == 0 {
            self.positions.liabilities.remove(index);
        } else {
            self.positions.liabilities.set(
                index,
                Position {
                    principal: balance,
                    index: reserve.data.borrow_index,
                },
            );
        }
        self.touched.set(index, reserve.asset.clone());
    }
}
