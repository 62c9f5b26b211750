use soroban_sdk::{map, vec, Address, Env, Map, Vec};

use sep_40_oracle::{Asset, PriceFeedClient};

use crate::{
    errors::PoolError,
    storage::{self, PoolConfig},
};

use super::reserve::Reserve;

/// An in-memory view of the pool for a single state transition. Reserves are accrued once on
/// first load and shared by every step of the transition, and only the ones marked for writing
/// are stored back to the ledger.
pub struct Pool {
    pub config: PoolConfig,
    pub reserves: Map<Address, Reserve>,
    reserves_to_store: Vec<Address>,
    prices: Map<Address, i128>,
}

impl Pool {
    /// Load the Pool from the ledger
    pub fn load(e: &Env) -> Self {
        let pool_config = storage::get_pool_config(e);
        Pool {
            config: pool_config,
            reserves: map![e],
            reserves_to_store: vec![e],
            prices: map![e],
        }
    }

    /// Load a Reserve from the ledger and update to the current ledger timestamp. Returns
    /// a cached version if it exists.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    ///
    /// ### Errors
    /// If the asset is not a reserve of the pool
    pub fn load_reserve(&self, e: &Env, asset: &Address) -> Result<Reserve, PoolError> {
        if let Some(reserve) = self.reserves.get(asset.clone()) {
            return Ok(reserve);
        }
        Reserve::load(e, asset)
    }

    /// Cache the updated reserve in the pool.
    ///
    /// ### Arguments
    /// * reserve - The updated reserve
    /// * write - If the reserve needs to be written to the ledger
    pub fn cache_reserve(&mut self, reserve: Reserve, write: bool) {
        if !self.reserves_to_store.contains(&reserve.asset) && write {
            self.reserves_to_store.push_back(reserve.asset.clone());
        }
        self.reserves.set(reserve.asset.clone(), reserve);
    }

    /// Store the cached reserves to the ledger that need to be written.
    pub fn store_cached_reserves(&self, e: &Env) {
        for address in self.reserves_to_store.iter() {
            let reserve = self.reserves.get_unchecked(address);
            reserve.store(e);
        }
    }

    /// Load a price from the Pool's oracle. Returns a cached version if one already exists.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    ///
    /// ### Errors
    /// If the oracle has no price for the asset or the price is older than the pool's
    /// maximum price age
    pub fn load_price(&mut self, e: &Env, asset: &Address) -> Result<i128, PoolError> {
        if let Some(price) = self.prices.get(asset.clone()) {
            return Ok(price);
        }
        let oracle_client = PriceFeedClient::new(e, &self.config.oracle);
        let oracle_asset = Asset::Stellar(asset.clone());
        let price_data = oracle_client
            .lastprice(&oracle_asset)
            .ok_or(PoolError::StaleOraclePrice)?;
        if price_data.timestamp + self.config.max_price_age < e.ledger().timestamp() {
            return Err(PoolError::StaleOraclePrice);
        }
        self.prices.set(asset.clone(), price_data.price);
        Ok(price_data.price)
    }
}
