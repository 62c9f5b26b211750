use cast::i128;
use sep_41_token::TokenClient;
use soroban_sdk::{Address, Env};

use crate::{
    constants::{SCALAR_7, SCALAR_9},
    errors::PoolError,
    liquidation::BonusPolicy,
    storage::{self, PoolConfig, ReserveConfig, ReserveData},
};

use super::{interest::calc_rates, reserve::Reserve};

/// Initialize the pool
///
/// ### Errors
/// If the pool is already initialized or the arguments are invalid
pub fn execute_initialize(e: &Env, admin: &Address, config: &PoolConfig) -> Result<(), PoolError> {
    if storage::has_admin(e) {
        return Err(PoolError::AlreadyInitializedError);
    }
    if !is_valid_pool_config(config) {
        return Err(PoolError::InvalidPoolInitArgs);
    }

    storage::set_admin(e, admin);
    storage::set_pool_config(e, config);
    Ok(())
}

/// Update the pool
///
/// ### Errors
/// If the new configuration is invalid
pub fn execute_update_pool(e: &Env, config: &PoolConfig) -> Result<(), PoolError> {
    if !is_valid_pool_config(config) {
        return Err(PoolError::BadRequest);
    }
    storage::set_pool_config(e, config);
    Ok(())
}

fn is_valid_pool_config(config: &PoolConfig) -> bool {
    config.max_price_age > 0
        && config.intent_ttl > 0
        && BonusPolicy::from_u32(config.bonus_policy).is_ok()
}

/// Initialize a reserve for the pool
///
/// ### Errors
/// If the reserve already exists, the metadata is invalid, or the pool has reached the
/// maximum number of reserves
pub fn initialize_reserve(
    e: &Env,
    asset: &Address,
    config: &ReserveConfig,
) -> Result<u32, PoolError> {
    if storage::has_res(e, asset) {
        return Err(PoolError::AlreadyInitializedError);
    }

    require_valid_reserve_metadata(config)?;
    let index = storage::push_res_list(e, asset)?;

    let mut reserve_config = config.clone();
    reserve_config.index = index;
    storage::set_res_config(e, asset, &reserve_config);

    let (borrow_rate, supply_rate) = calc_rates(&reserve_config, 0);
    let init_data = ReserveData {
        liquidity_index: SCALAR_9,
        borrow_index: SCALAR_9,
        total_liquidity: 0,
        total_borrowed: 0,
        supply_rate,
        borrow_rate,
        treasury_credit: 0,
        last_time: e.ledger().timestamp(),
    };
    storage::set_res_data(e, asset, &init_data);
    Ok(index)
}

/// Update a reserve in the pool. The reserve is accrued under its previous configuration
/// before the new one takes effect.
///
/// ### Errors
/// If the reserve does not exist or the metadata is invalid
pub fn execute_update_reserve(
    e: &Env,
    asset: &Address,
    config: &ReserveConfig,
) -> Result<(), PoolError> {
    require_valid_reserve_metadata(config)?;

    let mut reserve = Reserve::load(e, asset)?;

    // force index to remain constant and only allow metadata based changes
    let mut new_config = config.clone();
    new_config.index = reserve.config.index;
    // decimals are fixed by the underlying token
    new_config.decimals = reserve.config.decimals;

    reserve.config = new_config;
    reserve.update_rates();
    reserve.store(e);
    storage::set_res_config(e, asset, &reserve.config);
    Ok(())
}

/// Transfer the treasury's share of accrued interest out of the reserve, bounded by the
/// reserve's unborrowed liquidity
///
/// ### Arguments
/// * `asset` - The underlying asset of the reserve
/// * `to` - The recipient of the claimed tokens
///
/// ### Returns
/// The amount of underlying claimed
///
/// ### Errors
/// If the reserve does not exist
pub fn execute_claim_treasury(e: &Env, asset: &Address, to: &Address) -> Result<i128, PoolError> {
    let mut reserve = Reserve::load(e, asset)?;
    let amount = reserve
        .data
        .treasury_credit
        .min(reserve.available_liquidity());
    if amount <= 0 {
        return Ok(0);
    }

    reserve.remove_liquidity(amount)?;
    reserve.data.treasury_credit -= amount;
    reserve.store(e);

    TokenClient::new(e, asset).transfer(&e.current_contract_address(), to, &amount);
    Ok(amount)
}

fn require_valid_reserve_metadata(metadata: &ReserveConfig) -> Result<(), PoolError> {
    let max_bps = 10_000;
    if metadata.decimals > 18
        || i128(metadata.optimal_util) == 0
        || i128(metadata.optimal_util) >= SCALAR_7
        || metadata.reserve_factor > max_bps
        || metadata.liq_threshold > max_bps
        || metadata.liq_bonus > max_bps
        || metadata.close_factor == 0
        || metadata.close_factor > max_bps
    {
        return Err(PoolError::InvalidReserveMetadata);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::testutils;

    use super::*;
    use sep_41_token::testutils::MockTokenClient;
    use soroban_sdk::testutils::{Address as _, Ledger, LedgerInfo};

    #[test]
    fn test_execute_initialize() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        let admin = Address::generate(&e);
        let oracle = Address::generate(&e);
        let pool_config = testutils::default_pool_config(&e, &oracle);

        e.as_contract(&pool, || {
            execute_initialize(&e, &admin, &pool_config).unwrap();

            assert_eq!(storage::get_admin(&e), admin);
            let stored_config = storage::get_pool_config(&e);
            assert_eq!(stored_config.oracle, oracle);
            assert_eq!(stored_config.settler, pool_config.settler);
            assert_eq!(stored_config.max_price_age, pool_config.max_price_age);
            assert_eq!(stored_config.intent_ttl, pool_config.intent_ttl);
            assert_eq!(stored_config.bonus_policy, pool_config.bonus_policy);

            let result = execute_initialize(&e, &admin, &pool_config);
            assert_eq!(result, Err(PoolError::AlreadyInitializedError));
        });
    }

    #[test]
    fn test_execute_initialize_validates() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        let admin = Address::generate(&e);
        let mut pool_config = testutils::default_pool_config(&e, &Address::generate(&e));
        pool_config.bonus_policy = 2;

        e.as_contract(&pool, || {
            let result = execute_initialize(&e, &admin, &pool_config);
            assert_eq!(result, Err(PoolError::InvalidPoolInitArgs));
            assert!(!storage::has_admin(&e));
        });
    }

    #[test]
    fn test_execute_update_pool() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        let pool_config = testutils::default_pool_config(&e, &Address::generate(&e));
        e.as_contract(&pool, || {
            storage::set_pool_config(&e, &pool_config);

            // happy path
            let mut new_config = pool_config.clone();
            new_config.max_price_age = 60;
            new_config.bonus_policy = 1;
            execute_update_pool(&e, &new_config).unwrap();
            let stored_config = storage::get_pool_config(&e);
            assert_eq!(stored_config.max_price_age, 60);
            assert_eq!(stored_config.bonus_policy, 1);
            assert_eq!(stored_config.oracle, pool_config.oracle);

            new_config.intent_ttl = 0;
            let result = execute_update_pool(&e, &new_config);
            assert_eq!(result, Err(PoolError::BadRequest));
            assert_eq!(storage::get_pool_config(&e).intent_ttl, pool_config.intent_ttl);
        });
    }

    #[test]
    fn test_initialize_reserve() {
        let e = Env::default();
        e.ledger().set(LedgerInfo {
            timestamp: 12345,
            protocol_version: 20,
            sequence_number: 100,
            network_id: Default::default(),
            base_reserve: 10,
            min_temp_entry_ttl: 10,
            min_persistent_entry_ttl: 10,
            max_entry_ttl: 2000000,
        });
        let pool = testutils::create_pool(&e);

        let asset_id_0 = Address::generate(&e);
        let asset_id_1 = Address::generate(&e);
        let (mut metadata, _) = testutils::default_reserve_meta();
        metadata.index = 7;

        e.as_contract(&pool, || {
            let index = initialize_reserve(&e, &asset_id_0, &metadata).unwrap();
            assert_eq!(index, 0);
            let index = initialize_reserve(&e, &asset_id_1, &metadata).unwrap();
            assert_eq!(index, 1);

            let res_config = storage::get_res_config(&e, &asset_id_1).unwrap();
            assert_eq!(res_config.index, 1);
            assert_eq!(res_config.optimal_util, metadata.optimal_util);
            assert_eq!(res_config.liq_threshold, metadata.liq_threshold);
            let res_data = storage::get_res_data(&e, &asset_id_1).unwrap();
            assert_eq!(res_data.liquidity_index, SCALAR_9);
            assert_eq!(res_data.borrow_index, SCALAR_9);
            assert_eq!(res_data.total_liquidity, 0);
            assert_eq!(res_data.borrow_rate, metadata.base_rate as i128);
            assert_eq!(res_data.supply_rate, 0);
            assert_eq!(res_data.last_time, 12345);

            let result = initialize_reserve(&e, &asset_id_0, &metadata);
            assert_eq!(result, Err(PoolError::AlreadyInitializedError));
        });
    }

    #[test]
    fn test_initialize_reserve_max_reserves() {
        let e = Env::default();
        e.budget().reset_unlimited();
        let pool = testutils::create_pool(&e);
        let (metadata, _) = testutils::default_reserve_meta();

        e.as_contract(&pool, || {
            for _ in 0..32 {
                initialize_reserve(&e, &Address::generate(&e), &metadata).unwrap();
            }
            let result = initialize_reserve(&e, &Address::generate(&e), &metadata);
            assert_eq!(result, Err(PoolError::BadRequest));
        });
    }

    #[test]
    fn test_initialize_reserve_validates_metadata() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);
        let asset = Address::generate(&e);

        e.as_contract(&pool, || {
            let (mut metadata, _) = testutils::default_reserve_meta();
            metadata.decimals = 19;
            let result = initialize_reserve(&e, &asset, &metadata);
            assert_eq!(result, Err(PoolError::InvalidReserveMetadata));

            let (mut metadata, _) = testutils::default_reserve_meta();
            metadata.optimal_util = 1_0000000;
            let result = initialize_reserve(&e, &asset, &metadata);
            assert_eq!(result, Err(PoolError::InvalidReserveMetadata));

            let (mut metadata, _) = testutils::default_reserve_meta();
            metadata.liq_threshold = 10_001;
            let result = initialize_reserve(&e, &asset, &metadata);
            assert_eq!(result, Err(PoolError::InvalidReserveMetadata));

            let (mut metadata, _) = testutils::default_reserve_meta();
            metadata.close_factor = 0;
            let result = initialize_reserve(&e, &asset, &metadata);
            assert_eq!(result, Err(PoolError::InvalidReserveMetadata));

            assert!(!storage::has_res(&e, &asset));
        });
    }

    #[test]
    fn test_execute_update_reserve() {
        let e = Env::default();
        e.mock_all_auths();
        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);

        let (underlying, _) = testutils::create_token_contract(&e, &bombadil);
        let (reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_data.borrow_rate = 0_1000000;
        testutils::create_reserve(&e, &pool, &underlying, &reserve_config, &reserve_data);

        e.ledger().set(LedgerInfo {
            timestamp: 31536000,
            protocol_version: 20,
            sequence_number: 100,
            network_id: Default::default(),
            base_reserve: 10,
            min_temp_entry_ttl: 10,
            min_persistent_entry_ttl: 10,
            max_entry_ttl: 2000000,
        });

        let mut new_config = reserve_config.clone();
        new_config.index = 99;
        new_config.liq_threshold = 7000;
        new_config.active = false;

        e.as_contract(&pool, || {
            execute_update_reserve(&e, &underlying, &new_config).unwrap();

            let res_config = storage::get_res_config(&e, &underlying).unwrap();
            assert_eq!(res_config.index, 0);
            assert_eq!(res_config.liq_threshold, 7000);
            assert!(!res_config.active);

            // accrued under the old rate before the update
            let res_data = storage::get_res_data(&e, &underlying).unwrap();
            assert_eq!(res_data.borrow_index, 1_100_000_000);
            assert_eq!(res_data.last_time, 31536000);

            let result = execute_update_reserve(&e, &Address::generate(&e), &new_config);
            assert_eq!(result, Err(PoolError::ReserveNotFound));
        });
    }

    #[test]
    fn test_execute_claim_treasury() {
        let e = Env::default();
        e.mock_all_auths_allowing_non_root_auth();
        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);
        let treasury = Address::generate(&e);

        let (underlying, _) = testutils::create_token_contract(&e, &bombadil);
        let (reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_data.treasury_credit = 2_0000000;
        testutils::create_reserve(&e, &pool, &underlying, &reserve_config, &reserve_data);
        let underlying_client = MockTokenClient::new(&e, &underlying);

        e.as_contract(&pool, || {
            let claimed = execute_claim_treasury(&e, &underlying, &treasury).unwrap();
            assert_eq!(claimed, 2_0000000);

            let res_data = storage::get_res_data(&e, &underlying).unwrap();
            assert_eq!(res_data.treasury_credit, 0);
            assert_eq!(res_data.total_liquidity, 98_0000000);

            // nothing left to claim
            let claimed = execute_claim_treasury(&e, &underlying, &treasury).unwrap();
            assert_eq!(claimed, 0);
        });
        assert_eq!(underlying_client.balance(&treasury), 2_0000000);
    }
}
