#![cfg(test)]

use crate::{
    constants::SCALAR_9,
    pool::Reserve,
    storage::{self, PoolConfig, ReserveConfig, ReserveData},
    PoolContract,
};
use sep_40_oracle::testutils::{Asset, MockPriceOracleClient, MockPriceOracleWASM};
use sep_41_token::testutils::{MockTokenClient, MockTokenWASM};
use soroban_sdk::{testutils::Address as _, Address, Env, IntoVal, Symbol, Vec};

pub(crate) fn create_pool(e: &Env) -> Address {
    e.register_contract(None, PoolContract {})
}

//************************************************
//           External Contract Helpers
//************************************************

// ***** Token *****

pub(crate) fn create_token_contract<'a>(
    e: &Env,
    admin: &Address,
) -> (Address, MockTokenClient<'a>) {
    let contract_address = Address::generate(e);
    e.register_contract_wasm(&contract_address, MockTokenWASM);
    let client = MockTokenClient::new(e, &contract_address);
    client.initialize(admin, &7, &"unit".into_val(e), &"test".into_val(e));
    (contract_address, client)
}

//***** Oracle ******

pub(crate) fn create_mock_oracle<'a>(e: &Env) -> (Address, MockPriceOracleClient<'a>) {
    let contract_address = e.register_contract_wasm(None, MockPriceOracleWASM);
    (
        contract_address.clone(),
        MockPriceOracleClient::new(e, &contract_address),
    )
}

/// Deploy a mock oracle with 7 decimals that reports a stable price for each asset
pub(crate) fn create_oracle_with_prices<'a>(
    e: &Env,
    admin: &Address,
    assets: &Vec<Address>,
    prices: &Vec<i128>,
) -> (Address, MockPriceOracleClient<'a>) {
    let (oracle, oracle_client) = create_mock_oracle(e);
    let mut oracle_assets: Vec<Asset> = Vec::new(e);
    for asset in assets.iter() {
        oracle_assets.push_back(Asset::Stellar(asset));
    }
    oracle_client.set_data(
        admin,
        &Asset::Other(Symbol::new(e, "USD")),
        &oracle_assets,
        &7,
        &300,
    );
    oracle_client.set_price_stable(prices);
    (oracle, oracle_client)
}

//************************************************
//            Object Creation Helpers
//************************************************

//***** Pool *****

pub(crate) fn default_pool_config(e: &Env, oracle: &Address) -> PoolConfig {
    PoolConfig {
        oracle: oracle.clone(),
        settler: Address::generate(e),
        max_price_age: 3600,
        intent_ttl: 600,
        bonus_policy: 0,
    }
}

//***** Reserve *****

pub(crate) fn default_reserve(e: &Env) -> Reserve {
    let (config, data) = default_reserve_meta();
    Reserve {
        asset: Address::generate(e),
        scalar: 1_0000000,
        config,
        data,
    }
}

pub(crate) fn default_reserve_meta() -> (ReserveConfig, ReserveData) {
    (
        ReserveConfig {
            index: 0,
            decimals: 7,
            optimal_util: 0_9000000,
            base_rate: 0_0100000,
            slope_one: 0_0400000,
            slope_two: 1_0000000,
            reserve_factor: 1000,
            liq_threshold: 8500,
            liq_bonus: 500,
            close_factor: 5000,
            active: true,
        },
        ReserveData {
            liquidity_index: SCALAR_9,
            borrow_index: SCALAR_9,
            total_liquidity: 100_0000000,
            total_borrowed: 75_0000000,
            supply_rate: 0,
            borrow_rate: 0,
            treasury_credit: 0,
            last_time: 0,
        },
    )
}

/// Create a reserve based on the supplied config and data.
///
/// Mints the pool the underlying tokens that back the reserve's available liquidity.
pub(crate) fn create_reserve(
    e: &Env,
    pool_address: &Address,
    token_address: &Address,
    reserve_config: &ReserveConfig,
    reserve_data: &ReserveData,
) {
    let mut new_reserve_config = reserve_config.clone();
    e.as_contract(pool_address, || {
        let index = storage::push_res_list(e, token_address).unwrap();
        new_reserve_config.index = index;
        storage::set_res_config(e, token_address, &new_reserve_config);
        storage::set_res_data(e, token_address, reserve_data);
    });

    let to_mint_pool = reserve_data.total_liquidity - reserve_data.total_borrowed;
    if to_mint_pool > 0 {
        MockTokenClient::new(e, token_address)
            .mock_all_auths()
            .mint(pool_address, &to_mint_pool);
    }
}
