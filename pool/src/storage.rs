use soroban_sdk::{
    contracttype, unwrap::UnwrapOptimized, vec, Address, Env, IntoVal, Symbol, TryFromVal, Val,
    Vec,
};

use crate::{
    constants::MAX_RESERVES, errors::PoolError, pool::Position, settlement::Intent,
};

pub(crate) const LEDGER_THRESHOLD_SHARED: u32 = 172800; // ~ 10 days
pub(crate) const LEDGER_BUMP_SHARED: u32 = 241920; // ~ 14 days

pub(crate) const LEDGER_THRESHOLD_USER: u32 = 518400; // ~ 30 days
pub(crate) const LEDGER_BUMP_USER: u32 = 535670; // ~ 31 days

/********** Storage Types **********/

/// The pool's config
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct PoolConfig {
    pub oracle: Address,    // the SEP-40 price feed used for all valuations
    pub settler: Address,   // the only address allowed to commit or reject intents
    pub max_price_age: u64, // the maximum age of an oracle price in seconds
    pub intent_ttl: u64,    // the number of seconds an intent can wait for a commit
    pub bonus_policy: u32,  // how a liquidation bonus shortfall is handled (see BonusPolicy)
}

/// The configuration information about a reserve asset
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct ReserveConfig {
    pub index: u32,          // the index of the reserve in the list
    pub decimals: u32,       // the decimals used by the underlying token
    pub optimal_util: u32,   // the utilization at the kink of the rate curve, 7 decimals
    pub base_rate: u32,      // the borrow rate at zero utilization, 7 decimals
    pub slope_one: u32,      // the rate added between zero and optimal utilization, 7 decimals
    pub slope_two: u32,      // the rate added between optimal and full utilization, 7 decimals
    pub reserve_factor: u32, // the share of interest kept by the treasury, bps
    pub liq_threshold: u32,  // the share of collateral value counted towards health, bps
    pub liq_bonus: u32,      // the extra collateral awarded to liquidators, bps
    pub close_factor: u32,   // the share of a debt that can be liquidated at once, bps
    pub active: bool,        // if new deposits and borrows are accepted
}

/// The data for a reserve asset
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct ReserveData {
    pub liquidity_index: i128, // the supply interest index, 9 decimals
    pub borrow_index: i128,    // the debt interest index, 9 decimals
    pub total_liquidity: i128, // the total underlying supplied, including accrued interest
    pub total_borrowed: i128,  // the total underlying borrowed, including accrued interest
    pub supply_rate: i128,     // the current annual supply rate, 7 decimals
    pub borrow_rate: i128,     // the current annual borrow rate, 7 decimals
    pub treasury_credit: i128, // the amount of total_liquidity owned by the treasury
    pub last_time: u64,        // the last time the data was accrued
}

/********** Storage Key Types **********/

const ADMIN_KEY: &str = "Admin";
const POOL_CONFIG_KEY: &str = "Config";
const RES_LIST_KEY: &str = "ResList";
const INTENT_NONCE_KEY: &str = "IntNonce";

/// The side of the book a position is on
pub const SIDE_COLLATERAL: u32 = 0;
pub const SIDE_LIABILITY: u32 = 1;

#[derive(Clone)]
#[contracttype]
pub struct PositionKey {
    pub user: Address,
    pub asset: Address,
    pub side: u32,
}

#[derive(Clone)]
#[contracttype]
pub enum PoolDataKey {
    // A map of underlying asset's contract address to reserve config
    ResConfig(Address),
    // A map of underlying asset's contract address to reserve data
    ResData(Address),
    // A position for a user in a reserve on one side of the book
    Position(PositionKey),
    // A settlement intent by id
    Intent(u64),
}

/********** Storage **********/

/// Bump the instance rent for the contract
pub fn extend_instance(e: &Env) {
    e.storage()
        .instance()
        .extend_ttl(LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/// Fetch an entry in persistent storage, bumping it if it exists
fn get_persistent<K: IntoVal<Env, Val>, V: TryFromVal<Env, Val>>(
    e: &Env,
    key: &K,
    bump_threshold: u32,
    bump_amount: u32,
) -> Option<V> {
    let result = e.storage().persistent().get::<K, V>(key);
    if result.is_some() {
        e.storage()
            .persistent()
            .extend_ttl(key, bump_threshold, bump_amount);
    }
    result
}

/// Write an entry to persistent storage and bump it
fn set_persistent<K: IntoVal<Env, Val>, V: IntoVal<Env, Val>>(
    e: &Env,
    key: &K,
    value: &V,
    bump_threshold: u32,
    bump_amount: u32,
) {
    e.storage().persistent().set::<K, V>(key, value);
    e.storage()
        .persistent()
        .extend_ttl(key, bump_threshold, bump_amount);
}

/********** Admin **********/

/// Fetch the current admin Address
///
/// ### Panics
/// If the admin does not exist
pub fn get_admin(e: &Env) -> Address {
    e.storage()
        .instance()
        .get(&Symbol::new(e, ADMIN_KEY))
        .unwrap_optimized()
}

/// Set a new admin
///
/// ### Arguments
/// * `new_admin` - The Address for the admin
pub fn set_admin(e: &Env, new_admin: &Address) {
    e.storage()
        .instance()
        .set::<Symbol, Address>(&Symbol::new(e, ADMIN_KEY), new_admin);
}

/// Checks if an admin is set
pub fn has_admin(e: &Env) -> bool {
    e.storage().instance().has(&Symbol::new(e, ADMIN_KEY))
}

/********** Pool Config **********/

/// Fetch the pool configuration
///
/// ### Panics
/// If the pool's config is not set
pub fn get_pool_config(e: &Env) -> PoolConfig {
    e.storage()
        .instance()
        .get(&Symbol::new(e, POOL_CONFIG_KEY))
        .unwrap_optimized()
}

/// Set the pool configuration
///
/// ### Arguments
/// * `config` - The pool configuration
pub fn set_pool_config(e: &Env, config: &PoolConfig) {
    e.storage()
        .instance()
        .set::<Symbol, PoolConfig>(&Symbol::new(e, POOL_CONFIG_KEY), config);
}

/********** Reserve Config (ResConfig) **********/

/// Fetch the reserve configuration for an asset, if the reserve exists
///
/// ### Arguments
/// * `asset` - The contract address of the asset
pub fn get_res_config(e: &Env, asset: &Address) -> Option<ReserveConfig> {
    let key = PoolDataKey::ResConfig(asset.clone());
    get_persistent(e, &key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED)
}

/// Set the reserve configuration for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `config` - The reserve configuration for the asset
pub fn set_res_config(e: &Env, asset: &Address, config: &ReserveConfig) {
    let key = PoolDataKey::ResConfig(asset.clone());
    set_persistent(e, &key, config, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/// Checks if a reserve exists for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
pub fn has_res(e: &Env, asset: &Address) -> bool {
    let key = PoolDataKey::ResConfig(asset.clone());
    e.storage().persistent().has(&key)
}

/********** Reserve Data (ResData) **********/

/// Fetch the reserve data for an asset, if the reserve exists
///
/// ### Arguments
/// * `asset` - The contract address of the asset
pub fn get_res_data(e: &Env, asset: &Address) -> Option<ReserveData> {
    let key = PoolDataKey::ResData(asset.clone());
    get_persistent(e, &key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED)
}

/// Set the reserve data for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `data` - The reserve data for the asset
pub fn set_res_data(e: &Env, asset: &Address, data: &ReserveData) {
    let key = PoolDataKey::ResData(asset.clone());
    set_persistent(e, &key, data, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/********** Reserve List (ResList) **********/

/// Fetch the list of reserves
pub fn get_res_list(e: &Env) -> Vec<Address> {
    get_persistent(
        e,
        &Symbol::new(e, RES_LIST_KEY),
        LEDGER_THRESHOLD_SHARED,
        LEDGER_BUMP_SHARED,
    )
    .unwrap_or(vec![e])
}

/// Add a reserve to the back of the list and returns the index
///
/// ### Arguments
/// * `asset` - The contract address of the underlying asset
///
/// ### Errors
/// If the number of reserves in the list exceeds 32
///
// @dev: Once added it can't be removed
pub fn push_res_list(e: &Env, asset: &Address) -> Result<u32, PoolError> {
    let mut res_list = get_res_list(e);
    if res_list.len() == MAX_RESERVES {
        return Err(PoolError::BadRequest);
    }
    res_list.push_back(asset.clone());
    let new_index = res_list.len() - 1;
    set_persistent(
        e,
        &Symbol::new(e, RES_LIST_KEY),
        &res_list,
        LEDGER_THRESHOLD_SHARED,
        LEDGER_BUMP_SHARED,
    );
    Ok(new_index)
}

/********** Positions **********/

/// Fetch a user's position in a reserve for one side of the book
///
/// ### Arguments
/// * `user` - The address of the user
/// * `asset` - The contract address of the reserve's asset
/// * `side` - SIDE_COLLATERAL or SIDE_LIABILITY
pub fn get_position(e: &Env, user: &Address, asset: &Address, side: u32) -> Option<Position> {
    let key = PoolDataKey::Position(PositionKey {
        user: user.clone(),
        asset: asset.clone(),
        side,
    });
    get_persistent(e, &key, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER)
}

/// Set a user's position in a reserve for one side of the book
///
/// ### Arguments
/// * `user` - The address of the user
/// * `asset` - The contract address of the reserve's asset
/// * `side` - SIDE_COLLATERAL or SIDE_LIABILITY
/// * `position` - The new position
pub fn set_position(e: &Env, user: &Address, asset: &Address, side: u32, position: &Position) {
    let key = PoolDataKey::Position(PositionKey {
        user: user.clone(),
        asset: asset.clone(),
        side,
    });
    set_persistent(e, &key, position, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER);
}

/// Remove a user's position in a reserve for one side of the book
///
/// ### Arguments
/// * `user` - The address of the user
/// * `asset` - The contract address of the reserve's asset
/// * `side` - SIDE_COLLATERAL or SIDE_LIABILITY
pub fn del_position(e: &Env, user: &Address, asset: &Address, side: u32) {
    let key = PoolDataKey::Position(PositionKey {
        user: user.clone(),
        asset: asset.clone(),
        side,
    });
    e.storage().persistent().remove(&key);
}

/********** Intents **********/

/// Fetch an intent by id
///
/// ### Arguments
/// * `id` - The id of the intent
pub fn get_intent(e: &Env, id: u64) -> Option<Intent> {
    get_persistent(
        e,
        &PoolDataKey::Intent(id),
        LEDGER_THRESHOLD_USER,
        LEDGER_BUMP_USER,
    )
}

/// Set an intent
///
/// ### Arguments
/// * `intent` - The intent to write, keyed by its id
pub fn set_intent(e: &Env, intent: &Intent) {
    set_persistent(
        e,
        &PoolDataKey::Intent(intent.id),
        intent,
        LEDGER_THRESHOLD_USER,
        LEDGER_BUMP_USER,
    );
}

/// Fetch the next intent id and advance the nonce
pub fn next_intent_id(e: &Env) -> u64 {
    let key = Symbol::new(e, INTENT_NONCE_KEY);
    let id: u64 = e.storage().instance().get(&key).unwrap_or(0);
    e.storage().instance().set::<Symbol, u64>(&key, &(id + 1));
    id
}
