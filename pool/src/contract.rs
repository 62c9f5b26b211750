use crate::{
    errors::PoolError,
    pool::{self, PositionData, PositionSummary, Positions, Reserve, User},
    settlement::{self, EffectSummary, Intent, LiquidationTarget},
    storage::{self, PoolConfig, ReserveConfig},
};
use soroban_sdk::{contract, contractclient, contractimpl, Address, Env, Symbol};

/// ### Pool
///
/// A pooled-liquidity lending market. Users submit intents that the pool's settler commits
/// against the pool's reserves.
#[contract]
pub struct PoolContract;

#[contractclient(name = "PoolClient")]
pub trait Pool {
    /// Initialize the pool
    ///
    /// ### Arguments
    /// * `admin` - The Address for the admin
    /// * `settler` - The Address allowed to commit and reject intents
    /// * `oracle` - The contract address of the SEP-40 oracle
    /// * `max_price_age` - The maximum age of an oracle price in seconds
    /// * `intent_ttl` - The number of seconds an intent can be committed after submission
    /// * `bonus_policy` - How a liquidation bonus shortfall is handled (0 = reject, 1 = partial)
    ///
    /// ### Errors
    /// If the pool is already initialized or the arguments are invalid
    #[allow(clippy::too_many_arguments)]
    fn initialize(
        e: Env,
        admin: Address,
        settler: Address,
        oracle: Address,
        max_price_age: u64,
        intent_ttl: u64,
        bonus_policy: u32,
    ) -> Result<(), PoolError>;

    /// (Admin only) Set a new address as the admin of this pool
    ///
    /// ### Arguments
    /// * `new_admin` - The new admin address
    ///
    /// ### Panics
    /// If the caller is not the admin
    fn set_admin(e: Env, new_admin: Address);

    /// (Admin only) Update the pool
    ///
    /// ### Arguments
    /// * `config` - The new pool configuration
    ///
    /// ### Errors
    /// If the configuration is invalid
    fn update_pool(e: Env, config: PoolConfig) -> Result<(), PoolError>;

    /// (Admin only) Initialize a reserve in the pool
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset to add as a reserve
    /// * `config` - The ReserveConfig for the reserve
    ///
    /// ### Errors
    /// If the reserve is already setup or the config is invalid
    fn init_reserve(e: Env, asset: Address, config: ReserveConfig) -> Result<u32, PoolError>;

    /// (Admin only) Update a reserve in the pool
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    /// * `config` - The ReserveConfig for the reserve
    ///
    /// ### Errors
    /// If the reserve does not exist or the config is invalid
    fn update_reserve(e: Env, asset: Address, config: ReserveConfig) -> Result<(), PoolError>;

    /// (Admin only) Claim the treasury's share of a reserve's accrued interest
    ///
    /// Returns the amount of underlying claimed
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    /// * `to` - The address receiving the tokens
    fn claim_treasury(e: Env, asset: Address, to: Address) -> Result<i128, PoolError>;

    /// Submit an intent to the pool. Deposits, repayments and liquidations transfer `amount`
    /// from the initiator into the pool until the intent is settled.
    ///
    /// Returns the id of the intent
    ///
    /// ### Arguments
    /// * `initiator` - The user submitting the intent
    /// * `kind` - 0 = deposit, 1 = withdraw, 2 = borrow, 3 = repay, 4 = liquidate
    /// * `asset` - The reserve's underlying asset (the debt asset for a liquidation)
    /// * `amount` - The amount of underlying
    /// * `auxiliary` - The borrower and collateral for a liquidation
    fn submit_intent(
        e: Env,
        initiator: Address,
        kind: u32,
        asset: Address,
        amount: i128,
        auxiliary: Option<LiquidationTarget>,
    ) -> Result<u64, PoolError>;

    /// (Settler only) Apply an intent to the pool
    ///
    /// The summary's health factor is 0 for a deposit or repayment made while a price the
    /// account depends on is stale.
    ///
    /// ### Arguments
    /// * `intent_id` - The id of the intent
    ///
    /// ### Errors
    /// If the intent can't be committed or the pool rejects the change. Nothing is written and
    /// the intent stays Created, so a failed commit must be followed by `reject` to close the
    /// intent and refund any escrow.
    fn commit(e: Env, intent_id: u64) -> Result<EffectSummary, PoolError>;

    /// (Settler only) Reject an intent and refund any escrowed tokens
    ///
    /// ### Arguments
    /// * `intent_id` - The id of the intent
    fn reject(e: Env, intent_id: u64) -> Result<EffectSummary, PoolError>;

    /// Expire an intent past its expiration and refund any escrowed tokens
    ///
    /// ### Arguments
    /// * `intent_id` - The id of the intent
    fn expire(e: Env, intent_id: u64) -> Result<EffectSummary, PoolError>;

    /// Fetch an intent
    ///
    /// ### Arguments
    /// * `intent_id` - The id of the intent
    fn get_intent(e: Env, intent_id: u64) -> Result<Intent, PoolError>;

    /// Fetch the pool configuration
    fn get_config(e: Env) -> PoolConfig;

    /// Fetch a reserve, accrued to the current ledger timestamp
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    fn get_reserve(e: Env, asset: Address) -> Result<Reserve, PoolError>;

    /// Fetch the current balances of a user in a reserve
    ///
    /// ### Arguments
    /// * `user` - The address of the user
    /// * `asset` - The underlying asset of the reserve
    fn get_position(e: Env, user: Address, asset: Address) -> Result<PositionSummary, PoolError>;

    /// Fetch the stored positions of a user, keyed by reserve index
    ///
    /// ### Arguments
    /// * `user` - The address of the user
    fn get_positions(e: Env, user: Address) -> Positions;

    /// Fetch the health factor of a user with 9 decimals, or i128::MAX if the user has no debt
    ///
    /// ### Arguments
    /// * `user` - The address of the user
    fn get_health_factor(e: Env, user: Address) -> Result<i128, PoolError>;

    /// Fetch the largest amount of a reserve's asset a user can borrow while staying healthy
    ///
    /// ### Arguments
    /// * `user` - The address of the user
    /// * `asset` - The underlying asset of the reserve
    fn get_max_borrow(e: Env, user: Address, asset: Address) -> Result<i128, PoolError>;
}

#[contractimpl]
impl Pool for PoolContract {
    #[allow(clippy::too_many_arguments)]
    fn initialize(
        e: Env,
        admin: Address,
        settler: Address,
        oracle: Address,
        max_price_age: u64,
        intent_ttl: u64,
        bonus_policy: u32,
    ) -> Result<(), PoolError> {
        storage::extend_instance(&e);

        pool::execute_initialize(
            &e,
            &admin,
            &PoolConfig {
                oracle,
                settler,
                max_price_age,
                intent_ttl,
                bonus_policy,
            },
        )
    }

    fn set_admin(e: Env, new_admin: Address) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();
        new_admin.require_auth();

        storage::set_admin(&e, &new_admin);

        e.events()
            .publish((Symbol::new(&e, "set_admin"), admin), new_admin);
    }

    fn update_pool(e: Env, config: PoolConfig) -> Result<(), PoolError> {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_update_pool(&e, &config)?;

        e.events()
            .publish((Symbol::new(&e, "update_pool"), admin), config);
        Ok(())
    }

    fn init_reserve(e: Env, asset: Address, config: ReserveConfig) -> Result<u32, PoolError> {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        let index = pool::initialize_reserve(&e, &asset, &config)?;

        e.events()
            .publish((Symbol::new(&e, "init_reserve"), admin), (asset, index));
        Ok(index)
    }

    fn update_reserve(e: Env, asset: Address, config: ReserveConfig) -> Result<(), PoolError> {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_update_reserve(&e, &asset, &config)?;

        e.events()
            .publish((Symbol::new(&e, "update_reserve"), admin), asset);
        Ok(())
    }

    fn claim_treasury(e: Env, asset: Address, to: Address) -> Result<i128, PoolError> {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        let amount = pool::execute_claim_treasury(&e, &asset, &to)?;

        e.events()
            .publish((Symbol::new(&e, "claim_treasury"), asset, to), amount);
        Ok(amount)
    }

    fn submit_intent(
        e: Env,
        initiator: Address,
        kind: u32,
        asset: Address,
        amount: i128,
        auxiliary: Option<LiquidationTarget>,
    ) -> Result<u64, PoolError> {
        storage::extend_instance(&e);
        initiator.require_auth();

        let intent =
            settlement::execute_submit_intent(&e, &initiator, kind, &asset, amount, auxiliary)?;

        e.events().publish(
            (Symbol::new(&e, "submit_intent"), initiator),
            (intent.id, kind, asset, amount),
        );
        Ok(intent.id)
    }

    fn commit(e: Env, intent_id: u64) -> Result<EffectSummary, PoolError> {
        storage::extend_instance(&e);

        let summary = settlement::execute_commit(&e, intent_id)?;

        e.events()
            .publish((Symbol::new(&e, "commit"), intent_id), summary.clone());
        Ok(summary)
    }

    fn reject(e: Env, intent_id: u64) -> Result<EffectSummary, PoolError> {
        storage::extend_instance(&e);

        let summary = settlement::execute_reject(&e, intent_id)?;

        e.events()
            .publish((Symbol::new(&e, "reject"), intent_id), summary.clone());
        Ok(summary)
    }

    fn expire(e: Env, intent_id: u64) -> Result<EffectSummary, PoolError> {
        storage::extend_instance(&e);

        let summary = settlement::execute_expire(&e, intent_id)?;

        e.events()
            .publish((Symbol::new(&e, "expire"), intent_id), summary.clone());
        Ok(summary)
    }

    fn get_intent(e: Env, intent_id: u64) -> Result<Intent, PoolError> {
        storage::get_intent(&e, intent_id).ok_or(PoolError::IntentNotFound)
    }

    fn get_config(e: Env) -> PoolConfig {
        storage::get_pool_config(&e)
    }

    fn get_reserve(e: Env, asset: Address) -> Result<Reserve, PoolError> {
        Reserve::load(&e, &asset)
    }

    fn get_position(e: Env, user: Address, asset: Address) -> Result<PositionSummary, PoolError> {
        let reserve = Reserve::load(&e, &asset)?;
        Ok(User::load(&e, &user).get_summary(&reserve))
    }

    fn get_positions(e: Env, user: Address) -> Positions {
        User::load(&e, &user).positions
    }

    fn get_health_factor(e: Env, user: Address) -> Result<i128, PoolError> {
        let user = User::load(&e, &user);
        if !user.has_liabilities() {
            return Ok(i128::MAX);
        }
        let mut pool = pool::Pool::load(&e);
        Ok(PositionData::calculate_from_positions(&e, &mut pool, &user)?.as_health_factor())
    }

    fn get_max_borrow(e: Env, user: Address, asset: Address) -> Result<i128, PoolError> {
        let user = User::load(&e, &user);
        let mut pool = pool::Pool::load(&e);
        let reserve = pool.load_reserve(&e, &asset)?;
        let price = pool.load_price(&e, &asset)?;
        let position_data = PositionData::calculate_from_positions(&e, &mut pool, &user)?;
        Ok(position_data.max_borrowable(&reserve, price))
    }
}
