use lending_pool::{
    EffectSummary, IntentKind, LiquidationTarget, PoolClient, PoolContract, Reserve, ReserveConfig,
};
use sep_40_oracle::testutils::{Asset, MockPriceOracleClient, MockPriceOracleWASM};
use sep_41_token::testutils::{MockTokenClient, MockTokenWASM};
use soroban_sdk::testutils::{Address as _, Ledger, LedgerInfo};
use soroban_sdk::{vec as svec, Address, Env, IntoVal, Symbol, Vec as SVec};

pub const SCALAR_7: i128 = 1_000_0000;
pub const SCALAR_9: i128 = 1_000_000_000;

#[derive(Clone, Copy)]
#[repr(usize)]
pub enum TokenIndex {
    WETH = 0,
    USDC = 1,
    XLM = 2,
}

pub struct TestFixture<'a> {
    pub env: Env,
    pub bombadil: Address,
    pub settler: Address,
    pub users: Vec<Address>,
    pub pool: PoolClient<'a>,
    pub oracle: MockPriceOracleClient<'a>,
    pub prices: SVec<i128>,
    pub tokens: Vec<MockTokenClient<'a>>,
}

impl TestFixture<'_> {
    /// Create a new TestFixture for the lending pool
    ///
    /// Deploys wETH (0), USDC (1), and XLM (2) test tokens, an oracle pricing them at 2000,
    /// 1 and 0.1 USD, and a pool with a reserve for each token.
    pub fn create<'a>() -> TestFixture<'a> {
        let e = Env::default();
        e.mock_all_auths();
        e.budget().reset_unlimited();

        let bombadil = Address::generate(&e);
        let settler = Address::generate(&e);

        e.ledger().set(ledger_info(1_700_000_000, 100));

        // deploy tokens
        let eth_client = create_token(&e, &bombadil, 9, "wETH");
        let usdc_client = create_token(&e, &bombadil, 6, "USDC");
        let xlm_client = create_token(&e, &bombadil, 7, "XLM");

        // deploy oracle
        let oracle_id = e.register_contract_wasm(None, MockPriceOracleWASM);
        let oracle_client = MockPriceOracleClient::new(&e, &oracle_id);
        oracle_client.set_data(
            &bombadil,
            &Asset::Other(Symbol::new(&e, "USD")),
            &svec![
                &e,
                Asset::Stellar(eth_client.address.clone()),
                Asset::Stellar(usdc_client.address.clone()),
                Asset::Stellar(xlm_client.address.clone()),
            ],
            &7,
            &300,
        );
        let prices = svec![&e, 2000_0000000, 1_0000000, 0_1000000];
        oracle_client.set_price(&prices, &e.ledger().timestamp());

        // deploy pool
        let pool_id = e.register_contract(None, PoolContract {});
        let pool_client = PoolClient::new(&e, &pool_id);
        pool_client.initialize(&bombadil, &settler, &oracle_id, &3600, &600, &0);

        let mut weth_config = default_reserve_config(9);
        weth_config.liq_threshold = 8000;
        pool_client.init_reserve(&eth_client.address, &weth_config);

        let mut usdc_config = default_reserve_config(6);
        usdc_config.liq_threshold = 9000;
        usdc_config.optimal_util = 0_8000000;
        pool_client.init_reserve(&usdc_client.address, &usdc_config);

        let mut xlm_config = default_reserve_config(7);
        xlm_config.liq_threshold = 7500;
        pool_client.init_reserve(&xlm_client.address, &xlm_config);

        TestFixture {
            env: e,
            bombadil,
            settler,
            users: vec![],
            pool: pool_client,
            oracle: oracle_client,
            prices,
            tokens: vec![eth_client, usdc_client, xlm_client],
        }
    }

    pub fn token(&self, index: TokenIndex) -> &MockTokenClient {
        &self.tokens[index as usize]
    }

    /********** Intent Helpers ***********/

    /// Submit an intent for `user` and return its id
    pub fn submit(&self, user: &Address, kind: IntentKind, index: TokenIndex, amount: i128) -> u64 {
        self.pool.submit_intent(
            user,
            &(kind as u32),
            &self.token(index).address,
            &amount,
            &None,
        )
    }

    /// Submit an intent for `user` and have the settler commit it
    pub fn submit_and_commit(
        &self,
        user: &Address,
        kind: IntentKind,
        index: TokenIndex,
        amount: i128,
    ) -> EffectSummary {
        let intent_id = self.submit(user, kind, index, amount);
        self.pool.commit(&intent_id)
    }

    /// Submit a liquidation intent for `liquidator` covering `amount` of the borrower's debt
    /// in `debt_index` and return its id
    pub fn submit_liquidation(
        &self,
        liquidator: &Address,
        borrower: &Address,
        debt_index: TokenIndex,
        collateral_index: TokenIndex,
        amount: i128,
    ) -> u64 {
        self.pool.submit_intent(
            liquidator,
            &(IntentKind::Liquidate as u32),
            &self.token(debt_index).address,
            &amount,
            &Some(LiquidationTarget {
                borrower: borrower.clone(),
                collateral_asset: self.token(collateral_index).address.clone(),
            }),
        )
    }

    /********** Read Helpers ***********/

    pub fn read_reserve(&self, index: TokenIndex) -> Reserve {
        self.pool.get_reserve(&self.token(index).address)
    }

    pub fn read_collateral(&self, user: &Address, index: TokenIndex) -> i128 {
        self.pool
            .get_position(user, &self.token(index).address)
            .collateral
    }

    pub fn read_liabilities(&self, user: &Address, index: TokenIndex) -> i128 {
        self.pool
            .get_position(user, &self.token(index).address)
            .liabilities
    }

    /********** Chain Helpers ***********/

    /// Set the oracle price of a token, published at the current timestamp
    pub fn set_price(&mut self, index: TokenIndex, price: i128) {
        self.prices.set(index as u32, price);
        self.oracle
            .set_price(&self.prices, &self.env.ledger().timestamp());
    }

    /// Move time forward and republish the oracle prices at the new timestamp
    pub fn jump(&self, time: u64) {
        self.jump_without_prices(time);
        self.oracle
            .set_price(&self.prices, &self.env.ledger().timestamp());
    }

    /// Move time forward without republishing the oracle prices
    pub fn jump_without_prices(&self, time: u64) {
        let blocks = time / 5;
        self.env.ledger().set(ledger_info(
            self.env.ledger().timestamp() + time,
            self.env.ledger().sequence() + (blocks as u32),
        ));
    }
}

// entries live long enough to survive a year of ledgers
fn ledger_info(timestamp: u64, sequence_number: u32) -> LedgerInfo {
    LedgerInfo {
        timestamp,
        protocol_version: 20,
        sequence_number,
        network_id: Default::default(),
        base_reserve: 10,
        min_temp_entry_ttl: 16,
        min_persistent_entry_ttl: 10_000_000,
        max_entry_ttl: 10_000_000,
    }
}

pub fn create_token<'a>(
    e: &Env,
    admin: &Address,
    decimals: u32,
    symbol: &str,
) -> MockTokenClient<'a> {
    let contract_id = Address::generate(e);
    e.register_contract_wasm(&contract_id, MockTokenWASM);
    let client = MockTokenClient::new(e, &contract_id);
    client.initialize(
        admin,
        &decimals,
        &"test token".into_val(e),
        &symbol.into_val(e),
    );
    client
}

pub fn default_reserve_config(decimals: u32) -> ReserveConfig {
    ReserveConfig {
        index: 0,
        decimals,
        optimal_util: 0_7500000,
        base_rate: 0_0100000,
        slope_one: 0_0400000,
        slope_two: 0_7500000,
        reserve_factor: 1000,
        liq_threshold: 8000,
        liq_bonus: 500,
        close_factor: 5000,
        active: true,
    }
}

/// Create a TestFixture where frodo (users[0]) has supplied 100 wETH, 100k USDC and
/// 1M XLM to the pool
pub fn create_fixture_with_data<'a>() -> TestFixture<'a> {
    let mut fixture = TestFixture::create();

    let frodo = Address::generate(&fixture.env);
    fixture.users.push(frodo.clone());

    let supply = [
        (TokenIndex::WETH, 100 * 10i128.pow(9)),
        (TokenIndex::USDC, 100_000 * 10i128.pow(6)),
        (TokenIndex::XLM, 1_000_000 * SCALAR_7),
    ];
    for (index, amount) in supply {
        fixture.token(index).mint(&frodo, &amount);
        fixture.submit_and_commit(&frodo, IntentKind::Deposit, index, amount);
    }
    fixture
}
