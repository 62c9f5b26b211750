use cast::i128;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{unwrap::UnwrapOptimized, Address, Env, Symbol};

use crate::{
    constants::SCALAR_BPS,
    errors::PoolError,
    pool::{Pool, PositionData, User},
    validator::require_positive,
};

/// How a liquidation is handled when the bonus would seize more collateral than the
/// borrower holds
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum BonusPolicy {
    /// Fail the liquidation
    Reject = 0,
    /// Seize the entire balance, as long as it still covers the debt without a bonus
    PartialBonus = 1,
}

impl BonusPolicy {
    pub fn from_u32(value: u32) -> Result<Self, PoolError> {
        match value {
            0 => Ok(BonusPolicy::Reject),
            1 => Ok(BonusPolicy::PartialBonus),
            _ => Err(PoolError::BadRequest),
        }
    }
}

/// The outcome of a liquidation
pub struct LiquidationResult {
    /// The amount of collateral moved from the borrower to the liquidator
    pub seized: i128,
    /// The borrower's health factor after the liquidation
    pub health_factor: i128,
}

/// Repay part of an unhealthy borrower's debt on their behalf and move the equivalent
/// collateral, plus the reserve's liquidation bonus, to the liquidator's collateral position.
///
/// ### Arguments
/// * pool - The pool
/// * liquidator - The user covering the debt
/// * borrower - The user being liquidated
/// * debt_asset - The underlying asset of the debt being covered
/// * collateral_asset - The underlying asset of the collateral being seized
/// * debt_to_cover - The amount of debt repaid by the liquidator
///
/// ### Errors
/// If the borrower is healthy or holds no debt in `debt_asset`, if `debt_to_cover` exceeds
/// the debt reserve's close factor, or if the borrower's collateral cannot cover the seize
pub fn apply_liquidation(
    e: &Env,
    pool: &mut Pool,
    liquidator: &mut User,
    borrower: &mut User,
    debt_asset: &Address,
    collateral_asset: &Address,
    debt_to_cover: i128,
) -> Result<LiquidationResult, PoolError> {
    require_positive(debt_to_cover)?;
    if liquidator.address == borrower.address {
        return Err(PoolError::BadRequest);
    }

    let position_data = PositionData::calculate_from_positions(e, pool, borrower)?;
    if !position_data.is_liquidatable() {
        return Err(PoolError::LiquidationNotEligible);
    }

    let mut debt_reserve = pool.load_reserve(e, debt_asset)?;
    let collateral_reserve = pool.load_reserve(e, collateral_asset)?;
    let debt_balance = borrower.get_liabilities(&debt_reserve);
    if debt_balance == 0 {
        return Err(PoolError::LiquidationNotEligible);
    }
    let max_cover = debt_balance
        .fixed_mul_floor(i128(debt_reserve.config.close_factor), SCALAR_BPS)
        .unwrap_optimized();
    if debt_to_cover > max_cover {
        return Err(PoolError::ExceedsCloseFactor);
    }

    // value the covered debt in the base asset and convert it to collateral tokens
    let debt_price = pool.load_price(e, debt_asset)?;
    let collateral_price = pool.load_price(e, collateral_asset)?;
    let base_value = debt_price
        .fixed_mul_floor(debt_to_cover, debt_reserve.scalar)
        .unwrap_optimized();
    let base_seize = base_value
        .fixed_mul_floor(collateral_reserve.scalar, collateral_price)
        .unwrap_optimized();
    let mut seize = base_value
        .fixed_mul_floor(
            SCALAR_BPS + i128(collateral_reserve.config.liq_bonus),
            SCALAR_BPS,
        )
        .unwrap_optimized()
        .fixed_mul_floor(collateral_reserve.scalar, collateral_price)
        .unwrap_optimized();

    let collateral_balance = borrower.get_collateral(&collateral_reserve);
    if seize > collateral_balance {
        match BonusPolicy::from_u32(pool.config.bonus_policy)? {
            BonusPolicy::Reject => return Err(PoolError::InsufficientCollateral),
            BonusPolicy::PartialBonus => {
                if base_seize > collateral_balance {
                    return Err(PoolError::InsufficientCollateral);
                }
                seize = collateral_balance;
            }
        }
    }

    borrower.remove_liabilities(&debt_reserve, debt_to_cover)?;
    debt_reserve.decrease_borrowed(debt_to_cover);
    pool.cache_reserve(debt_reserve, true);

    // reload in case the debt and collateral share a reserve
    let collateral_reserve = pool.load_reserve(e, collateral_asset)?;
    borrower.remove_collateral(&collateral_reserve, seize)?;
    liquidator.add_collateral(&collateral_reserve, seize);
    pool.cache_reserve(collateral_reserve, true);

    let health_factor =
        PositionData::calculate_from_positions(e, pool, borrower)?.as_health_factor();

    e.events().publish(
        (
            Symbol::new(e, "liquidate"),
            borrower.address.clone(),
            liquidator.address.clone(),
        ),
        (
            debt_asset.clone(),
            collateral_asset.clone(),
            debt_to_cover,
            seize,
        ),
    );
    Ok(LiquidationResult {
        seized: seize,
        health_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::SCALAR_9, storage, testutils};
    use sep_40_oracle::testutils::MockPriceOracleClient;
    use soroban_sdk::{testutils::Address as _, vec};

    /// Creates a pool with a collateral reserve priced at 2500 and a stable reserve priced at 1,
    /// and a borrower holding 1 unit of collateral against `debt` of the stable asset.
    /// Returns (pool, oracle client, collateral asset, stable asset, borrower).
    fn setup_borrower<'a>(
        e: &Env,
        debt: i128,
        bonus_policy: u32,
    ) -> (Address, MockPriceOracleClient<'a>, Address, Address, Address) {
        e.mock_all_auths();
        e.budget().reset_unlimited();
        let bombadil = Address::generate(e);
        let samwise = Address::generate(e);
        let pool_address = testutils::create_pool(e);

        let (weth, _) = testutils::create_token_contract(e, &bombadil);
        let (reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_data.total_liquidity = 0;
        reserve_data.total_borrowed = 0;
        testutils::create_reserve(e, &pool_address, &weth, &reserve_config, &reserve_data);

        let (usdc, _) = testutils::create_token_contract(e, &bombadil);
        let (reserve_config, mut reserve_data) = testutils::default_reserve_meta();
        reserve_data.total_liquidity = 10000_0000000;
        reserve_data.total_borrowed = 0;
        testutils::create_reserve(e, &pool_address, &usdc, &reserve_config, &reserve_data);

        let (oracle, oracle_client) = testutils::create_oracle_with_prices(
            e,
            &bombadil,
            &vec![e, weth.clone(), usdc.clone()],
            &vec![e, 2500_0000000, 1_0000000],
        );
        let mut pool_config = testutils::default_pool_config(e, &oracle);
        pool_config.bonus_policy = bonus_policy;

        e.as_contract(&pool_address, || {
            storage::set_pool_config(e, &pool_config);
            let mut pool = Pool::load(e);
            let mut user = User::load(e, &samwise);
            crate::pool::apply_deposit(e, &mut pool, &mut user, &weth, 1_0000000).unwrap();
            crate::pool::apply_borrow(e, &mut pool, &mut user, &usdc, debt).unwrap();
            pool.store_cached_reserves(e);
            user.store(e);
        });
        (pool_address, oracle_client, weth, usdc, samwise)
    }

    #[test]
    fn test_liquidation_close_factor() {
        let e = Env::default();
        let (pool_address, oracle_client, weth, usdc, samwise) =
            setup_borrower(&e, 1000_0000000, 0);
        let frodo = Address::generate(&e);

        // 1000 * 0.85 < 1000 of debt
        oracle_client.set_price_stable(&vec![&e, 1000_0000000, 1_0000000]);

        e.as_contract(&pool_address, || {
            let mut pool = Pool::load(&e);
            let mut liquidator = User::load(&e, &frodo);
            let mut borrower = User::load(&e, &samwise);

            let result = apply_liquidation(
                &e,
                &mut pool,
                &mut liquidator,
                &mut borrower,
                &usdc,
                &weth,
                600_0000000,
            );
            assert_eq!(result.err(), Some(PoolError::ExceedsCloseFactor));

            let result = apply_liquidation(
                &e,
                &mut pool,
                &mut liquidator,
                &mut borrower,
                &usdc,
                &weth,
                500_0000000,
            )
            .unwrap();
            // 500 of debt at a 5% bonus is 525 of collateral value
            assert_eq!(result.seized, 0_5250000);
            // 0.475 * 1000 * 0.85 / 500
            assert_eq!(result.health_factor, 0_807_500_000);

            let weth_reserve = pool.load_reserve(&e, &weth).unwrap();
            let usdc_reserve = pool.load_reserve(&e, &usdc).unwrap();
            assert_eq!(borrower.get_liabilities(&usdc_reserve), 500_0000000);
            assert_eq!(borrower.get_collateral(&weth_reserve), 0_4750000);
            assert_eq!(liquidator.get_collateral(&weth_reserve), 0_5250000);
            assert_eq!(usdc_reserve.data.total_borrowed, 500_0000000);
            assert_eq!(weth_reserve.data.total_liquidity, 1_0000000);
        });
    }

    #[test]
    fn test_liquidation_healthy_borrower() {
        let e = Env::default();
        let (pool_address, _, weth, usdc, samwise) = setup_borrower(&e, 1000_0000000, 0);
        let frodo = Address::generate(&e);

        e.as_contract(&pool_address, || {
            let mut pool = Pool::load(&e);
            let mut liquidator = User::load(&e, &frodo);
            let mut borrower = User::load(&e, &samwise);

            let result = apply_liquidation(
                &e,
                &mut pool,
                &mut liquidator,
                &mut borrower,
                &usdc,
                &weth,
                100_0000000,
            );
            assert_eq!(result.err(), Some(PoolError::LiquidationNotEligible));
        });
    }

    #[test]
    fn test_liquidation_no_debt_in_asset() {
        let e = Env::default();
        let (pool_address, oracle_client, weth, _, samwise) =
            setup_borrower(&e, 1000_0000000, 0);
        let frodo = Address::generate(&e);
        oracle_client.set_price_stable(&vec![&e, 1000_0000000, 1_0000000]);

        e.as_contract(&pool_address, || {
            let mut pool = Pool::load(&e);
            let mut liquidator = User::load(&e, &frodo);
            let mut borrower = User::load(&e, &samwise);

            let result = apply_liquidation(
                &e,
                &mut pool,
                &mut liquidator,
                &mut borrower,
                &weth,
                &weth,
                0_1000000,
            );
            assert_eq!(result.err(), Some(PoolError::LiquidationNotEligible));

            let result = apply_liquidation(
                &e,
                &mut pool,
                &mut borrower.clone(),
                &mut borrower,
                &weth,
                &weth,
                0_1000000,
            );
            assert_eq!(result.err(), Some(PoolError::BadRequest));
        });
    }

    #[test]
    fn test_liquidation_reject_policy() {
        let e = Env::default();
        let (pool_address, oracle_client, weth, usdc, samwise) =
            setup_borrower(&e, 1000_0000000, 0);
        let frodo = Address::generate(&e);

        // covering 500 of debt requires exactly the 1 unit of collateral before the bonus
        oracle_client.set_price_stable(&vec![&e, 500_0000000, 1_0000000]);

        e.as_contract(&pool_address, || {
            let mut pool = Pool::load(&e);
            let mut liquidator = User::load(&e, &frodo);
            let mut borrower = User::load(&e, &samwise);

            let result = apply_liquidation(
                &e,
                &mut pool,
                &mut liquidator,
                &mut borrower,
                &usdc,
                &weth,
                500_0000000,
            );
            assert_eq!(result.err(), Some(PoolError::InsufficientCollateral));

            let result = apply_liquidation(
                &e,
                &mut pool,
                &mut liquidator,
                &mut borrower,
                &usdc,
                &weth,
                400_0000000,
            )
            .unwrap();
            // 420 of value at 500 per unit
            assert_eq!(result.seized, 0_8400000);
        });
    }

    #[test]
    fn test_liquidation_partial_bonus_policy() {
        let e = Env::default();
        let (pool_address, oracle_client, weth, usdc, samwise) =
            setup_borrower(&e, 1000_0000000, 1);
        let frodo = Address::generate(&e);
        oracle_client.set_price_stable(&vec![&e, 500_0000000, 1_0000000]);

        e.as_contract(&pool_address, || {
            let mut pool = Pool::load(&e);
            let mut liquidator = User::load(&e, &frodo);
            let mut borrower = User::load(&e, &samwise);

            let result = apply_liquidation(
                &e,
                &mut pool,
                &mut liquidator,
                &mut borrower,
                &usdc,
                &weth,
                500_0000000,
            )
            .unwrap();
            // the bonus is forfeited and the whole balance is seized
            assert_eq!(result.seized, 1_0000000);
            assert_eq!(result.health_factor, 0);

            let weth_reserve = pool.load_reserve(&e, &weth).unwrap();
            assert_eq!(borrower.get_collateral(&weth_reserve), 0);
            assert_eq!(liquidator.get_collateral(&weth_reserve), 1_0000000);
        });
    }

    #[test]
    fn test_liquidation_partial_bonus_policy_underwater() {
        let e = Env::default();
        let (pool_address, oracle_client, weth, usdc, samwise) =
            setup_borrower(&e, 1000_0000000, 1);
        let frodo = Address::generate(&e);

        // 500 of debt is worth 1.25 units of collateral
        oracle_client.set_price_stable(&vec![&e, 400_0000000, 1_0000000]);

        e.as_contract(&pool_address, || {
            let mut pool = Pool::load(&e);
            let mut liquidator = User::load(&e, &frodo);
            let mut borrower = User::load(&e, &samwise);

            let result = apply_liquidation(
                &e,
                &mut pool,
                &mut liquidator,
                &mut borrower,
                &usdc,
                &weth,
                500_0000000,
            );
            assert_eq!(result.err(), Some(PoolError::InsufficientCollateral));
        });
    }

    #[test]
    fn test_liquidation_never_seizes_more_than_balance() {
        let e = Env::default();
        let (pool_address, oracle_client, weth, usdc, samwise) =
            setup_borrower(&e, 2000_0000000, 1);
        let frodo = Address::generate(&e);

        for price in [2000_0000000i128, 1500_0000000, 1100_0000000, 1000_0000000] {
            oracle_client.set_price_stable(&vec![&e, price, 1_0000000]);
            e.as_contract(&pool_address, || {
                let mut pool = Pool::load(&e);
                let mut liquidator = User::load(&e, &frodo);
                let mut borrower = User::load(&e, &samwise);
                let weth_reserve = pool.load_reserve(&e, &weth).unwrap();
                let usdc_reserve = pool.load_reserve(&e, &usdc).unwrap();
                let collateral_before = borrower.get_collateral(&weth_reserve);
                let max_cover = borrower
                    .get_liabilities(&usdc_reserve)
                    .fixed_mul_floor(5000, SCALAR_BPS)
                    .unwrap();

                if let Ok(result) = apply_liquidation(
                    &e,
                    &mut pool,
                    &mut liquidator,
                    &mut borrower,
                    &usdc,
                    &weth,
                    max_cover,
                ) {
                    assert!(result.seized <= collateral_before);
                    assert!(result.health_factor < SCALAR_9 * 10);
                }
            });
        }
    }
}
