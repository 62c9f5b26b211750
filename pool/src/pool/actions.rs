use soroban_sdk::{Address, Env, Symbol};

use crate::{errors::PoolError, validator::require_positive};

use super::{health_factor::PositionData, pool::Pool, User};

/// Supply collateral to a reserve on behalf of the user
///
/// ### Arguments
/// * pool - The pool
/// * user - The user supplying collateral
/// * asset - The underlying asset of the reserve
/// * amount - The amount of underlying supplied
///
/// ### Errors
/// If the amount is not positive, or the reserve does not exist or is inactive
pub fn apply_deposit(
    e: &Env,
    pool: &mut Pool,
    user: &mut User,
    asset: &Address,
    amount: i128,
) -> Result<(), PoolError> {
    require_positive(amount)?;
    let mut reserve = pool.load_reserve(e, asset)?;
    reserve.require_active()?;

    user.add_collateral(&reserve, amount);
    reserve.add_liquidity(amount);
    pool.cache_reserve(reserve, true);

    e.events().publish(
        (Symbol::new(e, "deposit"), asset.clone(), user.address.clone()),
        amount,
    );
    Ok(())
}

/// Withdraw collateral from a reserve on behalf of the user. Requires the user to remain
/// healthy if they have outstanding debt.
///
/// ### Arguments
/// * pool - The pool
/// * user - The user withdrawing collateral
/// * asset - The underlying asset of the reserve
/// * amount - The amount of underlying withdrawn
///
/// ### Errors
/// If the amount is not positive or exceeds the collateral balance, the reserve lacks the
/// unborrowed liquidity, or the withdrawal would leave the user unhealthy
pub fn apply_withdraw(
    e: &Env,
    pool: &mut Pool,
    user: &mut User,
    asset: &Address,
    amount: i128,
) -> Result<(), PoolError> {
    require_positive(amount)?;
    let mut reserve = pool.load_reserve(e, asset)?;

    user.remove_collateral(&reserve, amount)?;
    reserve.remove_liquidity(amount)?;
    pool.cache_reserve(reserve, true);

    if user.has_liabilities() {
        PositionData::calculate_from_positions(e, pool, user)?.require_healthy()?;
    }

    e.events().publish(
        (Symbol::new(e, "withdraw"), asset.clone(), user.address.clone()),
        amount,
    );
    Ok(())
}

/// Borrow from a reserve on behalf of the user. Requires the user to remain healthy.
///
/// ### Arguments
/// * pool - The pool
/// * user - The user borrowing
/// * asset - The underlying asset of the reserve
/// * amount - The amount of underlying borrowed
///
/// ### Errors
/// If the amount is not positive, the reserve is inactive or lacks the liquidity, or the
/// borrow would leave the user unhealthy
pub fn apply_borrow(
    e: &Env,
    pool: &mut Pool,
    user: &mut User,
    asset: &Address,
    amount: i128,
) -> Result<(), PoolError> {
    require_positive(amount)?;
    let mut reserve = pool.load_reserve(e, asset)?;
    reserve.require_active()?;

    reserve.increase_borrowed(amount)?;
    user.add_liabilities(&reserve, amount);
    pool.cache_reserve(reserve, true);

    PositionData::calculate_from_positions(e, pool, user)?.require_healthy()?;

    e.events().publish(
        (Symbol::new(e, "borrow"), asset.clone(), user.address.clone()),
        amount,
    );
    Ok(())
}

/// Repay debt in a reserve on behalf of the user
///
/// ### Arguments
/// * pool - The pool
/// * user - The user repaying
/// * asset - The underlying asset of the reserve
/// * amount - The amount of underlying repaid
///
/// ### Errors
/// If the amount is not positive or exceeds the outstanding debt
pub fn apply_repay(
    e: &Env,
    pool: &mut Pool,
    user: &mut User,
    asset: &Address,
    amount: i128,
) -> Result<(), PoolError> {
    require_positive(amount)?;
    let mut reserve = pool.load_reserve(e, asset)?;

    user.remove_liabilities(&reserve, amount)?;
    reserve.decrease_borrowed(amount);
    pool.cache_reserve(reserve, true);

    e.events().publish(
        (Symbol::new(e, "repay"), asset.clone(), user.address.clone()),
        amount,
    );
    Ok(())
}
