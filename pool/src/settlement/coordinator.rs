use sep_41_token::TokenClient;
use soroban_sdk::{vec, Address, Env, Vec};

use crate::{
    errors::PoolError,
    liquidation::apply_liquidation,
    pool::{self, Pool, PositionData, User},
    storage,
    validator::require_positive,
};

use super::intent::{EffectSummary, Intent, IntentKind, IntentStatus, LiquidationTarget};

/// Create an intent for the initiator and escrow the initiator's tokens for intents that
/// pay into the pool
///
/// ### Arguments
/// * `initiator` - The user submitting the intent
/// * `kind` - The IntentKind
/// * `asset` - The reserve the intent acts on (the debt asset for liquidations)
/// * `amount` - The amount of underlying
/// * `auxiliary` - The liquidation target, required for and only for liquidations
///
/// ### Errors
/// If the kind or amount is invalid, the reserve does not exist, or the liquidation target
/// is missing, unexpected, or targets the initiator
pub fn execute_submit_intent(
    e: &Env,
    initiator: &Address,
    kind: u32,
    asset: &Address,
    amount: i128,
    auxiliary: Option<LiquidationTarget>,
) -> Result<Intent, PoolError> {
    let intent_kind = IntentKind::from_u32(kind)?;
    require_positive(amount)?;
    if !storage::has_res(e, asset) {
        return Err(PoolError::ReserveNotFound);
    }
    match (&intent_kind, &auxiliary) {
        (IntentKind::Liquidate, Some(target)) => {
            if target.borrower == *initiator {
                return Err(PoolError::BadRequest);
            }
            if !storage::has_res(e, &target.collateral_asset) {
                return Err(PoolError::ReserveNotFound);
            }
        }
        (IntentKind::Liquidate, None) | (_, Some(_)) => return Err(PoolError::BadRequest),
        _ => {}
    }

    let targets = match auxiliary {
        Some(target) => vec![e, target],
        None => Vec::new(e),
    };

    let pool_config = storage::get_pool_config(e);
    let now = e.ledger().timestamp();
    let intent = Intent {
        id: storage::next_intent_id(e),
        kind,
        initiator: initiator.clone(),
        counterparty: pool_config.settler,
        asset: asset.clone(),
        amount,
        auxiliary: targets,
        status: IntentStatus::Created as u32,
        created: now,
        expiration: now + pool_config.intent_ttl,
    };

    if intent_kind.is_escrowed() {
        TokenClient::new(e, asset).transfer(initiator, &e.current_contract_address(), &amount);
    }
    storage::set_intent(e, &intent);
    Ok(intent)
}

/// Settle an intent by applying it to the pool. The reserves, positions and intent status
/// are only written once every check has passed.
///
/// ### Arguments
/// * `intent_id` - The id of the intent
///
/// ### Errors
/// If the intent does not exist, was already settled, has expired, or the pool rejects the
/// requested change
pub fn execute_commit(e: &Env, intent_id: u64) -> Result<EffectSummary, PoolError> {
    let mut intent = storage::get_intent(e, intent_id).ok_or(PoolError::IntentNotFound)?;
    intent.counterparty.require_auth();
    intent.require_committable(e.ledger().timestamp())?;

    let kind = IntentKind::from_u32(intent.kind)?;
    let mut pool = Pool::load(e);
    let mut user = User::load(e, &intent.initiator);
    let mut seized = 0;
    let health_factor = match kind {
        IntentKind::Liquidate => {
            let target = intent.liquidation_target().ok_or(PoolError::BadRequest)?;
            let mut borrower = User::load(e, &target.borrower);
            let result = apply_liquidation(
                e,
                &mut pool,
                &mut user,
                &mut borrower,
                &intent.asset,
                &target.collateral_asset,
                intent.amount,
            )?;
            borrower.store(e);
            seized = result.seized;
            result.health_factor
        }
        // deposit and repay never require prices, the health factor is 0 if one is stale
        IntentKind::Deposit => {
            pool::apply_deposit(e, &mut pool, &mut user, &intent.asset, intent.amount)?;
            load_health_factor(e, &mut pool, &user).unwrap_or(0)
        }
        IntentKind::Withdraw => {
            pool::apply_withdraw(e, &mut pool, &mut user, &intent.asset, intent.amount)?;
            load_health_factor(e, &mut pool, &user)?
        }
        IntentKind::Borrow => {
            pool::apply_borrow(e, &mut pool, &mut user, &intent.asset, intent.amount)?;
            load_health_factor(e, &mut pool, &user)?
        }
        IntentKind::Repay => {
            pool::apply_repay(e, &mut pool, &mut user, &intent.asset, intent.amount)?;
            load_health_factor(e, &mut pool, &user).unwrap_or(0)
        }
    };

    pool.store_cached_reserves(e);
    user.store(e);
    intent.settle(IntentStatus::Committed);
    storage::set_intent(e, &intent);

    if kind.is_payout() {
        TokenClient::new(e, &intent.asset).transfer(
            &e.current_contract_address(),
            &intent.initiator,
            &intent.amount,
        );
    }

    Ok(EffectSummary {
        intent_id,
        kind: intent.kind,
        status: intent.status,
        asset: intent.asset,
        amount: intent.amount,
        seized,
        health_factor,
    })
}

/// Reject an intent that has not been settled and refund any escrow to the initiator
///
/// ### Arguments
/// * `intent_id` - The id of the intent
///
/// ### Errors
/// If the intent does not exist or has already left the Created state
pub fn execute_reject(e: &Env, intent_id: u64) -> Result<EffectSummary, PoolError> {
    let mut intent = storage::get_intent(e, intent_id).ok_or(PoolError::IntentNotFound)?;
    intent.counterparty.require_auth();
    intent.require_created()?;

    close_intent(e, &mut intent, IntentStatus::Rejected)
}

/// Expire an intent that was not settled before its expiration and refund any escrow to
/// the initiator
///
/// ### Arguments
/// * `intent_id` - The id of the intent
///
/// ### Errors
/// If the intent does not exist, has already left the Created state, or has not expired
pub fn execute_expire(e: &Env, intent_id: u64) -> Result<EffectSummary, PoolError> {
    let mut intent = storage::get_intent(e, intent_id).ok_or(PoolError::IntentNotFound)?;
    intent.require_created()?;
    if e.ledger().timestamp() <= intent.expiration {
        return Err(PoolError::IntentNotExpired);
    }

    close_intent(e, &mut intent, IntentStatus::Expired)
}

/// Health factor of the user, skipping the oracle for users without debt
fn load_health_factor(e: &Env, pool: &mut Pool, user: &User) -> Result<i128, PoolError> {
    if !user.has_liabilities() {
        return Ok(i128::MAX);
    }
    Ok(PositionData::calculate_from_positions(e, pool, user)?.as_health_factor())
}

fn close_intent(
    e: &Env,
    intent: &mut Intent,
    status: IntentStatus,
) -> Result<EffectSummary, PoolError> {
    let kind = IntentKind::from_u32(intent.kind)?;
    intent.settle(status);
    storage::set_intent(e, intent);

    if kind.is_escrowed() {
        TokenClient::new(e, &intent.asset).transfer(
            &e.current_contract_address(),
            &intent.initiator,
            &intent.amount,
        );
    }

    Ok(EffectSummary {
        intent_id: intent.id,
        kind: intent.kind,
        status: intent.status,
        asset: intent.asset.clone(),
        amount: intent.amount,
        seized: 0,
        health_factor: 0,
    })
}
