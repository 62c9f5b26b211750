use soroban_sdk::{contracttype, Address, Vec};

use crate::errors::PoolError;

/// The borrower and collateral a liquidation intent targets
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct LiquidationTarget {
    pub borrower: Address,
    pub collateral_asset: Address,
}

/// A request submitted to the pool that waits for the settler to commit it
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Intent {
    pub id: u64,
    pub kind: u32,            // the IntentKind
    pub initiator: Address,   // the user that submitted the intent
    pub counterparty: Address, // the settler allowed to commit or reject the intent
    pub asset: Address,       // the reserve the intent acts on (the debt asset for liquidations)
    pub amount: i128,         // the amount of underlying
    pub auxiliary: Vec<LiquidationTarget>, // the liquidation target, empty for other kinds
    pub status: u32,     // the IntentStatus
    pub created: u64,    // the timestamp the intent was submitted
    pub expiration: u64, // the last timestamp the intent can be committed
}

/// The effect of settling an intent
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct EffectSummary {
    pub intent_id: u64,
    pub kind: u32,
    pub status: u32,
    pub asset: Address,
    pub amount: i128,
    pub seized: i128,        // collateral moved to the liquidator, zero for other kinds
    pub health_factor: i128, // the health factor of the affected account after settlement
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum IntentKind {
    Deposit = 0,
    Withdraw = 1,
    Borrow = 2,
    Repay = 3,
    Liquidate = 4,
}

impl IntentKind {
    pub fn from_u32(value: u32) -> Result<Self, PoolError> {
        match value {
            0 => Ok(IntentKind::Deposit),
            1 => Ok(IntentKind::Withdraw),
            2 => Ok(IntentKind::Borrow),
            3 => Ok(IntentKind::Repay),
            4 => Ok(IntentKind::Liquidate),
            _ => Err(PoolError::BadRequest),
        }
    }

    /// If the initiator's tokens are held by the pool from submission until settlement
    pub fn is_escrowed(&self) -> bool {
        matches!(
            self,
            IntentKind::Deposit | IntentKind::Repay | IntentKind::Liquidate
        )
    }

    /// If the pool pays tokens out to the initiator on commit
    pub fn is_payout(&self) -> bool {
        matches!(self, IntentKind::Withdraw | IntentKind::Borrow)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum IntentStatus {
    Created = 0,
    Committed = 1,
    Rejected = 2,
    Expired = 3,
}

impl IntentStatus {
    pub fn from_u32(value: u32) -> Result<Self, PoolError> {
        match value {
            0 => Ok(IntentStatus::Created),
            1 => Ok(IntentStatus::Committed),
            2 => Ok(IntentStatus::Rejected),
            3 => Ok(IntentStatus::Expired),
            _ => Err(PoolError::InternalError),
        }
    }
}

impl Intent {
    /// Require the intent can still be committed at `now`
    ///
    /// ### Errors
    /// If the intent was already settled, or has expired
    pub fn require_committable(&self, now: u64) -> Result<(), PoolError> {
        match IntentStatus::from_u32(self.status)? {
            IntentStatus::Committed | IntentStatus::Rejected => {
                Err(PoolError::DuplicateSettlement)
            }
            IntentStatus::Expired => Err(PoolError::IntentExpired),
            IntentStatus::Created if now > self.expiration => Err(PoolError::IntentExpired),
            IntentStatus::Created => Ok(()),
        }
    }

    /// Require the intent has not left the Created state
    ///
    /// ### Errors
    /// If the intent was already settled or expired
    pub fn require_created(&self) -> Result<(), PoolError> {
        if self.status != IntentStatus::Created as u32 {
            return Err(PoolError::DuplicateSettlement);
        }
        Ok(())
    }

    /// The liquidation target of the intent, if any
    pub fn liquidation_target(&self) -> Option<LiquidationTarget> {
        self.auxiliary.first()
    }

    /// Move the intent out of the Created state
    pub fn settle(&mut self, status: IntentStatus) {
        self.status = status as u32;
    }
}
