#![no_std]

#[cfg(any(test, feature = "testutils"))]
extern crate std;

mod constants;
mod contract;
mod errors;
mod liquidation;
mod pool;
mod settlement;
mod storage;
mod testutils;
mod validator;

pub use constants::{SCALAR_7, SCALAR_9, SCALAR_BPS, SECONDS_PER_YEAR};
pub use contract::*;
pub use errors::PoolError;
pub use liquidation::BonusPolicy;
pub use pool::{Position, PositionSummary, Positions, Reserve};
pub use settlement::{EffectSummary, Intent, IntentKind, IntentStatus, LiquidationTarget};
pub use storage::{PoolConfig, PoolDataKey, PositionKey, ReserveConfig, ReserveData};
