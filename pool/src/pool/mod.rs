mod actions;
pub use actions::{apply_borrow, apply_deposit, apply_repay, apply_withdraw};

mod config;
pub use config::{
    execute_claim_treasury, execute_initialize, execute_update_pool, execute_update_reserve,
    initialize_reserve,
};

mod health_factor;
pub use health_factor::PositionData;

mod interest;

#[allow(clippy::module_inception)]
mod pool;
pub use pool::Pool;

mod reserve;
pub use reserve::Reserve;

mod user;
pub use user::{Position, PositionSummary, Positions, User};
