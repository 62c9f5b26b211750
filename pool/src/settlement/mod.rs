mod coordinator;
pub use coordinator::{execute_commit, execute_expire, execute_reject, execute_submit_intent};

mod intent;
pub use intent::{EffectSummary, Intent, IntentKind, IntentStatus, LiquidationTarget};
