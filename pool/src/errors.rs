use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
/// Error codes for the pool contract. Common errors are codes that match up with the built-in
/// contracts error reporting. Pool specific errors start at 1200.
pub enum PoolError {
    // Common Errors
    InternalError = 1,
    AlreadyInitializedError = 3,

    UnauthorizedError = 4,

    NegativeAmountError = 8,
    BalanceError = 10,
    OverflowError = 12,

    // Pool Request Errors (start at 1200)
    BadRequest = 1200,
    InvalidPoolInitArgs = 1201,
    InvalidReserveMetadata = 1202,
    ReserveNotFound = 1203,
    ZeroAmount = 1204,
    ReserveInactive = 1205,

    // Reserve and Position Errors
    InsufficientLiquidity = 1210,
    InsufficientBalance = 1211,
    InsufficientCollateral = 1212,
    RepayExceedsDebt = 1213,

    // Risk Errors
    HealthFactorViolation = 1220,
    StaleOraclePrice = 1221,

    // Liquidation Errors
    LiquidationNotEligible = 1230,
    ExceedsCloseFactor = 1231,

    // Settlement Errors
    IntentNotFound = 1240,
    DuplicateSettlement = 1241,
    IntentExpired = 1242,
    IntentNotExpired = 1243,
}
