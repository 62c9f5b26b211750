/********** Numbers **********/

/// Fixed-point scalar for 9 decimal numbers
pub const SCALAR_9: i128 = 1_000_000_000;

/// Fixed-point scalar for 7 decimal numbers
pub const SCALAR_7: i128 = 1_0000000;

/// Fixed-point scalar for basis points
pub const SCALAR_BPS: i128 = 10_000;

// seconds per year
pub const SECONDS_PER_YEAR: i128 = 31536000;

/********** Limits **********/

/// Maximum number of reserves a pool can support
pub const MAX_RESERVES: u32 = 32;
