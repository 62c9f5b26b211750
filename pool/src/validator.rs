use crate::errors::PoolError;

/// Require that an incoming amount is strictly positive
///
/// ### Arguments
/// * `amount` - The amount to check
///
/// ### Errors
/// If the number is zero or negative
pub fn require_positive(amount: i128) -> Result<(), PoolError> {
    if amount <= 0 {
        return Err(PoolError::ZeroAmount);
    }
    Ok(())
}
