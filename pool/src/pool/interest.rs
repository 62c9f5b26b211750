use cast::i128;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::unwrap::UnwrapOptimized;

use crate::{
    constants::{SCALAR_7, SCALAR_BPS},
    storage::ReserveConfig,
};

/// Calculates the annual borrow and supply rates for a reserve from its utilization using a
/// two-slope curve with a kink at the reserve's optimal utilization.
///
/// ### Arguments
/// * `config` - The Reserve config to calculate rates for
/// * `cur_util` - The current utilization of the reserve (7 decimals)
///
/// ### Returns
/// * (i128, i128) - (borrow rate, supply rate) both scaled to 7 decimals
pub fn calc_rates(config: &ReserveConfig, cur_util: i128) -> (i128, i128) {
    let optimal_util = i128(config.optimal_util);
    let base_rate = i128(config.base_rate);
    let borrow_rate = if cur_util <= optimal_util {
        let util_scalar = cur_util
            .fixed_div_ceil(optimal_util, SCALAR_7)
            .unwrap_optimized();
        base_rate
            + util_scalar
                .fixed_mul_ceil(i128(config.slope_one), SCALAR_7)
                .unwrap_optimized()
    } else {
        let util_scalar = (cur_util - optimal_util)
            .fixed_div_ceil(SCALAR_7 - optimal_util, SCALAR_7)
            .unwrap_optimized();
        base_rate
            + i128(config.slope_one)
            + util_scalar
                .fixed_mul_ceil(i128(config.slope_two), SCALAR_7)
                .unwrap_optimized()
    };

    // suppliers earn the borrowers' interest on the utilized share, less the treasury's cut
    let supply_rate = cur_util
        .fixed_mul_floor(borrow_rate, SCALAR_7)
        .unwrap_optimized()
        .fixed_mul_floor(SCALAR_BPS - i128(config.reserve_factor), SCALAR_BPS)
        .unwrap_optimized();
    (borrow_rate, supply_rate)
}
