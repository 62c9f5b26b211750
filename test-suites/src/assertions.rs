use crate::test_fixture::SCALAR_7;
use soroban_fixed_point_math::FixedPoint;

/// Assert `a` is within `delta` of `b`
pub fn assert_approx_eq_abs(a: i128, b: i128, delta: i128) {
    assert!(
        a >= b - delta && a <= b + delta,
        "assertion failed: `(left ~= right)` \
         (left: `{:?}`, right: `{:?}`, delta: `{:?}`)",
        a,
        b,
        delta
    );
}

/// Assert `a` is within a relative `pct` of `b`, where `pct` is a 7 decimal fraction
pub fn assert_approx_eq_rel(a: i128, b: i128, pct: i128) {
    let delta = b.abs().fixed_mul_ceil(pct, SCALAR_7).unwrap();
    assert_approx_eq_abs(a, b, delta);
}
