//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Saturate a value into the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Saturate a value into the symmetric range `[-limit, limit]`.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float
{
    clamp(value, -limit, limit)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. Due to floating point round-off it can result in
/// `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in magnitude
/// and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the range (-pi, pi].
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t = pi_t + pi_t;

    let wrapped = pi_t - rem_euclid(pi_t - angle, tau_t);

    // Round-off in rem_euclid can land exactly on -pi, which is outside the
    // half-open range.
    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else {
        wrapped
    }
}

/// Get the shortest signed angular distance to travel from `from` to `to`.
///
/// The result is in the range (-pi, pi], positive meaning counter-clockwise.
pub fn ang_dist<T>(from: T, to: T) -> T
where
    T: Float
{
    wrap_pi(to - from)
}
