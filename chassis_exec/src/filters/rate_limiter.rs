//! Rate limiter
//!
//! Bounds how quickly a scalar output may change between successive cycles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::time::Duration;
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The memory of a rate limiter.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct RateLimiterState {
    /// The output produced on the previous cycle.
    pub last_output: f64,
}

/// A rate limiter owning its own state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Maximum rate of change of the output.
    ///
    /// Units: output units/second
    max_rate: f64,

    state: RateLimiterState,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Advance a rate limiter by one cycle of length `dt`.
///
/// The returned state's `last_output` is the limited output, which differs
/// from the previous output by at most `max_rate * dt`.
pub fn rate_limit(
    state: RateLimiterState,
    max_rate: f64,
    input: f64,
    dt: Duration,
) -> RateLimiterState {
    let max_step = max_rate * dt.as_secs_f64();
    let step = clamp_abs(input - state.last_output, max_step);

    RateLimiterState {
        last_output: state.last_output + step,
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RateLimiter {
    /// Create a new limiter with an initial output of zero.
    pub fn new(max_rate: f64) -> Self {
        Self {
            max_rate,
            state: RateLimiterState::default(),
        }
    }

    /// Limit the input, returning the new output.
    pub fn calculate(&mut self, input: f64, dt: Duration) -> f64 {
        self.state = rate_limit(self.state, self.max_rate, input, dt);
        self.state.last_output
    }

    pub fn last_output(&self) -> f64 {
        self.state.last_output
    }

    /// Reset the limiter so that the previous output is `value`.
    pub fn reset(&mut self, value: f64) {
        self.state = RateLimiterState { last_output: value };
    }
}
