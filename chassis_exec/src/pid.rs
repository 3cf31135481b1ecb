//! # PID controller
//!
//! A discrete PID controller driven by an explicit cycle period, so that its
//! behaviour does not depend on the wall clock.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of a PID controller.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct PidGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Dervative gain
    pub k_d: f64,
}

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    gains: PidGains,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidGains {
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self { k_p, k_i, k_d }
    }

    /// True if all gains are finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.k_p, self.k_i, self.k_d]
            .iter()
            .all(|k| k.is_finite() && *k >= 0.0)
    }
}

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Get the value of the controller for the given error, sampled `dt`
    /// after the previous one.
    pub fn get(&mut self, error: f64, dt: Duration) -> f64 {
        let dt_s = dt.as_secs_f64();

        // Accumulate the integral term
        self.integral += error * dt_s;

        // No derivative on the first sample after a reset
        let deriv = match self.prev_error {
            Some(e) if dt_s > 0.0 => (error - e) / dt_s,
            _ => 0f64,
        };

        self.prev_error = Some(error);

        self.gains.k_p * error
            + self.gains.k_i * self.integral
            + self.gains.k_d * deriv
    }

    /// Clear the integral and derivative memory.
    pub fn reset(&mut self) {
        self.prev_error = None;
        self.integral = 0f64;
    }
}
