//! # Pose controllers module
//!
//! This module provides the three independent PID loops used by PoseCtrl,
//! operating on the field frame X, Y and heading errors.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use std::time::Duration;

// Internal
use super::Params;
use crate::drive::ChassisVelocity;
use crate::loc::PoseError;
use crate::pid::PidController;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose controllers
#[derive(Debug, Serialize, Clone)]
pub struct PoseControllers {
    /// Field X error controller
    x_ctrl: PidController,

    /// Field Y error controller
    y_ctrl: PidController,

    /// Heading error controller
    head_ctrl: PidController,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseControllers {

    /// Create a new instance of the controllers from the parameters
    pub fn new(params: &Params) -> Self {
        Self {
            x_ctrl: PidController::new(params.x_gains),
            y_ctrl: PidController::new(params.y_gains),
            head_ctrl: PidController::new(params.head_gains),
        }
    }

    /// Get the field relative velocity demand which reduces the given error.
    ///
    /// The heading error must already be wrapped into (-pi, pi] so the
    /// chassis turns the short way round.
    pub fn get_field_cmd(&mut self, error: &PoseError, dt: Duration) -> ChassisVelocity {
        ChassisVelocity::field(
            self.x_ctrl.get(error.dx_m, dt),
            self.y_ctrl.get(error.dy_m, dt),
            self.head_ctrl.get(error.dhead_rad, dt),
        )
    }

    /// Reset all three loops.
    pub fn reset(&mut self) {
        self.x_ctrl.reset();
        self.y_ctrl.reset();
        self.head_ctrl.reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive::Frame;

    #[test]
    fn test_field_cmd() {
        let mut ctrls = PoseControllers::new(&Params::default());
        let err = PoseError { dx_m: 0.5, dy_m: -0.25, dhead_rad: 0.1 };
        let cmd = ctrls.get_field_cmd(&err, Duration::from_millis(20));

        assert_eq!(cmd.frame, Frame::Field);
        assert!((cmd.vx_ms - 3.0).abs() < 1e-12);
        assert!((cmd.vy_ms + 1.5).abs() < 1e-12);
        assert!((cmd.omega_rads - 0.3).abs() < 1e-12);
    }
}
