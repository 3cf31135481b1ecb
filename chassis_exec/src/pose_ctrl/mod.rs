//! # Pose control module
//!
//! Pose control drives the chassis from its current pose onto a target pose
//! in the field frame. It does this using three independent PID controllers,
//! one each on the field X, field Y and heading errors. The heading error is
//! always the shortest signed angle, so the chassis never turns the long way
//! round.
//!
//! The raw demand from the controllers is passed through a constraint stage
//! which saturates it to the chassis speed limits and then bounds how quickly
//! it may change from one cycle to the next. Saturation scales the (vx, vy)
//! vector as a whole so the direction of travel is kept. The constrained
//! demand is finally rotated into the robot frame for the drivetrain.
//!
//! The controller is settled once the last demand is slow enough and the
//! chassis is close enough to the target in both position and heading. All
//! four bounds must hold at once.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod constraints;
pub mod controllers;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use thiserror::Error;

// Internal
use crate::loc::{Pose, Transform};
use crate::params::ParamsError;
pub use constraints::*;
pub use controllers::*;
pub use params::{Params, SettleThresholds};
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The target of a pose control activation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PoseTarget {
    /// A pose in the field frame.
    Absolute(Pose),

    /// A move relative to the pose at the moment the activation starts.
    Relative(Transform),
}

/// Errors that can occur in pose control.
#[derive(Debug, Error)]
pub enum PoseCtrlError {
    #[error("Invalid pose control parameters: {0}")]
    InvalidParams(#[from] ParamsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseTarget {
    /// Get the field frame target pose given the pose at activation.
    pub fn resolve(&self, start: &Pose) -> Pose {
        match self {
            PoseTarget::Absolute(p) => *p,
            PoseTarget::Relative(t) => start.transform_by(t),
        }
    }
}
