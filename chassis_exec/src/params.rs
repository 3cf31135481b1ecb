//! # Chassis Executable Parameters
//!
//! This module provides parameters for the chassis executable and the
//! validation shared by all controller parameter sets.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::loc::{Pose, Transform};
use crate::pid::PidGains;
use crate::pose_ctrl::PoseTarget;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A parameter value outside of its sane range.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("Gains for {0} must be finite and non-negative, found {1:?}")]
    InvalidGains(&'static str, PidGains),

    #[error("{0} must be finite and greater than zero, found {1}")]
    NotPositive(&'static str, f64),

    #[error("{0} must be finite and not negative, found {1}")]
    Negative(&'static str, f64),

    #[error("The cycle period must be greater than zero")]
    ZeroCyclePeriod,
}

/// How the target pose of a scenario is given.
#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum TargetParams {
    /// Absolute field pose, heading in degrees.
    Absolute { x_m: f64, y_m: f64, heading_deg: f64 },

    /// Move relative to the starting pose, rotation in degrees.
    Relative { dx_m: f64, dy_m: f64, rotation_deg: f64 },
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the chassis executable (a simulated closed loop run).
#[derive(Debug, Clone, Deserialize)]
pub struct ChassisExecParams {
    /// Period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// If true the loop sleeps out the remainder of each cycle, otherwise it
    /// runs as fast as possible.
    pub realtime: bool,

    /// Maximum number of cycles to run before cancelling.
    pub max_cycles: u64,

    /// Starting pose of the simulated chassis as `[x_m, y_m, heading_deg]`.
    pub start_pose: [f64; 3],

    /// Target of the pose controller, if it should run.
    pub target: Option<TargetParams>,

    /// Scheduled vision detections, if the vision tracker should run.
    #[serde(default)]
    pub vision: Vec<VisionWindow>,

    /// True if the vision tracker should run alongside the pose controller.
    #[serde(default)]
    pub track_vision: bool,
}

/// A window of cycles during which the simulated camera sees the target.
#[derive(Debug, Copy, Clone, Deserialize)]
pub struct VisionWindow {
    /// First cycle of the window (inclusive).
    pub start_cycle: u64,

    /// Last cycle of the window (exclusive).
    pub end_cycle: u64,

    /// Bearing offset of the target relative to the chassis heading.
    ///
    /// Units: degrees
    pub bearing_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check that a value is finite and strictly positive.
pub fn check_positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    }
    else {
        Err(ParamsError::NotPositive(name, value))
    }
}

/// Check that a value is finite and not negative.
pub fn check_non_negative(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    }
    else {
        Err(ParamsError::Negative(name, value))
    }
}

/// Check that a set of PID gains is usable.
pub fn check_gains(name: &'static str, gains: &PidGains) -> Result<(), ParamsError> {
    if gains.is_valid() {
        Ok(())
    }
    else {
        Err(ParamsError::InvalidGains(name, *gains))
    }
}

/// Check that a cycle period is usable.
pub fn check_period(cycle_period: Duration) -> Result<(), ParamsError> {
    if cycle_period > Duration::default() {
        Ok(())
    }
    else {
        Err(ParamsError::ZeroCyclePeriod)
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ChassisExecParams {
    /// Validate the parameters, returning the cycle period.
    pub fn cycle_period(&self) -> Result<Duration, ParamsError> {
        check_positive("cycle_period_s", self.cycle_period_s)?;

        util::time::seconds_to_duration(self.cycle_period_s)
            .ok_or(ParamsError::NotPositive("cycle_period_s", self.cycle_period_s))
    }

    pub fn start_pose(&self) -> Pose {
        Pose::from_degrees(self.start_pose[0], self.start_pose[1], self.start_pose[2])
    }

    pub fn pose_target(&self) -> Option<PoseTarget> {
        self.target.map(|t| match t {
            TargetParams::Absolute { x_m, y_m, heading_deg } =>
                PoseTarget::Absolute(Pose::from_degrees(x_m, y_m, heading_deg)),
            TargetParams::Relative { dx_m, dy_m, rotation_deg } =>
                PoseTarget::Relative(Transform::new(dx_m, dy_m, rotation_deg.to_radians())),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exec_params_from_toml() {
        let p: ChassisExecParams = util::params::load_str(r#"
            cycle_period_s = 0.02
            realtime = false
            max_cycles = 500
            start_pose = [0.0, 0.0, 0.0]
            track_vision = true

            [target]
            kind = "Relative"
            dx_m = 1.0
            dy_m = 0.0
            rotation_deg = 90.0

            [[vision]]
            start_cycle = 0
            end_cycle = 10
            bearing_deg = 5.0
        "#).unwrap();

        assert_eq!(p.cycle_period().unwrap(), Duration::from_millis(20));
        assert_eq!(p.vision.len(), 1);
        assert!(matches!(p.pose_target(), Some(PoseTarget::Relative(_))));
    }

    #[test]
    fn test_checks() {
        assert!(check_positive("a", 1.0).is_ok());
        assert_eq!(check_positive("a", 0.0), Err(ParamsError::NotPositive("a", 0.0)));
        assert!(check_non_negative("b", 0.0).is_ok());
        assert!(check_non_negative("b", -0.1).is_err());
        assert!(check_non_negative("b", f64::INFINITY).is_err());
        assert_eq!(check_period(Duration::default()), Err(ParamsError::ZeroCyclePeriod));
    }
}
