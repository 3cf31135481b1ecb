//! # Localisation module
//!
//! Planar pose types for the chassis. Poses are produced fresh each cycle by
//! an external pose provider (odometry, vision fusion, simulation) and are
//! never mutated in place.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::Serialize;
use util::maths::{ang_dist, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose (position and heading in the field frame) of the chassis.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Default)]
pub struct Pose {
    /// The position in the field frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// The heading, measured counter-clockwise from the field X axis and
    /// wrapped to (-pi, pi].
    ///
    /// Units: radians
    heading_rad: f64,
}

/// A rigid transform expressed in the frame of the pose it is applied to.
///
/// Used to command a relative move, e.g. "1 m forward and turn 90 degrees",
/// which is resolved against the pose at the moment the command starts.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Default)]
pub struct Transform {
    /// Translation in the body frame of the pose being transformed.
    ///
    /// Units: meters
    pub translation_m: Vector2<f64>,

    /// Rotation to add to the heading.
    ///
    /// Units: radians
    pub rotation_rad: f64,
}

/// The error between a target pose and the current pose, i.e.
/// `target - current`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Default)]
pub struct PoseError {
    /// Field frame X error.
    pub dx_m: f64,

    /// Field frame Y error.
    pub dy_m: f64,

    /// Shortest signed heading error in (-pi, pi].
    pub dhead_rad: f64,
}

/// A source of pose estimates, sampled once per cycle.
pub trait PoseProvider {
    /// Get the current estimated pose.
    fn pose(&mut self) -> Pose;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    /// Create a new pose, wrapping the heading into (-pi, pi].
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad: wrap_pi(heading_rad),
        }
    }

    /// Create a new pose with the heading given in degrees.
    pub fn from_degrees(x_m: f64, y_m: f64, heading_deg: f64) -> Self {
        Self::new(x_m, y_m, heading_deg.to_radians())
    }

    pub fn x(&self) -> f64 {
        self.position_m[0]
    }

    pub fn y(&self) -> f64 {
        self.position_m[1]
    }

    /// Return the heading of the chassis in the range (-pi, pi].
    pub fn heading(&self) -> f64 {
        self.heading_rad
    }

    /// Apply a body-frame transform to this pose.
    ///
    /// The translation is rotated by the current heading into the field
    /// frame, and the rotation added to the heading.
    pub fn transform_by(&self, transform: &Transform) -> Pose {
        let rot = Rotation2::new(self.heading_rad);
        let position_m = self.position_m + rot * transform.translation_m;

        Pose {
            position_m,
            heading_rad: wrap_pi(self.heading_rad + transform.rotation_rad),
        }
    }

    /// Compute the error from this pose (the current pose) to the target.
    pub fn error_to(&self, target: &Pose) -> PoseError {
        PoseError {
            dx_m: target.x() - self.x(),
            dy_m: target.y() - self.y(),
            dhead_rad: ang_dist(self.heading_rad, target.heading_rad),
        }
    }
}

impl Transform {
    pub fn new(dx_m: f64, dy_m: f64, rotation_rad: f64) -> Self {
        Self {
            translation_m: Vector2::new(dx_m, dy_m),
            rotation_rad,
        }
    }
}

impl PoseError {
    /// Magnitude of the positional part of the error.
    pub fn distance_m(&self) -> f64 {
        self.dx_m.hypot(self.dy_m)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_heading_wrapped() {
        let p = Pose::new(0.0, 0.0, 3.0 * PI / 2.0);
        assert!((p.heading() + FRAC_PI_2).abs() < 1e-12);

        let p = Pose::from_degrees(0.0, 0.0, -180.0);
        assert!((p.heading() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_transform_by() {
        // Facing +Y, moving 1 m forward ends up at +Y
        let p = Pose::new(1.0, 2.0, FRAC_PI_2);
        let t = p.transform_by(&Transform::new(1.0, 0.0, FRAC_PI_2));

        assert!((t.x() - 1.0).abs() < 1e-12);
        assert!((t.y() - 3.0).abs() < 1e-12);
        assert!((t.heading() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_error_to_wraps() {
        let current = Pose::new(0.0, 0.0, PI - 0.05);
        let target = Pose::new(1.0, -1.0, -PI + 0.05);
        let e = current.error_to(&target);

        assert_eq!(e.dx_m, 1.0);
        assert_eq!(e.dy_m, -1.0);
        assert!((e.dhead_rad - 0.1).abs() < 1e-9);
        assert!((e.distance_m() - 2f64.sqrt()).abs() < 1e-12);
    }
}
