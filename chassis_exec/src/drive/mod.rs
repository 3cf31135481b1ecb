//! # Drive module
//!
//! Chassis velocity demands and the interface to the drivetrain actuator.
//!
//! A velocity demand is always tagged with the frame it is expressed in.
//! Field-relative demands have axes fixed to the environment, robot-relative
//! demands have axes fixed to the chassis body (X forward, Y left). The
//! drivetrain only ever accepts robot-relative demands.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The frame a velocity demand is expressed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Frame {
    Field,
    Robot,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A chassis velocity demand.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ChassisVelocity {
    /// Translational velocity along the frame's X axis.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Translational velocity along the frame's Y axis.
    ///
    /// Units: meters/second
    pub vy_ms: f64,

    /// Rotational velocity, counter-clockwise positive.
    ///
    /// Units: radians/second
    pub omega_rads: f64,

    /// Frame the translational components are expressed in.
    pub frame: Frame,
}

/// The drivetrain actuator, accepting one robot-relative demand per cycle.
pub trait DriveActuator {
    /// Drive the chassis with the given robot-relative demand.
    fn drive(&mut self, cmd: ChassisVelocity);

    /// Command the chassis to stop.
    fn stop(&mut self) {
        self.drive(ChassisVelocity::zero(Frame::Robot))
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisVelocity {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64, frame: Frame) -> Self {
        Self {
            vx_ms,
            vy_ms,
            omega_rads,
            frame,
        }
    }

    pub fn field(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self::new(vx_ms, vy_ms, omega_rads, Frame::Field)
    }

    pub fn robot(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self::new(vx_ms, vy_ms, omega_rads, Frame::Robot)
    }

    /// A stop demand in the given frame.
    pub fn zero(frame: Frame) -> Self {
        Self::new(0.0, 0.0, 0.0, frame)
    }

    /// Translational part of the demand as a vector.
    pub fn translation(&self) -> Vector2<f64> {
        Vector2::new(self.vx_ms, self.vy_ms)
    }

    /// Magnitude of the translational part of the demand.
    ///
    /// Units: meters/second
    pub fn speed_ms(&self) -> f64 {
        self.vx_ms.hypot(self.vy_ms)
    }

    /// True if every component is exactly zero.
    pub fn is_stopped(&self) -> bool {
        self.vx_ms == 0.0 && self.vy_ms == 0.0 && self.omega_rads == 0.0
    }

    /// Express this demand in the robot frame, given the chassis heading in
    /// the field frame.
    pub fn to_robot(&self, heading_rad: f64) -> Self {
        match self.frame {
            Frame::Robot => *self,
            Frame::Field => {
                let v = Rotation2::new(-heading_rad) * self.translation();
                Self::robot(v[0], v[1], self.omega_rads)
            }
        }
    }

    /// Express this demand in the field frame, given the chassis heading in
    /// the field frame.
    pub fn to_field(&self, heading_rad: f64) -> Self {
        match self.frame {
            Frame::Field => *self,
            Frame::Robot => {
                let v = Rotation2::new(heading_rad) * self.translation();
                Self::field(v[0], v[1], self.omega_rads)
            }
        }
    }

    /// Combine the translation of one robot-relative demand with the rotation
    /// of another.
    ///
    /// This is how two independent behaviours (e.g. an approach and an aim)
    /// share the single actuator write of a cycle.
    pub fn compose(translation: &ChassisVelocity, rotation: &ChassisVelocity) -> Self {
        debug_assert_eq!(translation.frame, Frame::Robot);
        debug_assert_eq!(rotation.frame, Frame::Robot);

        Self::robot(translation.vx_ms, translation.vy_ms, rotation.omega_rads)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_frame_conversion() {
        // Facing +Y, a field +Y demand is straight ahead for the robot
        let f = ChassisVelocity::field(0.0, 1.0, 0.5);
        let r = f.to_robot(FRAC_PI_2);

        assert_eq!(r.frame, Frame::Robot);
        assert!((r.vx_ms - 1.0).abs() < 1e-12);
        assert!(r.vy_ms.abs() < 1e-12);
        assert_eq!(r.omega_rads, 0.5);

        // And back again
        let f2 = r.to_field(FRAC_PI_2);
        assert_eq!(f2.frame, Frame::Field);
        assert!(f2.vx_ms.abs() < 1e-12);
        assert!((f2.vy_ms - 1.0).abs() < 1e-12);

        // Converting into the same frame is a no-op
        assert_eq!(r.to_robot(1.0), r);
    }

    #[test]
    fn test_compose() {
        let approach = ChassisVelocity::robot(0.5, 0.1, 2.0);
        let aim = ChassisVelocity::robot(0.0, 0.0, -0.3);
        let c = ChassisVelocity::compose(&approach, &aim);

        assert_eq!(c, ChassisVelocity::robot(0.5, 0.1, -0.3));
    }
}
