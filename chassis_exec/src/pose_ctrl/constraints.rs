//! Velocity constraint stage
//!
//! Saturates a velocity demand to the chassis's speed limits, then bounds the
//! per-cycle change in the demand to its acceleration limits.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::Serialize;
use std::time::Duration;

use crate::drive::{ChassisVelocity, Frame};
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Speed and acceleration limits applied to a velocity demand.
#[derive(Debug, Clone, Serialize)]
pub struct VelocityConstraints {
    /// Units: meters/second
    max_speed_ms: f64,

    /// Units: radians/second
    max_omega_rads: f64,

    /// Units: meters/second^2
    max_accel_mss: f64,

    /// Units: radians/second^2
    max_ang_accel_radss: f64,

    /// The demand output on the previous cycle.
    last_output: ChassisVelocity,
}

/// Which limits were active on the last application of the constraints.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct ConstraintFlags {
    pub speed_limited: bool,
    pub omega_limited: bool,
    pub accel_limited: bool,
    pub ang_accel_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VelocityConstraints {
    /// Create a new constraint stage whose previous output is a field
    /// relative stop.
    pub fn new(
        max_speed_ms: f64,
        max_omega_rads: f64,
        max_accel_mss: f64,
        max_ang_accel_radss: f64,
    ) -> Self {
        Self {
            max_speed_ms,
            max_omega_rads,
            max_accel_mss,
            max_ang_accel_radss,
            last_output: ChassisVelocity::zero(Frame::Field),
        }
    }

    /// Saturate the demand to the speed limits.
    ///
    /// The translational part is scaled uniformly so that its direction is
    /// kept, the rotational part is saturated on its own.
    pub fn clamp_velocity(&self, cmd: &ChassisVelocity, flags: &mut ConstraintFlags) -> ChassisVelocity {
        let mut out = *cmd;

        let speed_ms = cmd.speed_ms();
        if speed_ms > self.max_speed_ms {
            let scale = self.max_speed_ms / speed_ms;
            out.vx_ms *= scale;
            out.vy_ms *= scale;
            flags.speed_limited = true;
        }

        if cmd.omega_rads.abs() > self.max_omega_rads {
            out.omega_rads = clamp_abs(cmd.omega_rads, self.max_omega_rads);
            flags.omega_limited = true;
        }

        out
    }

    /// Bound the change from the previous output, remembering the result as
    /// the new previous output.
    pub fn limit_accel(
        &mut self,
        cmd: &ChassisVelocity,
        dt: Duration,
        flags: &mut ConstraintFlags,
    ) -> ChassisVelocity {
        debug_assert_eq!(cmd.frame, self.last_output.frame);

        let dt_s = dt.as_secs_f64();
        let mut out = *cmd;

        // The change in the translational vector is limited as a whole, so
        // the chassis never accelerates harder than the limit in any
        // direction.
        let max_dv = self.max_accel_mss * dt_s;
        let dv = cmd.translation() - self.last_output.translation();
        let dv_norm = dv.norm();
        if dv_norm > max_dv {
            let limited = self.last_output.translation() + dv * (max_dv / dv_norm);
            out.vx_ms = limited[0];
            out.vy_ms = limited[1];
            flags.accel_limited = true;
        }

        let max_domega = self.max_ang_accel_radss * dt_s;
        let domega = cmd.omega_rads - self.last_output.omega_rads;
        if domega.abs() > max_domega {
            out.omega_rads = self.last_output.omega_rads + clamp_abs(domega, max_domega);
            flags.ang_accel_limited = true;
        }

        self.last_output = out;
        out
    }

    /// Apply the speed limits then the acceleration limits.
    pub fn apply(&mut self, cmd: &ChassisVelocity, dt: Duration) -> (ChassisVelocity, ConstraintFlags) {
        let mut flags = ConstraintFlags::default();

        let clamped = self.clamp_velocity(cmd, &mut flags);
        let out = self.limit_accel(&clamped, dt, &mut flags);

        trace!("Constrained demand {:?} -> {:?} ({:?})", cmd, out, flags);

        (out, flags)
    }

    /// Forget the previous output, the next demand is limited relative to a
    /// stop.
    pub fn reset(&mut self) {
        self.last_output = ChassisVelocity::zero(Frame::Field);
    }

    pub fn last_output(&self) -> ChassisVelocity {
        self.last_output
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: Duration = Duration::from_millis(20);

    fn constraints() -> VelocityConstraints {
        VelocityConstraints::new(4.5, 4.5, 14.5, 9.0)
    }

    #[test]
    fn test_clamp_keeps_direction() {
        let c = constraints();
        let mut flags = ConstraintFlags::default();

        for (vx, vy) in [(10.0, 0.0), (6.0, -8.0), (-3.0, 4.0), (-100.0, -0.5)].iter() {
            let raw = ChassisVelocity::field(*vx, *vy, 0.0);
            let out = c.clamp_velocity(&raw, &mut flags);

            assert!((out.speed_ms() - 4.5).abs() < 1e-9);

            let dir_in = raw.translation().normalize();
            let dir_out = out.translation().normalize();
            assert!((dir_in - dir_out).norm() < 1e-9);
        }
        assert!(flags.speed_limited);
    }

    #[test]
    fn test_clamp_within_limits_unchanged() {
        let c = constraints();
        let mut flags = ConstraintFlags::default();
        let raw = ChassisVelocity::field(1.0, -2.0, -3.0);

        assert_eq!(c.clamp_velocity(&raw, &mut flags), raw);
        assert!(!flags.speed_limited && !flags.omega_limited);

        let raw = ChassisVelocity::field(0.0, 0.0, -30.0);
        assert_eq!(c.clamp_velocity(&raw, &mut flags).omega_rads, -4.5);
    }

    #[test]
    fn test_accel_bounded() {
        let mut c = constraints();
        let max_dv = 14.5 * 0.02;
        let max_dw = 9.0 * 0.02;

        let demands = [
            ChassisVelocity::field(4.0, 2.0, 4.0),
            ChassisVelocity::field(-4.0, 0.0, -4.0),
            ChassisVelocity::field(0.1, 0.1, 0.0),
            ChassisVelocity::field(3.0, -3.0, 1.0),
        ];

        let mut prev = c.last_output();
        for d in demands.iter().cycle().take(40) {
            let (out, _) = c.apply(d, DT);

            assert!((out.translation() - prev.translation()).norm() <= max_dv + 1e-9);
            assert!((out.omega_rads - prev.omega_rads).abs() <= max_dw + 1e-9);
            assert!(out.speed_ms() <= 4.5 + 1e-9);

            prev = out;
        }
    }

    #[test]
    fn test_reset() {
        let mut c = constraints();
        c.apply(&ChassisVelocity::field(4.0, 0.0, 0.0), DT);
        assert!(!c.last_output().is_stopped());

        c.reset();
        assert!(c.last_output().is_stopped());
    }
}
