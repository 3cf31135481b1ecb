//! Pose control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::params::{check_gains, check_non_negative, check_positive, ParamsError};
use crate::pid::PidGains;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for pose control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Field X position controller gains
    pub x_gains: PidGains,

    /// Field Y position controller gains
    pub y_gains: PidGains,

    /// Heading controller gains
    pub head_gains: PidGains,

    /// Maximum translational speed demand, applied to the magnitude of the
    /// (vx, vy) vector.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Maximum rotational speed demand.
    ///
    /// Units: radians/second
    pub max_omega_rads: f64,

    /// Maximum change in the translational velocity vector per second.
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,

    /// Maximum change in rotational speed per second.
    ///
    /// Units: radians/second^2
    pub max_ang_accel_radss: f64,

    /// Thresholds under which the chassis is considered settled on target.
    pub settle: SettleThresholds,
}

/// The four bounds which must all hold at once for the controller to be
/// settled.
#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct SettleThresholds {
    /// Translational speed of the last demand.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Rotational speed of the last demand.
    ///
    /// Units: radians/second
    pub omega_rads: f64,

    /// Distance from the target position.
    ///
    /// Units: meters
    pub dist_m: f64,

    /// Absolute heading error to the target.
    ///
    /// Units: radians
    pub head_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check every parameter is within its sane range.
    pub fn validate(&self) -> Result<(), ParamsError> {
        check_gains("x_gains", &self.x_gains)?;
        check_gains("y_gains", &self.y_gains)?;
        check_gains("head_gains", &self.head_gains)?;

        check_positive("max_speed_ms", self.max_speed_ms)?;
        check_positive("max_omega_rads", self.max_omega_rads)?;
        check_positive("max_accel_mss", self.max_accel_mss)?;
        check_positive("max_ang_accel_radss", self.max_ang_accel_radss)?;

        check_non_negative("settle.speed_ms", self.settle.speed_ms)?;
        check_non_negative("settle.omega_rads", self.settle.omega_rads)?;
        check_non_negative("settle.dist_m", self.settle.dist_m)?;
        check_non_negative("settle.head_rad", self.settle.head_rad)?;

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            x_gains: PidGains::new(6.0, 0.0, 0.0),
            y_gains: PidGains::new(6.0, 0.0, 0.0),
            head_gains: PidGains::new(3.0, 0.0, 0.0),
            max_speed_ms: 4.5,
            max_omega_rads: 4.5,
            max_accel_mss: 14.5,
            max_ang_accel_radss: 9.0,
            settle: SettleThresholds {
                speed_ms: 0.05,
                omega_rads: 0.2,
                dist_m: 0.02,
                head_rad: 0.01,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert_eq!(Params::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut p = Params::default();
        p.max_speed_ms = -1.0;
        assert_eq!(p.validate(), Err(ParamsError::NotPositive("max_speed_ms", -1.0)));

        let mut p = Params::default();
        p.head_gains.k_d = -0.5;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidGains("head_gains", _))));

        let mut p = Params::default();
        p.settle.dist_m = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let p: Params = util::params::load_str(r#"
            max_speed_ms = 3.0
            max_omega_rads = 2.0
            max_accel_mss = 10.0
            max_ang_accel_radss = 6.0

            [x_gains]
            k_p = 5.0
            k_i = 0.0
            k_d = 0.1

            [y_gains]
            k_p = 5.0
            k_i = 0.0
            k_d = 0.1

            [head_gains]
            k_p = 2.0
            k_i = 0.0
            k_d = 0.0

            [settle]
            speed_ms = 0.05
            omega_rads = 0.2
            dist_m = 0.02
            head_rad = 0.01
        "#).unwrap();

        assert_eq!(p.max_speed_ms, 3.0);
        assert_eq!(p.x_gains, PidGains::new(5.0, 0.0, 0.1));
        assert!(p.validate().is_ok());
    }
}
