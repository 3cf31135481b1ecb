//! Vision tracking parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::filters::{DebounceConfig, DebounceEdge};
use crate::params::{check_gains, check_non_negative, check_positive, ParamsError};
use crate::pid::PidGains;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for vision tracking
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Heading controller gains, acting on the heading error in radians.
    pub head_gains: PidGains,

    /// Time the target's presence must be held before a change is accepted.
    ///
    /// Units: seconds
    pub hold_s: f64,

    /// Which change in presence the hold applies to.
    #[serde(default = "default_edge")]
    pub edge: DebounceEdge,

    /// Maximum magnitude of the rotational demand.
    ///
    /// Units: radians/second
    pub max_omega_rads: f64,

    /// Maximum rate of change of the rotational demand.
    ///
    /// Units: radians/second^2
    pub rate_limit_radss: f64,

    /// Heading error within which the chassis is considered aimed.
    ///
    /// Units: degrees
    pub aim_tolerance_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check every parameter is within its sane range.
    pub fn validate(&self) -> Result<(), ParamsError> {
        check_gains("head_gains", &self.head_gains)?;
        check_non_negative("hold_s", self.hold_s)?;
        check_positive("max_omega_rads", self.max_omega_rads)?;
        check_positive("rate_limit_radss", self.rate_limit_radss)?;
        check_non_negative("aim_tolerance_deg", self.aim_tolerance_deg)?;

        Ok(())
    }

    /// Build the configuration of the presence debounce filter.
    pub fn debounce_config(&self) -> Result<DebounceConfig, ParamsError> {
        let hold = util::time::seconds_to_duration(self.hold_s)
            .ok_or(ParamsError::Negative("hold_s", self.hold_s))?;

        Ok(DebounceConfig::new(self.edge, hold))
    }

    pub fn aim_tolerance_rad(&self) -> f64 {
        self.aim_tolerance_deg.to_radians()
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            // 0.16 per degree of error
            head_gains: PidGains::new(0.16f64.to_degrees(), 0.0, 0.0),
            hold_s: 0.2,
            edge: DebounceEdge::Falling,
            max_omega_rads: 4.5,
            rate_limit_radss: 8.0,
            aim_tolerance_deg: 5.0,
        }
    }
}

fn default_edge() -> DebounceEdge {
    DebounceEdge::Falling
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default() {
        let p = Params::default();
        assert_eq!(p.validate(), Ok(()));
        assert!((p.head_gains.k_p - 9.167).abs() < 1e-3);

        let cfg = p.debounce_config().unwrap();
        assert_eq!(cfg.falling_hold, Duration::from_millis(200));
        assert_eq!(cfg.rising_hold, Duration::default());
        assert!(!cfg.initial);
    }

    #[test]
    fn test_from_toml() {
        let p: Params = util::params::load_str(r#"
            hold_s = 0.1
            max_omega_rads = 3.0
            rate_limit_radss = 8.0
            aim_tolerance_deg = 3.0

            [head_gains]
            k_p = 9.0
            k_i = 0.0
            k_d = 0.0
        "#).unwrap();

        assert_eq!(p.edge, DebounceEdge::Falling);
        assert_eq!(p.max_omega_rads, 3.0);
        assert_eq!(p.debounce_config().unwrap().falling_hold, Duration::from_millis(100));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut p = Params::default();
        p.hold_s = -0.2;
        assert_eq!(p.validate(), Err(ParamsError::Negative("hold_s", -0.2)));

        let mut p = Params::default();
        p.rate_limit_radss = 0.0;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.max_omega_rads = 0.0;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.max_omega_rads = -1.0;
        assert!(p.validate().is_err());
    }
}
