//! # Vision tracking module
//!
//! The vision tracker turns the chassis to face a target seen by the camera.
//! Each cycle the camera may report a bearing offset to the target relative
//! to the chassis heading. The offset is converted into an absolute target
//! heading, whose presence is debounced so that short dropouts in detection
//! do not make the chassis stop turning. While a target heading is known a
//! single PID loop drives the heading error to zero.
//!
//! The resulting rotational rate is rate limited so that acquiring or losing
//! a target never steps the demand. The tracker only ever commands rotation,
//! any translation comes from a behaviour running alongside it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use thiserror::Error;

// Internal
use crate::params::ParamsError;
pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single camera report.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Default)]
pub struct TargetObservation {
    /// True if the camera reports a target detection.
    pub present: bool,

    /// Bearing of the target relative to the chassis heading, counter-clockwise
    /// positive.
    ///
    /// Units: degrees
    pub bearing_offset_deg: Option<f64>,
}

/// A source of camera reports, sampled once per cycle.
pub trait VisionSource {
    /// Get this cycle's report, or `None` if the camera has nothing to say.
    fn observe(&mut self) -> Option<TargetObservation>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur in vision tracking.
#[derive(Debug, Error)]
pub enum VisionTrackError {
    #[error("Invalid vision tracking parameters: {0}")]
    InvalidParams(#[from] ParamsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TargetObservation {
    /// A report of a target at the given bearing.
    pub fn seen(bearing_offset_deg: f64) -> Self {
        Self {
            present: true,
            bearing_offset_deg: Some(bearing_offset_deg),
        }
    }

    /// A report of no target.
    pub fn lost() -> Self {
        Self::default()
    }

    /// The bearing if this is a usable detection.
    ///
    /// Reports flagged present without a finite bearing are not usable.
    pub fn bearing_deg(&self) -> Option<f64> {
        match self.bearing_offset_deg {
            Some(b) if self.present && b.is_finite() => Some(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_observation_validity() {
        assert_eq!(TargetObservation::seen(-4.0).bearing_deg(), Some(-4.0));
        assert_eq!(TargetObservation::lost().bearing_deg(), None);

        let no_bearing = TargetObservation { present: true, bearing_offset_deg: None };
        assert_eq!(no_bearing.bearing_deg(), None);

        let nan = TargetObservation::seen(f64::NAN);
        assert_eq!(nan.bearing_deg(), None);

        let stale = TargetObservation { present: false, bearing_offset_deg: Some(3.0) };
        assert_eq!(stale.bearing_deg(), None);
    }
}
