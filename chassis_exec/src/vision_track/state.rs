//! Vision tracking module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use serde::Serialize;
use std::time::Duration;

// Internal
use super::*;
use crate::drive::{ChassisVelocity, Frame};
use crate::filters::{OptionalDebounce, RateLimiter};
use crate::params::check_period;
use crate::pid::PidController;
use util::{maths::{ang_dist, clamp_abs, wrap_pi}, module::Command};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Turns the chassis to face a target reported by the camera.
pub struct VisionTracker {
    params: Params,

    cycle_period: Duration,

    /// Time since activation of the next sample.
    elapsed: Duration,

    /// Debounced absolute target heading.
    target: OptionalDebounce,

    head_ctrl: PidController,

    rate_limiter: RateLimiter,

    /// Heading error on the last cycle, `None` if there was no target.
    last_error_rad: Option<f64>,

    report: StatusReport,
}

/// The data sampled each cycle for the tracker.
#[derive(Debug, Copy, Clone, Default)]
pub struct TrackerInput {
    /// Chassis heading in the field frame.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// This cycle's camera report, if any.
    pub observation: Option<TargetObservation>,
}

/// Monitoring quantities of the tracker.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct StatusReport {
    /// True if the camera provided a usable detection this cycle.
    pub raw_present: bool,

    /// Debounced presence of the target.
    pub target_present: bool,

    /// Filtered target heading, if there is a target.
    pub target_heading_rad: Option<f64>,

    /// Rotational demand before rate limiting, saturated to the maximum.
    pub raw_omega_rads: f64,

    /// Rotational demand output.
    pub omega_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VisionTracker {
    /// Create a new tracker.
    pub fn new(params: Params, cycle_period: Duration) -> Result<Self, VisionTrackError> {
        params.validate()?;
        check_period(cycle_period)?;

        let target = OptionalDebounce::new(params.debounce_config()?);
        let head_ctrl = PidController::new(params.head_gains);
        let rate_limiter = RateLimiter::new(params.rate_limit_radss);

        Ok(Self {
            params,
            cycle_period,
            elapsed: Duration::default(),
            target,
            head_ctrl,
            rate_limiter,
            last_error_rad: None,
            report: StatusReport::default(),
        })
    }

    /// Calculate the rotational demand for this cycle.
    ///
    /// The returned demand is robot relative with zero translation.
    pub fn step(&mut self, input: &TrackerInput) -> ChassisVelocity {
        let now = self.elapsed;
        self.elapsed += self.cycle_period;

        let sample = input
            .observation
            .and_then(|o| o.bearing_deg())
            .map(|b| wrap_pi(input.heading_rad + b.to_radians()));

        let was_present = self.target.is_present();
        let target = self.target.update(sample, now);

        if self.target.is_present() != was_present {
            debug!(
                "Vision target {} at {:.3} s",
                if was_present { "lost" } else { "acquired" },
                now.as_secs_f64()
            );
        }

        let raw_omega_rads = match target {
            Some(t) => {
                let err = ang_dist(input.heading_rad, t);
                self.last_error_rad = Some(err);
                clamp_abs(
                    self.head_ctrl.get(err, self.cycle_period),
                    self.params.max_omega_rads
                )
            }
            None => {
                self.last_error_rad = None;
                self.head_ctrl.reset();
                0.0
            }
        };

        let omega_rads = self.rate_limiter.calculate(raw_omega_rads, self.cycle_period);

        self.report = StatusReport {
            raw_present: sample.is_some(),
            target_present: target.is_some(),
            target_heading_rad: target,
            raw_omega_rads,
            omega_rads,
        };

        trace!("VisionTracker: {:?}", self.report);

        ChassisVelocity::robot(0.0, 0.0, omega_rads)
    }

    /// True if there is a target and the heading error to it is within the
    /// aim tolerance.
    pub fn is_aimed(&self) -> bool {
        match self.last_error_rad {
            Some(e) => e.abs() <= self.params.aim_tolerance_rad(),
            None => false,
        }
    }

    /// Debounced presence of the target.
    pub fn has_target(&self) -> bool {
        self.target.is_present()
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }
}

impl Command for VisionTracker {
    type InputData = TrackerInput;
    type OutputData = ChassisVelocity;

    fn initialize(&mut self, _input_data: &TrackerInput) {
        self.elapsed = Duration::default();
        self.target.reset();
        self.head_ctrl.reset();
        self.rate_limiter.reset(0.0);
        self.last_error_rad = None;
        self.report = StatusReport::default();

        info!("VisionTracker initialised");
    }

    fn execute(&mut self, input_data: &TrackerInput) -> ChassisVelocity {
        self.step(input_data)
    }

    /// Tracking continues until cancelled.
    fn is_finished(&self, _input_data: &TrackerInput) -> bool {
        false
    }

    fn end(&mut self, interrupted: bool) -> ChassisVelocity {
        info!("VisionTracker ended (interrupted: {})", interrupted);

        self.rate_limiter.reset(0.0);
        self.last_error_rad = None;
        ChassisVelocity::zero(Frame::Robot)
    }
}
