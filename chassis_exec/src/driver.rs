//! # Cycle driver
//!
//! Runs the active behaviours once per control cycle. Within a cycle the
//! pose and camera are sampled first, then each active behaviour is stepped
//! with those samples, and finally their demands are combined into the
//! single actuator write of the cycle.
//!
//! When both behaviours are active the translation comes from pose control
//! and the rotation from the vision tracker. Whenever the driver releases the
//! actuator it writes a stop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, trace};
use serde::Serialize;
use std::time::Duration;

use crate::drive::{ChassisVelocity, DriveActuator, Frame};
use crate::loc::PoseProvider;
use crate::pose_ctrl::PoseCtrl;
use crate::vision_track::{TrackerInput, VisionSource, VisionTracker};
use util::module::Command;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Owns the collaborators of the control loop and the active behaviours.
pub struct CycleDriver<P, V, A> {
    pose_src: P,
    vision_src: V,
    actuator: A,

    cycle_period: Duration,

    /// Number of cycles run so far.
    num_cycles: u64,

    /// The active pose controller, if any.
    pose_ctrl: Option<PoseCtrl>,

    /// The active vision tracker, if any.
    tracker: Option<VisionTracker>,
}

/// Summary of one cycle, flat so it can be archived as a CSV row.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub time_s: f64,

    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,

    pub vx_ms: f64,
    pub vy_ms: f64,
    pub omega_rads: f64,

    /// Pose control was active at the start of the cycle.
    pub pose_active: bool,

    /// Pose control settled on this cycle.
    pub settled: bool,

    pub tracking: bool,
    pub target_present: bool,
    pub aimed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<P, V, A> CycleDriver<P, V, A>
where
    P: PoseProvider,
    V: VisionSource,
    A: DriveActuator,
{
    pub fn new(pose_src: P, vision_src: V, actuator: A, cycle_period: Duration) -> Self {
        Self {
            pose_src,
            vision_src,
            actuator,
            cycle_period,
            num_cycles: 0,
            pose_ctrl: None,
            tracker: None,
        }
    }

    /// Activate pose control from the current pose, replacing any active
    /// pose controller.
    pub fn start_pose_ctrl(&mut self, mut ctrl: PoseCtrl) {
        if let Some(mut old) = self.pose_ctrl.take() {
            old.end(true);
        }

        let pose = self.pose_src.pose();
        ctrl.initialize(&pose);
        self.pose_ctrl = Some(ctrl);
    }

    /// Activate vision tracking, replacing any active tracker.
    pub fn start_tracking(&mut self, mut tracker: VisionTracker) {
        if let Some(mut old) = self.tracker.take() {
            old.end(true);
        }

        let input = TrackerInput {
            heading_rad: self.pose_src.pose().heading(),
            observation: None,
        };
        tracker.initialize(&input);
        self.tracker = Some(tracker);
    }

    /// Run one control cycle, writing the actuator exactly once.
    pub fn cycle(&mut self) -> CycleReport {
        let pose = self.pose_src.pose();
        let observation = self.vision_src.observe();

        let mut report = CycleReport {
            cycle: self.num_cycles,
            time_s: self.cycle_period.as_secs_f64() * self.num_cycles as f64,
            x_m: pose.x(),
            y_m: pose.y(),
            heading_rad: pose.heading(),
            pose_active: self.pose_ctrl.is_some(),
            tracking: self.tracker.is_some(),
            ..Default::default()
        };

        let mut translation = match self.pose_ctrl.as_mut() {
            Some(ctrl) => ctrl.execute(&pose),
            None => ChassisVelocity::zero(Frame::Robot),
        };

        let rotation = match self.tracker.as_mut() {
            Some(tracker) => {
                let rotation = tracker.execute(&TrackerInput {
                    heading_rad: pose.heading(),
                    observation,
                });

                report.target_present = tracker.has_target();
                report.aimed = tracker.is_aimed();
                Some(rotation)
            }
            None => None,
        };

        let settled = self
            .pose_ctrl
            .as_ref()
            .map(|c| c.is_finished(&pose))
            .unwrap_or(false);

        if settled {
            if let Some(mut ctrl) = self.pose_ctrl.take() {
                translation = ctrl.end(false);
                info!("Pose control settled after {} cycles", self.num_cycles + 1);
            }
        }

        let cmd = match rotation {
            Some(r) => ChassisVelocity::compose(&translation, &r),
            None => translation,
        };

        self.actuator.drive(cmd);

        report.settled = settled;
        report.vx_ms = cmd.vx_ms;
        report.vy_ms = cmd.vy_ms;
        report.omega_rads = cmd.omega_rads;

        trace!("Cycle {}: {:?}", self.num_cycles, cmd);

        self.num_cycles += 1;
        report
    }

    /// Deactivate all behaviours and stop the chassis.
    pub fn cancel(&mut self) {
        if let Some(mut ctrl) = self.pose_ctrl.take() {
            ctrl.end(true);
        }
        if let Some(mut tracker) = self.tracker.take() {
            tracker.end(true);
        }

        self.actuator.stop();
    }

    /// True if no behaviour is active.
    pub fn is_idle(&self) -> bool {
        self.pose_ctrl.is_none() && self.tracker.is_none()
    }

    pub fn pose_ctrl(&self) -> Option<&PoseCtrl> {
        self.pose_ctrl.as_ref()
    }

    pub fn tracker(&self) -> Option<&VisionTracker> {
        self.tracker.as_ref()
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loc::Pose;
    use crate::pose_ctrl::{self, PoseTarget};
    use crate::sim::{ScriptedVision, SharedSim, SimChassis};
    use crate::vision_track;

    const DT: Duration = Duration::from_millis(20);

    fn driver(
        start: Pose,
        vision: ScriptedVision,
    ) -> (CycleDriver<SharedSim, ScriptedVision, SharedSim>, SharedSim) {
        let sim = SharedSim::new(SimChassis::new(start, DT));
        let d = CycleDriver::new(sim.clone(), vision, sim.clone(), DT);
        (d, sim)
    }

    fn tracker(hold_s: f64) -> VisionTracker {
        let mut p = vision_track::Params::default();
        p.hold_s = hold_s;
        VisionTracker::new(p, DT).unwrap()
    }

    #[test]
    fn test_drive_to_pose() {
        let (mut d, sim) = driver(Pose::default(), ScriptedVision::new(Vec::new()));
        let target = Pose::new(1.0, 0.0, 0.0);

        d.start_pose_ctrl(
            PoseCtrl::new(pose_ctrl::Params::default(), DT, PoseTarget::Absolute(target)).unwrap()
        );

        let mut settled = false;
        while d.num_cycles() < 100 {
            let r = d.cycle();
            if r.settled {
                settled = true;
                break;
            }
        }

        assert!(settled);
        assert!(d.is_idle());

        // One write per cycle, the last being the stop
        let sim = sim.borrow();
        assert_eq!(sim.num_writes(), d.num_cycles());
        assert!(sim.last_cmd().is_stopped());
        assert!(sim.true_pose().error_to(&target).distance_m() < 0.02);
    }

    #[test]
    fn test_cancel_stops() {
        let (mut d, sim) = driver(Pose::default(), ScriptedVision::new(Vec::new()));
        d.start_pose_ctrl(
            PoseCtrl::new(
                pose_ctrl::Params::default(),
                DT,
                PoseTarget::Absolute(Pose::new(5.0, 5.0, 1.0)),
            ).unwrap()
        );

        for _ in 0..5 {
            d.cycle();
        }
        assert!(!sim.borrow().last_cmd().is_stopped());

        d.cancel();
        assert!(d.is_idle());
        assert!(sim.borrow().last_cmd().is_stopped());
        assert_eq!(sim.borrow().num_writes(), 6);

        // Idle cycles keep the chassis stopped
        d.cycle();
        assert!(sim.borrow().last_cmd().is_stopped());
    }

    #[test]
    fn test_compose_translate_and_aim() {
        let vision = ScriptedVision::new(Vec::new()).window(0, 100, 10.0);
        let (mut d, _sim) = driver(Pose::default(), vision);

        d.start_pose_ctrl(
            PoseCtrl::new(
                pose_ctrl::Params::default(),
                DT,
                PoseTarget::Absolute(Pose::new(2.0, 0.0, 0.0)),
            ).unwrap()
        );
        d.start_tracking(tracker(0.2));

        let r = d.cycle();

        // Translation from pose control, rotation from the tracker
        assert!(r.vx_ms > 0.0);
        assert!((r.omega_rads - 0.16).abs() < 1e-9);
        assert!(r.target_present);

        let tracker_omega = d.tracker().map(|t| t.report().omega_rads);
        let r = d.cycle();
        assert_eq!(Some(r.omega_rads), d.tracker().map(|t| t.report().omega_rads));
        assert!(tracker_omega.unwrap() < r.omega_rads);
    }

    #[test]
    fn test_tracker_rotation_within_max() {
        let vision = ScriptedVision::new(Vec::new()).window(0, 200, 90.0);
        let (mut d, sim) = driver(Pose::default(), vision);

        d.start_tracking(tracker(0.2));

        for c in 0..150 {
            let r = d.cycle();
            assert!(r.omega_rads.abs() <= 4.5 + 1e-9, "cycle {}", c);
        }
        assert!((sim.borrow().last_cmd().omega_rads - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_vision_loss_within_hold() {
        // Present for 10 cycles, absent for 3, then present again
        let vision = ScriptedVision::new(Vec::new())
            .window(0, 10, 10.0)
            .window(13, 30, 10.0);
        let (mut d, _sim) = driver(Pose::default(), vision);

        d.start_tracking(tracker(0.1));

        for c in 0..20 {
            let r = d.cycle();
            assert!(r.target_present, "cycle {}", c);
            assert!(r.omega_rads > 0.0, "cycle {}", c);
            assert_eq!(r.vx_ms, 0.0);
            assert_eq!(r.vy_ms, 0.0);
        }
    }

    #[test]
    fn test_vision_loss_beyond_hold() {
        let vision = ScriptedVision::new(Vec::new()).window(0, 10, 10.0);
        let (mut d, _sim) = driver(Pose::default(), vision);

        d.start_tracking(tracker(0.1));

        let mut prev = 0.0;
        for c in 0..40 {
            let r = d.cycle();

            // Lost on the sixth absent cycle
            assert_eq!(r.target_present, c < 15, "cycle {}", c);
            assert!((r.omega_rads - prev).abs() <= 0.16 + 1e-9, "cycle {}", c);
            prev = r.omega_rads;
        }

        assert_eq!(prev, 0.0);
    }
}
