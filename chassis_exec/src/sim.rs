//! # Simulation module
//!
//! Stand-ins for the chassis hardware and the camera, so that the control
//! loop can be run closed loop without a robot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::drive::{ChassisVelocity, DriveActuator, Frame};
use crate::loc::{Pose, PoseProvider};
use crate::params::VisionWindow;
use crate::vision_track::{TargetObservation, VisionSource};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A perfect kinematic chassis.
///
/// Each demand written to the chassis is integrated over one cycle period,
/// and the chassis reports its true pose.
#[derive(Debug, Clone)]
pub struct SimChassis {
    pose: Pose,

    cycle_period: Duration,

    last_cmd: ChassisVelocity,

    /// Number of demands written so far.
    num_writes: u64,
}

/// A simulated chassis shared between the pose provider and actuator roles
/// of the control loop.
#[derive(Debug, Clone)]
pub struct SharedSim(Rc<RefCell<SimChassis>>);

/// Replays a schedule of target detections, one report per cycle.
#[derive(Debug, Clone)]
pub struct ScriptedVision {
    windows: Vec<VisionWindow>,

    /// Index of the next cycle to report.
    cycle: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimChassis {
    pub fn new(start: Pose, cycle_period: Duration) -> Self {
        Self {
            pose: start,
            cycle_period,
            last_cmd: ChassisVelocity::zero(Frame::Robot),
            num_writes: 0,
        }
    }

    pub fn last_cmd(&self) -> ChassisVelocity {
        self.last_cmd
    }

    pub fn num_writes(&self) -> u64 {
        self.num_writes
    }

    /// Current pose without counting as a sample.
    pub fn true_pose(&self) -> Pose {
        self.pose
    }
}

impl PoseProvider for SimChassis {
    fn pose(&mut self) -> Pose {
        self.pose
    }
}

impl DriveActuator for SimChassis {
    fn drive(&mut self, cmd: ChassisVelocity) {
        debug_assert_eq!(cmd.frame, Frame::Robot);

        let dt_s = self.cycle_period.as_secs_f64();
        let field = cmd.to_field(self.pose.heading());
        let position_m = self.pose.position_m + field.translation() * dt_s;

        self.pose = Pose::new(
            position_m[0],
            position_m[1],
            self.pose.heading() + field.omega_rads * dt_s,
        );
        self.last_cmd = cmd;
        self.num_writes += 1;
    }
}

impl SharedSim {
    pub fn new(sim: SimChassis) -> Self {
        Self(Rc::new(RefCell::new(sim)))
    }

    pub fn borrow(&self) -> Ref<SimChassis> {
        self.0.borrow()
    }
}

impl PoseProvider for SharedSim {
    fn pose(&mut self) -> Pose {
        self.0.borrow_mut().pose()
    }
}

impl DriveActuator for SharedSim {
    fn drive(&mut self, cmd: ChassisVelocity) {
        self.0.borrow_mut().drive(cmd)
    }
}

impl ScriptedVision {
    pub fn new(windows: Vec<VisionWindow>) -> Self {
        Self { windows, cycle: 0 }
    }

    /// Report a target at `bearing_deg` from `start_cycle` until (but not
    /// including) `end_cycle`.
    pub fn window(mut self, start_cycle: u64, end_cycle: u64, bearing_deg: f64) -> Self {
        self.windows.push(VisionWindow {
            start_cycle,
            end_cycle,
            bearing_deg,
        });
        self
    }
}

impl VisionSource for ScriptedVision {
    fn observe(&mut self) -> Option<TargetObservation> {
        let cycle = self.cycle;
        self.cycle += 1;

        let obs = self
            .windows
            .iter()
            .find(|w| cycle >= w.start_cycle && cycle < w.end_cycle)
            .map(|w| TargetObservation::seen(w.bearing_deg))
            .unwrap_or_else(TargetObservation::lost);

        Some(obs)
    }
}
