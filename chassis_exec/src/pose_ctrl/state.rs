//! Pose control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::time::Duration;

// Internal
use super::*;
use crate::drive::{ChassisVelocity, Frame};
use crate::loc::Pose;
use crate::params::check_period;
use util::module::Command;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drives the chassis onto a target pose.
///
/// Each cycle the field frame error to the target is passed through three
/// independent PID loops, the resulting field relative demand is constrained
/// to the chassis limits, and finally expressed in the robot frame for the
/// drivetrain.
pub struct PoseCtrl {
    params: Params,

    cycle_period: Duration,

    /// The commanded target, resolved into `target_pose` on activation.
    target: PoseTarget,

    /// The target pose of the current activation, `None` when inactive.
    target_pose: Option<Pose>,

    /// Controller objects used to calculate the raw demand
    controllers: PoseControllers,

    constraints: VelocityConstraints,

    /// The robot relative demand output on the last cycle.
    last_cmd: ChassisVelocity,

    report: StatusReport,
}

/// The status report containing various limit flags and monitoring quantities.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Distance to the target position
    pub dist_error_m: f64,

    /// Heading error to the target
    pub head_error_rad: f64,

    /// Speed of the demand before constraints were applied
    pub raw_speed_ms: f64,

    /// Rotational speed of the demand before constraints were applied
    pub raw_omega_rads: f64,

    /// Limits active on this cycle
    pub limits: ConstraintFlags,

    /// True if all settle thresholds were met after this cycle
    pub settled: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseCtrl {
    /// Create a new pose controller.
    ///
    /// Fails if any parameter is outside of its sane range or the cycle
    /// period is zero.
    pub fn new(
        params: Params,
        cycle_period: Duration,
        target: PoseTarget,
    ) -> Result<Self, PoseCtrlError> {
        params.validate()?;
        check_period(cycle_period)?;

        let controllers = PoseControllers::new(&params);
        let constraints = VelocityConstraints::new(
            params.max_speed_ms,
            params.max_omega_rads,
            params.max_accel_mss,
            params.max_ang_accel_radss,
        );

        Ok(Self {
            params,
            cycle_period,
            target,
            target_pose: None,
            controllers,
            constraints,
            last_cmd: ChassisVelocity::zero(Frame::Robot),
            report: StatusReport::default(),
        })
    }

    /// The target pose of the current activation.
    pub fn target_pose(&self) -> Option<Pose> {
        self.target_pose
    }

    /// The robot relative demand output on the last cycle.
    pub fn last_cmd(&self) -> ChassisVelocity {
        self.last_cmd
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Calculate the robot relative demand for this cycle.
    ///
    /// If the controller has not been initialised a stop is returned.
    pub fn step(&mut self, current: &Pose) -> ChassisVelocity {
        self.report = StatusReport::default();

        let target = match self.target_pose {
            Some(t) => t,
            None => {
                warn!("PoseCtrl stepped before initialisation, commanding stop");
                self.last_cmd = ChassisVelocity::zero(Frame::Robot);
                return self.last_cmd;
            }
        };

        let error = current.error_to(&target);
        self.report.dist_error_m = error.distance_m();
        self.report.head_error_rad = error.dhead_rad;

        let raw = self.controllers.get_field_cmd(&error, self.cycle_period);
        self.report.raw_speed_ms = raw.speed_ms();
        self.report.raw_omega_rads = raw.omega_rads;

        let (constrained, limits) = self.constraints.apply(&raw, self.cycle_period);
        self.report.limits = limits;

        self.last_cmd = constrained.to_robot(current.heading());
        self.report.settled = self.is_settled(current);

        trace!(
            "PoseCtrl err: {:.4} m, {:.4} rad, cmd: {:?}",
            self.report.dist_error_m,
            self.report.head_error_rad,
            self.last_cmd
        );

        self.last_cmd
    }

    /// True if the chassis is settled on the target of the current
    /// activation.
    ///
    /// Speeds are taken from the last commanded demand rather than a
    /// measurement.
    pub fn is_settled(&self, current: &Pose) -> bool {
        match self.target_pose {
            Some(target) => self.params.settle.is_settled(&self.last_cmd, current, &target),
            None => false,
        }
    }
}

impl SettleThresholds {
    /// True only if all four thresholds hold simultaneously.
    pub fn is_settled(
        &self,
        last_cmd: &ChassisVelocity,
        current: &Pose,
        target: &Pose,
    ) -> bool {
        let error = current.error_to(target);

        last_cmd.speed_ms() < self.speed_ms
            && last_cmd.omega_rads.abs() < self.omega_rads
            && error.distance_m() < self.dist_m
            && error.dhead_rad.abs() < self.head_rad
    }
}

impl Command for PoseCtrl {
    type InputData = Pose;
    type OutputData = ChassisVelocity;

    /// Resolve the target against the current pose and reset all loop,
    /// constraint and demand memory.
    fn initialize(&mut self, input_data: &Pose) {
        let target_pose = self.target.resolve(input_data);

        self.controllers.reset();
        self.constraints.reset();
        self.last_cmd = ChassisVelocity::zero(Frame::Robot);
        self.report = StatusReport::default();
        self.target_pose = Some(target_pose);

        info!(
            "PoseCtrl initialised: ({:.3}, {:.3}, {:.3}) -> ({:.3}, {:.3}, {:.3})",
            input_data.x(),
            input_data.y(),
            input_data.heading(),
            target_pose.x(),
            target_pose.y(),
            target_pose.heading()
        );
    }

    fn execute(&mut self, input_data: &Pose) -> ChassisVelocity {
        self.step(input_data)
    }

    fn is_finished(&self, input_data: &Pose) -> bool {
        self.is_settled(input_data)
    }

    fn end(&mut self, interrupted: bool) -> ChassisVelocity {
        if interrupted {
            info!("PoseCtrl cancelled before settling");
        }
        else {
            debug!("PoseCtrl settled");
        }

        self.target_pose = None;
        self.constraints.reset();
        self.last_cmd = ChassisVelocity::zero(Frame::Robot);
        self.last_cmd
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive::DriveActuator;
    use crate::loc::{PoseProvider, Transform};
    use crate::sim::SimChassis;
    use std::f64::consts::FRAC_PI_2;

    const DT: Duration = Duration::from_millis(20);

    fn scenario_params() -> Params {
        let mut p = Params::default();
        p.x_gains = crate::pid::PidGains::new(6.0, 0.0, 0.0);
        p.y_gains = crate::pid::PidGains::new(6.0, 0.0, 0.0);
        p.max_speed_ms = 4.5;
        p
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut p = Params::default();
        p.max_accel_mss = -14.5;

        let r = PoseCtrl::new(p, DT, PoseTarget::Absolute(Pose::default()));
        assert!(matches!(r, Err(PoseCtrlError::InvalidParams(_))));

        let r = PoseCtrl::new(Params::default(), Duration::default(), PoseTarget::Absolute(Pose::default()));
        assert!(r.is_err());
    }

    #[test]
    fn test_step_before_init_stops() {
        let mut ctrl = PoseCtrl::new(
            Params::default(), DT, PoseTarget::Absolute(Pose::new(1.0, 0.0, 0.0))
        ).unwrap();

        assert!(ctrl.step(&Pose::default()).is_stopped());
        assert!(!ctrl.is_settled(&Pose::default()));
    }

    #[test]
    fn test_converges_to_target() {
        let target = Pose::from_degrees(1.0, 0.0, 0.0);
        let mut ctrl = PoseCtrl::new(scenario_params(), DT, PoseTarget::Absolute(target)).unwrap();
        let mut sim = SimChassis::new(Pose::from_degrees(0.0, 0.0, 0.0), DT);

        ctrl.initialize(&sim.pose());

        let mut vxs = Vec::new();
        let mut settled_cycle = None;

        for cycle in 0..200 {
            let pose = sim.pose();
            let cmd = ctrl.step(&pose);
            sim.drive(cmd);
            vxs.push(cmd.vx_ms);

            if ctrl.is_settled(&sim.pose()) {
                settled_cycle = Some(cycle);
                break;
            }
        }

        let settled_cycle = settled_cycle.expect("controller never settled");
        assert!(settled_cycle < 100, "settled too slowly ({} cycles)", settled_cycle);

        // Always driving toward the target, ramping up then decaying
        assert!(vxs.iter().all(|v| *v > 0.0));
        let peak = vxs
            .iter()
            .enumerate()
            .fold(0, |best, (i, v)| if *v > vxs[best] { i } else { best });
        for w in vxs[peak..].windows(2) {
            assert!(w[1] <= w[0] + 1e-12, "vx not decaying: {:?}", w);
        }

        let end = sim.pose();
        assert!((end.x() - 1.0).abs() < 0.02);
        assert!(end.y().abs() < 1e-9);
    }

    #[test]
    fn test_converges_from_rotated_start() {
        let target = Pose::new(-0.5, 0.75, -FRAC_PI_2);
        let mut ctrl = PoseCtrl::new(Params::default(), DT, PoseTarget::Absolute(target)).unwrap();
        let mut sim = SimChassis::new(Pose::new(0.2, -0.3, 2.5), DT);

        ctrl.initialize(&sim.pose());

        let mut settled = false;
        for _ in 0..500 {
            let cmd = ctrl.step(&sim.pose());
            sim.drive(cmd);
            if ctrl.is_settled(&sim.pose()) {
                settled = true;
                break;
            }
        }

        assert!(settled);
        let e = sim.pose().error_to(&target);
        assert!(e.distance_m() < 0.02);
        assert!(e.dhead_rad.abs() < 0.01);
    }

    #[test]
    fn test_relative_target_resolved_on_init() {
        let start = Pose::new(1.0, 1.0, FRAC_PI_2);
        let mut ctrl = PoseCtrl::new(
            Params::default(),
            DT,
            PoseTarget::Relative(Transform::new(2.0, 0.0, FRAC_PI_2)),
        ).unwrap();

        ctrl.initialize(&start);
        let t = ctrl.target_pose().unwrap();

        assert!((t.x() - 1.0).abs() < 1e-9);
        assert!((t.y() - 3.0).abs() < 1e-9);

        // Re-activating from elsewhere resolves against the new pose
        ctrl.end(true);
        ctrl.initialize(&Pose::default());
        let t = ctrl.target_pose().unwrap();
        assert!((t.x() - 2.0).abs() < 1e-9);
        assert!(t.y().abs() < 1e-9);
    }

    #[test]
    fn test_output_is_robot_relative() {
        // Facing +Y with the target straight ahead in the field frame means
        // the robot frame demand is along +X
        let mut ctrl = PoseCtrl::new(
            Params::default(), DT, PoseTarget::Absolute(Pose::new(0.0, 1.0, FRAC_PI_2))
        ).unwrap();
        let pose = Pose::new(0.0, 0.0, FRAC_PI_2);

        ctrl.initialize(&pose);
        let cmd = ctrl.step(&pose);

        assert_eq!(cmd.frame, Frame::Robot);
        assert!(cmd.vx_ms > 0.0);
        assert!(cmd.vy_ms.abs() < 1e-9);
    }

    #[test]
    fn test_settle_needs_all_four() {
        let t = Params::default().settle;
        let target = Pose::new(1.0, 0.0, 0.0);
        let on_target = Pose::new(1.0, 0.0, 0.0);

        // All within bounds
        assert!(t.is_settled(&ChassisVelocity::robot(0.01, 0.0, 0.05), &on_target, &target));

        // Position within bound but still turning
        assert!(!t.is_settled(&ChassisVelocity::robot(0.0, 0.0, 0.5), &on_target, &target));

        // Slow demand but far away
        assert!(!t.is_settled(&ChassisVelocity::robot(0.0, 0.0, 0.0), &Pose::new(0.5, 0.0, 0.0), &target));

        // Translating too fast
        assert!(!t.is_settled(&ChassisVelocity::robot(0.0, 0.1, 0.0), &on_target, &target));

        // Heading off
        assert!(!t.is_settled(&ChassisVelocity::robot(0.0, 0.0, 0.0), &Pose::new(1.0, 0.0, 0.05), &target));
    }

    #[test]
    fn test_end_commands_stop() {
        let mut ctrl = PoseCtrl::new(
            Params::default(), DT, PoseTarget::Absolute(Pose::new(3.0, 0.0, 0.0))
        ).unwrap();
        ctrl.initialize(&Pose::default());
        assert!(!ctrl.step(&Pose::default()).is_stopped());

        assert!(ctrl.end(true).is_stopped());
        assert!(ctrl.last_cmd().is_stopped());
        assert_eq!(ctrl.target_pose(), None);
    }
}
