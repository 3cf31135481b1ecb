//! Main chassis executable entry point.
//!
//! # Architecture
//!
//! The executable runs the control core closed loop against a simulated
//! chassis and camera:
//!
//!     - Initialise the session, logging and parameters
//!     - Activate pose control and/or vision tracking
//!     - Main loop:
//!         - Pose and camera acquisition
//!         - Behaviour processing
//!         - Single drivetrain write
//!         - Archiving
//!     - Stop the chassis and save a summary of the run
//!
//! An optional single argument names the executable parameter file to use
//! from the params directory, otherwise `chassis_exec.toml` is used.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, info, warn};
use serde::Serialize;
use std::env;
use std::thread;
use std::time::Instant;

// Internal
use chassis_lib::{
    driver::CycleDriver,
    loc::Pose,
    params::ChassisExecParams,
    pose_ctrl::{self, PoseCtrl},
    sim::{ScriptedVision, SharedSim, SimChassis},
    vision_track::{self, VisionTracker},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const DEFAULT_EXEC_PARAMS: &str = "chassis_exec.toml";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of the run, saved into the session directory on exit.
#[derive(Debug, Serialize)]
struct RunSummary {
    num_cycles: u64,

    /// Cycle on which pose control settled, if it did.
    settled_cycle: Option<u64>,

    start_pose: Pose,
    target_pose: Option<Pose>,
    final_pose: Pose,

    /// True if the loop was stopped by the cycle limit.
    cycle_limit_reached: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "chassis_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Chassis Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let exec_params_file = match args.len() {
        1 => DEFAULT_EXEC_PARAMS,
        2 => args[1].as_str(),
        n => return Err(eyre!("Expected either zero or one argument, found {}", n - 1)),
    };

    let exec_params: ChassisExecParams = util::params::load(exec_params_file)
        .wrap_err_with(|| format!("Could not load exec params from {}", exec_params_file))?;
    let pose_ctrl_params: pose_ctrl::Params = util::params::load("pose_ctrl.toml")
        .wrap_err("Could not load pose control params")?;
    let vision_params: vision_track::Params = util::params::load("vision_track.toml")
        .wrap_err("Could not load vision tracking params")?;

    let cycle_period = exec_params.cycle_period()
        .wrap_err("Invalid cycle period")?;

    info!("Parameters loaded");

    // ---- INITIALISE MODULES ----

    let start_pose = exec_params.start_pose();
    let sim = SharedSim::new(SimChassis::new(start_pose, cycle_period));
    let vision = ScriptedVision::new(exec_params.vision.clone());

    let mut driver = CycleDriver::new(sim.clone(), vision, sim.clone(), cycle_period);

    let mut target_pose = None;
    if let Some(target) = exec_params.pose_target() {
        let ctrl = PoseCtrl::new(pose_ctrl_params, cycle_period, target)
            .wrap_err("Failed to initialise PoseCtrl")?;
        driver.start_pose_ctrl(ctrl);
        target_pose = driver.pose_ctrl().and_then(|c| c.target_pose());
        info!("PoseCtrl init complete");
    }

    if exec_params.track_vision {
        let tracker = VisionTracker::new(vision_params, cycle_period)
            .wrap_err("Failed to initialise VisionTracker")?;
        driver.start_tracking(tracker);
        info!("VisionTracker init complete");
    }

    if driver.is_idle() {
        return Err(eyre!("No behaviours are configured, nothing to do"));
    }

    let mut archiver = Archiver::from_path(&session, "cycles.csv")
        .wrap_err("Failed to create the cycle archive")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut settled_cycle = None;

    while driver.num_cycles() < exec_params.max_cycles {
        let cycle_start_instant = Instant::now();

        let report = driver.cycle();

        if report.settled {
            settled_cycle = Some(report.cycle);
        }

        if let Err(e) = archiver.serialise(report) {
            warn!("Could not archive cycle {}: {}", report.cycle, e);
        }

        // The run is over once pose control settles, any tracker is
        // cancelled with it
        if report.settled || driver.is_idle() {
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        if !exec_params.realtime {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }
    }

    // ---- SHUTDOWN ----

    let cycle_limit_reached =
        settled_cycle.is_none() && driver.num_cycles() >= exec_params.max_cycles;
    if cycle_limit_reached {
        warn!("Cycle limit of {} reached", exec_params.max_cycles);
    }

    if !driver.is_idle() {
        info!("Cancelling active behaviours");
        driver.cancel();
    }

    let summary = RunSummary {
        num_cycles: driver.num_cycles(),
        settled_cycle,
        start_pose,
        target_pose,
        final_pose: sim.borrow().true_pose(),
        cycle_limit_reached,
    };

    info!("Run summary: {:#?}", summary);

    session.save("summary.json", &summary)
        .wrap_err("Failed to save the run summary")?;

    info!("End of execution");

    Ok(())
}
