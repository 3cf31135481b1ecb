//! # Chassis library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the chassis crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drive module - chassis velocity demands and the drivetrain interface
pub mod drive;

/// Cycle driver - runs the active behaviours once per control cycle
pub mod driver;

/// Temporal filters - debouncing and rate limiting
pub mod filters;

/// Localisation module - the chassis pose and the pose provider interface
pub mod loc;

/// Executable parameters and shared parameter validation
pub mod params;

/// PID controller
pub mod pid;

/// Pose control module - drives the chassis onto a target pose
pub mod pose_ctrl;

/// Simulation - a kinematic chassis and scripted camera
pub mod sim;

/// Vision tracking module - turns the chassis to face a camera target
pub mod vision_track;
