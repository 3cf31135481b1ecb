//! Module interfaces
//!
//! Every closed-loop behaviour in `chassis_exec` shall implement the
//! `Command` trait so that a cycle driver can activate, step and release it
//! in the same way.

// ---------------------------------------------------------------------------
// COMMAND LIFECYCLE
// ---------------------------------------------------------------------------

/// A cyclic command, invoked once per control period while it is active.
///
/// The lifecycle of an activation is:
///
/// 1. `initialize` once, before the first `execute`.
/// 2. `execute` once per cycle, with that cycle's fresh input.
/// 3. `end` once, either because `is_finished` returned true or because the
///    driver cancelled the command. The output of `end` is the stop demand
///    the driver must write before relinquishing the actuator.
///
/// A later activation must start again from `initialize`.
pub trait Command {
    /// Data sampled once per cycle and given to the command.
    type InputData;

    /// Demand produced by the command each cycle.
    type OutputData;

    /// Start a new activation, resetting all internal filter and loop state.
    fn initialize(&mut self, input_data: &Self::InputData);

    /// Main cyclic processing function.
    fn execute(&mut self, input_data: &Self::InputData) -> Self::OutputData;

    /// Returns true once the command has achieved its goal.
    fn is_finished(&self, input_data: &Self::InputData) -> bool;

    /// Finish the activation and return the demand to leave the actuator
    /// in.
    fn end(&mut self, interrupted: bool) -> Self::OutputData;
}
