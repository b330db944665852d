//! Agent loop: the turn-based orchestration state machine.

mod outcome;
mod runner;

pub use outcome::{RunError, RunOutcome};
pub use runner::{AgentRunner, CancelFlag};
