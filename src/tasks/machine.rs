//! Common execution contract shared by every task variant

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::TaskConfig;
use crate::core::types::{AgentView, Seconds};
use crate::tasks::goal::Goal;
use crate::world::{CommandBuffer, WorldFacade};

/// Why a task failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailReason {
    /// No complete path to the destination
    Unreachable,
    /// The entity the goal refers to is gone or was never given
    TargetMissing,
    InventoryFull,
    /// The host rejected the inventory operation
    OperationFailed,
}

/// Terminal state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    Succeeded,
    Failed(FailReason),
    /// Overall budget or an operation safety timeout elapsed
    TimedOut,
    /// Navigation stopped making progress
    Stuck,
    Cancelled,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded)
    }
}

/// Per-tick inputs of a task
pub struct TaskContext<'a> {
    pub agent: AgentView,
    pub world: &'a dyn WorldFacade,
    pub commands: &'a mut CommandBuffer,
    pub config: &'a TaskConfig,
    pub rng: &'a mut ChaCha8Rng,
    pub now: Seconds,
}

/// Uniform lifecycle of a resumable task state machine.
///
/// `start` resets every field, so a task can be started, stopped and started
/// again any number of times.
pub trait TaskMachine {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext);

    fn update(&mut self, ctx: &mut TaskContext);

    fn stop(&mut self, ctx: &mut TaskContext);

    fn outcome(&self) -> Option<TaskOutcome>;

    fn is_complete(&self) -> bool {
        self.outcome().is_some()
    }
}
