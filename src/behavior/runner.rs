//! Owns the one active task of a layer and reports its completion

use crate::behavior::context::LayerContext;
use crate::events::BotEventKind;
use crate::tasks::{ActionDescriptor, GoalKind, Task, TaskMachine, TaskOutcome};

#[derive(Debug, Default)]
pub struct TaskRunner {
    current: Option<(ActionDescriptor, Task)>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    pub fn action(&self) -> Option<&ActionDescriptor> {
        self.current.as_ref().map(|(action, _)| action)
    }

    pub fn kind(&self) -> Option<GoalKind> {
        self.action().map(|a| a.kind())
    }

    /// No task, or the task reached a terminal state
    pub fn is_ending(&self) -> bool {
        self.current.as_ref().map_or(true, |(_, task)| task.is_complete())
    }

    /// Replace any running task with a fresh one for `action`
    pub fn begin(&mut self, action: ActionDescriptor, ctx: &mut LayerContext) {
        self.abort(ctx);
        let kind = action.kind();
        let mut task = Task::for_kind(kind);
        task.start(&action.goal, &mut ctx.tasks());
        tracing::debug!(agent = %ctx.agent.id, goal = %kind, reason = %action.reason, "task started");
        ctx.emit(BotEventKind::TaskStarted {
            agent: ctx.agent.id,
            goal: kind,
        });
        self.current = Some((action, task));
    }

    /// Advance the task; returns the finished action once it reaches a terminal state
    pub fn advance(&mut self, ctx: &mut LayerContext) -> Option<(ActionDescriptor, TaskOutcome)> {
        let (_, task) = self.current.as_mut()?;
        if !task.is_complete() {
            task.update(&mut ctx.tasks());
        }
        let outcome = task.outcome()?;
        let (action, _) = self.current.take()?;
        Self::report(ctx, &action, outcome);
        Some((action, outcome))
    }

    /// Stop the running task, if any
    pub fn abort(&mut self, ctx: &mut LayerContext) -> Option<(ActionDescriptor, TaskOutcome)> {
        let (action, mut task) = self.current.take()?;
        task.stop(&mut ctx.tasks());
        let outcome = task.outcome().unwrap_or(TaskOutcome::Cancelled);
        Self::report(ctx, &action, outcome);
        Some((action, outcome))
    }

    fn report(ctx: &mut LayerContext, action: &ActionDescriptor, outcome: TaskOutcome) {
        tracing::debug!(agent = %ctx.agent.id, goal = %action.kind(), ?outcome, "task finished");
        ctx.emit(BotEventKind::TaskCompleted {
            agent: ctx.agent.id,
            goal: action.kind(),
            outcome,
        });
    }
}
