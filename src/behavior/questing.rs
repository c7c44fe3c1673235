//! Questing: work through role-generated objectives, then extract

use crate::behavior::context::LayerContext;
use crate::behavior::gate::{ActivationGate, GatePolicy, GateState};
use crate::behavior::layer::BehaviorLayer;
use crate::behavior::objectives::ObjectiveQueue;
use crate::behavior::runner::TaskRunner;
use crate::core::error::{BotError, Result};
use crate::core::types::Seconds;
use crate::tasks::{ActionDescriptor, Goal, GoalKind, TaskOutcome};

pub const QUESTING_PRIORITY: i32 = 10;

#[derive(Debug, Default)]
pub struct QuestingLayer {
    queue: ObjectiveQueue,
    gate: ActivationGate,
    state: GateState,
    runner: TaskRunner,
    raid_started: Option<Seconds>,
    raid_over: bool,
}

impl QuestingLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objectives(&self) -> &ObjectiveQueue {
        &self.queue
    }

    fn refresh_gate(&mut self, ctx: &LayerContext) -> GateState {
        let policy = GatePolicy::from(&ctx.config.questing);
        self.state = self.gate.evaluate(&ctx.agent, ctx.awareness, &policy, ctx.now);
        self.state
    }

    /// Generate objectives on first use and enforce the raid timer
    fn refresh_objectives(&mut self, ctx: &mut LayerContext) {
        if !self.queue.is_generated() {
            let zones = ctx.world.zones();
            self.queue
                .generate(&ctx.agent, &zones, ctx.world, &ctx.config.questing, &mut *ctx.rng);
            self.raid_started = Some(ctx.now);
        }
        let started = self.raid_started.unwrap_or(ctx.now);
        if !self.raid_over && ctx.now - started >= ctx.config.questing.raid_duration {
            self.raid_over = true;
            let dropped = self.queue.abandon_all_but_extract();
            tracing::info!(agent = %ctx.agent.id, dropped, "raid timer elapsed, heading for extract");
        }
    }

    fn settle(&mut self, action: &ActionDescriptor, outcome: TaskOutcome, ctx: &mut LayerContext) {
        if action.kind() == GoalKind::Pause {
            return;
        }
        let policy = GatePolicy::from(&ctx.config.questing);
        self.gate.record_completion(&policy, ctx.now);
        if !outcome.is_success() {
            // A failed objective is not retried
            tracing::debug!(agent = %ctx.agent.id, goal = %action.kind(), ?outcome, "objective skipped");
        }
        self.queue.complete(&action.goal);
    }
}

impl BehaviorLayer for QuestingLayer {
    fn name(&self) -> &'static str {
        "questing"
    }

    fn priority(&self) -> i32 {
        QUESTING_PRIORITY
    }

    fn is_active(&mut self, ctx: &mut LayerContext) -> Result<bool> {
        if self.refresh_gate(ctx).is_closed() {
            return Ok(false);
        }
        self.refresh_objectives(ctx);
        if !self.runner.is_idle() {
            return Ok(true);
        }
        let Some(next) = self.queue.next_pending() else {
            return Ok(false);
        };
        Ok(ctx
            .awareness
            .can_perform_non_combat_activity(ctx.agent.id, next.target_position))
    }

    fn next_action(&mut self, ctx: &mut LayerContext) -> Result<ActionDescriptor> {
        if self.state == GateState::Cooling {
            return Ok(ActionDescriptor::new(Goal::pause(ctx.agent.position), "quest cooldown"));
        }
        let goal = self
            .queue
            .next_pending()
            .cloned()
            .ok_or_else(|| BotError::missing("questing.next_action", "no pending objective"))?;
        Ok(ActionDescriptor::new(goal, "next objective"))
    }

    fn is_action_ending(&self) -> Result<bool> {
        Ok(self.runner.is_ending())
    }

    fn start(&mut self, ctx: &mut LayerContext) -> Result<()> {
        tracing::debug!(agent = %ctx.agent.id, pending = self.queue.pending(), "questing started");
        Ok(())
    }

    fn stop(&mut self, ctx: &mut LayerContext) {
        self.runner.abort(ctx);
    }

    fn update(&mut self, ctx: &mut LayerContext) -> Result<()> {
        if self.runner.is_idle() {
            let action = self.next_action(ctx)?;
            self.runner.begin(action, ctx);
        }
        if let Some((action, outcome)) = self.runner.advance(ctx) {
            self.settle(&action, outcome, ctx);
            if !self.refresh_gate(ctx).is_closed() && self.queue.next_pending().is_some() {
                let next = self.next_action(ctx)?;
                self.runner.begin(next, ctx);
            }
        }
        Ok(())
    }
}
