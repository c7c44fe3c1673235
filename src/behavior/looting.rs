//! Looting: claim the best nearby corpse, container or loose item and empty it

use crate::behavior::context::LayerContext;
use crate::behavior::gate::{ActivationGate, GatePolicy, GateState};
use crate::behavior::layer::BehaviorLayer;
use crate::behavior::runner::TaskRunner;
use crate::core::config::TargetingConfig;
use crate::core::error::Result;
use crate::core::types::AgentId;
use crate::events::BotEventKind;
use crate::targeting::{ScanFilters, Target, TargetCategory, TargetScanner};
use crate::tasks::{ActionDescriptor, Goal, GoalKind, TaskOutcome};

pub const LOOTING_PRIORITY: i32 = 20;

#[derive(Debug)]
pub struct LootingLayer {
    scanner: TargetScanner,
    gate: ActivationGate,
    state: GateState,
    runner: TaskRunner,
}

impl LootingLayer {
    pub fn new(agent: AgentId, config: &TargetingConfig) -> Self {
        Self {
            scanner: TargetScanner::new(agent, config),
            gate: ActivationGate::new(),
            state: GateState::Open,
            runner: TaskRunner::new(),
        }
    }

    pub fn scanner(&self) -> &TargetScanner {
        &self.scanner
    }

    fn has_work(&self) -> bool {
        self.scanner.current().is_some() || !self.scanner.queue().is_empty()
    }

    fn refresh_gate(&mut self, ctx: &LayerContext) -> GateState {
        let policy = GatePolicy::from(&ctx.config.looting);
        self.state = self.gate.evaluate(&ctx.agent, ctx.awareness, &policy, ctx.now);
        self.state
    }

    fn goal_for(target: &Target, ctx: &LayerContext) -> Goal {
        let kind = match target.category {
            TargetCategory::Corpse => GoalKind::LootCorpse,
            TargetCategory::Container => GoalKind::OpenContainer,
            TargetCategory::LooseItem => GoalKind::PickUpItem,
        };
        Goal::new(kind, target.position)
            .with_entity(target.key)
            .with_radius(ctx.config.tasks.arrive_radius)
            .with_label("loot")
    }

    /// Release or blacklist the target the finished task was working on
    fn settle(&mut self, action: &ActionDescriptor, outcome: TaskOutcome, ctx: &mut LayerContext) {
        if action.kind() == GoalKind::Pause {
            return;
        }
        let policy = GatePolicy::from(&ctx.config.looting);
        self.gate.record_completion(&policy, ctx.now);

        let Some(target) = action.goal.entity else {
            return;
        };
        let agent = ctx.agent.id;
        if outcome.is_success() {
            self.scanner.release(ctx.claims, target);
            ctx.emit(BotEventKind::TargetReleased { agent, target });
        } else {
            self.scanner.blacklist(ctx.claims, target, ctx.now);
            ctx.emit(BotEventKind::TargetBlacklisted { agent, target });
        }
    }
}

impl BehaviorLayer for LootingLayer {
    fn name(&self) -> &'static str {
        "looting"
    }

    fn priority(&self) -> i32 {
        LOOTING_PRIORITY
    }

    fn is_active(&mut self, ctx: &mut LayerContext) -> Result<bool> {
        if let GateState::Closed(reason) = self.refresh_gate(ctx) {
            tracing::trace!(agent = %ctx.agent.id, ?reason, "looting gated");
            return Ok(false);
        }
        self.scanner
            .cleanup(ctx.world, ctx.claims, &ctx.config.targeting, ctx.now);
        let filters = ScanFilters::from_config(&ctx.config.looting);
        self.scanner.scan(
            ctx.world,
            ctx.claims,
            &ctx.agent,
            &ctx.config.targeting,
            &filters,
            ctx.now,
        );
        Ok(self.has_work())
    }

    fn next_action(&mut self, ctx: &mut LayerContext) -> Result<ActionDescriptor> {
        let here = ctx.agent.position;
        if self.state == GateState::Cooling {
            return Ok(ActionDescriptor::new(Goal::pause(here), "loot cooldown"));
        }
        if let Some(current) = self.scanner.current() {
            return Ok(ActionDescriptor::new(Self::goal_for(current, ctx), "resume target"));
        }
        match self.scanner.claim_next(ctx.claims, ctx.now) {
            Some(target) => {
                ctx.emit(BotEventKind::TargetClaimed {
                    agent: ctx.agent.id,
                    target: target.key,
                    priority: target.priority,
                });
                Ok(ActionDescriptor::new(Self::goal_for(&target, ctx), "claimed target"))
            }
            None => Ok(ActionDescriptor::new(Goal::pause(here), "nothing to claim")),
        }
    }

    fn is_action_ending(&self) -> Result<bool> {
        Ok(self.runner.is_ending())
    }

    fn start(&mut self, ctx: &mut LayerContext) -> Result<()> {
        tracing::debug!(agent = %ctx.agent.id, queued = self.scanner.queue().len(), "looting started");
        Ok(())
    }

    fn stop(&mut self, ctx: &mut LayerContext) {
        self.runner.abort(ctx);
        if let Some(target) = self.scanner.current().map(|t| t.key) {
            self.scanner.release(ctx.claims, target);
            ctx.emit(BotEventKind::TargetReleased {
                agent: ctx.agent.id,
                target,
            });
        }
    }

    fn update(&mut self, ctx: &mut LayerContext) -> Result<()> {
        if self.runner.is_idle() {
            let action = self.next_action(ctx)?;
            self.runner.begin(action, ctx);
        }
        if let Some((action, outcome)) = self.runner.advance(ctx) {
            self.settle(&action, outcome, ctx);
            // Seek the next target right away
            if !self.refresh_gate(ctx).is_closed() && self.has_work() {
                let next = self.next_action(ctx)?;
                self.runner.begin(next, ctx);
            }
        }
        Ok(())
    }
}
