//! Looting a corpse or opening and looting a container

use crate::core::types::{EntityId, Seconds};
use crate::tasks::goal::{Goal, GoalKind};
use crate::tasks::machine::{FailReason, TaskContext, TaskMachine, TaskOutcome};
use crate::tasks::motion::{facing, MoveStatus, Mover, TaskTimer};
use crate::tasks::transfer::{ItemTransfer, TransferStatus};
use crate::world::commands::posture;
use crate::world::InteractKind;

/// Where the loot comes from; containers need to be opened first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LootSource {
    #[default]
    Corpse,
    Container,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum LootState {
    #[default]
    Approach,
    /// Crouched next to the source, waiting before touching it
    Settle { until: Seconds },
    Inspect,
    Transfer,
}

#[derive(Debug, Default)]
pub struct LootTask {
    source: LootSource,
    target: Option<EntityId>,
    state: LootState,
    timer: TaskTimer,
    mover: Mover,
    transfer: ItemTransfer,
    outcome: Option<TaskOutcome>,
}

impl LootTask {
    pub fn new(source: LootSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> GoalKind {
        match self.source {
            LootSource::Corpse => GoalKind::LootCorpse,
            LootSource::Container => GoalKind::OpenContainer,
        }
    }

    fn name(&self) -> &'static str {
        match self.source {
            LootSource::Corpse => "loot_corpse",
            LootSource::Container => "open_container",
        }
    }

    fn finish(&mut self, ctx: &mut TaskContext, outcome: TaskOutcome) {
        self.transfer.cancel();
        ctx.commands.set_posture(ctx.agent.id, posture::STANDING);
        tracing::debug!(agent = %ctx.agent.id, task = self.name(), ?outcome, moved = self.transfer.moved(), "loot finished");
        self.outcome = Some(outcome);
    }
}

impl TaskMachine for LootTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.target = goal.entity;
        self.state = LootState::Approach;
        self.timer = TaskTimer::start(ctx.now, self.kind().budget(ctx.config));
        self.mover.reset();
        self.transfer.reset();
        self.outcome = None;
        if self.target.is_none() {
            self.outcome = Some(TaskOutcome::Failed(FailReason::TargetMissing));
        }
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_some() {
            return;
        }
        if self.timer.expired(ctx.now, ctx.agent.id, self.name()) {
            self.finish(ctx, TaskOutcome::TimedOut);
            return;
        }
        let Some(target) = self.target else {
            self.outcome = Some(TaskOutcome::Failed(FailReason::TargetMissing));
            return;
        };
        let Some(entity) = ctx.world.entity(target) else {
            self.finish(ctx, TaskOutcome::Failed(FailReason::TargetMissing));
            return;
        };

        match self.state {
            LootState::Approach => match self.mover.drive(ctx, entity.position, ctx.config.arrive_radius) {
                MoveStatus::Arrived => {
                    let agent = ctx.agent.id;
                    ctx.commands.look_at(agent, facing(ctx.agent.position, entity.position));
                    ctx.commands.set_posture(agent, posture::CROUCHED);
                    let delay = match self.source {
                        LootSource::Corpse => {
                            ctx.commands.interact(agent, target, InteractKind::Search);
                            ctx.config.settle_delay
                        }
                        LootSource::Container => {
                            ctx.commands.interact(agent, target, InteractKind::Open);
                            ctx.config.open_delay
                        }
                    };
                    self.state = LootState::Settle {
                        until: ctx.now + delay,
                    };
                }
                MoveStatus::Moving => {}
                MoveStatus::Stuck => self.finish(ctx, TaskOutcome::Stuck),
                MoveStatus::Unreachable => self.finish(ctx, TaskOutcome::Failed(FailReason::Unreachable)),
            },
            LootState::Settle { until } => {
                if ctx.now >= until {
                    self.state = LootState::Inspect;
                }
            }
            LootState::Inspect => {
                let planned = self.transfer.plan(ctx, &entity.items);
                tracing::trace!(agent = %ctx.agent.id, %target, planned, "inspected loot source");
                if planned == 0 {
                    self.finish(ctx, TaskOutcome::Succeeded);
                } else {
                    self.state = LootState::Transfer;
                }
            }
            LootState::Transfer => {
                if self.transfer.update(ctx, target) == TransferStatus::Finished {
                    let outcome = if self.transfer.moved() == 0 && self.transfer.failed() > 0 {
                        TaskOutcome::Failed(FailReason::OperationFailed)
                    } else {
                        TaskOutcome::Succeeded
                    };
                    self.finish(ctx, outcome);
                }
            }
        }
    }

    fn stop(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_none() {
            self.finish(ctx, TaskOutcome::Cancelled);
        }
        self.transfer.cancel();
    }

    fn outcome(&self) -> Option<TaskOutcome> {
        self.outcome
    }
}
