//! Picking up a loose item, and placing a carried item at a point

use glam::Vec3;

use crate::core::types::{EntityId, ItemId, Seconds};
use crate::tasks::goal::{Goal, GoalKind};
use crate::tasks::machine::{FailReason, TaskContext, TaskMachine, TaskOutcome};
use crate::tasks::motion::{MoveStatus, Mover, TaskTimer};
use crate::world::commands::posture;
use crate::world::{ItemDestination, MoveFailure, MoveRequest, MoveResult, OpPoll, OpResolution, OpSlot};

/// Map a resolved single-item operation to a task outcome
pub(crate) fn resolution_outcome(resolution: OpResolution) -> TaskOutcome {
    match resolution {
        OpResolution::Completed(MoveResult::Moved) => TaskOutcome::Succeeded,
        OpResolution::Completed(MoveResult::Failed(MoveFailure::InventoryFull)) => {
            TaskOutcome::Failed(FailReason::InventoryFull)
        }
        OpResolution::Completed(MoveResult::Failed(MoveFailure::ItemMissing)) => {
            TaskOutcome::Failed(FailReason::TargetMissing)
        }
        OpResolution::Completed(MoveResult::Failed(_)) => TaskOutcome::Failed(FailReason::OperationFailed),
        OpResolution::TimedOut => TaskOutcome::TimedOut,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PickUpState {
    #[default]
    Approach,
    Grab,
}

#[derive(Debug, Default)]
pub struct PickUpTask {
    target: Option<EntityId>,
    item: Option<ItemId>,
    state: PickUpState,
    timer: TaskTimer,
    mover: Mover,
    op: OpSlot,
    outcome: Option<TaskOutcome>,
}

impl TaskMachine for PickUpTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.target = goal.entity;
        self.item = goal.item;
        self.state = PickUpState::Approach;
        self.timer = TaskTimer::start(ctx.now, GoalKind::PickUpItem.budget(ctx.config));
        self.mover.reset();
        self.op.reset();
        self.outcome = self
            .target
            .is_none()
            .then_some(TaskOutcome::Failed(FailReason::TargetMissing));
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_some() {
            return;
        }
        if self.timer.expired(ctx.now, ctx.agent.id, "pick_up_item") {
            self.op.cancel();
            self.outcome = Some(TaskOutcome::TimedOut);
            return;
        }
        let Some(target) = self.target else {
            return;
        };

        match self.state {
            PickUpState::Approach => {
                let Some(entity) = ctx.world.entity(target) else {
                    self.outcome = Some(TaskOutcome::Failed(FailReason::TargetMissing));
                    return;
                };
                match self.mover.drive(ctx, entity.position, ctx.config.arrive_radius) {
                    MoveStatus::Arrived => {
                        let item = self.item.or_else(|| entity.items.first().map(|i| i.id));
                        let Some(item) = item else {
                            self.outcome = Some(TaskOutcome::Failed(FailReason::TargetMissing));
                            return;
                        };
                        let request = MoveRequest {
                            agent: ctx.agent.id,
                            item,
                            source: Some(target),
                            destination: ItemDestination::Agent(ctx.agent.id),
                        };
                        self.state = PickUpState::Grab;
                        let completion = self.op.begin(ctx.now);
                        ctx.world.attempt_move(request, completion);
                    }
                    MoveStatus::Moving => {}
                    MoveStatus::Stuck => self.outcome = Some(TaskOutcome::Stuck),
                    MoveStatus::Unreachable => {
                        self.outcome = Some(TaskOutcome::Failed(FailReason::Unreachable))
                    }
                }
            }
            PickUpState::Grab => {
                if let OpPoll::Resolved(resolution) = self.op.poll(ctx.now, ctx.config.op_timeout) {
                    self.outcome = Some(resolution_outcome(resolution));
                }
            }
        }
    }

    fn stop(&mut self, _ctx: &mut TaskContext) {
        self.op.cancel();
        if self.outcome.is_none() {
            self.outcome = Some(TaskOutcome::Cancelled);
        }
    }

    fn outcome(&self) -> Option<TaskOutcome> {
        self.outcome
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum PlaceState {
    #[default]
    Approach,
    Plant {
        until: Seconds,
    },
    Drop,
}

/// Carry an item to a point, crouch for a while and leave it on the ground
#[derive(Debug, Default)]
pub struct PlaceItemTask {
    item: Option<ItemId>,
    point: Vec3,
    radius: f32,
    state: PlaceState,
    timer: TaskTimer,
    mover: Mover,
    op: OpSlot,
    outcome: Option<TaskOutcome>,
}

impl PlaceItemTask {
    fn finish(&mut self, ctx: &mut TaskContext, outcome: TaskOutcome) {
        self.op.cancel();
        if self.state != PlaceState::Approach {
            ctx.commands.set_posture(ctx.agent.id, posture::STANDING);
        }
        self.outcome = Some(outcome);
    }
}

impl TaskMachine for PlaceItemTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.item = goal.item;
        self.point = goal.target_position;
        self.radius = goal.completion_radius;
        self.state = PlaceState::Approach;
        self.timer = TaskTimer::start(ctx.now, GoalKind::PlaceItem.budget(ctx.config));
        self.mover.reset();
        self.op.reset();
        self.outcome = self
            .item
            .is_none()
            .then_some(TaskOutcome::Failed(FailReason::TargetMissing));
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_some() {
            return;
        }
        if self.timer.expired(ctx.now, ctx.agent.id, "place_item") {
            self.finish(ctx, TaskOutcome::TimedOut);
            return;
        }
        let Some(item) = self.item else {
            return;
        };

        match self.state {
            PlaceState::Approach => match self.mover.drive(ctx, self.point, self.radius) {
                MoveStatus::Arrived => {
                    ctx.commands.set_posture(ctx.agent.id, posture::CROUCHED);
                    self.state = PlaceState::Plant {
                        until: ctx.now + ctx.config.plant_duration,
                    };
                }
                MoveStatus::Moving => {}
                MoveStatus::Stuck => self.finish(ctx, TaskOutcome::Stuck),
                MoveStatus::Unreachable => self.finish(ctx, TaskOutcome::Failed(FailReason::Unreachable)),
            },
            PlaceState::Plant { until } => {
                if ctx.now >= until {
                    let request = MoveRequest {
                        agent: ctx.agent.id,
                        item,
                        source: None,
                        destination: ItemDestination::Ground(self.point),
                    };
                    self.state = PlaceState::Drop;
                    let completion = self.op.begin(ctx.now);
                    ctx.world.attempt_move(request, completion);
                }
            }
            PlaceState::Drop => {
                if let OpPoll::Resolved(resolution) = self.op.poll(ctx.now, ctx.config.op_timeout) {
                    self.finish(ctx, resolution_outcome(resolution));
                }
            }
        }
    }

    fn stop(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_none() {
            self.finish(ctx, TaskOutcome::Cancelled);
        }
    }

    fn outcome(&self) -> Option<TaskOutcome> {
        self.outcome
    }
}
