//! Navigation-centric tasks: travel, explore, search, extract and retreat

use glam::Vec3;

use crate::core::types::{flat_distance, EntityId, ItemId, Seconds};
use crate::tasks::goal::{Goal, GoalKind};
use crate::tasks::machine::{FailReason, TaskContext, TaskMachine, TaskOutcome};
use crate::tasks::motion::{MoveStatus, Mover, TaskTimer};
use crate::tasks::pickup::resolution_outcome;
use crate::world::commands::speed;
use crate::world::{AgentCommand, ItemDestination, MoveRequest, OpPoll, OpSlot};

/// Walk to a point. Also used for retreating, at running speed.
#[derive(Debug, Default)]
pub struct TravelTask {
    kind: Option<GoalKind>,
    point: Vec3,
    radius: f32,
    timer: TaskTimer,
    mover: Mover,
    outcome: Option<TaskOutcome>,
}

impl TravelTask {
    fn name(&self) -> &'static str {
        match self.kind {
            Some(GoalKind::Retreat) => "retreat",
            _ => "travel_to",
        }
    }
}

impl TaskMachine for TravelTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.kind = Some(goal.kind);
        self.point = goal.target_position;
        self.radius = goal.completion_radius;
        self.timer = TaskTimer::start(ctx.now, goal.kind.budget(ctx.config));
        self.mover.reset();
        self.outcome = None;
        let pace = if goal.kind == GoalKind::Retreat {
            speed::RUN
        } else {
            speed::WALK
        };
        ctx.commands.set_speed(ctx.agent.id, pace);
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_some() {
            return;
        }
        if self.timer.expired(ctx.now, ctx.agent.id, self.name()) {
            self.outcome = Some(TaskOutcome::TimedOut);
            return;
        }
        self.outcome = match self.mover.drive(ctx, self.point, self.radius) {
            MoveStatus::Arrived => Some(TaskOutcome::Succeeded),
            MoveStatus::Moving => None,
            MoveStatus::Stuck => Some(TaskOutcome::Stuck),
            MoveStatus::Unreachable => Some(TaskOutcome::Failed(FailReason::Unreachable)),
        };
    }

    fn stop(&mut self, _ctx: &mut TaskContext) {
        if self.outcome.is_none() {
            self.outcome = Some(TaskOutcome::Cancelled);
        }
    }

    fn outcome(&self) -> Option<TaskOutcome> {
        self.outcome
    }
}

/// Visit a list of waypoints in order, skipping the ones that cannot be reached
#[derive(Debug, Default)]
pub struct ExploreTask {
    waypoints: Vec<Vec3>,
    next: usize,
    visited: usize,
    radius: f32,
    timer: TaskTimer,
    mover: Mover,
    outcome: Option<TaskOutcome>,
}

impl ExploreTask {
    pub fn visited(&self) -> usize {
        self.visited
    }
}

impl TaskMachine for ExploreTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.waypoints = if goal.waypoints.is_empty() {
            vec![goal.target_position]
        } else {
            goal.waypoints.clone()
        };
        self.next = 0;
        self.visited = 0;
        self.radius = goal.completion_radius;
        self.timer = TaskTimer::start(ctx.now, GoalKind::Explore.budget(ctx.config));
        self.mover.reset();
        self.outcome = None;
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_some() {
            return;
        }
        if self.timer.expired(ctx.now, ctx.agent.id, "explore") {
            self.outcome = Some(TaskOutcome::TimedOut);
            return;
        }
        let Some(point) = self.waypoints.get(self.next).copied() else {
            self.outcome = Some(if self.visited > 0 {
                TaskOutcome::Succeeded
            } else {
                TaskOutcome::Failed(FailReason::Unreachable)
            });
            return;
        };
        match self.mover.drive(ctx, point, self.radius) {
            MoveStatus::Arrived => {
                self.visited += 1;
                self.next += 1;
            }
            MoveStatus::Moving => {}
            MoveStatus::Unreachable => {
                tracing::debug!(agent = %ctx.agent.id, waypoint = self.next, "skipping unreachable waypoint");
                self.next += 1;
            }
            MoveStatus::Stuck => self.outcome = Some(TaskOutcome::Stuck),
        }
    }

    fn stop(&mut self, _ctx: &mut TaskContext) {
        if self.outcome.is_none() {
            self.outcome = Some(TaskOutcome::Cancelled);
        }
    }

    fn outcome(&self) -> Option<TaskOutcome> {
        self.outcome
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SearchState {
    #[default]
    Sweep,
    Fetch(EntityId),
    Grab,
}

/// Sweep waypoints looking for a specific item, then pick it up
#[derive(Debug, Default)]
pub struct SearchTask {
    item: Option<ItemId>,
    waypoints: Vec<Vec3>,
    next: usize,
    radius: f32,
    state: SearchState,
    last_look: Option<Seconds>,
    timer: TaskTimer,
    mover: Mover,
    op: OpSlot,
    outcome: Option<TaskOutcome>,
}

const LOOK_INTERVAL: Seconds = 1.0;

impl SearchTask {
    fn look(&mut self, ctx: &TaskContext, item: ItemId) -> Option<EntityId> {
        if let Some(at) = self.last_look {
            if ctx.now - at < LOOK_INTERVAL {
                return None;
            }
        }
        self.last_look = Some(ctx.now);
        ctx.world
            .find_nearby(ctx.agent.position, ctx.config.search_sense_radius)
            .into_iter()
            .find(|entity| entity.items.iter().any(|i| i.id == item))
            .map(|entity| entity.id)
    }
}

impl TaskMachine for SearchTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.item = goal.item;
        self.waypoints = if goal.waypoints.is_empty() {
            vec![goal.target_position]
        } else {
            goal.waypoints.clone()
        };
        self.next = 0;
        self.radius = goal.completion_radius;
        self.state = SearchState::Sweep;
        self.last_look = None;
        self.timer = TaskTimer::start(ctx.now, GoalKind::SearchForItem.budget(ctx.config));
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
        if self.timer.expired(ctx.now, ctx.agent.id, "search_for_item") {
            self.op.cancel();
            self.outcome = Some(TaskOutcome::TimedOut);
            return;
        }
        let Some(item) = self.item else {
            return;
        };

        match self.state {
            SearchState::Sweep => {
                if let Some(found) = self.look(ctx, item) {
                    tracing::debug!(agent = %ctx.agent.id, %item, entity = %found, "search spotted item");
                    self.mover.reset();
                    self.state = SearchState::Fetch(found);
                    return;
                }
                let Some(point) = self.waypoints.get(self.next).copied() else {
                    self.outcome = Some(TaskOutcome::Failed(FailReason::TargetMissing));
                    return;
                };
                match self.mover.drive(ctx, point, self.radius) {
                    MoveStatus::Arrived | MoveStatus::Unreachable => self.next += 1,
                    MoveStatus::Moving => {}
                    MoveStatus::Stuck => self.outcome = Some(TaskOutcome::Stuck),
                }
            }
            SearchState::Fetch(source) => {
                let Some(entity) = ctx.world.entity(source) else {
                    self.state = SearchState::Sweep;
                    return;
                };
                match self.mover.drive(ctx, entity.position, ctx.config.arrive_radius) {
                    MoveStatus::Arrived => {
                        let request = MoveRequest {
                            agent: ctx.agent.id,
                            item,
                            source: Some(source),
                            destination: ItemDestination::Agent(ctx.agent.id),
                        };
                        self.state = SearchState::Grab;
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
            SearchState::Grab => {
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
enum ExtractState {
    #[default]
    Approach,
    Hold {
        until: Seconds,
    },
}

/// Reach an extraction zone and stay inside it until extraction fires
#[derive(Debug, Default)]
pub struct ExtractTask {
    point: Vec3,
    radius: f32,
    state: ExtractState,
    timer: TaskTimer,
    mover: Mover,
    outcome: Option<TaskOutcome>,
}

impl TaskMachine for ExtractTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.point = goal.target_position;
        self.radius = goal.completion_radius;
        self.state = ExtractState::Approach;
        self.timer = TaskTimer::start(ctx.now, GoalKind::Extract.budget(ctx.config));
        self.mover.reset();
        self.outcome = None;
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_some() {
            return;
        }
        if self.timer.expired(ctx.now, ctx.agent.id, "extract") {
            self.outcome = Some(TaskOutcome::TimedOut);
            return;
        }
        match self.state {
            ExtractState::Approach => match self.mover.drive(ctx, self.point, self.radius) {
                MoveStatus::Arrived => {
                    self.state = ExtractState::Hold {
                        until: ctx.now + ctx.config.extract_hold,
                    };
                }
                MoveStatus::Moving => {}
                MoveStatus::Stuck => self.outcome = Some(TaskOutcome::Stuck),
                MoveStatus::Unreachable => {
                    self.outcome = Some(TaskOutcome::Failed(FailReason::Unreachable))
                }
            },
            ExtractState::Hold { until } => {
                if flat_distance(ctx.agent.position, self.point) > self.radius {
                    self.mover.reset();
                    self.state = ExtractState::Approach;
                } else if ctx.now >= until {
                    tracing::info!(agent = %ctx.agent.id, "agent extracting");
                    ctx.commands.push(AgentCommand::Extract { agent: ctx.agent.id });
                    self.outcome = Some(TaskOutcome::Succeeded);
                }
            }
        }
    }

    fn stop(&mut self, _ctx: &mut TaskContext) {
        if self.outcome.is_none() {
            self.outcome = Some(TaskOutcome::Cancelled);
        }
    }

    fn outcome(&self) -> Option<TaskOutcome> {
        self.outcome
    }
}
