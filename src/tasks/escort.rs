//! Mission tasks: reaching a patient, holding a perimeter slot, treating

use glam::Vec3;

use crate::core::types::{flat_distance, EntityId, Seconds};
use crate::tasks::goal::{Goal, GoalKind};
use crate::tasks::machine::{FailReason, TaskContext, TaskMachine, TaskOutcome};
use crate::tasks::motion::{facing, MoveStatus, Mover, TaskTimer};
use crate::world::commands::posture;
use crate::world::InteractKind;

/// Current position of the patient, or the goal's point when the patient is not visible
fn patient_position(ctx: &TaskContext, patient: Option<EntityId>, fallback: Vec3) -> Vec3 {
    patient
        .and_then(|id| ctx.world.entity(id))
        .map(|entity| entity.position)
        .unwrap_or(fallback)
}

/// Follow the patient until within the completion radius
#[derive(Debug, Default)]
pub struct MoveToPatientTask {
    patient: Option<EntityId>,
    fallback: Vec3,
    radius: f32,
    timer: TaskTimer,
    mover: Mover,
    outcome: Option<TaskOutcome>,
}

impl TaskMachine for MoveToPatientTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.patient = goal.entity;
        self.fallback = goal.target_position;
        self.radius = goal.completion_radius;
        self.timer = TaskTimer::start(ctx.now, GoalKind::MoveToPatient.budget(ctx.config));
        self.mover.reset();
        self.outcome = None;
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_some() {
            return;
        }
        if self.timer.expired(ctx.now, ctx.agent.id, "move_to_patient") {
            self.outcome = Some(TaskOutcome::TimedOut);
            return;
        }
        let destination = patient_position(ctx, self.patient, self.fallback);
        self.outcome = match self.mover.drive(ctx, destination, self.radius) {
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

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum HoldState {
    #[default]
    Approach,
    Hold {
        until: Seconds,
    },
}

/// Occupy a perimeter slot facing outward for a fixed duration
#[derive(Debug, Default)]
pub struct HoldPerimeterTask {
    slot: Vec3,
    radius: f32,
    facing: Option<Vec3>,
    center: Option<EntityId>,
    state: HoldState,
    timer: TaskTimer,
    mover: Mover,
    outcome: Option<TaskOutcome>,
}

impl TaskMachine for HoldPerimeterTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.slot = goal.target_position;
        self.radius = goal.completion_radius;
        self.facing = goal.facing;
        self.center = goal.entity;
        self.state = HoldState::Approach;
        self.timer = TaskTimer::start(ctx.now, GoalKind::HoldPerimeter.budget(ctx.config));
        self.mover.reset();
        self.outcome = None;
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_some() {
            return;
        }
        if self.timer.expired(ctx.now, ctx.agent.id, "hold_perimeter") {
            self.outcome = Some(TaskOutcome::TimedOut);
            return;
        }
        match self.state {
            HoldState::Approach => match self.mover.drive(ctx, self.slot, self.radius) {
                MoveStatus::Arrived => {
                    let agent = ctx.agent.id;
                    // Outward: away from whatever the perimeter surrounds
                    let direction = self.facing.unwrap_or_else(|| {
                        let center = patient_position(ctx, self.center, self.slot);
                        facing(center, self.slot)
                    });
                    ctx.commands.look_at(agent, direction);
                    ctx.commands.set_posture(agent, posture::CROUCHED);
                    self.state = HoldState::Hold {
                        until: ctx.now + ctx.config.hold_duration,
                    };
                }
                MoveStatus::Moving => {}
                MoveStatus::Stuck => self.outcome = Some(TaskOutcome::Stuck),
                MoveStatus::Unreachable => {
                    self.outcome = Some(TaskOutcome::Failed(FailReason::Unreachable))
                }
            },
            HoldState::Hold { until } => {
                if flat_distance(ctx.agent.position, self.slot) > self.radius * 2.0 {
                    ctx.commands.set_posture(ctx.agent.id, posture::STANDING);
                    self.mover.reset();
                    self.state = HoldState::Approach;
                } else if ctx.now >= until {
                    ctx.commands.set_posture(ctx.agent.id, posture::STANDING);
                    self.outcome = Some(TaskOutcome::Succeeded);
                }
            }
        }
    }

    fn stop(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_none() {
            if matches!(self.state, HoldState::Hold { .. }) {
                ctx.commands.set_posture(ctx.agent.id, posture::STANDING);
            }
            self.outcome = Some(TaskOutcome::Cancelled);
        }
    }

    fn outcome(&self) -> Option<TaskOutcome> {
        self.outcome
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum HealState {
    #[default]
    Approach,
    Kneel {
        until: Seconds,
    },
    Treat {
        until: Seconds,
    },
}

/// Reach the patient, kneel and go through the treatment animation.
///
/// The healing itself is applied by the mission controller; this task only
/// puts the agent in place and reports when the animation is done.
#[derive(Debug, Default)]
pub struct HealTask {
    patient: Option<EntityId>,
    fallback: Vec3,
    radius: f32,
    state: HealState,
    timer: TaskTimer,
    mover: Mover,
    outcome: Option<TaskOutcome>,
}

impl HealTask {
    fn finish(&mut self, ctx: &mut TaskContext, outcome: TaskOutcome) {
        if self.state != HealState::Approach {
            ctx.commands.set_posture(ctx.agent.id, posture::STANDING);
        }
        self.outcome = Some(outcome);
    }
}

impl TaskMachine for HealTask {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        self.patient = goal.entity;
        self.fallback = goal.target_position;
        self.radius = goal.completion_radius;
        self.state = HealState::Approach;
        self.timer = TaskTimer::start(ctx.now, GoalKind::HealPatient.budget(ctx.config));
        self.mover.reset();
        self.outcome = self
            .patient
            .is_none()
            .then_some(TaskOutcome::Failed(FailReason::TargetMissing));
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_some() {
            return;
        }
        if self.timer.expired(ctx.now, ctx.agent.id, "heal_patient") {
            self.finish(ctx, TaskOutcome::TimedOut);
            return;
        }
        let Some(patient) = self.patient else {
            return;
        };
        let position = patient_position(ctx, Some(patient), self.fallback);

        match self.state {
            HealState::Approach => match self.mover.drive(ctx, position, self.radius) {
                MoveStatus::Arrived => {
                    let agent = ctx.agent.id;
                    ctx.commands.look_at(agent, facing(ctx.agent.position, position));
                    ctx.commands.set_posture(agent, posture::CROUCHED);
                    self.state = HealState::Kneel {
                        until: ctx.now + ctx.config.kneel_delay,
                    };
                }
                MoveStatus::Moving => {}
                MoveStatus::Stuck => self.finish(ctx, TaskOutcome::Stuck),
                MoveStatus::Unreachable => self.finish(ctx, TaskOutcome::Failed(FailReason::Unreachable)),
            },
            HealState::Kneel { until } => {
                if ctx.now >= until {
                    ctx.commands.interact(ctx.agent.id, patient, InteractKind::Treat);
                    self.state = HealState::Treat {
                        until: ctx.now + ctx.config.treat_duration,
                    };
                }
            }
            HealState::Treat { until } => {
                if ctx.now >= until {
                    self.finish(ctx, TaskOutcome::Succeeded);
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

/// Stand still for a short while
#[derive(Debug, Default)]
pub struct PauseTask {
    until: Seconds,
    outcome: Option<TaskOutcome>,
}

impl TaskMachine for PauseTask {
    fn start(&mut self, _goal: &Goal, ctx: &mut TaskContext) {
        ctx.commands.stop(ctx.agent.id);
        self.until = ctx.now + ctx.config.pause_duration;
        self.outcome = None;
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        if self.outcome.is_none() && ctx.now >= self.until {
            self.outcome = Some(TaskOutcome::Succeeded);
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
