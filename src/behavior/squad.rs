//! Mission duty layers: the lead medic and the perimeter escorts
//!
//! Both layers are driven entirely by the mission snapshot taken this tick.
//! Each phase maps to one goal; once that goal succeeds the member pauses
//! until the phase changes. A failed goal is retried after one pause.

use glam::Vec3;

use crate::behavior::context::LayerContext;
use crate::behavior::layer::BehaviorLayer;
use crate::behavior::runner::TaskRunner;
use crate::core::error::{BotError, Result};
use crate::core::types::Seconds;
use crate::mission::{Member, MemberRole, MissionPhase, MissionSnapshot};
use crate::tasks::motion::facing;
use crate::tasks::{ActionDescriptor, Goal, GoalKind};

pub const MEDIC_PRIORITY: i32 = 100;
pub const ESCORT_PRIORITY: i32 = 90;

/// Maps the snapshot to the goal for one member
type Planner = fn(&MissionSnapshot, &Member, &LayerContext) -> Goal;

/// Shared bookkeeping of a duty layer
#[derive(Debug, Default)]
struct Duty {
    runner: TaskRunner,
    /// Phase the running goal was planned for
    key: Option<MissionPhase>,
    settled: bool,
    retry_at: Seconds,
}

impl Duty {
    fn member<'s>(ctx: &'s LayerContext, site: &'static str) -> Result<(&'s MissionSnapshot, &'s Member)> {
        let snapshot = ctx
            .mission
            .ok_or_else(|| BotError::missing(site, "no mission snapshot"))?;
        let member = snapshot
            .member(ctx.agent.id)
            .ok_or_else(|| BotError::missing(site, format!("agent {} is not on the roster", ctx.agent.id)))?;
        Ok((snapshot, member))
    }

    fn is_active(ctx: &LayerContext, role: MemberRole) -> bool {
        ctx.agent.alive
            && ctx.mission.is_some_and(|snapshot| {
                !matches!(snapshot.phase, MissionPhase::Idle | MissionPhase::Dismissing)
                    && snapshot.member(ctx.agent.id).is_some_and(|m| m.role == role)
            })
    }

    fn next_action(&self, ctx: &LayerContext, site: &'static str, plan: Planner) -> Result<ActionDescriptor> {
        let (snapshot, member) = Self::member(ctx, site)?;
        if self.settled {
            return Ok(ActionDescriptor::new(Goal::pause(ctx.agent.position), "holding for next phase"));
        }
        if ctx.now < self.retry_at {
            return Ok(ActionDescriptor::new(Goal::pause(ctx.agent.position), "waiting to retry"));
        }
        let goal = plan(snapshot, member, ctx);
        Ok(ActionDescriptor::new(goal, format!("mission {}", snapshot.phase)))
    }

    fn update(
        &mut self,
        ctx: &mut LayerContext,
        site: &'static str,
        key_of: fn(MissionPhase) -> MissionPhase,
        plan: Planner,
    ) -> Result<()> {
        let phase = Self::member(ctx, site)?.0.phase;
        let key = key_of(phase);
        if self.key != Some(key) {
            self.runner.abort(ctx);
            self.key = Some(key);
            self.settled = false;
            self.retry_at = 0.0;
        }
        if self.runner.is_idle() {
            let action = self.next_action(ctx, site, plan)?;
            self.runner.begin(action, ctx);
        }
        if let Some((action, outcome)) = self.runner.advance(ctx) {
            if action.kind() != GoalKind::Pause {
                if outcome.is_success() {
                    self.settled = true;
                } else {
                    tracing::debug!(agent = %ctx.agent.id, goal = %action.kind(), ?outcome, "duty goal failed");
                    self.retry_at = ctx.now + ctx.config.tasks.pause_duration;
                }
            }
            let next = self.next_action(ctx, site, plan)?;
            self.runner.begin(next, ctx);
        }
        Ok(())
    }

    fn stop(&mut self, ctx: &mut LayerContext) {
        self.runner.abort(ctx);
        self.key = None;
        self.settled = false;
        self.retry_at = 0.0;
    }
}

fn patient_position(snapshot: &MissionSnapshot, ctx: &LayerContext) -> Vec3 {
    snapshot
        .patient
        .and_then(|patient| ctx.world.entity(patient))
        .map_or(snapshot.rally, |e| e.position)
}

fn with_patient(goal: Goal, snapshot: &MissionSnapshot) -> Goal {
    match snapshot.patient {
        Some(patient) => goal.with_entity(patient),
        None => goal,
    }
}

fn retreat_goal(member: &Member, ctx: &LayerContext) -> Goal {
    Goal::new(GoalKind::Retreat, member.retreat_point)
        .with_radius(ctx.config.tasks.arrive_radius * 2.0)
        .with_label("retreat")
}

fn plan_medic(snapshot: &MissionSnapshot, member: &Member, ctx: &LayerContext) -> Goal {
    let mission = &ctx.config.mission;
    let patient = patient_position(snapshot, ctx);
    match snapshot.phase {
        MissionPhase::MovingToPosition => with_patient(
            Goal::new(GoalKind::MoveToPatient, patient).with_radius(mission.arrival_radius * 0.5),
            snapshot,
        ),
        MissionPhase::Defending => with_patient(
            Goal::new(GoalKind::MoveToPatient, patient).with_radius(mission.treat_range * 0.6),
            snapshot,
        ),
        MissionPhase::Treating => with_patient(
            Goal::new(GoalKind::HealPatient, patient).with_radius(mission.treat_range * 0.6),
            snapshot,
        ),
        MissionPhase::Retreating => retreat_goal(member, ctx),
        MissionPhase::Idle | MissionPhase::Spawning | MissionPhase::Dismissing => Goal::pause(ctx.agent.position),
    }
}

fn plan_escort(snapshot: &MissionSnapshot, member: &Member, ctx: &LayerContext) -> Goal {
    match snapshot.phase {
        MissionPhase::MovingToPosition | MissionPhase::Defending | MissionPhase::Treating => with_patient(
            Goal::new(GoalKind::HoldPerimeter, member.slot)
                .with_radius(ctx.config.tasks.arrive_radius)
                .with_facing(facing(snapshot.rally, member.slot))
                .with_label("perimeter"),
            snapshot,
        ),
        MissionPhase::Retreating => retreat_goal(member, ctx),
        MissionPhase::Idle | MissionPhase::Spawning | MissionPhase::Dismissing => Goal::pause(ctx.agent.position),
    }
}

/// The perimeter is held through every phase between arrival and retreat
fn escort_key(phase: MissionPhase) -> MissionPhase {
    match phase {
        MissionPhase::MovingToPosition | MissionPhase::Defending | MissionPhase::Treating => MissionPhase::Defending,
        other => other,
    }
}

/// Lead member: reaches the patient and performs the treatment
#[derive(Debug, Default)]
pub struct MedicLayer {
    duty: Duty,
}

impl MedicLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BehaviorLayer for MedicLayer {
    fn name(&self) -> &'static str {
        "medic"
    }

    fn priority(&self) -> i32 {
        MEDIC_PRIORITY
    }

    fn is_active(&mut self, ctx: &mut LayerContext) -> Result<bool> {
        Ok(Duty::is_active(ctx, MemberRole::Lead))
    }

    fn next_action(&mut self, ctx: &mut LayerContext) -> Result<ActionDescriptor> {
        self.duty.next_action(ctx, "medic.next_action", plan_medic)
    }

    fn is_action_ending(&self) -> Result<bool> {
        Ok(self.duty.runner.is_ending())
    }

    fn start(&mut self, ctx: &mut LayerContext) -> Result<()> {
        let (snapshot, _) = Duty::member(ctx, "medic.start")?;
        tracing::debug!(agent = %ctx.agent.id, phase = %snapshot.phase, "medic duty started");
        Ok(())
    }

    fn stop(&mut self, ctx: &mut LayerContext) {
        self.duty.stop(ctx);
    }

    fn update(&mut self, ctx: &mut LayerContext) -> Result<()> {
        self.duty.update(ctx, "medic.update", |phase| phase, plan_medic)
    }
}

/// Support member: holds a perimeter slot facing outward
#[derive(Debug, Default)]
pub struct EscortLayer {
    duty: Duty,
}

impl EscortLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BehaviorLayer for EscortLayer {
    fn name(&self) -> &'static str {
        "escort"
    }

    fn priority(&self) -> i32 {
        ESCORT_PRIORITY
    }

    fn is_active(&mut self, ctx: &mut LayerContext) -> Result<bool> {
        Ok(Duty::is_active(ctx, MemberRole::Support))
    }

    fn next_action(&mut self, ctx: &mut LayerContext) -> Result<ActionDescriptor> {
        self.duty.next_action(ctx, "escort.next_action", plan_escort)
    }

    fn is_action_ending(&self) -> Result<bool> {
        Ok(self.duty.runner.is_ending())
    }

    fn start(&mut self, ctx: &mut LayerContext) -> Result<()> {
        let (_, member) = Duty::member(ctx, "escort.start")?;
        tracing::debug!(agent = %ctx.agent.id, slot = ?member.slot, "escort duty started");
        Ok(())
    }

    fn stop(&mut self, ctx: &mut LayerContext) {
        self.duty.stop(ctx);
    }

    fn update(&mut self, ctx: &mut LayerContext) -> Result<()> {
        self.duty.update(ctx, "escort.update", escort_key, plan_escort)
    }
}
