//! Shared navigation and timeout helpers for task state machines

use glam::Vec3;

use crate::core::types::{flat_distance, AgentId, Seconds};
use crate::tasks::machine::TaskContext;

/// Overall wall-clock budget of a task. Reports expiry once.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskTimer {
    started_at: Seconds,
    budget: Seconds,
    reported: bool,
}

impl TaskTimer {
    pub fn start(now: Seconds, budget: Seconds) -> Self {
        Self {
            started_at: now,
            budget,
            reported: false,
        }
    }

    pub fn elapsed(&self, now: Seconds) -> Seconds {
        (now - self.started_at).max(0.0)
    }

    pub fn expired(&mut self, now: Seconds, agent: AgentId, task: &'static str) -> bool {
        if self.elapsed(now) < self.budget {
            return false;
        }
        if !self.reported {
            self.reported = true;
            tracing::warn!(%agent, task, budget = self.budget, "task timed out");
        }
        true
    }
}

/// Result of driving toward a destination for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    Arrived,
    Moving,
    /// Too many re-issues without measurable progress
    Stuck,
    /// No complete path exists
    Unreachable,
}

/// Issues move commands, re-issues them on an interval and detects lack of progress.
///
/// A new destination (further than `radius` from the previous one) resets the
/// strike count and re-checks reachability.
#[derive(Debug, Clone, Default)]
pub struct Mover {
    destination: Option<Vec3>,
    last_issue_at: Option<Seconds>,
    best_distance: f32,
    strikes: u32,
}

impl Mover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    pub fn drive(&mut self, ctx: &mut TaskContext, destination: Vec3, radius: f32) -> MoveStatus {
        let agent = ctx.agent.id;
        let distance = flat_distance(ctx.agent.position, destination);
        if distance <= radius {
            if self.last_issue_at.is_some() {
                ctx.commands.stop(agent);
            }
            self.last_issue_at = None;
            self.destination = None;
            return MoveStatus::Arrived;
        }

        let retarget = match self.destination {
            Some(previous) => flat_distance(previous, destination) > radius,
            None => true,
        };
        if retarget {
            if !ctx.world.is_reachable(ctx.agent.position, destination) {
                tracing::debug!(%agent, ?destination, "destination unreachable");
                return MoveStatus::Unreachable;
            }
            self.destination = Some(destination);
            self.last_issue_at = None;
            self.strikes = 0;
        }

        match self.last_issue_at {
            None => {
                self.best_distance = distance;
                self.issue(ctx, destination);
            }
            Some(issued) if ctx.now - issued >= ctx.config.reissue_interval => {
                if self.best_distance - distance >= ctx.config.min_progress {
                    self.strikes = 0;
                    self.best_distance = distance;
                } else {
                    self.strikes += 1;
                    tracing::debug!(%agent, strikes = self.strikes, distance, "no progress");
                    if self.strikes >= ctx.config.max_strikes {
                        return MoveStatus::Stuck;
                    }
                }
                self.issue(ctx, destination);
            }
            Some(_) => {}
        }
        MoveStatus::Moving
    }

    fn issue(&mut self, ctx: &mut TaskContext, destination: Vec3) {
        ctx.commands.move_to(ctx.agent.id, destination);
        self.last_issue_at = Some(ctx.now);
    }
}

/// Unit vector on the horizontal plane from `from` toward `to`
pub fn facing(from: Vec3, to: Vec3) -> Vec3 {
    let flat = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    flat.try_normalize().unwrap_or(Vec3::Z)
}
