//! Role-generated objective list with a total order

use glam::Vec3;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::config::QuestingConfig;
use crate::core::types::{flat_distance, AgentView};
use crate::tasks::{Goal, GoalKind};
use crate::world::{Navigation, Zone, ZoneKind};

const LANDMARK_PRIORITY: i32 = 10;
const PATROL_PRIORITY: i32 = 20;
const DROP_PRIORITY: i32 = 25;
const CACHE_PRIORITY: i32 = 30;
/// Combat-capable agents favour hostile zones
const HOSTILE_BONUS: i32 = 5;
const WAYPOINT_ATTEMPTS: usize = 4;

#[derive(Debug, Clone)]
struct Entry {
    goal: Goal,
    abandoned: bool,
}

/// Objectives sorted by priority, highest first; equal priorities keep insertion order
#[derive(Debug, Clone, Default)]
pub struct ObjectiveQueue {
    entries: Vec<Entry>,
    generated: bool,
}

impl ObjectiveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, goal: Goal) {
        let pos = self
            .entries
            .iter()
            .position(|e| goal.priority > e.goal.priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            pos,
            Entry {
                goal,
                abandoned: false,
            },
        );
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn next_pending(&self) -> Option<&Goal> {
        self.entries
            .iter()
            .find(|e| !e.goal.completed && !e.abandoned)
            .map(|e| &e.goal)
    }

    /// Mark the first pending objective equal to `goal` as done
    pub fn complete(&mut self, goal: &Goal) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|e| !e.goal.completed && !e.abandoned && e.goal == *goal)
        {
            Some(entry) => {
                entry.goal.completed = true;
                true
            }
            None => false,
        }
    }

    /// Drop everything except the final extract
    pub fn abandon_all_but_extract(&mut self) -> usize {
        let mut abandoned = 0;
        for entry in &mut self.entries {
            if entry.goal.kind != GoalKind::Extract && !entry.goal.completed && !entry.abandoned {
                entry.abandoned = true;
                abandoned += 1;
            }
        }
        abandoned
    }

    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.goal.completed && !e.abandoned)
            .count()
    }

    pub fn goals(&self) -> impl Iterator<Item = &Goal> {
        self.entries.iter().map(|e| &e.goal)
    }

    /// Build objectives from the world's zones for this agent's role.
    ///
    /// Hostile zones are only given to combat-capable agents. The nearest
    /// usable extraction zone is always appended as the final objective.
    pub fn generate<R: Rng + ?Sized, N: Navigation + ?Sized>(
        &mut self,
        agent: &AgentView,
        zones: &[Zone],
        nav: &N,
        config: &QuestingConfig,
        rng: &mut R,
    ) {
        self.entries.clear();
        self.generated = true;
        let combat = agent.role.is_combat_capable();

        let mut candidates: Vec<&Zone> = zones
            .iter()
            .filter(|z| z.kind != ZoneKind::Extract && (combat || !z.hostile))
            .collect();
        candidates.shuffle(rng);

        for zone in candidates.into_iter().take(config.objectives_per_agent) {
            let mut goal = objective_for(zone, nav, config, rng);
            if zone.hostile {
                goal.priority += HOSTILE_BONUS;
            }
            self.push(goal);
        }

        let extract = zones
            .iter()
            .filter(|z| z.kind == ZoneKind::Extract && (combat || !z.hostile))
            .min_by(|a, b| {
                flat_distance(agent.position, a.position).total_cmp(&flat_distance(agent.position, b.position))
            });
        if let Some(zone) = extract {
            self.push(
                Goal::new(GoalKind::Extract, zone.position)
                    .with_radius(zone.radius.max(config.completion_radius))
                    .with_priority(i32::MIN)
                    .with_label(zone.name.clone()),
            );
        }
        tracing::debug!(
            agent = %agent.id,
            role = %agent.role,
            objectives = self.entries.len(),
            "objectives generated"
        );
    }
}

fn objective_for<R: Rng + ?Sized, N: Navigation + ?Sized>(
    zone: &Zone,
    nav: &N,
    config: &QuestingConfig,
    rng: &mut R,
) -> Goal {
    let base = |kind: GoalKind, priority: i32| {
        Goal::new(kind, zone.position)
            .with_radius(config.completion_radius)
            .with_priority(priority)
            .with_label(zone.name.clone())
    };
    match (zone.kind, zone.item) {
        (ZoneKind::Cache, Some(item)) => base(GoalKind::SearchForItem, CACHE_PRIORITY)
            .with_item(item)
            .with_waypoints(waypoints_around(zone.position, config.search_radius, config.explore_waypoints, nav, rng)),
        (ZoneKind::DropPoint, Some(item)) => base(GoalKind::PlaceItem, DROP_PRIORITY).with_item(item),
        (ZoneKind::Patrol, _) | (ZoneKind::Cache, None) => base(GoalKind::Explore, PATROL_PRIORITY)
            .with_waypoints(waypoints_around(zone.position, config.explore_radius, config.explore_waypoints, nav, rng)),
        (ZoneKind::Landmark, _) | (ZoneKind::DropPoint, None) | (ZoneKind::Extract, _) => {
            base(GoalKind::TravelTo, LANDMARK_PRIORITY)
        }
    }
}

/// Random reachable points within `radius` of `center`; falls back to the center itself
pub fn waypoints_around<R: Rng + ?Sized, N: Navigation + ?Sized>(
    center: Vec3,
    radius: f32,
    count: usize,
    nav: &N,
    rng: &mut R,
) -> Vec<Vec3> {
    let mut points = Vec::with_capacity(count);
    for _ in 0..count * WAYPOINT_ATTEMPTS {
        if points.len() == count {
            break;
        }
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = rng.gen_range(0.0..=radius.max(0.0));
        let point = center + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;
        if nav.is_reachable(center, point) {
            points.push(point);
        }
    }
    if points.is_empty() {
        points.push(center);
    }
    points
}
