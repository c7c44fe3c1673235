//! Goal descriptors handed from behavior layers to the task executor

use derive_more::Display;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::config::TaskConfig;
use crate::core::types::{EntityId, ItemId, Seconds};

/// One variant per task state machine
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalKind {
    LootCorpse,
    OpenContainer,
    PickUpItem,
    TravelTo,
    Explore,
    SearchForItem,
    PlaceItem,
    Extract,
    MoveToPatient,
    HoldPerimeter,
    HealPatient,
    Retreat,
    Pause,
}

impl GoalKind {
    /// Wall-clock budget after which the task gives up
    pub fn budget(&self, config: &TaskConfig) -> Seconds {
        match self {
            GoalKind::LootCorpse => config.loot_timeout,
            GoalKind::OpenContainer => config.container_timeout,
            GoalKind::PickUpItem => config.pickup_timeout,
            GoalKind::TravelTo => config.travel_timeout,
            GoalKind::Explore => config.explore_timeout,
            GoalKind::SearchForItem => config.search_timeout,
            GoalKind::PlaceItem => config.place_timeout,
            GoalKind::Extract => config.extract_timeout,
            GoalKind::MoveToPatient => config.escort_timeout,
            GoalKind::HoldPerimeter => config.hold_timeout,
            GoalKind::HealPatient => config.heal_timeout,
            GoalKind::Retreat => config.retreat_timeout,
            // Pauses end on their own duration; the budget is only a backstop
            GoalKind::Pause => config.pause_duration * 4.0,
        }
    }
}

/// A high-level intent for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub kind: GoalKind,
    pub target_position: Vec3,
    pub completion_radius: f32,
    /// Higher runs first; ties keep insertion order
    pub priority: i32,
    pub completed: bool,
    pub item: Option<ItemId>,
    /// Entity the goal is about: the corpse, container, loose item or patient
    pub entity: Option<EntityId>,
    /// Ordered points to sweep for explore and search goals
    pub waypoints: Vec<Vec3>,
    /// Direction to face while holding a position
    pub facing: Option<Vec3>,
    /// Human-readable origin, e.g. the zone name
    pub label: String,
}

impl Goal {
    pub fn new(kind: GoalKind, target_position: Vec3) -> Self {
        Self {
            kind,
            target_position,
            completion_radius: 1.5,
            priority: 0,
            completed: false,
            item: None,
            entity: None,
            waypoints: Vec::new(),
            facing: None,
            label: String::new(),
        }
    }

    /// Low-cost placeholder that keeps a layer in control while it waits
    pub fn pause(at: Vec3) -> Self {
        Self::new(GoalKind::Pause, at).with_label("pause")
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.completion_radius = radius;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_item(mut self, item: ItemId) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Vec3>) -> Self {
        self.waypoints = waypoints;
        self
    }

    pub fn with_facing(mut self, facing: Vec3) -> Self {
        self.facing = Some(facing);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// What a behavior layer returns from `next_action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub goal: Goal,
    pub reason: String,
}

impl ActionDescriptor {
    pub fn new(goal: Goal, reason: impl Into<String>) -> Self {
        Self {
            goal,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> GoalKind {
        self.goal.kind
    }
}
