//! Read-only world services consumed by the core

use glam::Vec3;

use crate::core::types::{AgentId, AgentView, EntityId};
use crate::world::entity::{WorldEntity, Zone};

/// Spatial lookups over entities and agents
pub trait SpatialQuery {
    /// Entities within `radius` of `point`
    fn find_nearby(&self, point: Vec3, radius: f32) -> Vec<WorldEntity>;

    /// Look up a single entity; `None` once it no longer exists
    fn entity(&self, id: EntityId) -> Option<WorldEntity>;

    fn agent(&self, id: AgentId) -> Option<AgentView>;

    /// Every agent currently present, living or dead
    fn agents(&self) -> Vec<AgentView>;

    /// Points of interest used for objective generation
    fn zones(&self) -> Vec<Zone>;
}

/// Path queries; the core never plans paths itself
pub trait Navigation {
    fn is_reachable(&self, from: Vec3, to: Vec3) -> bool {
        self.compute_path(from, to).is_some()
    }

    /// A complete path from `from` to `to`, or `None` if only a partial path exists
    fn compute_path(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>>;
}
