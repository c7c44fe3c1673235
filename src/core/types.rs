//! Core type definitions used throughout the codebase

use derive_more::Display;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Simulated time in seconds since the session started
pub type Seconds = f32;

/// Unique identifier for agents (simulated actors controlled by this crate)
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for world entities (corpses, containers, loose items, patients)
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<AgentId> for EntityId {
    /// Agents are world entities too; a dead agent's body keeps its identity.
    fn from(agent: AgentId) -> Self {
        Self(agent.0)
    }
}

/// Unique identifier for inventory items
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Faction tag; agents of the same faction are friendly by default
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u16);

/// What kind of actor an agent is
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    /// Armed agent that can fight and take risks
    Combatant,
    /// Non-combat agent; avoids hostile objectives
    Civilian,
    /// Squad lead that performs treatment during a mission
    Medic,
    /// Squad support that holds the perimeter during a mission
    Guard,
}

impl AgentRole {
    pub fn is_combat_capable(&self) -> bool {
        matches!(self, AgentRole::Combatant | AgentRole::Guard)
    }
}

/// Everything the core can observe about an agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: AgentId,
    pub position: Vec3,
    pub alive: bool,
    pub faction: FactionId,
    pub role: AgentRole,
    /// Free inventory space in item-size units
    pub free_space: f32,
}

/// An item as seen inside a corpse, container or lying loose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: ItemId,
    pub value: f32,
    /// Inventory space the item occupies (always > 0 for real items)
    pub size: f32,
}

impl ItemInfo {
    pub fn new(value: f32, size: f32) -> Self {
        Self {
            id: ItemId::new(),
            value,
            size,
        }
    }

    /// Value per unit of inventory space
    pub fn density(&self) -> f32 {
        if self.size > 0.0 {
            self.value / self.size
        } else {
            self.value
        }
    }
}

/// Distance on the horizontal plane; navigation ignores height differences
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_equality() {
        let a = AgentId::new();
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, AgentId::new());
    }

    #[test]
    fn test_agent_and_entity_share_identity() {
        let agent = AgentId::new();
        let entity: EntityId = agent.into();
        assert_eq!(entity.0, agent.0);
    }

    #[test]
    fn test_item_density() {
        let item = ItemInfo::new(100.0, 4.0);
        assert_eq!(item.density(), 25.0);
    }

    #[test]
    fn test_role_combat_capability() {
        assert!(AgentRole::Combatant.is_combat_capable());
        assert!(AgentRole::Guard.is_combat_capable());
        assert!(!AgentRole::Civilian.is_combat_capable());
        assert!(!AgentRole::Medic.is_combat_capable());
    }

    #[test]
    fn test_flat_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 50.0, 4.0);
        assert_eq!(flat_distance(a, b), 5.0);
    }
}
