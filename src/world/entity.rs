//! Snapshots of world entities and points of interest

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, ItemId, ItemInfo};

/// Category of an interactable world entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Body of a dead actor; items are taken from its equipment
    Corpse,
    /// Closed storage that must be opened before its items are visible
    Container,
    /// A single item lying on the ground
    LooseItem,
    /// Anything else the spatial query returns (doors, props, living actors)
    Other,
}

/// Read-only snapshot of a world entity returned by spatial queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
    /// Items the entity holds. For a loose item this is the item itself.
    pub items: Vec<ItemInfo>,
}

impl WorldEntity {
    pub fn new(kind: EntityKind, position: Vec3) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            position,
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<ItemInfo>) -> Self {
        self.items = items;
        self
    }

    /// Estimated worth of interacting with this entity
    pub fn total_value(&self) -> f32 {
        self.items.iter().map(|i| i.value.max(0.0)).sum()
    }
}

/// Kind of point of interest used when generating objectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    /// Somewhere worth visiting
    Landmark,
    /// An area worth sweeping on foot
    Patrol,
    /// A spot where an item is expected to be found
    Cache,
    /// A spot where an item must be planted
    DropPoint,
    /// Exit from the world
    Extract,
}

/// A named point of interest supplied by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub kind: ZoneKind,
    pub position: Vec3,
    pub radius: f32,
    /// Hostile zones are only assigned to combat-capable agents
    pub hostile: bool,
    /// Item to find at a cache or to plant at a drop point
    pub item: Option<ItemId>,
}

impl Zone {
    pub fn new(name: impl Into<String>, kind: ZoneKind, position: Vec3, radius: f32) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            radius,
            hostile: false,
            item: None,
        }
    }

    pub fn hostile(mut self) -> Self {
        self.hostile = true;
        self
    }

    pub fn with_item(mut self, item: ItemId) -> Self {
        self.item = Some(item);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_value_ignores_negative_items() {
        let entity = WorldEntity::new(EntityKind::Corpse, Vec3::ZERO).with_items(vec![
            ItemInfo::new(10.0, 1.0),
            ItemInfo::new(-5.0, 1.0),
            ItemInfo::new(2.5, 1.0),
        ]);
        assert_eq!(entity.total_value(), 12.5);
    }
}
