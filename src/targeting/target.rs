//! Scanned candidate targets

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::config::LootingConfig;
use crate::core::types::EntityId;
use crate::world::entity::EntityKind;

/// What kind of point of interest a target is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetCategory {
    Corpse,
    Container,
    LooseItem,
}

impl TargetCategory {
    pub fn from_kind(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::Corpse => Some(TargetCategory::Corpse),
            EntityKind::Container => Some(TargetCategory::Container),
            EntityKind::LooseItem => Some(TargetCategory::LooseItem),
            EntityKind::Other => None,
        }
    }
}

/// A scored candidate produced by a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Stable identity of the underlying world entity
    pub key: EntityId,
    pub category: TargetCategory,
    pub position: Vec3,
    pub value: f32,
    pub distance: f32,
    pub priority: f32,
    /// Inventory space needed; only meaningful for loose items
    pub item_size: f32,
}

/// Which candidates a scan may return
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanFilters {
    pub corpses: bool,
    pub containers: bool,
    pub loose_items: bool,
    pub min_value: f32,
}

impl ScanFilters {
    pub fn from_config(config: &LootingConfig) -> Self {
        Self {
            corpses: config.loot_corpses,
            containers: config.loot_containers,
            loose_items: config.loot_loose_items,
            min_value: config.min_value,
        }
    }

    pub fn allows(&self, category: TargetCategory) -> bool {
        match category {
            TargetCategory::Corpse => self.corpses,
            TargetCategory::Container => self.containers,
            TargetCategory::LooseItem => self.loose_items,
        }
    }
}

impl Default for ScanFilters {
    fn default() -> Self {
        Self::from_config(&LootingConfig::default())
    }
}
