//! Bot configuration with documented defaults
//!
//! Every tunable radius, timeout and cooldown is collected here. The host may
//! reload the configuration at any time: components receive `&BotConfig` on
//! every poll and never keep a copy.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::ConfigError;
use crate::core::types::Seconds;

/// Target scanning and claim tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Radius of the spatial query around the agent (world units)
    pub scan_radius: f32,
    /// Minimum time between two scans by the same agent
    pub rescan_interval: Seconds,
    /// Distances below this are treated as this value when scoring
    ///
    /// Keeps targets at the agent's feet from producing huge priorities.
    pub distance_floor: f32,
    /// Upper bound on any computed priority
    pub priority_ceiling: f32,
    /// Minimum time between two invalidation sweeps
    pub cleanup_interval: Seconds,
    /// Maximum number of exclusion entries per agent
    pub exclusion_capacity: usize,
    /// Exclusion entries older than this are dropped during cleanup
    pub exclusion_ttl: Seconds,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            scan_radius: 40.0,
            rescan_interval: 4.0,
            distance_floor: 1.0,
            priority_ceiling: 10_000.0,
            cleanup_interval: 10.0,
            exclusion_capacity: 64,
            exclusion_ttl: 600.0,
        }
    }
}

/// Looting domain toggles and pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LootingConfig {
    pub enabled: bool,
    pub loot_corpses: bool,
    pub loot_containers: bool,
    pub loot_loose_items: bool,
    /// Targets whose estimated value is below this are ignored
    pub min_value: f32,
    /// Pause after each completed target
    pub cooldown: Seconds,
    /// Maximum targets looted per rolling window
    pub max_actions_per_window: u32,
    pub window: Seconds,
    /// Seconds since a sensed threat during which looting stays off
    pub combat_grace: Seconds,
}

impl Default for LootingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            loot_corpses: true,
            loot_containers: true,
            loot_loose_items: true,
            min_value: 1.0,
            cooldown: 4.0,
            max_actions_per_window: 12,
            window: 600.0,
            combat_grace: 20.0,
        }
    }
}

/// Questing domain toggles and objective generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestingConfig {
    pub enabled: bool,
    /// Objectives generated per agent before the final extract
    pub objectives_per_agent: usize,
    /// After this long an agent abandons remaining objectives and extracts
    pub raid_duration: Seconds,
    pub completion_radius: f32,
    /// Waypoints visited by an explore objective
    pub explore_waypoints: usize,
    pub explore_radius: f32,
    pub search_radius: f32,
    pub cooldown: Seconds,
    pub max_actions_per_window: u32,
    pub window: Seconds,
    pub combat_grace: Seconds,
}

impl Default for QuestingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            objectives_per_agent: 4,
            raid_duration: 1800.0,
            completion_radius: 3.0,
            explore_waypoints: 3,
            explore_radius: 25.0,
            search_radius: 20.0,
            cooldown: 2.0,
            max_actions_per_window: 30,
            window: 600.0,
            combat_grace: 30.0,
        }
    }
}

/// Per-task budgets and shared navigation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub loot_timeout: Seconds,
    pub container_timeout: Seconds,
    pub pickup_timeout: Seconds,
    pub travel_timeout: Seconds,
    pub explore_timeout: Seconds,
    pub search_timeout: Seconds,
    pub place_timeout: Seconds,
    pub extract_timeout: Seconds,
    pub escort_timeout: Seconds,
    pub hold_timeout: Seconds,
    pub heal_timeout: Seconds,
    pub retreat_timeout: Seconds,
    /// Length of the low-cost pause goal used during cooldowns
    pub pause_duration: Seconds,
    /// How often a move command is re-issued while navigating
    pub reissue_interval: Seconds,
    /// Minimum distance improvement between re-issues to count as progress
    pub min_progress: f32,
    /// Consecutive re-issues without progress before a task gives up
    pub max_strikes: u32,
    pub arrive_radius: f32,
    /// How far a searching agent notices the item it is looking for
    pub search_sense_radius: f32,
    /// Safety net for inventory requests whose completion never arrives
    pub op_timeout: Seconds,
    pub settle_delay: Seconds,
    pub open_delay: Seconds,
    pub plant_duration: Seconds,
    pub extract_hold: Seconds,
    pub hold_duration: Seconds,
    pub kneel_delay: Seconds,
    pub treat_duration: Seconds,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            loot_timeout: 45.0,
            container_timeout: 45.0,
            pickup_timeout: 30.0,
            travel_timeout: 60.0,
            explore_timeout: 60.0,
            search_timeout: 60.0,
            place_timeout: 45.0,
            extract_timeout: 60.0,
            escort_timeout: 60.0,
            hold_timeout: 60.0,
            heal_timeout: 60.0,
            retreat_timeout: 45.0,
            pause_duration: 3.0,
            reissue_interval: 2.0,
            min_progress: 0.5,
            max_strikes: 3,
            arrive_radius: 1.5,
            search_sense_radius: 10.0,
            op_timeout: 5.0,
            settle_delay: 1.0,
            open_delay: 1.5,
            plant_duration: 4.0,
            extract_hold: 8.0,
            hold_duration: 30.0,
            kneel_delay: 1.5,
            treat_duration: 10.0,
        }
    }
}

/// Mission difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Members spawned per mission for a configured base team size
    pub fn team_size(&self, base: usize) -> usize {
        match self {
            Difficulty::Easy => base + 1,
            Difficulty::Normal => base,
            Difficulty::Hard => base.saturating_sub(1).max(1),
        }
    }

    /// Multiplier applied to the configured treatment amount
    pub fn treatment_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Normal => 0.8,
            Difficulty::Hard => 0.5,
        }
    }
}

/// Squad mission tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub enabled: bool,
    pub difficulty: Difficulty,
    /// Base team size including the lead
    pub team_size: usize,
    /// Faction tag given to spawned squad members
    pub squad_faction: u16,
    pub cooldown: Seconds,
    pub spawn_timeout: Seconds,
    /// Distance from the patient at which the squad is spawned
    pub spawn_distance: f32,
    pub move_timeout: Seconds,
    pub arrival_radius: f32,
    pub perimeter_radius: f32,
    pub perimeter_setup_delay: Seconds,
    pub treat_range: f32,
    pub defend_timeout: Seconds,
    pub prep_delay: Seconds,
    pub completion_hold: Seconds,
    pub treat_safety_cap: Seconds,
    pub treatment_amount: f32,
    pub retreat_radius: f32,
    pub retreat_timeout: Seconds,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            difficulty: Difficulty::Normal,
            team_size: 4,
            squad_faction: 900,
            cooldown: 300.0,
            spawn_timeout: 20.0,
            spawn_distance: 60.0,
            move_timeout: 90.0,
            arrival_radius: 4.0,
            perimeter_radius: 8.0,
            perimeter_setup_delay: 5.0,
            treat_range: 2.5,
            defend_timeout: 45.0,
            prep_delay: 3.0,
            completion_hold: 5.0,
            treat_safety_cap: 60.0,
            treatment_amount: 100.0,
            retreat_radius: 30.0,
            retreat_timeout: 40.0,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub targeting: TargetingConfig,
    pub looting: LootingConfig,
    pub questing: QuestingConfig,
    pub tasks: TaskConfig,
    pub mission: MissionConfig,
}

impl BotConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject values that would break invariants downstream
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targeting.exclusion_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "targeting.exclusion_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.targeting.distance_floor > 0.0) {
            return Err(ConfigError::Invalid {
                field: "targeting.distance_floor",
                reason: "must be positive".to_string(),
            });
        }
        if !(self.targeting.priority_ceiling > 0.0) {
            return Err(ConfigError::Invalid {
                field: "targeting.priority_ceiling",
                reason: "must be positive".to_string(),
            });
        }
        if self.mission.team_size == 0 {
            return Err(ConfigError::Invalid {
                field: "mission.team_size",
                reason: "a mission needs at least its lead".to_string(),
            });
        }
        if self.mission.retreat_radius <= self.mission.perimeter_radius {
            return Err(ConfigError::Invalid {
                field: "mission.retreat_radius",
                reason: format!(
                    "must exceed perimeter_radius ({})",
                    self.mission.perimeter_radius
                ),
            });
        }
        if self.tasks.max_strikes == 0 {
            return Err(ConfigError::Invalid {
                field: "tasks.max_strikes",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
