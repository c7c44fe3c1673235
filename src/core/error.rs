use thiserror::Error;

use crate::core::types::{AgentId, EntityId};

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Agent {0} is not registered with the director")]
    AgentNotRegistered(AgentId),

    #[error("Missing required state in {site}: {detail}")]
    MissingState { site: &'static str, detail: String },

    #[error("Claim error: {0}")]
    Claim(#[from] ClaimError),

    #[error("Mission error: {0}")]
    Mission(#[from] MissionError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl BotError {
    pub fn missing(site: &'static str, detail: impl Into<String>) -> Self {
        Self::MissingState {
            site,
            detail: detail.into(),
        }
    }
}

/// Failures of the shared claim registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Target {target} is already claimed by {owner}")]
    AlreadyClaimed { target: EntityId, owner: AgentId },

    #[error("Agent {agent} already holds a claim on {held}")]
    AgentHoldsClaim { agent: AgentId, held: EntityId },
}

/// Reasons a mission request or mission operation is refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MissionError {
    #[error("A mission is already in flight")]
    AlreadyActive,

    #[error("Mission cooldown has {remaining:.1}s remaining")]
    CoolingDown { remaining: f32 },

    #[error("Patient {0} is dead or inaccessible")]
    PatientUnavailable(EntityId),

    #[error("Patient {0} does not need treatment")]
    PatientHealthy(EntityId),

    #[error("Mission subsystem is disabled")]
    Disabled,

    #[error("Spawn request failed: {0}")]
    SpawnFailed(String),
}

/// Failures reported by the optional awareness module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Awareness module is not available")]
    Unavailable,

    #[error("Awareness call failed: {0}")]
    CallFailed(String),
}

/// Configuration loading and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, BotError>;
