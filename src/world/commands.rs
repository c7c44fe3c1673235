//! Actuation commands emitted by the core for the host to apply

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, EntityId};

/// Posture values passed to `SetPosture`
pub mod posture {
    pub const STANDING: f32 = 1.0;
    pub const CROUCHED: f32 = 0.3;
}

/// Speed values passed to `SetSpeed`
pub mod speed {
    pub const WALK: f32 = 0.5;
    pub const RUN: f32 = 1.0;
}

/// Kinds of direct interaction with a world entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractKind {
    Open,
    Search,
    Treat,
}

/// A movement or look command for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentCommand {
    MoveTo { agent: AgentId, point: Vec3 },
    Stop { agent: AgentId },
    SetPosture { agent: AgentId, value: f32 },
    SetSpeed { agent: AgentId, value: f32 },
    LookAt { agent: AgentId, direction: Vec3 },
    Interact { agent: AgentId, entity: EntityId, kind: InteractKind },
    /// Remove the agent from the world through an extraction point
    Extract { agent: AgentId },
}

impl AgentCommand {
    pub fn agent(&self) -> AgentId {
        match self {
            AgentCommand::MoveTo { agent, .. }
            | AgentCommand::Stop { agent }
            | AgentCommand::SetPosture { agent, .. }
            | AgentCommand::SetSpeed { agent, .. }
            | AgentCommand::LookAt { agent, .. }
            | AgentCommand::Interact { agent, .. }
            | AgentCommand::Extract { agent } => *agent,
        }
    }
}

/// Commands collected during one tick, drained by the host afterwards
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    commands: Vec<AgentCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: AgentCommand) {
        self.commands.push(command);
    }

    pub fn move_to(&mut self, agent: AgentId, point: Vec3) {
        self.push(AgentCommand::MoveTo { agent, point });
    }

    pub fn stop(&mut self, agent: AgentId) {
        self.push(AgentCommand::Stop { agent });
    }

    pub fn set_posture(&mut self, agent: AgentId, value: f32) {
        self.push(AgentCommand::SetPosture { agent, value });
    }

    pub fn set_speed(&mut self, agent: AgentId, value: f32) {
        self.push(AgentCommand::SetSpeed { agent, value });
    }

    pub fn look_at(&mut self, agent: AgentId, direction: Vec3) {
        self.push(AgentCommand::LookAt { agent, direction });
    }

    pub fn interact(&mut self, agent: AgentId, entity: EntityId, kind: InteractKind) {
        self.push(AgentCommand::Interact {
            agent,
            entity,
            kind,
        });
    }

    pub fn drain(&mut self) -> Vec<AgentCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
