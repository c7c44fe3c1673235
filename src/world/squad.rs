//! Host services used by the squad mission controller

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::error::MissionError;
use crate::core::types::{AgentId, AgentRole, EntityId, FactionId};

/// Ask the host to spawn `count` agents of `role` near `position`.
///
/// Spawned agents are reported back asynchronously through the mission inbox.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub role: AgentRole,
    pub count: usize,
    pub position: Vec3,
    pub faction: FactionId,
}

/// Either side of an allegiance link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Participant {
    Agent(AgentId),
    Entity(EntityId),
}

/// What the host reports about the mission's patient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientStatus {
    pub position: Vec3,
    pub alive: bool,
    /// False when the patient left the world or can no longer be reached
    pub accessible: bool,
    pub needs_treatment: bool,
}

/// Effect applied to the patient during the treating phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreatmentEffect {
    pub amount: f32,
}

/// Spawning, relationships and effects; all calls are fire-and-forget
pub trait SquadServices {
    fn request_spawn(&self, request: SpawnRequest) -> Result<(), MissionError>;

    fn despawn(&self, agent: AgentId);

    /// Teleport a straggler; used when movement phases time out
    fn relocate(&self, agent: AgentId, point: Vec3);

    /// Make `a` and `b` mutually non-hostile
    fn set_non_hostile(&self, a: Participant, b: Participant);

    fn apply_treatment(&self, patient: EntityId, effect: TreatmentEffect);

    fn patient_status(&self, patient: EntityId) -> Option<PatientStatus>;
}
