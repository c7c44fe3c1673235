//! Squad membership: one lead, the rest support

use derive_more::Display;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Seconds};

/// Mission phases in order; `Dismissing` always returns to `Idle`
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MissionPhase {
    #[default]
    Idle,
    Spawning,
    MovingToPosition,
    Defending,
    Treating,
    Retreating,
    Dismissing,
}

/// Sub-steps of the treating phase
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreatStage {
    Preparing,
    /// The treatment effect is applied exactly once on entering this stage
    Applying,
    Holding,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberRole {
    /// Performs the treatment
    Lead,
    /// Holds the perimeter
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub agent: AgentId,
    pub role: MemberRole,
    pub slot: Vec3,
    pub retreat_point: Vec3,
    pub joined_at: Seconds,
}

/// Ordered by join time; promotion picks the earliest surviving support
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. A second lead is demoted to support.
    pub fn add(&mut self, agent: AgentId, role: MemberRole, at: Seconds, position: Vec3) -> Option<MemberRole> {
        if self.contains(agent) {
            return None;
        }
        let role = if role == MemberRole::Lead && self.lead().is_some() {
            MemberRole::Support
        } else {
            role
        };
        self.members.push(Member {
            agent,
            role,
            slot: position,
            retreat_point: position,
            joined_at: at,
        });
        Some(role)
    }

    pub fn remove(&mut self, agent: AgentId) -> Option<Member> {
        let index = self.members.iter().position(|m| m.agent == agent)?;
        Some(self.members.remove(index))
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.members.iter().any(|m| m.agent == agent)
    }

    pub fn get(&self, agent: AgentId) -> Option<&Member> {
        self.members.iter().find(|m| m.agent == agent)
    }

    pub fn get_mut(&mut self, agent: AgentId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.agent == agent)
    }

    pub fn lead(&self) -> Option<&Member> {
        self.members.iter().find(|m| m.role == MemberRole::Lead)
    }

    /// Promote the earliest-joined support member when there is no lead
    pub fn promote_next(&mut self) -> Option<AgentId> {
        if self.lead().is_some() {
            return None;
        }
        let next = self.members.iter_mut().find(|m| m.role == MemberRole::Support)?;
        next.role = MemberRole::Lead;
        Some(next.agent)
    }

    pub fn agents(&self) -> Vec<AgentId> {
        self.members.iter().map(|m| m.agent).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Member> {
        self.members.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
