//! Exclusive target claims shared by every agent of a director
//!
//! A target is held by at most one agent and an agent holds at most one
//! target. Both directions are indexed so release by either side is O(1).

use ahash::AHashMap;

use crate::core::error::ClaimError;
use crate::core::types::{AgentId, EntityId};

#[derive(Debug, Clone, Default)]
pub struct ClaimRegistry {
    by_target: AHashMap<EntityId, AgentId>,
    by_agent: AHashMap<AgentId, EntityId>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `target` for `agent`. Re-claiming a target the agent already holds succeeds.
    pub fn try_claim(&mut self, agent: AgentId, target: EntityId) -> Result<(), ClaimError> {
        if let Some(&owner) = self.by_target.get(&target) {
            if owner == agent {
                return Ok(());
            }
            return Err(ClaimError::AlreadyClaimed { target, owner });
        }
        if let Some(&held) = self.by_agent.get(&agent) {
            return Err(ClaimError::AgentHoldsClaim { agent, held });
        }
        self.by_target.insert(target, agent);
        self.by_agent.insert(agent, target);
        Ok(())
    }

    /// Release whatever `agent` holds
    pub fn release_agent(&mut self, agent: AgentId) -> Option<EntityId> {
        let target = self.by_agent.remove(&agent)?;
        self.by_target.remove(&target);
        Some(target)
    }

    /// Release `target` only if `agent` is its owner
    pub fn release(&mut self, agent: AgentId, target: EntityId) -> bool {
        if self.by_target.get(&target) != Some(&agent) {
            return false;
        }
        self.by_target.remove(&target);
        self.by_agent.remove(&agent);
        true
    }

    pub fn owner_of(&self, target: EntityId) -> Option<AgentId> {
        self.by_target.get(&target).copied()
    }

    pub fn held_by(&self, agent: AgentId) -> Option<EntityId> {
        self.by_agent.get(&agent).copied()
    }

    /// True if someone other than `agent` holds `target`
    pub fn is_claimed_by_other(&self, target: EntityId, agent: AgentId) -> bool {
        matches!(self.by_target.get(&target), Some(owner) if *owner != agent)
    }

    /// Drop claims whose owner no longer passes `keep`; returns released pairs
    pub fn retain_owners(&mut self, mut keep: impl FnMut(AgentId) -> bool) -> Vec<(AgentId, EntityId)> {
        let dropped: Vec<(AgentId, EntityId)> = self
            .by_agent
            .iter()
            .filter(|(agent, _)| !keep(**agent))
            .map(|(agent, target)| (*agent, *target))
            .collect();
        for (agent, target) in &dropped {
            self.by_agent.remove(agent);
            self.by_target.remove(target);
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_agent_cannot_claim() {
        let mut claims = ClaimRegistry::new();
        let a = AgentId::new();
        let b = AgentId::new();
        let target = EntityId::new();

        assert!(claims.try_claim(a, target).is_ok());
        assert_eq!(
            claims.try_claim(b, target),
            Err(ClaimError::AlreadyClaimed { target, owner: a })
        );
        assert_eq!(claims.owner_of(target), Some(a));
    }

    #[test]
    fn test_agent_holds_one_claim() {
        let mut claims = ClaimRegistry::new();
        let a = AgentId::new();
        let first = EntityId::new();
        let second = EntityId::new();

        claims.try_claim(a, first).unwrap();
        assert_eq!(
            claims.try_claim(a, second),
            Err(ClaimError::AgentHoldsClaim { agent: a, held: first })
        );
        assert!(claims.try_claim(a, first).is_ok());
    }

    #[test]
    fn test_release_only_by_owner() {
        let mut claims = ClaimRegistry::new();
        let a = AgentId::new();
        let b = AgentId::new();
        let target = EntityId::new();
        claims.try_claim(a, target).unwrap();

        assert!(!claims.release(b, target));
        assert!(claims.release(a, target));
        assert!(claims.is_empty());
        assert!(claims.try_claim(b, target).is_ok());
    }

    #[test]
    fn test_retain_owners_drops_dead_agents() {
        let mut claims = ClaimRegistry::new();
        let alive = AgentId::new();
        let dead = AgentId::new();
        claims.try_claim(alive, EntityId::new()).unwrap();
        let lost = EntityId::new();
        claims.try_claim(dead, lost).unwrap();

        let dropped = claims.retain_owners(|agent| agent == alive);
        assert_eq!(dropped, vec![(dead, lost)]);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims.owner_of(lost), None);
    }
}
