//! Matching asynchronous spawn reports to the members a mission asked for

use ahash::AHashSet;

use crate::core::types::{AgentId, AgentRole};
use crate::mission::roster::MemberRole;

/// Open while a mission is spawning.
///
/// Agents that existed before the request and roles nobody asked for are
/// ignored. Requested members that only show up after the window closed are
/// still owed by the request; `claim_late` hands them back for despawning.
#[derive(Debug, Clone, Default)]
pub struct SpawnCorrelation {
    known: AHashSet<AgentId>,
    lead_remaining: usize,
    support_remaining: usize,
    open: bool,
}

impl SpawnCorrelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the identities that already exist and start accepting reports
    pub fn open(&mut self, existing: impl IntoIterator<Item = AgentId>, leads: usize, supports: usize) {
        self.known = existing.into_iter().collect();
        self.lead_remaining = leads;
        self.support_remaining = supports;
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// All requested members are accounted for
    pub fn is_satisfied(&self) -> bool {
        self.lead_remaining == 0 && self.support_remaining == 0
    }

    /// Classify a spawn report; `None` means it is not ours
    pub fn accept(&mut self, agent: AgentId, role: AgentRole) -> Option<MemberRole> {
        if !self.open || self.known.contains(&agent) {
            return None;
        }
        let member_role = match role {
            AgentRole::Medic if self.lead_remaining > 0 => {
                self.lead_remaining -= 1;
                MemberRole::Lead
            }
            AgentRole::Guard if self.support_remaining > 0 => {
                self.support_remaining -= 1;
                MemberRole::Support
            }
            _ => return None,
        };
        self.known.insert(agent);
        Some(member_role)
    }

    /// A requested member reported after the window closed. Each outstanding
    /// request is claimed at most once.
    pub fn claim_late(&mut self, agent: AgentId, role: AgentRole) -> bool {
        if self.open || self.known.contains(&agent) {
            return false;
        }
        let owed = match role {
            AgentRole::Medic => &mut self.lead_remaining,
            AgentRole::Guard => &mut self.support_remaining,
            _ => return false,
        };
        if *owed == 0 {
            return false;
        }
        *owed -= 1;
        self.known.insert(agent);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preexisting_agents_ignored() {
        let old = AgentId::new();
        let mut correlation = SpawnCorrelation::new();
        correlation.open([old], 1, 1);
        assert_eq!(correlation.accept(old, AgentRole::Medic), None);

        let fresh = AgentId::new();
        assert_eq!(correlation.accept(fresh, AgentRole::Medic), Some(MemberRole::Lead));
        // Same identity reported twice
        assert_eq!(correlation.accept(fresh, AgentRole::Medic), None);
    }

    #[test]
    fn test_unrequested_roles_and_surplus_ignored() {
        let mut correlation = SpawnCorrelation::new();
        correlation.open([], 1, 1);
        assert_eq!(correlation.accept(AgentId::new(), AgentRole::Civilian), None);
        assert_eq!(correlation.accept(AgentId::new(), AgentRole::Guard), Some(MemberRole::Support));
        assert_eq!(correlation.accept(AgentId::new(), AgentRole::Guard), None);
        assert!(!correlation.is_satisfied());
        assert_eq!(correlation.accept(AgentId::new(), AgentRole::Medic), Some(MemberRole::Lead));
        assert!(correlation.is_satisfied());
    }

    #[test]
    fn test_closed_window_ignores_reports() {
        let mut correlation = SpawnCorrelation::new();
        correlation.open([], 1, 0);
        correlation.close();
        assert_eq!(correlation.accept(AgentId::new(), AgentRole::Medic), None);
    }

    #[test]
    fn test_late_report_claimed_once_per_outstanding_member() {
        let old = AgentId::new();
        let mut correlation = SpawnCorrelation::new();
        correlation.open([old], 1, 2);
        assert_eq!(correlation.accept(AgentId::new(), AgentRole::Guard), Some(MemberRole::Support));

        // Still open: nothing is late yet
        let early = AgentId::new();
        assert!(!correlation.claim_late(early, AgentRole::Guard));
        correlation.close();

        let straggler = AgentId::new();
        assert!(correlation.claim_late(straggler, AgentRole::Guard));
        assert!(!correlation.claim_late(straggler, AgentRole::Guard));
        assert!(!correlation.claim_late(AgentId::new(), AgentRole::Guard));
        assert!(!correlation.claim_late(old, AgentRole::Medic));
        assert!(!correlation.claim_late(AgentId::new(), AgentRole::Civilian));
        assert!(correlation.claim_late(AgentId::new(), AgentRole::Medic));
        assert!(correlation.is_satisfied());
    }
}
