//! Mutual non-hostility between squad members and their patient

use ahash::AHashSet;

use crate::core::types::{AgentId, EntityId};
use crate::world::{Participant, SquadServices};

/// Links already established this mission, stored with the smaller side first
#[derive(Debug, Clone, Default)]
pub struct Allegiance {
    linked: AHashSet<(Participant, Participant)>,
}

impl Allegiance {
    pub fn new() -> Self {
        Self::default()
    }

    fn ordered(a: Participant, b: Participant) -> (Participant, Participant) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn is_linked(&self, a: Participant, b: Participant) -> bool {
        self.linked.contains(&Self::ordered(a, b))
    }

    /// Returns true if a new link was requested from the host
    pub fn link(&mut self, services: &dyn SquadServices, a: Participant, b: Participant) -> bool {
        if a == b || !self.linked.insert(Self::ordered(a, b)) {
            return false;
        }
        services.set_non_hostile(a, b);
        true
    }

    /// Link a newly captured member with the patient and every current member
    pub fn admit(
        &mut self,
        services: &dyn SquadServices,
        agent: AgentId,
        patient: EntityId,
        members: &[AgentId],
    ) -> usize {
        let newcomer = Participant::Agent(agent);
        let mut created = usize::from(self.link(services, newcomer, Participant::Entity(patient)));
        for other in members {
            created += usize::from(self.link(services, newcomer, Participant::Agent(*other)));
        }
        created
    }

    /// Full pairwise pass over the final roster; catches anything missed while spawning
    pub fn reconcile(&mut self, services: &dyn SquadServices, patient: EntityId, members: &[AgentId]) -> usize {
        let mut created = 0;
        for (i, agent) in members.iter().enumerate() {
            created += usize::from(self.link(
                services,
                Participant::Agent(*agent),
                Participant::Entity(patient),
            ));
            for other in &members[i + 1..] {
                created += usize::from(self.link(
                    services,
                    Participant::Agent(*agent),
                    Participant::Agent(*other),
                ));
            }
        }
        if created > 0 {
            tracing::debug!(created, "allegiance reconciliation added links");
        }
        created
    }

    pub fn len(&self) -> usize {
        self.linked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.linked.is_empty()
    }

    pub fn clear(&mut self) {
        self.linked.clear();
    }
}
