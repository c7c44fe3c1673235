//! Shared service object around the mission controller

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::config::MissionConfig;
use crate::core::error::MissionError;
use crate::core::types::{AgentId, EntityId, Seconds};
use crate::events::{BotEvent, BotEventKind};
use crate::mission::controller::{MissionController, MissionSnapshot};
use crate::mission::inbox::MissionInbox;
use crate::mission::roster::{MemberRole, MissionPhase};
use crate::world::{SquadServices, WorldFacade};

/// Cloneable handle; the controller state and the inbox sit behind separate locks.
///
/// Callbacks post into the inbox, which never waits on the state lock, so a
/// report delivered while a tick is running cannot deadlock.
#[derive(Debug, Clone, Default)]
pub struct MissionHandle {
    state: Arc<Mutex<MissionController>>,
    inbox: MissionInbox,
}

impl MissionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inbox the host posts spawn and death reports into
    pub fn inbox(&self) -> MissionInbox {
        self.inbox.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MissionController> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn request_mission(
        &self,
        patient: EntityId,
        world: &dyn WorldFacade,
        services: &dyn SquadServices,
        config: &MissionConfig,
        now: Seconds,
    ) -> Result<(), MissionError> {
        let mut controller = self.lock();
        let result = controller.request(patient, world, services, config, now);
        if let Err(err) = &result {
            tracing::info!(%patient, reason = %err, "mission request rejected");
            controller.push_event(
                now,
                BotEventKind::MissionRejected {
                    patient,
                    reason: err.to_string(),
                },
            );
        }
        result
    }

    /// Advance the mission once. Internal failures are logged and leave the phase unchanged.
    pub fn tick(&self, world: &dyn WorldFacade, services: &dyn SquadServices, config: &MissionConfig, now: Seconds) {
        let pending = self.inbox.drain();
        let mut controller = self.lock();
        if let Err(err) = controller.tick(pending, world, services, config, now) {
            tracing::error!(site = "mission.tick", error = %err, "mission tick failed");
            controller.push_event(
                now,
                BotEventKind::InvariantViolation {
                    agent: None,
                    site: "mission.tick".to_string(),
                    detail: err.to_string(),
                },
            );
        }
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        self.lock().snapshot()
    }

    pub fn phase(&self) -> MissionPhase {
        self.lock().phase()
    }

    pub fn role_of(&self, agent: AgentId) -> Option<MemberRole> {
        self.lock().role_of(agent)
    }

    pub fn drain_events(&self) -> Vec<BotEvent> {
        self.lock().drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;

    #[test]
    fn test_rejection_is_logged_as_event() {
        let world = SandboxWorld::new(20, 20);
        let handle = MissionHandle::new();
        let patient = EntityId::new();

        let err = handle
            .request_mission(patient, &world, &world, &MissionConfig::default(), 0.0)
            .unwrap_err();
        assert_eq!(err, MissionError::PatientUnavailable(patient));
        let events = handle.drain_events();
        assert!(matches!(
            events.as_slice(),
            [BotEvent { kind: BotEventKind::MissionRejected { .. }, .. }]
        ));
    }

    #[test]
    fn test_reports_posted_during_tick_are_kept() {
        let mut world = SandboxWorld::new(120, 120);
        let handle = MissionHandle::new();
        world.attach_mission_inbox(handle.inbox());
        let config = MissionConfig::default();
        let patient = world.add_patient(glam::Vec3::new(60.5, 0.0, 60.5), 10.0, 100.0);

        handle.request_mission(patient, &world, &world, &config, 0.0).unwrap();
        assert_eq!(handle.phase(), MissionPhase::Spawning);
        world.step(0.1);
        assert_eq!(handle.inbox().len(), 4);

        handle.tick(&world, &world, &config, 0.1);
        assert!(handle.inbox().is_empty());
        assert_eq!(handle.snapshot().members.len(), 4);
        assert_eq!(handle.phase(), MissionPhase::MovingToPosition);
        let lead = handle.snapshot().lead().map(|m| m.agent).unwrap();
        assert_eq!(handle.role_of(lead), Some(MemberRole::Lead));
    }
}
