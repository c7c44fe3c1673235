//! Squad mission state machine
//!
//! Idle → Spawning → MovingToPosition → Defending → Treating → Retreating →
//! Dismissing → Idle. Every phase can abort: an inaccessible patient sends the
//! squad to Dismissing, a lost lead is replaced by the next survivor, and an
//! empty roster tears the mission down on the spot.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::config::MissionConfig;
use crate::core::error::{BotError, MissionError, Result};
use crate::core::types::{flat_distance, AgentId, AgentRole, EntityId, FactionId, Seconds};
use crate::events::{BotEvent, BotEventKind};
use crate::mission::allegiance::Allegiance;
use crate::mission::correlation::SpawnCorrelation;
use crate::mission::formation;
use crate::mission::inbox::MissionEvent;
use crate::mission::roster::{Member, MemberRole, MissionPhase, Roster, TreatStage};
use crate::world::{SpawnRequest, SquadServices, TreatmentEffect, WorldFacade};

/// Copy of the mission state handed to behavior layers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionSnapshot {
    pub phase: MissionPhase,
    pub patient: Option<EntityId>,
    pub rally: Vec3,
    pub members: Vec<Member>,
    pub treat_stage: Option<TreatStage>,
    pub cooldown_until: Seconds,
}

impl MissionSnapshot {
    pub fn member(&self, agent: AgentId) -> Option<&Member> {
        self.members.iter().find(|m| m.agent == agent)
    }

    pub fn lead(&self) -> Option<&Member> {
        self.members.iter().find(|m| m.role == MemberRole::Lead)
    }

    pub fn is_active(&self) -> bool {
        self.phase != MissionPhase::Idle
    }
}

#[derive(Debug, Default)]
pub struct MissionController {
    phase: MissionPhase,
    patient: Option<EntityId>,
    rally: Vec3,
    roster: Roster,
    correlation: SpawnCorrelation,
    allegiance: Allegiance,
    phase_started_at: Seconds,
    cooldown_until: Seconds,
    treat_stage: Option<TreatStage>,
    stage_started_at: Seconds,
    treatment_applied: bool,
    events: Vec<BotEvent>,
}

impl MissionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn role_of(&self, agent: AgentId) -> Option<MemberRole> {
        self.roster.get(agent).map(|m| m.role)
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        MissionSnapshot {
            phase: self.phase,
            patient: self.patient,
            rally: self.rally,
            members: self.roster.iter().copied().collect(),
            treat_stage: self.treat_stage,
            cooldown_until: self.cooldown_until,
        }
    }

    pub fn push_event(&mut self, at: Seconds, kind: BotEventKind) {
        self.events.push(BotEvent { at, kind });
    }

    pub fn drain_events(&mut self) -> Vec<BotEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start a mission for `patient`, or say why not. A rejection never touches a running mission.
    pub fn request(
        &mut self,
        patient: EntityId,
        world: &dyn WorldFacade,
        services: &dyn SquadServices,
        config: &MissionConfig,
        now: Seconds,
    ) -> std::result::Result<(), MissionError> {
        if !config.enabled {
            return Err(MissionError::Disabled);
        }
        if self.phase != MissionPhase::Idle {
            return Err(MissionError::AlreadyActive);
        }
        if now < self.cooldown_until {
            return Err(MissionError::CoolingDown {
                remaining: self.cooldown_until - now,
            });
        }
        let status = services
            .patient_status(patient)
            .ok_or(MissionError::PatientUnavailable(patient))?;
        if !status.alive || !status.accessible {
            return Err(MissionError::PatientUnavailable(patient));
        }
        if !status.needs_treatment {
            return Err(MissionError::PatientHealthy(patient));
        }

        let team = config.difficulty.team_size(config.team_size);
        let supports = team.saturating_sub(1);
        self.correlation
            .open(world.agents().into_iter().map(|a| a.id), 1, supports);
        self.patient = Some(patient);
        self.rally = status.position;
        self.roster.clear();
        self.allegiance.clear();
        self.push_event(now, BotEventKind::MissionRequested { patient });
        self.enter(MissionPhase::Spawning, now);

        let position = self.rally + Vec3::new(config.spawn_distance, 0.0, 0.0);
        let faction = FactionId(config.squad_faction);
        let mut requests = vec![SpawnRequest {
            role: AgentRole::Medic,
            count: 1,
            position,
            faction,
        }];
        if supports > 0 {
            requests.push(SpawnRequest {
                role: AgentRole::Guard,
                count: supports,
                position,
                faction,
            });
        }
        for request in requests {
            if let Err(err) = services.request_spawn(request) {
                tracing::warn!(%patient, error = %err, "squad spawn request failed");
                self.correlation.close();
                self.patient = None;
                self.enter(MissionPhase::Idle, now);
                return Err(err);
            }
        }
        tracing::info!(%patient, team, "mission requested");
        Ok(())
    }

    /// Apply queued reports, check abort rules, then advance the current phase
    pub fn tick(
        &mut self,
        inbox: Vec<MissionEvent>,
        world: &dyn WorldFacade,
        services: &dyn SquadServices,
        config: &MissionConfig,
        now: Seconds,
    ) -> Result<()> {
        for event in inbox {
            self.apply(event, world, services, now);
        }
        if self.phase == MissionPhase::Idle {
            return Ok(());
        }

        // Deaths whose callback never arrived
        let missing: Vec<AgentId> = self
            .roster
            .iter()
            .filter(|m| !world.agent(m.agent).is_some_and(|a| a.alive))
            .map(|m| m.agent)
            .collect();
        for agent in missing {
            self.lose_member(agent, now);
        }

        let patient = self
            .patient
            .ok_or_else(|| BotError::missing("mission.tick", "active mission without a patient"))?;

        if self.phase != MissionPhase::Dismissing {
            match services.patient_status(patient) {
                Some(status) if status.alive && status.accessible => self.rally = status.position,
                _ => {
                    tracing::info!(%patient, "patient no longer accessible, dismissing squad");
                    self.enter(MissionPhase::Dismissing, now);
                }
            }
        }
        if self.phase != MissionPhase::Spawning && self.roster.is_empty() {
            tracing::info!(%patient, "no squad members left, tearing down");
            self.teardown(services, config, now);
            return Ok(());
        }

        let elapsed = now - self.phase_started_at;
        match self.phase {
            MissionPhase::Idle => {}
            MissionPhase::Spawning => {
                let satisfied = self.correlation.is_satisfied();
                if satisfied || elapsed >= config.spawn_timeout {
                    self.correlation.close();
                    if self.roster.is_empty() {
                        tracing::warn!(%patient, "spawn timed out with no members");
                        self.teardown(services, config, now);
                        return Ok(());
                    }
                    if !satisfied {
                        tracing::warn!(%patient, members = self.roster.len(), "spawn timed out, continuing with partial squad");
                    }
                    self.allegiance
                        .reconcile(services, patient, &self.roster.agents());
                    if self.roster.lead().is_none() {
                        tracing::warn!(%patient, "no lead spawned");
                        self.ensure_lead(now);
                    }
                    self.assign_slots(world, config);
                    self.enter(MissionPhase::MovingToPosition, now);
                }
            }
            MissionPhase::MovingToPosition => {
                let stragglers: Vec<(AgentId, Vec3)> = self
                    .roster
                    .iter()
                    .filter(|m| {
                        !world
                            .agent(m.agent)
                            .is_some_and(|a| flat_distance(a.position, m.slot) <= config.arrival_radius)
                    })
                    .map(|m| (m.agent, m.slot))
                    .collect();
                if stragglers.is_empty() {
                    self.enter(MissionPhase::Defending, now);
                } else if elapsed >= config.move_timeout {
                    for (agent, slot) in stragglers {
                        tracing::debug!(%agent, "relocating straggler to its slot");
                        services.relocate(agent, slot);
                    }
                    self.enter(MissionPhase::Defending, now);
                }
            }
            MissionPhase::Defending => {
                let Some(lead) = self.ensure_lead(now) else {
                    tracing::warn!(%patient, "nobody left to lead, tearing down");
                    self.teardown(services, config, now);
                    return Ok(());
                };
                let in_range = world
                    .agent(lead)
                    .is_some_and(|a| flat_distance(a.position, self.rally) <= config.treat_range);
                if in_range && elapsed >= config.perimeter_setup_delay {
                    self.enter(MissionPhase::Treating, now);
                } else if elapsed >= config.defend_timeout {
                    tracing::debug!(agent = %lead, "relocating lead to the patient");
                    services.relocate(lead, self.rally);
                    self.enter(MissionPhase::Treating, now);
                }
            }
            MissionPhase::Treating => self.advance_treatment(patient, world, services, config, now),
            MissionPhase::Retreating => {
                let clear = self.roster.iter().all(|m| {
                    world
                        .agent(m.agent)
                        .is_some_and(|a| flat_distance(a.position, self.rally) >= config.retreat_radius)
                });
                if clear || elapsed >= config.retreat_timeout {
                    self.enter(MissionPhase::Dismissing, now);
                }
            }
            MissionPhase::Dismissing => self.teardown(services, config, now),
        }
        Ok(())
    }

    fn advance_treatment(
        &mut self,
        patient: EntityId,
        world: &dyn WorldFacade,
        services: &dyn SquadServices,
        config: &MissionConfig,
        now: Seconds,
    ) {
        if now - self.phase_started_at >= config.treat_safety_cap {
            tracing::warn!(%patient, "treatment safety cap reached");
            self.start_retreat(world, config, now);
            return;
        }
        let in_stage = now - self.stage_started_at;
        match self.treat_stage.unwrap_or(TreatStage::Preparing) {
            TreatStage::Preparing => {
                if in_stage >= config.prep_delay {
                    self.set_stage(TreatStage::Applying, now);
                }
            }
            TreatStage::Applying => {
                if !self.treatment_applied {
                    let amount = config.treatment_amount * config.difficulty.treatment_scale();
                    services.apply_treatment(patient, TreatmentEffect { amount });
                    self.treatment_applied = true;
                    tracing::info!(%patient, amount, "treatment applied");
                }
                self.set_stage(TreatStage::Holding, now);
            }
            TreatStage::Holding => {
                if in_stage >= config.completion_hold {
                    self.start_retreat(world, config, now);
                }
            }
        }
    }

    fn set_stage(&mut self, stage: TreatStage, now: Seconds) {
        tracing::debug!(%stage, "treatment stage");
        self.treat_stage = Some(stage);
        self.stage_started_at = now;
    }

    fn start_retreat(&mut self, world: &dyn WorldFacade, config: &MissionConfig, now: Seconds) {
        let rally = self.rally;
        for member in self.roster.iter_mut() {
            let position = world.agent(member.agent).map(|a| a.position).unwrap_or(member.slot);
            member.retreat_point = formation::retreat_point(rally, position, config.retreat_radius);
        }
        self.enter(MissionPhase::Retreating, now);
    }

    fn assign_slots(&mut self, world: &dyn WorldFacade, config: &MissionConfig) {
        let supports = self
            .roster
            .iter()
            .filter(|m| m.role == MemberRole::Support)
            .count();
        let rally = self.rally;
        let mut slots = formation::defense_slots(rally, config.perimeter_radius, supports, world).into_iter();
        for member in self.roster.iter_mut() {
            member.slot = match member.role {
                MemberRole::Lead => rally,
                MemberRole::Support => slots.next().unwrap_or(rally),
            };
        }
    }

    fn apply(&mut self, event: MissionEvent, world: &dyn WorldFacade, services: &dyn SquadServices, now: Seconds) {
        match event {
            MissionEvent::AgentSpawned { agent, role } => {
                if self.phase != MissionPhase::Spawning || !self.correlation.is_open() {
                    if self.correlation.claim_late(agent, role) {
                        tracing::info!(%agent, %role, "late squad spawn despawned");
                        services.despawn(agent);
                    } else {
                        tracing::debug!(%agent, phase = %self.phase, "spawn report outside spawning ignored");
                    }
                    return;
                }
                let Some(member_role) = self.correlation.accept(agent, role) else {
                    tracing::debug!(%agent, %role, "uncorrelated spawn ignored");
                    return;
                };
                let position = world.agent(agent).map(|a| a.position).unwrap_or(self.rally);
                let current = self.roster.agents();
                if self.roster.add(agent, member_role, now, position).is_some() {
                    if let Some(patient) = self.patient {
                        self.allegiance.admit(services, agent, patient, &current);
                    }
                    tracing::debug!(%agent, role = %member_role, "squad member joined");
                    self.push_event(now, BotEventKind::MemberJoined { agent, role });
                }
            }
            MissionEvent::AgentDied { agent } => self.lose_member(agent, now),
        }
    }

    fn lose_member(&mut self, agent: AgentId, now: Seconds) {
        let Some(member) = self.roster.remove(agent) else {
            return;
        };
        tracing::info!(%agent, role = %member.role, "squad member lost");
        self.push_event(now, BotEventKind::MemberLost { agent });
        if member.role == MemberRole::Lead {
            self.ensure_lead(now);
        }
    }

    /// Current lead, promoting the next support when the slot is empty
    fn ensure_lead(&mut self, now: Seconds) -> Option<AgentId> {
        if let Some(lead) = self.roster.lead() {
            return Some(lead.agent);
        }
        let next = self.roster.promote_next()?;
        let rally = self.rally;
        if let Some(promoted) = self.roster.get_mut(next) {
            promoted.slot = rally;
        }
        tracing::info!(agent = %next, "lead promoted");
        self.push_event(now, BotEventKind::LeadPromoted { agent: next });
        Some(next)
    }

    /// Despawn everyone, start the cooldown and return to Idle
    fn teardown(&mut self, services: &dyn SquadServices, config: &MissionConfig, now: Seconds) {
        for agent in self.roster.agents() {
            services.despawn(agent);
        }
        self.roster.clear();
        self.allegiance.clear();
        self.correlation.close();
        self.patient = None;
        self.treat_stage = None;
        self.treatment_applied = false;
        self.cooldown_until = now + config.cooldown;
        self.enter(MissionPhase::Idle, now);
    }

    fn enter(&mut self, phase: MissionPhase, now: Seconds) {
        if phase == self.phase {
            return;
        }
        let from = self.phase;
        tracing::info!(%from, to = %phase, "mission phase");
        self.push_event(now, BotEventKind::MissionPhaseChanged { from, to: phase });
        self.phase = phase;
        self.phase_started_at = now;
        if phase == MissionPhase::Treating {
            self.treat_stage = Some(TreatStage::Preparing);
            self.stage_started_at = now;
            self.treatment_applied = false;
        } else {
            self.treat_stage = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::inbox::MissionInbox;
    use crate::sandbox::SandboxWorld;
    use crate::world::Participant;

    const DT: f32 = 0.1;

    fn quick_config() -> MissionConfig {
        MissionConfig {
            spawn_timeout: 2.0,
            move_timeout: 1.0,
            perimeter_setup_delay: 0.5,
            defend_timeout: 1.0,
            prep_delay: 0.5,
            completion_hold: 0.5,
            retreat_timeout: 1.0,
            cooldown: 30.0,
            ..MissionConfig::default()
        }
    }

    struct Fixture {
        world: SandboxWorld,
        inbox: MissionInbox,
        controller: MissionController,
        patient: EntityId,
        now: Seconds,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = SandboxWorld::new(120, 120);
            let inbox = MissionInbox::new();
            world.attach_mission_inbox(inbox.clone());
            let patient = world.add_patient(Vec3::new(60.5, 0.0, 60.5), 20.0, 100.0);
            Self {
                world,
                inbox,
                controller: MissionController::new(),
                patient,
                now: 0.0,
            }
        }

        fn step(&mut self, config: &MissionConfig) {
            self.world.step(DT);
            self.now += DT;
            let pending = self.inbox.drain();
            self.controller
                .tick(pending, &self.world, &self.world, config, self.now)
                .unwrap();
        }

        fn run_until(&mut self, config: &MissionConfig, phase: MissionPhase, max_ticks: usize) -> bool {
            for _ in 0..max_ticks {
                if self.controller.phase() == phase {
                    return true;
                }
                self.step(config);
            }
            self.controller.phase() == phase
        }

        fn phases(&mut self) -> Vec<MissionPhase> {
            self.controller
                .drain_events()
                .into_iter()
                .filter_map(|e| match e.kind {
                    BotEventKind::MissionPhaseChanged { to, .. } => Some(to),
                    _ => None,
                })
                .collect()
        }
    }

    #[test]
    fn test_full_mission_visits_every_phase_in_order() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.step(&config);
        assert_eq!(f.controller.roster().len(), 4);
        assert!(f.controller.roster().lead().is_some());

        assert!(f.run_until(&config, MissionPhase::Idle, 200));
        assert_eq!(
            f.phases(),
            vec![
                MissionPhase::Spawning,
                MissionPhase::MovingToPosition,
                MissionPhase::Defending,
                MissionPhase::Treating,
                MissionPhase::Retreating,
                MissionPhase::Dismissing,
                MissionPhase::Idle,
            ]
        );
        assert!(f.controller.roster().is_empty());
        assert_eq!(f.world.despawned().len(), 4);
        assert_eq!(f.world.treatment_total(), 100.0 * 0.8);
    }

    #[test]
    fn test_members_are_allied_with_patient_and_each_other() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.step(&config);
        let members = f.controller.roster().agents();
        for a in &members {
            assert!(f
                .world
                .are_non_hostile(Participant::Agent(*a), Participant::Entity(f.patient)));
            for b in &members {
                if a != b {
                    assert!(f.world.are_non_hostile(Participant::Agent(*a), Participant::Agent(*b)));
                }
            }
        }
    }

    #[test]
    fn test_duplicate_request_leaves_mission_untouched() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.step(&config);
        let before = f.controller.snapshot();

        let err = f
            .controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap_err();
        assert_eq!(err, MissionError::AlreadyActive);
        assert_eq!(f.controller.snapshot(), before);
    }

    #[test]
    fn test_cooldown_after_teardown() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.step(&config);
        assert!(f.run_until(&config, MissionPhase::Idle, 200));

        let err = f
            .controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap_err();
        assert!(matches!(err, MissionError::CoolingDown { .. }));
    }

    #[test]
    fn test_healthy_or_missing_patient_rejected() {
        let config = quick_config();
        let mut f = Fixture::new();
        let healthy = f.world.add_patient(Vec3::new(20.5, 0.0, 20.5), 100.0, 100.0);
        assert_eq!(
            f.controller.request(healthy, &f.world, &f.world, &config, 0.0),
            Err(MissionError::PatientHealthy(healthy))
        );
        let nobody = EntityId::new();
        assert_eq!(
            f.controller.request(nobody, &f.world, &f.world, &config, 0.0),
            Err(MissionError::PatientUnavailable(nobody))
        );
        assert_eq!(f.controller.phase(), MissionPhase::Idle);
    }

    #[test]
    fn test_spawn_failure_rolls_back() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.world.fail_spawns("no spawn points");
        assert!(matches!(
            f.controller.request(f.patient, &f.world, &f.world, &config, 0.0),
            Err(MissionError::SpawnFailed(_))
        ));
        assert_eq!(f.controller.phase(), MissionPhase::Idle);
    }

    #[test]
    fn test_preexisting_agent_spawn_report_ignored() {
        let config = quick_config();
        let mut f = Fixture::new();
        let bystander = f
            .world
            .add_agent(Vec3::new(10.5, 0.0, 10.5), AgentRole::Medic, FactionId(1));
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.inbox.post(MissionEvent::AgentSpawned {
            agent: bystander,
            role: AgentRole::Medic,
        });
        f.step(&config);
        assert!(f.controller.role_of(bystander).is_none());
        assert_eq!(f.controller.roster().len(), 4);
    }

    #[test]
    fn test_inaccessible_patient_dismisses_squad() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.step(&config);
        f.world.set_patient_accessible(f.patient, false);
        f.step(&config);

        assert_eq!(f.controller.phase(), MissionPhase::Idle);
        assert!(f.phases().ends_with(&[MissionPhase::Dismissing, MissionPhase::Idle]));
        assert_eq!(f.world.despawned().len(), 4);
    }

    #[test]
    fn test_lead_loss_promotes_survivor() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.step(&config);
        let lead = f.controller.roster().lead().map(|m| m.agent).unwrap();

        f.world.kill_agent(lead);
        f.step(&config);
        let promoted = f.controller.roster().lead().map(|m| m.agent).unwrap();
        assert_ne!(promoted, lead);
        assert_eq!(f.controller.roster().len(), 3);
        let events = f.controller.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e.kind, BotEventKind::LeadPromoted { agent } if agent == promoted)));
    }

    #[test]
    fn test_squad_without_medic_promotes_and_finishes() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.world.step(DT);
        f.now += DT;
        let pending: Vec<MissionEvent> = f
            .inbox
            .drain()
            .into_iter()
            .filter(|e| !matches!(e, MissionEvent::AgentSpawned { role: AgentRole::Medic, .. }))
            .collect();
        f.controller
            .tick(pending, &f.world, &f.world, &config, f.now)
            .unwrap();
        assert_eq!(f.controller.roster().len(), 3);
        assert!(f.controller.roster().lead().is_none());

        assert!(f.run_until(&config, MissionPhase::MovingToPosition, 40));
        let lead = f.controller.roster().lead().map(|m| m.agent).unwrap();
        assert_eq!(f.controller.roster().get(lead).map(|m| m.slot), Some(Vec3::new(60.5, 0.0, 60.5)));
        let events = f.controller.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e.kind, BotEventKind::LeadPromoted { agent } if agent == lead)));

        assert!(f.run_until(&config, MissionPhase::Idle, 200));
        assert_eq!(f.world.treatment_total(), 100.0 * 0.8);
        assert_eq!(f.world.despawned().len(), 3);
    }

    #[test]
    fn test_late_spawn_after_window_is_despawned() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.world.step(DT);
        f.now += DT;
        let (held, pending): (Vec<MissionEvent>, Vec<MissionEvent>) = f
            .inbox
            .drain()
            .into_iter()
            .partition(|e| matches!(e, MissionEvent::AgentSpawned { role: AgentRole::Guard, .. }));
        f.controller
            .tick(pending, &f.world, &f.world, &config, f.now)
            .unwrap();
        assert!(f.run_until(&config, MissionPhase::MovingToPosition, 40));

        let MissionEvent::AgentSpawned { agent: late, .. } = held[0] else {
            panic!("expected a spawn report");
        };
        f.inbox.post(held[0]);
        f.step(&config);
        assert!(f.controller.role_of(late).is_none());
        assert!(f.world.despawned().contains(&late));
    }

    #[test]
    fn test_losing_everyone_tears_down() {
        let config = quick_config();
        let mut f = Fixture::new();
        f.controller
            .request(f.patient, &f.world, &f.world, &config, f.now)
            .unwrap();
        f.step(&config);
        for agent in f.controller.roster().agents() {
            f.world.kill_agent(agent);
        }
        f.step(&config);
        assert_eq!(f.controller.phase(), MissionPhase::Idle);
        assert!(f.controller.roster().is_empty());
    }
}
