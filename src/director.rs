//! Per-tick driver for every registered agent
//!
//! The director owns the brains, the shared claim registry and the event log.
//! Each tick it drops agents that left the world, releases claims whose owner
//! is dead or unregistered, advances the mission once, and then lets every
//! brain arbitrate and update in registration order.

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::behavior::{AgentBrain, LayerContext};
use crate::core::config::BotConfig;
use crate::core::error::{BotError, MissionError, Result};
use crate::core::types::{AgentId, EntityId, Seconds};
use crate::events::{BotEvent, BotEventKind, EventLog};
use crate::mission::MissionHandle;
use crate::targeting::ClaimRegistry;
use crate::world::{Awareness, CommandBuffer, SquadServices, WorldFacade};

#[derive(Debug)]
struct AgentSlot {
    brain: AgentBrain,
    rng: ChaCha8Rng,
}

#[derive(Debug)]
pub struct AgentDirector {
    slots: AHashMap<AgentId, AgentSlot>,
    /// Registration order; brains tick in this order
    order: Vec<AgentId>,
    claims: ClaimRegistry,
    events: EventLog,
    awareness: Awareness,
    mission: Option<MissionHandle>,
    rng: ChaCha8Rng,
}

impl AgentDirector {
    pub fn new(seed: u64) -> Self {
        Self {
            slots: AHashMap::new(),
            order: Vec::new(),
            claims: ClaimRegistry::new(),
            events: EventLog::new(),
            awareness: Awareness::Absent,
            mission: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_awareness(mut self, awareness: Awareness) -> Self {
        self.awareness = awareness;
        self
    }

    pub fn with_mission(mut self, mission: MissionHandle) -> Self {
        self.mission = Some(mission);
        self
    }

    pub fn mission(&self) -> Option<&MissionHandle> {
        self.mission.as_ref()
    }

    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    pub fn brain(&self, agent: AgentId) -> Option<&AgentBrain> {
        self.slots.get(&agent).map(|s| &s.brain)
    }

    pub fn agents(&self) -> &[AgentId] {
        &self.order
    }

    pub fn is_registered(&self, agent: AgentId) -> bool {
        self.slots.contains_key(&agent)
    }

    /// Register an agent with the default layers; returns false if it already was
    pub fn register_agent(&mut self, agent: AgentId, config: &BotConfig) -> bool {
        self.register_brain(AgentBrain::with_default_layers(agent, config))
    }

    pub fn register_brain(&mut self, brain: AgentBrain) -> bool {
        let agent = brain.agent();
        if self.slots.contains_key(&agent) {
            return false;
        }
        let rng = ChaCha8Rng::seed_from_u64(self.rng.gen());
        self.slots.insert(agent, AgentSlot { brain, rng });
        self.order.push(agent);
        tracing::debug!(%agent, "agent registered");
        true
    }

    /// Forget an agent and release whatever it had claimed
    pub fn remove_agent(&mut self, agent: AgentId, now: Seconds) -> Result<()> {
        if self.slots.remove(&agent).is_none() {
            return Err(BotError::AgentNotRegistered(agent));
        }
        self.order.retain(|&a| a != agent);
        if let Some(target) = self.claims.release_agent(agent) {
            self.events.push(now, BotEventKind::TargetReleased { agent, target });
        }
        tracing::debug!(%agent, "agent removed");
        Ok(())
    }

    pub fn request_mission(
        &mut self,
        patient: EntityId,
        world: &dyn WorldFacade,
        squad: &dyn SquadServices,
        config: &BotConfig,
        now: Seconds,
    ) -> std::result::Result<(), MissionError> {
        let Some(mission) = &self.mission else {
            return Err(MissionError::Disabled);
        };
        let result = mission.request_mission(patient, world, squad, &config.mission, now);
        self.events.extend(mission.drain_events());
        result
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<BotEvent> {
        self.events.drain()
    }

    pub fn tick(
        &mut self,
        world: &dyn WorldFacade,
        squad: &dyn SquadServices,
        commands: &mut CommandBuffer,
        config: &BotConfig,
        now: Seconds,
    ) {
        let gone: Vec<AgentId> = self
            .order
            .iter()
            .copied()
            .filter(|&agent| world.agent(agent).is_none())
            .collect();
        for agent in gone {
            // Registered, so removal cannot fail
            let _ = self.remove_agent(agent, now);
        }

        let slots = &self.slots;
        let dropped = self
            .claims
            .retain_owners(|agent| slots.contains_key(&agent) && world.agent(agent).is_some_and(|a| a.alive));
        for (agent, target) in dropped {
            tracing::debug!(%agent, %target, "claim dropped with its owner");
            self.events.push(now, BotEventKind::TargetReleased { agent, target });
        }

        let snapshot = self.mission.as_ref().map(|mission| {
            mission.tick(world, squad, &config.mission, now);
            self.events.extend(mission.drain_events());
            mission.snapshot()
        });

        if let Some(snapshot) = &snapshot {
            for member in &snapshot.members {
                if !self.slots.contains_key(&member.agent) && world.agent(member.agent).is_some() {
                    self.register_agent(member.agent, config);
                }
            }
        }

        for agent in &self.order {
            let Some(AgentSlot { brain, rng }) = self.slots.get_mut(agent) else {
                continue;
            };
            let Some(view) = world.agent(*agent) else {
                continue;
            };
            let mut ctx = LayerContext {
                agent: view,
                world,
                commands: &mut *commands,
                config,
                claims: &mut self.claims,
                awareness: &self.awareness,
                mission: snapshot.as_ref(),
                events: &mut self.events,
                rng,
                now,
            };
            brain.tick(&mut ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgentRole, FactionId, ItemInfo};
    use crate::sandbox::SandboxWorld;
    use crate::world::{EntityKind, WorldEntity};
    use glam::Vec3;

    const DT: f32 = 0.1;

    fn run(director: &mut AgentDirector, world: &mut SandboxWorld, config: &BotConfig, from: f32, ticks: usize) -> f32 {
        let mut commands = CommandBuffer::new();
        let mut now = from;
        for _ in 0..ticks {
            director.tick(&*world, &*world, &mut commands, config, now);
            world.apply_commands(&mut commands);
            world.step(DT);
            now += DT;
        }
        now
    }

    #[test]
    fn test_empty_world_does_nothing() {
        let config = BotConfig::default();
        let mut world = SandboxWorld::new(50, 50);
        let agent = world.add_agent(Vec3::new(10.0, 0.0, 10.0), AgentRole::Combatant, FactionId(1));
        let mut director = AgentDirector::new(1);
        director.register_agent(agent, &config);

        run(&mut director, &mut world, &config, 0.0, 50);
        assert!(director.claims().is_empty());
        assert_eq!(director.brain(agent).and_then(|b| b.active_layer()), None);
        assert!(director
            .drain_events()
            .iter()
            .all(|e| !matches!(e.kind, BotEventKind::InvariantViolation { .. })));
    }

    #[test]
    fn test_agent_loots_nearby_corpse() {
        let config = BotConfig::default();
        let mut world = SandboxWorld::new(50, 50);
        let agent = world.add_agent(Vec3::new(10.0, 0.0, 10.0), AgentRole::Combatant, FactionId(1));
        world.add_entity(
            WorldEntity::new(EntityKind::Corpse, Vec3::new(16.0, 0.0, 10.0))
                .with_items(vec![ItemInfo::new(60.0, 1.0), ItemInfo::new(30.0, 1.0)]),
        );
        let mut director = AgentDirector::new(1);
        director.register_agent(agent, &config);

        run(&mut director, &mut world, &config, 0.0, 300);
        assert!(!world.inventory_of(agent).is_empty());
        let events = director.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e.kind, BotEventKind::TargetClaimed { agent: a, .. } if a == agent)));
    }

    #[test]
    fn test_remove_unknown_agent_is_error() {
        let mut director = AgentDirector::new(1);
        let stranger = AgentId::new();
        assert!(matches!(
            director.remove_agent(stranger, 0.0),
            Err(BotError::AgentNotRegistered(a)) if a == stranger
        ));
    }

    #[test]
    fn test_dead_agent_loses_its_claim() {
        let config = BotConfig::default();
        let mut world = SandboxWorld::new(50, 50);
        let agent = world.add_agent(Vec3::new(10.0, 0.0, 10.0), AgentRole::Combatant, FactionId(1));
        let corpse = world.add_entity(
            WorldEntity::new(EntityKind::Corpse, Vec3::new(30.0, 0.0, 10.0))
                .with_items(vec![ItemInfo::new(60.0, 1.0)]),
        );
        let mut director = AgentDirector::new(1);
        director.register_agent(agent, &config);

        let now = run(&mut director, &mut world, &config, 0.0, 5);
        assert_eq!(director.claims().owner_of(corpse), Some(agent));

        world.kill_agent(agent);
        run(&mut director, &mut world, &config, now, 1);
        assert!(director.claims().is_empty());
    }

    #[test]
    fn test_vanished_agent_is_unregistered() {
        let config = BotConfig::default();
        let mut world = SandboxWorld::new(50, 50);
        let agent = world.add_agent(Vec3::new(10.0, 0.0, 10.0), AgentRole::Combatant, FactionId(1));
        let mut director = AgentDirector::new(1);
        director.register_agent(agent, &config);
        assert!(!director.register_agent(agent, &config));

        world.despawn(agent);
        run(&mut director, &mut world, &config, 0.0, 1);
        assert!(!director.is_registered(agent));
        assert!(director.agents().is_empty());
    }
}
