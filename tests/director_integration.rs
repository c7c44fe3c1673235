//! End-to-end runs of the director against the sandbox world

use bot_directive::core::config::{BotConfig, MissionConfig};
use bot_directive::core::error::MissionError;
use bot_directive::core::types::{AgentRole, FactionId, ItemInfo, Seconds};
use bot_directive::mission::{MissionHandle, MissionPhase};
use bot_directive::sandbox::{Scenario, ScenarioSpec, SandboxWorld};
use bot_directive::world::{CommandBuffer, EntityKind, WorldEntity};
use bot_directive::{AgentDirector, BotEvent, BotEventKind};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const DT: f32 = 0.1;

struct Sim {
    world: SandboxWorld,
    director: AgentDirector,
    config: BotConfig,
    commands: CommandBuffer,
    events: Vec<BotEvent>,
    now: Seconds,
}

impl Sim {
    fn new(world: SandboxWorld, director: AgentDirector, config: BotConfig) -> Self {
        Self {
            world,
            director,
            config,
            commands: CommandBuffer::new(),
            events: Vec::new(),
            now: 0.0,
        }
    }

    fn tick(&mut self) {
        self.director
            .tick(&self.world, &self.world, &mut self.commands, &self.config, self.now);
        self.world.apply_commands(&mut self.commands);
        self.world.step(DT);
        self.now += DT;
        self.events.extend(self.director.drain_events());
    }

    fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn violations(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, BotEventKind::InvariantViolation { .. }))
            .count()
    }
}

fn quick_mission() -> MissionConfig {
    MissionConfig {
        cooldown: 60.0,
        spawn_timeout: 5.0,
        spawn_distance: 20.0,
        move_timeout: 30.0,
        perimeter_setup_delay: 1.0,
        defend_timeout: 20.0,
        prep_delay: 1.0,
        completion_hold: 1.0,
        retreat_timeout: 20.0,
        ..MissionConfig::default()
    }
}

#[test]
fn test_empty_world_stays_quiet() {
    let mut world = SandboxWorld::new(60, 60);
    let config = BotConfig::default();
    let agent = world.add_agent(Vec3::new(30.5, 0.0, 30.5), AgentRole::Combatant, FactionId(1));
    let mut director = AgentDirector::new(5);
    director.register_agent(agent, &config);

    let mut sim = Sim::new(world, director, config);
    sim.run(100);
    assert!(sim.director.claims().is_empty());
    assert_eq!(sim.violations(), 0);
    assert!(!sim
        .events
        .iter()
        .any(|e| matches!(e.kind, BotEventKind::TargetClaimed { .. })));
}

#[test]
fn test_two_agents_never_share_a_target() {
    let mut world = SandboxWorld::new(60, 60);
    let config = BotConfig::default();
    let a = world.add_agent(Vec3::new(20.5, 0.0, 20.5), AgentRole::Combatant, FactionId(1));
    let b = world.add_agent(Vec3::new(28.5, 0.0, 20.5), AgentRole::Combatant, FactionId(1));
    let corpse = world.add_entity(
        WorldEntity::new(EntityKind::Corpse, Vec3::new(24.5, 0.0, 20.5)).with_items(vec![ItemInfo::new(90.0, 1.0)]),
    );
    let mut director = AgentDirector::new(9);
    director.register_agent(a, &config);
    director.register_agent(b, &config);

    let mut sim = Sim::new(world, director, config);
    for _ in 0..400 {
        sim.tick();
        assert!(sim.director.claims().len() <= 1);
    }
    let claimers: Vec<_> = sim
        .events
        .iter()
        .filter_map(|e| match e.kind {
            BotEventKind::TargetClaimed { agent, target, .. } if target == corpse => Some(agent),
            _ => None,
        })
        .collect();
    assert!(!claimers.is_empty());
    let carried = sim.world.inventory_of(a).len() + sim.world.inventory_of(b).len();
    assert_eq!(carried, 1);
    assert_eq!(sim.violations(), 0);
}

#[test]
fn test_duplicate_mission_request_is_rejected() {
    let mut world = SandboxWorld::new(120, 120);
    let handle = MissionHandle::new();
    world.attach_mission_inbox(handle.inbox());
    let patient = world.add_patient(Vec3::new(60.5, 0.0, 60.5), 15.0, 100.0);
    let mut config = BotConfig::default();
    config.mission = quick_mission();
    let mut director = AgentDirector::new(3).with_mission(handle.clone());

    director
        .request_mission(patient, &world, &world, &config, 0.0)
        .unwrap();
    let before = handle.snapshot();
    let second = director.request_mission(patient, &world, &world, &config, 0.0);
    assert_eq!(second, Err(MissionError::AlreadyActive));
    assert_eq!(handle.snapshot(), before);
    assert!(director
        .drain_events()
        .iter()
        .any(|e| matches!(e.kind, BotEventKind::MissionRejected { .. })));
}

#[test]
fn test_mission_without_handle_is_disabled() {
    let mut world = SandboxWorld::new(20, 20);
    let patient = world.add_patient(Vec3::new(10.5, 0.0, 10.5), 15.0, 100.0);
    let mut director = AgentDirector::new(3);
    assert_eq!(
        director.request_mission(patient, &world, &world, &BotConfig::default(), 0.0),
        Err(MissionError::Disabled)
    );
}

#[test]
fn test_director_runs_full_mission() {
    let mut world = SandboxWorld::new(120, 120);
    let handle = MissionHandle::new();
    world.attach_mission_inbox(handle.inbox());
    let patient = world.add_patient(Vec3::new(60.5, 0.0, 60.5), 15.0, 100.0);
    let mut config = BotConfig::default();
    config.mission = quick_mission();
    let mut director = AgentDirector::new(21).with_mission(handle.clone());
    director
        .request_mission(patient, &world, &world, &config, 0.0)
        .unwrap();

    let mut sim = Sim::new(world, director, config);
    let mut peak_roster = 0;
    for _ in 0..3000 {
        sim.tick();
        peak_roster = peak_roster.max(sim.director.agents().len());
        if handle.phase() == MissionPhase::Idle {
            break;
        }
    }
    assert_eq!(handle.phase(), MissionPhase::Idle);
    assert_eq!(peak_roster, 4);
    assert_eq!(sim.world.treatment_total(), 100.0 * 0.8);
    assert_eq!(sim.world.despawned().len(), 4);

    // Despawned members drop out of the director on the next tick
    sim.tick();
    assert!(sim.director.agents().is_empty());

    let phases: Vec<MissionPhase> = sim
        .events
        .iter()
        .filter_map(|e| match e.kind {
            BotEventKind::MissionPhaseChanged { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
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
    assert!(sim.events.iter().any(|e| matches!(
        &e.kind,
        BotEventKind::LayerSwitched { to: Some(layer), .. } if layer == "medic"
    )));
    assert_eq!(sim.violations(), 0);
}

#[test]
fn test_generated_scenario_runs_cleanly() {
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let Scenario { world, agents, .. } = Scenario::generate(&ScenarioSpec::default(), &mut rng);
    let config = BotConfig::default();
    let mut director = AgentDirector::new(77);
    for &agent in &agents {
        director.register_agent(agent, &config);
    }

    let mut sim = Sim::new(world, director, config);
    sim.run(600);
    assert_eq!(sim.violations(), 0);
    assert!(sim
        .events
        .iter()
        .any(|e| matches!(e.kind, BotEventKind::TaskStarted { .. })));
}
