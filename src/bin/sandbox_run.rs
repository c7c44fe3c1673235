//! Headless Sandbox Runner
//!
//! Generates a seeded scenario, drives every agent through the director and
//! prints a summary of what happened. Useful for eyeballing behavior changes
//! and for reproducing a run from its seed.

use std::collections::BTreeMap;
use std::path::PathBuf;

use bot_directive::core::types::Seconds;
use bot_directive::mission::MissionPhase;
use bot_directive::sandbox::{Scenario, ScenarioSpec};
use bot_directive::world::{Awareness, CommandBuffer};
use bot_directive::{AgentDirector, BotConfig, BotEvent, BotEventKind, MissionHandle, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Headless Sandbox Runner - seeded agent runs without a host engine
#[derive(Parser, Debug)]
#[command(name = "sandbox_run")]
#[command(about = "Run agents through a generated sandbox world and report the outcome")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 3000)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Combat-capable agents in the scenario
    #[arg(long, default_value_t = 3)]
    combatants: usize,

    /// Civilian agents in the scenario
    #[arg(long, default_value_t = 1)]
    civilians: usize,

    /// TOML config file; defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Request a squad mission for the scenario patient at this time (seconds)
    #[arg(long)]
    mission_at: Option<f32>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Also print every recorded event
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    seconds: Seconds,
    agents: usize,
    extracted: usize,
    items_carried: usize,
    treatment_applied: f32,
    mission_phase: MissionPhase,
    invariant_violations: usize,
    events: BTreeMap<&'static str, usize>,
}

fn kind_name(kind: &BotEventKind) -> &'static str {
    match kind {
        BotEventKind::TargetClaimed { .. } => "target_claimed",
        BotEventKind::TargetReleased { .. } => "target_released",
        BotEventKind::TargetBlacklisted { .. } => "target_blacklisted",
        BotEventKind::TaskStarted { .. } => "task_started",
        BotEventKind::TaskCompleted { .. } => "task_completed",
        BotEventKind::LayerSwitched { .. } => "layer_switched",
        BotEventKind::MissionRequested { .. } => "mission_requested",
        BotEventKind::MissionRejected { .. } => "mission_rejected",
        BotEventKind::MissionPhaseChanged { .. } => "mission_phase_changed",
        BotEventKind::MemberJoined { .. } => "member_joined",
        BotEventKind::MemberLost { .. } => "member_lost",
        BotEventKind::LeadPromoted { .. } => "lead_promoted",
        BotEventKind::InvariantViolation { .. } => "invariant_violation",
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bot_directive=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let config = match &args.config {
        Some(path) => BotConfig::load(path)?,
        None => BotConfig::default(),
    };

    let spec = ScenarioSpec {
        combatants: args.combatants,
        civilians: args.civilians,
        ..ScenarioSpec::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let Scenario {
        mut world,
        agents,
        patient,
    } = Scenario::generate(&spec, &mut rng);

    let mission = MissionHandle::new();
    world.attach_mission_inbox(mission.inbox());
    let mut director = AgentDirector::new(seed)
        .with_awareness(Awareness::Absent)
        .with_mission(mission.clone());
    for &agent in &agents {
        director.register_agent(agent, &config);
    }
    tracing::info!(seed, agents = agents.len(), "sandbox run starting");

    let mut commands = CommandBuffer::new();
    let mut events: Vec<BotEvent> = Vec::new();
    let mut now: Seconds = 0.0;
    let mut mission_requested = false;
    for _ in 0..args.ticks {
        if let (Some(at), Some(patient)) = (args.mission_at, patient) {
            if !mission_requested && now >= at {
                mission_requested = true;
                if let Err(err) = director.request_mission(patient, &world, &world, &config, now) {
                    tracing::warn!(error = %err, "mission request rejected");
                }
            }
        }
        director.tick(&world, &world, &mut commands, &config, now);
        world.apply_commands(&mut commands);
        world.step(args.dt);
        now += args.dt;
        events.extend(director.drain_events());
    }

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for event in &events {
        *counts.entry(kind_name(&event.kind)).or_default() += 1;
    }
    let summary = RunSummary {
        seed,
        ticks: args.ticks,
        seconds: now,
        agents: agents.len(),
        extracted: world.extracted().len(),
        items_carried: agents.iter().map(|&a| world.inventory_of(a).len()).sum(),
        treatment_applied: world.treatment_total(),
        mission_phase: mission.phase(),
        invariant_violations: counts.get("invariant_violation").copied().unwrap_or(0),
        events: counts,
    };

    if args.verbose {
        for event in &events {
            eprintln!("  [{:8.1}] {:?}", event.at, event.kind);
        }
    }

    if args.format == "text" {
        println!("=== Sandbox Run (seed {}) ===", summary.seed);
        println!("Simulated: {} ticks, {:.1}s", summary.ticks, summary.seconds);
        println!("Agents: {} ({} extracted)", summary.agents, summary.extracted);
        println!("Items carried: {}", summary.items_carried);
        println!("Treatment applied: {:.1}", summary.treatment_applied);
        println!("Mission phase: {}", summary.mission_phase);
        println!("Invariant violations: {}", summary.invariant_violations);
        for (kind, count) in &summary.events {
            println!("  {kind}: {count}");
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
