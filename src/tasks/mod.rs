//! Task executor: resumable state machines that turn a goal into commands
//!
//! Each [`GoalKind`] maps to exactly one variant of [`Task`]. Every variant
//! implements [`TaskMachine`]; `Task` dispatches to it so the behavior layers
//! can drive any task through the same `start`/`update`/`stop` calls.

pub mod escort;
pub mod goal;
pub mod loot;
pub mod machine;
pub mod motion;
pub mod pickup;
pub mod sampling;
pub mod transfer;
pub mod travel;

pub use escort::{HealTask, HoldPerimeterTask, MoveToPatientTask, PauseTask};
pub use goal::{ActionDescriptor, Goal, GoalKind};
pub use loot::{LootSource, LootTask};
pub use machine::{FailReason, TaskContext, TaskMachine, TaskOutcome};
pub use motion::{MoveStatus, Mover, TaskTimer};
pub use pickup::{PickUpTask, PlaceItemTask};
pub use travel::{ExploreTask, ExtractTask, SearchTask, TravelTask};

/// Closed set of task state machines
#[derive(Debug)]
pub enum Task {
    LootCorpse(LootTask),
    OpenContainer(LootTask),
    PickUpItem(PickUpTask),
    TravelTo(TravelTask),
    Explore(ExploreTask),
    SearchForItem(SearchTask),
    PlaceItem(PlaceItemTask),
    Extract(ExtractTask),
    MoveToPatient(MoveToPatientTask),
    HoldPerimeter(HoldPerimeterTask),
    HealPatient(HealTask),
    Retreat(TravelTask),
    Pause(PauseTask),
}

macro_rules! dispatch {
    ($task:expr, $inner:ident => $body:expr) => {
        match $task {
            Task::LootCorpse($inner) => $body,
            Task::OpenContainer($inner) => $body,
            Task::PickUpItem($inner) => $body,
            Task::TravelTo($inner) => $body,
            Task::Explore($inner) => $body,
            Task::SearchForItem($inner) => $body,
            Task::PlaceItem($inner) => $body,
            Task::Extract($inner) => $body,
            Task::MoveToPatient($inner) => $body,
            Task::HoldPerimeter($inner) => $body,
            Task::HealPatient($inner) => $body,
            Task::Retreat($inner) => $body,
            Task::Pause($inner) => $body,
        }
    };
}

impl Task {
    /// Fresh, not yet started task for a goal kind
    pub fn for_kind(kind: GoalKind) -> Self {
        match kind {
            GoalKind::LootCorpse => Task::LootCorpse(LootTask::new(LootSource::Corpse)),
            GoalKind::OpenContainer => Task::OpenContainer(LootTask::new(LootSource::Container)),
            GoalKind::PickUpItem => Task::PickUpItem(PickUpTask::default()),
            GoalKind::TravelTo => Task::TravelTo(TravelTask::default()),
            GoalKind::Explore => Task::Explore(ExploreTask::default()),
            GoalKind::SearchForItem => Task::SearchForItem(SearchTask::default()),
            GoalKind::PlaceItem => Task::PlaceItem(PlaceItemTask::default()),
            GoalKind::Extract => Task::Extract(ExtractTask::default()),
            GoalKind::MoveToPatient => Task::MoveToPatient(MoveToPatientTask::default()),
            GoalKind::HoldPerimeter => Task::HoldPerimeter(HoldPerimeterTask::default()),
            GoalKind::HealPatient => Task::HealPatient(HealTask::default()),
            GoalKind::Retreat => Task::Retreat(TravelTask::default()),
            GoalKind::Pause => Task::Pause(PauseTask::default()),
        }
    }

    pub fn kind(&self) -> GoalKind {
        match self {
            Task::LootCorpse(_) => GoalKind::LootCorpse,
            Task::OpenContainer(_) => GoalKind::OpenContainer,
            Task::PickUpItem(_) => GoalKind::PickUpItem,
            Task::TravelTo(_) => GoalKind::TravelTo,
            Task::Explore(_) => GoalKind::Explore,
            Task::SearchForItem(_) => GoalKind::SearchForItem,
            Task::PlaceItem(_) => GoalKind::PlaceItem,
            Task::Extract(_) => GoalKind::Extract,
            Task::MoveToPatient(_) => GoalKind::MoveToPatient,
            Task::HoldPerimeter(_) => GoalKind::HoldPerimeter,
            Task::HealPatient(_) => GoalKind::HealPatient,
            Task::Retreat(_) => GoalKind::Retreat,
            Task::Pause(_) => GoalKind::Pause,
        }
    }
}

impl TaskMachine for Task {
    fn start(&mut self, goal: &Goal, ctx: &mut TaskContext) {
        tracing::trace!(agent = %ctx.agent.id, kind = %self.kind(), "task start");
        dispatch!(self, task => task.start(goal, ctx))
    }

    fn update(&mut self, ctx: &mut TaskContext) {
        dispatch!(self, task => task.update(ctx))
    }

    fn stop(&mut self, ctx: &mut TaskContext) {
        dispatch!(self, task => task.stop(ctx))
    }

    fn outcome(&self) -> Option<TaskOutcome> {
        dispatch!(self, task => task.outcome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TaskConfig;
    use crate::core::types::{AgentId, AgentRole, FactionId, ItemInfo};
    use crate::sandbox::{InventoryMode, SandboxWorld};
    use crate::world::commands::posture;
    use crate::world::{
        AgentCommand, CommandBuffer, EntityKind, InteractKind, MoveResult, SpatialQuery, WorldEntity,
    };
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 0.1;

    struct Harness {
        world: SandboxWorld,
        agent: AgentId,
        config: TaskConfig,
        rng: ChaCha8Rng,
        commands: CommandBuffer,
        issued: Vec<AgentCommand>,
        now: f32,
    }

    impl Harness {
        fn new(start: Vec3) -> Self {
            let mut world = SandboxWorld::new(60, 60);
            let agent = world.add_agent(start, AgentRole::Combatant, FactionId(1));
            Self {
                world,
                agent,
                config: TaskConfig::default(),
                rng: ChaCha8Rng::seed_from_u64(11),
                commands: CommandBuffer::new(),
                issued: Vec::new(),
                now: 0.0,
            }
        }

        fn with_ctx(&mut self, f: impl FnOnce(&mut TaskContext)) {
            let view = self.world.agent_view(self.agent).unwrap();
            let mut ctx = TaskContext {
                agent: view,
                world: &self.world,
                commands: &mut self.commands,
                config: &self.config,
                rng: &mut self.rng,
                now: self.now,
            };
            f(&mut ctx);
        }

        fn flush(&mut self) {
            self.issued.extend(self.commands.iter().cloned());
            self.world.apply_commands(&mut self.commands);
        }

        fn start(&mut self, task: &mut Task, goal: &Goal) {
            self.with_ctx(|ctx| task.start(goal, ctx));
            self.flush();
        }

        fn run(&mut self, task: &mut Task, max_ticks: usize) -> Option<TaskOutcome> {
            for _ in 0..max_ticks {
                self.world.step(DT);
                self.now += DT;
                self.with_ctx(|ctx| task.update(ctx));
                self.flush();
                if task.is_complete() {
                    break;
                }
            }
            task.outcome()
        }
    }

    #[test]
    fn test_every_kind_maps_to_its_variant() {
        let kinds = [
            GoalKind::LootCorpse,
            GoalKind::OpenContainer,
            GoalKind::PickUpItem,
            GoalKind::TravelTo,
            GoalKind::Explore,
            GoalKind::SearchForItem,
            GoalKind::PlaceItem,
            GoalKind::Extract,
            GoalKind::MoveToPatient,
            GoalKind::HoldPerimeter,
            GoalKind::HealPatient,
            GoalKind::Retreat,
            GoalKind::Pause,
        ];
        for kind in kinds {
            let task = Task::for_kind(kind);
            assert_eq!(task.kind(), kind);
            assert!(!task.is_complete());
        }
    }

    #[test]
    fn test_travel_arrives() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        let goal = Goal::new(GoalKind::TravelTo, Vec3::new(15.0, 0.0, 5.0)).with_radius(1.0);
        let mut task = Task::for_kind(GoalKind::TravelTo);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 400), Some(TaskOutcome::Succeeded));
    }

    #[test]
    fn test_travel_to_walled_off_point_fails_unreachable() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        for x in 18..=22 {
            for z in 18..=22 {
                if x == 18 || x == 22 || z == 18 || z == 22 {
                    h.world.block_cell(x, z);
                }
            }
        }
        let goal = Goal::new(GoalKind::TravelTo, Vec3::new(20.5, 0.0, 20.5)).with_radius(0.5);
        let mut task = Task::for_kind(GoalKind::TravelTo);
        h.start(&mut task, &goal);
        assert_eq!(
            h.run(&mut task, 5),
            Some(TaskOutcome::Failed(FailReason::Unreachable))
        );
    }

    #[test]
    fn test_frozen_agent_is_reported_stuck() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        h.world.freeze_agent(h.agent);
        let goal = Goal::new(GoalKind::TravelTo, Vec3::new(30.0, 0.0, 5.0)).with_radius(1.0);
        let mut task = Task::for_kind(GoalKind::TravelTo);
        h.start(&mut task, &goal);
        let outcome = h.run(&mut task, 200);
        assert_eq!(outcome, Some(TaskOutcome::Stuck));
        // max_strikes re-issues after the first command, spaced by reissue_interval
        assert!(h.now >= h.config.reissue_interval * h.config.max_strikes as f32);
    }

    #[test]
    fn test_loot_corpse_moves_items_once_each() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        let items: Vec<ItemInfo> = (0..4).map(|i| ItemInfo::new(50.0 + i as f32, 1.0)).collect();
        let corpse = h.world.add_entity(
            WorldEntity::new(EntityKind::Corpse, Vec3::new(9.0, 0.0, 5.0)).with_items(items),
        );
        let goal = Goal::new(GoalKind::LootCorpse, Vec3::new(9.0, 0.0, 5.0)).with_entity(corpse);
        let mut task = Task::for_kind(GoalKind::LootCorpse);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 600), Some(TaskOutcome::Succeeded));

        let carried = h.world.inventory_of(h.agent);
        let left = h.world.entity(corpse).map(|e| e.items.len()).unwrap_or(0);
        assert!(!carried.is_empty());
        assert_eq!(carried.len() + left, 4);
        assert!(h.world.interactions().contains(&(h.agent, corpse, InteractKind::Search)));
    }

    #[test]
    fn test_container_is_opened_before_transfer() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        let crate_id = h.world.add_entity(
            WorldEntity::new(EntityKind::Container, Vec3::new(7.0, 0.0, 5.0))
                .with_items(vec![ItemInfo::new(80.0, 1.0)]),
        );
        let goal = Goal::new(GoalKind::OpenContainer, Vec3::new(7.0, 0.0, 5.0)).with_entity(crate_id);
        let mut task = Task::for_kind(GoalKind::OpenContainer);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 600), Some(TaskOutcome::Succeeded));
        assert!(h.issued.iter().any(|c| matches!(
            c,
            AgentCommand::Interact { kind: InteractKind::Open, .. }
        )));
        assert_eq!(h.world.inventory_of(h.agent).len(), 1);
    }

    #[test]
    fn test_never_completing_op_times_out_then_late_callback_ignored() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        h.world.set_inventory_mode(InventoryMode::Never);
        let loose = h.world.add_entity(
            WorldEntity::new(EntityKind::LooseItem, Vec3::new(6.0, 0.0, 5.0))
                .with_items(vec![ItemInfo::new(10.0, 1.0)]),
        );
        let goal = Goal::new(GoalKind::PickUpItem, Vec3::new(6.0, 0.0, 5.0)).with_entity(loose);
        let mut task = Task::for_kind(GoalKind::PickUpItem);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 200), Some(TaskOutcome::TimedOut));

        // The host finally answers; nothing changes
        assert_eq!(h.world.release_held(MoveResult::Moved), 1);
        h.run(&mut task, 5);
        assert_eq!(task.outcome(), Some(TaskOutcome::TimedOut));
    }

    #[test]
    fn test_deferred_pickup_completes() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        h.world.set_inventory_mode(InventoryMode::Deferred);
        let item = ItemInfo::new(10.0, 1.0);
        let loose = h.world.add_entity(
            WorldEntity::new(EntityKind::LooseItem, Vec3::new(6.0, 0.0, 5.0)).with_items(vec![item]),
        );
        let goal = Goal::new(GoalKind::PickUpItem, Vec3::new(6.0, 0.0, 5.0)).with_entity(loose);
        let mut task = Task::for_kind(GoalKind::PickUpItem);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 200), Some(TaskOutcome::Succeeded));
        assert_eq!(h.world.inventory_of(h.agent)[0].id, item.id);
    }

    #[test]
    fn test_restart_resets_state() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        let goal = Goal::new(GoalKind::TravelTo, Vec3::new(25.0, 0.0, 5.0)).with_radius(1.0);
        let mut task = Task::for_kind(GoalKind::TravelTo);
        h.start(&mut task, &goal);
        h.run(&mut task, 3);
        h.with_ctx(|ctx| task.stop(ctx));
        assert_eq!(task.outcome(), Some(TaskOutcome::Cancelled));

        h.start(&mut task, &goal);
        assert_eq!(task.outcome(), None);
        assert_eq!(h.run(&mut task, 600), Some(TaskOutcome::Succeeded));
    }

    #[test]
    fn test_extract_emits_extract_command() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        let goal = Goal::new(GoalKind::Extract, Vec3::new(8.0, 0.0, 5.0)).with_radius(2.0);
        let mut task = Task::for_kind(GoalKind::Extract);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 400), Some(TaskOutcome::Succeeded));
        assert!(h
            .issued
            .iter()
            .any(|c| matches!(c, AgentCommand::Extract { agent } if *agent == h.agent)));
    }

    #[test]
    fn test_explore_skips_unreachable_waypoint() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        for x in 28..=32 {
            for z in 28..=32 {
                if x == 28 || x == 32 || z == 28 || z == 32 {
                    h.world.block_cell(x, z);
                }
            }
        }
        let goal = Goal::new(GoalKind::Explore, Vec3::new(5.0, 0.0, 5.0))
            .with_radius(1.0)
            .with_waypoints(vec![Vec3::new(30.5, 0.0, 30.5), Vec3::new(9.0, 0.0, 5.0)]);
        let mut task = Task::for_kind(GoalKind::Explore);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 400), Some(TaskOutcome::Succeeded));
        if let Task::Explore(explore) = &task {
            assert_eq!(explore.visited(), 1);
        }
    }

    #[test]
    fn test_pause_finishes_after_duration() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        let mut task = Task::for_kind(GoalKind::Pause);
        h.start(&mut task, &Goal::pause(Vec3::ZERO));
        assert_eq!(h.run(&mut task, 10), None);
        assert_eq!(h.run(&mut task, 100), Some(TaskOutcome::Succeeded));
    }

    #[test]
    fn test_search_sweeps_until_item_is_spotted_then_takes_it() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        let wanted = ItemInfo::new(60.0, 1.0);
        h.world.add_entity(
            WorldEntity::new(EntityKind::LooseItem, Vec3::new(30.0, 0.0, 5.0)).with_items(vec![wanted]),
        );
        let goal = Goal::new(GoalKind::SearchForItem, Vec3::new(22.0, 0.0, 5.0))
            .with_radius(1.0)
            .with_item(wanted.id)
            .with_waypoints(vec![Vec3::new(12.0, 0.0, 5.0), Vec3::new(22.0, 0.0, 5.0)]);
        let mut task = Task::for_kind(GoalKind::SearchForItem);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 800), Some(TaskOutcome::Succeeded));
        assert!(h.world.inventory_of(h.agent).iter().any(|i| i.id == wanted.id));
    }

    #[test]
    fn test_search_for_absent_item_fails_after_last_waypoint() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        let missing = ItemInfo::new(60.0, 1.0);
        let goal = Goal::new(GoalKind::SearchForItem, Vec3::new(10.0, 0.0, 5.0))
            .with_radius(1.0)
            .with_item(missing.id);
        let mut task = Task::for_kind(GoalKind::SearchForItem);
        h.start(&mut task, &goal);
        assert_eq!(
            h.run(&mut task, 400),
            Some(TaskOutcome::Failed(FailReason::TargetMissing))
        );

        // Without an item there is nothing to look for
        let mut task = Task::for_kind(GoalKind::SearchForItem);
        h.start(&mut task, &Goal::new(GoalKind::SearchForItem, Vec3::new(10.0, 0.0, 5.0)));
        assert_eq!(task.outcome(), Some(TaskOutcome::Failed(FailReason::TargetMissing)));
    }

    #[test]
    fn test_place_item_leaves_it_on_the_ground() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        h.config.plant_duration = 1.0;
        let beacon = ItemInfo::new(5.0, 1.0);
        h.world.give_item(h.agent, beacon);
        let point = Vec3::new(12.0, 0.0, 5.0);
        let goal = Goal::new(GoalKind::PlaceItem, point).with_radius(1.0).with_item(beacon.id);
        let mut task = Task::for_kind(GoalKind::PlaceItem);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 400), Some(TaskOutcome::Succeeded));

        assert!(h.world.inventory_of(h.agent).is_empty());
        let on_ground = h
            .world
            .find_nearby(point, 1.0)
            .into_iter()
            .any(|e| e.kind == EntityKind::LooseItem && e.items.iter().any(|i| i.id == beacon.id));
        assert!(on_ground);
        assert!(h.issued.iter().any(|c| matches!(
            c,
            AgentCommand::SetPosture { value, .. } if *value == posture::CROUCHED
        )));
    }

    #[test]
    fn test_hold_perimeter_faces_outward_then_stands() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        h.config.hold_duration = 2.0;
        let goal = Goal::new(GoalKind::HoldPerimeter, Vec3::new(10.0, 0.0, 5.0))
            .with_radius(1.0)
            .with_facing(Vec3::X);
        let mut task = Task::for_kind(GoalKind::HoldPerimeter);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 10), None);
        assert_eq!(h.run(&mut task, 400), Some(TaskOutcome::Succeeded));

        assert!(h
            .issued
            .iter()
            .any(|c| matches!(c, AgentCommand::LookAt { direction, .. } if direction.x > 0.9)));
        let last_posture = h.issued.iter().rev().find_map(|c| match c {
            AgentCommand::SetPosture { value, .. } => Some(*value),
            _ => None,
        });
        assert_eq!(last_posture, Some(posture::STANDING));
    }

    #[test]
    fn test_heal_kneels_then_treats_patient() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        h.config.treat_duration = 2.0;
        let patient = h.world.add_patient(Vec3::new(12.0, 0.0, 5.0), 20.0, 100.0);
        let goal = Goal::new(GoalKind::HealPatient, Vec3::new(12.0, 0.0, 5.0))
            .with_radius(1.5)
            .with_entity(patient);
        let mut task = Task::for_kind(GoalKind::HealPatient);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 600), Some(TaskOutcome::Succeeded));
        assert!(h.world.interactions().contains(&(h.agent, patient, InteractKind::Treat)));

        let mut task = Task::for_kind(GoalKind::HealPatient);
        h.start(&mut task, &Goal::new(GoalKind::HealPatient, Vec3::new(12.0, 0.0, 5.0)));
        assert_eq!(task.outcome(), Some(TaskOutcome::Failed(FailReason::TargetMissing)));
    }

    #[test]
    fn test_move_to_patient_tracks_entity_over_stale_point() {
        let mut h = Harness::new(Vec3::new(5.0, 0.0, 5.0));
        let patient = h.world.add_patient(Vec3::new(15.0, 0.0, 5.0), 20.0, 100.0);
        let goal = Goal::new(GoalKind::MoveToPatient, Vec3::new(5.0, 0.0, 25.0))
            .with_radius(1.0)
            .with_entity(patient);
        let mut task = Task::for_kind(GoalKind::MoveToPatient);
        h.start(&mut task, &goal);
        assert_eq!(h.run(&mut task, 400), Some(TaskOutcome::Succeeded));

        let at = h.world.agent_view(h.agent).unwrap().position;
        assert!(crate::core::types::flat_distance(at, Vec3::new(15.0, 0.0, 5.0)) <= 1.1);
    }
}
