//! In-memory world implementing every service the core consumes
//!
//! Agents walk grid paths at a fixed speed, entities live in a sparse hash
//! grid, and inventory moves complete immediately, on the next step, or only
//! when the test releases them. Services take `&self`, so mutable state sits
//! in a `RefCell`.

use std::cell::RefCell;
use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};
use glam::Vec3;

use crate::core::error::MissionError;
use crate::core::types::{flat_distance, AgentId, AgentRole, AgentView, EntityId, FactionId, ItemInfo, Seconds};
use crate::mission::{MissionEvent, MissionInbox};
use crate::sandbox::grid::NavGrid;
use crate::sandbox::spatial::SparseHashGrid;
use crate::world::commands::posture;
use crate::world::{
    AgentCommand, CommandBuffer, Completion, EntityKind, InteractKind, InventoryService, ItemDestination,
    MoveFailure, MoveRequest, MoveResult, Navigation, Participant, PatientStatus, SpatialQuery, SpawnRequest,
    SquadServices, TreatmentEffect, WorldEntity, Zone,
};

/// Walking speed at a speed setting of 1.0 (units per second)
pub const BASE_SPEED: f32 = 3.0;
/// How close an agent must stand to take items from an entity
pub const INTERACT_RANGE: f32 = 3.0;
pub const DEFAULT_FREE_SPACE: f32 = 20.0;
const SPATIAL_CELL: f32 = 8.0;
/// Spacing between members of one spawn batch
const SPAWN_SPACING: f32 = 1.5;

/// When the sandbox answers inventory moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InventoryMode {
    /// Inside `attempt_move`
    #[default]
    Immediate,
    /// On the next `step`
    Deferred,
    /// Only through `release_held`
    Never,
}

#[derive(Debug, Clone)]
struct SandboxAgent {
    position: Vec3,
    alive: bool,
    faction: FactionId,
    role: AgentRole,
    free_space: f32,
    speed: f32,
    posture: f32,
    facing: Vec3,
    path: VecDeque<Vec3>,
    frozen: bool,
    inventory: Vec<ItemInfo>,
}

impl SandboxAgent {
    fn view(&self, id: AgentId) -> AgentView {
        AgentView {
            id,
            position: self.position,
            alive: self.alive,
            faction: self.faction,
            role: self.role,
            free_space: self.free_space,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PatientState {
    health: f32,
    max_health: f32,
    accessible: bool,
}

#[derive(Debug, Default)]
struct State {
    agents: AHashMap<AgentId, SandboxAgent>,
    agent_order: Vec<AgentId>,
    entities: AHashMap<EntityId, WorldEntity>,
    patients: AHashMap<EntityId, PatientState>,
    deferred: Vec<(MoveRequest, Completion)>,
    held: Vec<(MoveRequest, Completion)>,
    spawns: Vec<SpawnRequest>,
    spawn_failure: Option<String>,
    non_hostile: AHashSet<(Participant, Participant)>,
    treatment_total: f32,
    despawned: Vec<AgentId>,
}

impl State {
    fn remove_agent(&mut self, agent: AgentId) -> Option<SandboxAgent> {
        self.agent_order.retain(|&a| a != agent);
        self.agents.remove(&agent)
    }
}

pub struct SandboxWorld {
    grid: NavGrid,
    spatial: RefCell<SparseHashGrid>,
    state: RefCell<State>,
    zones: Vec<Zone>,
    inventory_mode: InventoryMode,
    mission_inbox: Option<MissionInbox>,
    interactions: Vec<(AgentId, EntityId, InteractKind)>,
    extracted: Vec<AgentId>,
    now: Seconds,
}

impl SandboxWorld {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            grid: NavGrid::new(width, height),
            spatial: RefCell::new(SparseHashGrid::new(SPATIAL_CELL)),
            state: RefCell::new(State::default()),
            zones: Vec::new(),
            inventory_mode: InventoryMode::Immediate,
            mission_inbox: None,
            interactions: Vec::new(),
            extracted: Vec::new(),
            now: 0.0,
        }
    }

    pub fn now(&self) -> Seconds {
        self.now
    }

    pub fn grid(&self) -> &NavGrid {
        &self.grid
    }

    pub fn block_cell(&mut self, x: i32, z: i32) {
        self.grid.block((x, z));
    }

    pub fn add_agent(&mut self, position: Vec3, role: AgentRole, faction: FactionId) -> AgentId {
        let id = AgentId::new();
        let state = self.state.get_mut();
        state.agents.insert(id, new_agent(position, role, faction));
        state.agent_order.push(id);
        id
    }

    pub fn agent_view(&self, agent: AgentId) -> Option<AgentView> {
        self.state.borrow().agents.get(&agent).map(|a| a.view(agent))
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.state.borrow().agent_order.clone()
    }

    pub fn set_free_space(&mut self, agent: AgentId, free_space: f32) {
        if let Some(a) = self.state.get_mut().agents.get_mut(&agent) {
            a.free_space = free_space;
        }
    }

    /// The agent ignores move orders from now on
    pub fn freeze_agent(&mut self, agent: AgentId) {
        if let Some(a) = self.state.get_mut().agents.get_mut(&agent) {
            a.frozen = true;
            a.path.clear();
        }
    }

    pub fn give_item(&mut self, agent: AgentId, item: ItemInfo) {
        if let Some(a) = self.state.get_mut().agents.get_mut(&agent) {
            a.free_space = (a.free_space - item.size).max(0.0);
            a.inventory.push(item);
        }
    }

    pub fn inventory_of(&self, agent: AgentId) -> Vec<ItemInfo> {
        self.state
            .borrow()
            .agents
            .get(&agent)
            .map(|a| a.inventory.clone())
            .unwrap_or_default()
    }

    pub fn posture_of(&self, agent: AgentId) -> Option<f32> {
        self.state.borrow().agents.get(&agent).map(|a| a.posture)
    }

    pub fn facing_of(&self, agent: AgentId) -> Option<Vec3> {
        self.state.borrow().agents.get(&agent).map(|a| a.facing)
    }

    /// Kill an agent: it stays in the world as a corpse carrying its inventory
    pub fn kill_agent(&mut self, agent: AgentId) -> Option<EntityId> {
        let state = self.state.get_mut();
        let a = state.agents.get_mut(&agent)?;
        if !a.alive {
            return None;
        }
        a.alive = false;
        a.path.clear();
        let items = std::mem::take(&mut a.inventory);
        let position = a.position;
        let corpse = WorldEntity {
            id: EntityId::from(agent),
            kind: EntityKind::Corpse,
            position,
            items,
        };
        let id = self.add_entity(corpse);
        if let Some(inbox) = &self.mission_inbox {
            inbox.post(MissionEvent::AgentDied { agent });
        }
        tracing::debug!(%agent, "sandbox agent killed");
        Some(id)
    }

    pub fn add_entity(&mut self, entity: WorldEntity) -> EntityId {
        let id = entity.id;
        self.spatial.get_mut().insert(id, entity.position);
        self.state.get_mut().entities.insert(id, entity);
        id
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<WorldEntity> {
        let state = self.state.get_mut();
        let entity = state.entities.remove(&id)?;
        state.patients.remove(&id);
        self.spatial.get_mut().remove(id, entity.position);
        Some(entity)
    }

    pub fn add_zone(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    /// A wounded entity a squad can be sent to treat
    pub fn add_patient(&mut self, position: Vec3, health: f32, max_health: f32) -> EntityId {
        let id = self.add_entity(WorldEntity::new(EntityKind::Other, position));
        self.state.get_mut().patients.insert(
            id,
            PatientState {
                health,
                max_health,
                accessible: true,
            },
        );
        id
    }

    pub fn set_patient_accessible(&mut self, patient: EntityId, accessible: bool) {
        if let Some(p) = self.state.get_mut().patients.get_mut(&patient) {
            p.accessible = accessible;
        }
    }

    pub fn patient_health(&self, patient: EntityId) -> Option<f32> {
        self.state.borrow().patients.get(&patient).map(|p| p.health)
    }

    /// Total treatment applied across all patients
    pub fn treatment_total(&self) -> f32 {
        self.state.borrow().treatment_total
    }

    /// Make every following spawn request fail with `reason`
    pub fn fail_spawns(&mut self, reason: impl Into<String>) {
        self.state.get_mut().spawn_failure = Some(reason.into());
    }

    pub fn attach_mission_inbox(&mut self, inbox: MissionInbox) {
        self.mission_inbox = Some(inbox);
    }

    pub fn set_inventory_mode(&mut self, mode: InventoryMode) {
        self.inventory_mode = mode;
    }

    /// Answer every held inventory request with `result`; returns how many were answered
    pub fn release_held(&mut self, result: MoveResult) -> usize {
        let held = std::mem::take(&mut self.state.get_mut().held);
        let count = held.len();
        for (_, completion) in held {
            completion.complete(result);
        }
        count
    }

    pub fn interactions(&self) -> &[(AgentId, EntityId, InteractKind)] {
        &self.interactions
    }

    pub fn extracted(&self) -> &[AgentId] {
        &self.extracted
    }

    pub fn despawned(&self) -> Vec<AgentId> {
        self.state.borrow().despawned.clone()
    }

    pub fn are_non_hostile(&self, a: Participant, b: Participant) -> bool {
        self.state.borrow().non_hostile.contains(&(a, b))
    }

    /// Apply and consume the commands emitted this tick
    pub fn apply_commands(&mut self, commands: &mut CommandBuffer) {
        for command in commands.drain() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: AgentCommand) {
        let agent_id = command.agent();
        if let AgentCommand::Extract { agent } = command {
            if self.state.get_mut().remove_agent(agent).is_some() {
                tracing::debug!(%agent, "sandbox agent extracted");
                self.extracted.push(agent);
            }
            return;
        }
        if let AgentCommand::Interact { agent, entity, kind } = command {
            self.interactions.push((agent, entity, kind));
            return;
        }

        let grid = &self.grid;
        let state = self.state.get_mut();
        let Some(agent) = state.agents.get_mut(&agent_id) else {
            return;
        };
        if !agent.alive {
            return;
        }
        match command {
            AgentCommand::MoveTo { point, .. } => {
                agent.path.clear();
                if agent.frozen {
                    return;
                }
                // The host moves nowhere when it cannot find a complete path
                if let Some(path) = grid.find_path(agent.position, point) {
                    agent.path.extend(path.into_iter().skip(1));
                }
            }
            AgentCommand::Stop { .. } => agent.path.clear(),
            AgentCommand::SetPosture { value, .. } => agent.posture = value,
            AgentCommand::SetSpeed { value, .. } => agent.speed = value,
            AgentCommand::LookAt { direction, .. } => agent.facing = direction,
            AgentCommand::Interact { .. } | AgentCommand::Extract { .. } => {}
        }
    }

    /// Advance the world by `dt` seconds
    pub fn step(&mut self, dt: Seconds) {
        self.now += dt;

        let deferred = std::mem::take(&mut self.state.get_mut().deferred);
        for (request, completion) in deferred {
            let result = perform_move(self.state.get_mut(), self.spatial.get_mut(), &request);
            completion.complete(result);
        }

        let spawns = std::mem::take(&mut self.state.get_mut().spawns);
        for request in spawns {
            self.spawn_batch(request);
        }

        let state = self.state.get_mut();
        for id in &state.agent_order {
            let Some(agent) = state.agents.get_mut(id) else {
                continue;
            };
            if !agent.alive || agent.frozen {
                continue;
            }
            let mut budget = BASE_SPEED * agent.speed * dt;
            while budget > 0.0 {
                let Some(&next) = agent.path.front() else {
                    break;
                };
                let distance = flat_distance(agent.position, next);
                if distance <= budget {
                    agent.position = next;
                    agent.path.pop_front();
                    budget -= distance;
                } else {
                    let direction = (next - agent.position) / distance;
                    agent.position += direction * budget;
                    budget = 0.0;
                }
            }
        }
    }

    fn spawn_batch(&mut self, request: SpawnRequest) {
        for i in 0..request.count {
            let wanted = request.position + Vec3::new(0.0, 0.0, i as f32 * SPAWN_SPACING);
            let Some(position) = self.grid.nearest_walkable(wanted) else {
                tracing::warn!(role = %request.role, "no walkable cell for spawn");
                continue;
            };
            let id = self.add_agent(position, request.role, request.faction);
            if let Some(inbox) = &self.mission_inbox {
                inbox.post(MissionEvent::AgentSpawned {
                    agent: id,
                    role: request.role,
                });
            }
            tracing::debug!(agent = %id, role = %request.role, "sandbox agent spawned");
        }
    }
}

impl std::fmt::Debug for SandboxWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SandboxWorld")
            .field("width", &self.grid.width())
            .field("height", &self.grid.height())
            .field("agents", &state.agents.len())
            .field("entities", &state.entities.len())
            .field("now", &self.now)
            .finish()
    }
}

fn new_agent(position: Vec3, role: AgentRole, faction: FactionId) -> SandboxAgent {
    SandboxAgent {
        position,
        alive: true,
        faction,
        role,
        free_space: DEFAULT_FREE_SPACE,
        speed: 1.0,
        posture: posture::STANDING,
        facing: Vec3::Z,
        path: VecDeque::new(),
        frozen: false,
        inventory: Vec::new(),
    }
}

/// Validate and apply one inventory move
fn perform_move(state: &mut State, spatial: &mut SparseHashGrid, request: &MoveRequest) -> MoveResult {
    let Some(actor) = state.agents.get(&request.agent).filter(|a| a.alive) else {
        return MoveResult::Failed(MoveFailure::Rejected);
    };
    let actor_position = actor.position;

    let item = match request.source {
        Some(source) => {
            let Some(entity) = state.entities.get(&source) else {
                return MoveResult::Failed(MoveFailure::ItemMissing);
            };
            if flat_distance(actor_position, entity.position) > INTERACT_RANGE {
                return MoveResult::Failed(MoveFailure::OutOfRange);
            }
            match entity.items.iter().find(|i| i.id == request.item) {
                Some(item) => *item,
                None => return MoveResult::Failed(MoveFailure::ItemMissing),
            }
        }
        None => match actor.inventory.iter().find(|i| i.id == request.item) {
            Some(item) => *item,
            None => return MoveResult::Failed(MoveFailure::ItemMissing),
        },
    };

    if let ItemDestination::Agent(receiver) = request.destination {
        match state.agents.get(&receiver).filter(|a| a.alive) {
            Some(r) if r.free_space >= item.size => {}
            Some(_) => return MoveResult::Failed(MoveFailure::InventoryFull),
            None => return MoveResult::Failed(MoveFailure::Rejected),
        }
    }

    // Take the item from its source
    match request.source {
        Some(source) => {
            let mut emptied = None;
            if let Some(entity) = state.entities.get_mut(&source) {
                entity.items.retain(|i| i.id != item.id);
                if entity.kind == EntityKind::LooseItem && entity.items.is_empty() {
                    emptied = Some(entity.position);
                }
            }
            if let Some(position) = emptied {
                state.entities.remove(&source);
                spatial.remove(source, position);
            }
        }
        None => {
            if let Some(actor) = state.agents.get_mut(&request.agent) {
                actor.inventory.retain(|i| i.id != item.id);
                actor.free_space += item.size;
            }
        }
    }

    match request.destination {
        ItemDestination::Agent(receiver) => {
            if let Some(r) = state.agents.get_mut(&receiver) {
                r.free_space -= item.size;
                r.inventory.push(item);
            }
        }
        ItemDestination::Ground(point) => {
            let dropped = WorldEntity::new(EntityKind::LooseItem, point).with_items(vec![item]);
            spatial.insert(dropped.id, point);
            state.entities.insert(dropped.id, dropped);
        }
    }
    MoveResult::Moved
}

impl SpatialQuery for SandboxWorld {
    fn find_nearby(&self, point: Vec3, radius: f32) -> Vec<WorldEntity> {
        let ids = self.spatial.borrow().query_radius(point, radius);
        let state = self.state.borrow();
        ids.into_iter()
            .filter_map(|id| state.entities.get(&id).cloned())
            .collect()
    }

    fn entity(&self, id: EntityId) -> Option<WorldEntity> {
        self.state.borrow().entities.get(&id).cloned()
    }

    fn agent(&self, id: AgentId) -> Option<AgentView> {
        self.agent_view(id)
    }

    fn agents(&self) -> Vec<AgentView> {
        let state = self.state.borrow();
        state
            .agent_order
            .iter()
            .filter_map(|id| state.agents.get(id).map(|a| a.view(*id)))
            .collect()
    }

    fn zones(&self) -> Vec<Zone> {
        self.zones.clone()
    }
}

impl Navigation for SandboxWorld {
    fn compute_path(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>> {
        self.grid.find_path(from, to)
    }
}

impl InventoryService for SandboxWorld {
    fn attempt_move(&self, request: MoveRequest, completion: Completion) {
        match self.inventory_mode {
            InventoryMode::Immediate => {
                let result = {
                    let mut state = self.state.borrow_mut();
                    let mut spatial = self.spatial.borrow_mut();
                    perform_move(&mut state, &mut spatial, &request)
                };
                completion.complete(result);
            }
            InventoryMode::Deferred => self.state.borrow_mut().deferred.push((request, completion)),
            InventoryMode::Never => self.state.borrow_mut().held.push((request, completion)),
        }
    }
}

impl SquadServices for SandboxWorld {
    fn request_spawn(&self, request: SpawnRequest) -> Result<(), MissionError> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = &state.spawn_failure {
            return Err(MissionError::SpawnFailed(reason.clone()));
        }
        state.spawns.push(request);
        Ok(())
    }

    fn despawn(&self, agent: AgentId) {
        let mut state = self.state.borrow_mut();
        if state.remove_agent(agent).is_some() {
            state.despawned.push(agent);
        }
    }

    fn relocate(&self, agent: AgentId, point: Vec3) {
        let target = self.grid.nearest_walkable(point).unwrap_or(point);
        if let Some(a) = self.state.borrow_mut().agents.get_mut(&agent) {
            a.position = target;
            a.path.clear();
        }
    }

    fn set_non_hostile(&self, a: Participant, b: Participant) {
        let mut state = self.state.borrow_mut();
        state.non_hostile.insert((a, b));
        state.non_hostile.insert((b, a));
    }

    fn apply_treatment(&self, patient: EntityId, effect: TreatmentEffect) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if let Some(p) = state.patients.get_mut(&patient) {
            p.health = (p.health + effect.amount).min(p.max_health);
            state.treatment_total += effect.amount;
        }
    }

    fn patient_status(&self, patient: EntityId) -> Option<PatientStatus> {
        let state = self.state.borrow();
        let p = state.patients.get(&patient)?;
        let entity = state.entities.get(&patient)?;
        Some(PatientStatus {
            position: entity.position,
            alive: p.health > 0.0,
            accessible: p.accessible,
            needs_treatment: p.health < p.max_health,
        })
    }
}
