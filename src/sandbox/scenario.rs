//! Seeded scenario generation for the runner binary and integration tests

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, AgentRole, EntityId, FactionId, ItemInfo};
use crate::sandbox::world::SandboxWorld;
use crate::world::{EntityKind, WorldEntity, Zone, ZoneKind};

const MARGIN: f32 = 4.0;
const WALL_LENGTH: i32 = 8;

/// What to put in a generated world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSpec {
    pub width: u32,
    pub height: u32,
    pub combatants: usize,
    pub civilians: usize,
    pub corpses: usize,
    pub containers: usize,
    pub loose_items: usize,
    pub walls: usize,
    /// Place a wounded patient in the middle of the map
    pub patient: bool,
}

impl Default for ScenarioSpec {
    fn default() -> Self {
        Self {
            width: 120,
            height: 120,
            combatants: 3,
            civilians: 1,
            corpses: 6,
            containers: 3,
            loose_items: 6,
            walls: 6,
            patient: true,
        }
    }
}

#[derive(Debug)]
pub struct Scenario {
    pub world: SandboxWorld,
    pub agents: Vec<AgentId>,
    pub patient: Option<EntityId>,
}

impl Scenario {
    pub fn generate<R: Rng + ?Sized>(spec: &ScenarioSpec, rng: &mut R) -> Self {
        let mut world = SandboxWorld::new(spec.width, spec.height);
        let width = spec.width as f32;
        let height = spec.height as f32;

        for _ in 0..spec.walls {
            let x = rng.gen_range(0..spec.width.max(1)) as i32;
            let z = rng.gen_range(0..spec.height.max(1)) as i32;
            let horizontal = rng.gen_bool(0.5);
            for i in 0..WALL_LENGTH {
                if horizontal {
                    world.block_cell(x + i, z);
                } else {
                    world.block_cell(x, z + i);
                }
            }
        }

        let place = |rng: &mut R, world: &SandboxWorld| -> Vec3 {
            let wanted = Vec3::new(
                rng.gen_range(MARGIN..(width - MARGIN).max(MARGIN + 1.0)),
                0.0,
                rng.gen_range(MARGIN..(height - MARGIN).max(MARGIN + 1.0)),
            );
            world.grid().nearest_walkable(wanted).unwrap_or(wanted)
        };

        for (kind, count) in [
            (EntityKind::Corpse, spec.corpses),
            (EntityKind::Container, spec.containers),
            (EntityKind::LooseItem, spec.loose_items),
        ] {
            for _ in 0..count {
                let position = place(&mut *rng, &world);
                let items = match kind {
                    EntityKind::LooseItem => vec![random_item(rng)],
                    _ => (0..rng.gen_range(1..=4)).map(|_| random_item(rng)).collect(),
                };
                world.add_entity(WorldEntity::new(kind, position).with_items(items));
            }
        }

        let landmark = place(&mut *rng, &world);
        world.add_zone(Zone::new("watchtower", ZoneKind::Landmark, landmark, 3.0));
        let patrol = place(&mut *rng, &world);
        world.add_zone(Zone::new("old barracks", ZoneKind::Patrol, patrol, 6.0).hostile());
        let cache = place(&mut *rng, &world);
        let stash = random_item(rng);
        world.add_entity(WorldEntity::new(EntityKind::LooseItem, cache).with_items(vec![stash]));
        world.add_zone(Zone::new("supply cache", ZoneKind::Cache, cache, 4.0).with_item(stash.id));
        let exit = world
            .grid()
            .nearest_walkable(Vec3::new(MARGIN, 0.0, MARGIN))
            .unwrap_or(Vec3::new(MARGIN, 0.0, MARGIN));
        world.add_zone(Zone::new("south gate", ZoneKind::Extract, exit, 4.0));

        let mut agents = Vec::with_capacity(spec.combatants + spec.civilians);
        for (role, count) in [(AgentRole::Combatant, spec.combatants), (AgentRole::Civilian, spec.civilians)] {
            for _ in 0..count {
                let position = place(&mut *rng, &world);
                agents.push(world.add_agent(position, role, FactionId(1)));
            }
        }

        let patient = spec.patient.then(|| {
            let center = Vec3::new(width / 2.0, 0.0, height / 2.0);
            let position = world.grid().nearest_walkable(center).unwrap_or(center);
            world.add_patient(position, 25.0, 100.0)
        });

        tracing::debug!(agents = agents.len(), patient = ?patient, "scenario generated");
        Self {
            world,
            agents,
            patient,
        }
    }
}

fn random_item<R: Rng + ?Sized>(rng: &mut R) -> ItemInfo {
    ItemInfo::new(rng.gen_range(5.0..120.0), rng.gen_range(0.5..4.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SpatialQuery;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_generates_requested_population() {
        let spec = ScenarioSpec::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let scenario = Scenario::generate(&spec, &mut rng);

        assert_eq!(scenario.agents.len(), spec.combatants + spec.civilians);
        assert!(scenario.patient.is_some());
        assert_eq!(scenario.world.zones().len(), 4);
        let everything = scenario.world.find_nearby(Vec3::new(60.0, 0.0, 60.0), 200.0);
        // corpses + containers + loose items + cache stash + patient
        assert_eq!(everything.len(), spec.corpses + spec.containers + spec.loose_items + 2);
    }
}
