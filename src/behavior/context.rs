//! Everything a behavior layer may touch during one tick

use rand_chacha::ChaCha8Rng;

use crate::core::config::BotConfig;
use crate::core::types::{AgentView, Seconds};
use crate::events::{BotEventKind, EventLog};
use crate::mission::MissionSnapshot;
use crate::targeting::ClaimRegistry;
use crate::tasks::TaskContext;
use crate::world::{Awareness, CommandBuffer, WorldFacade};

pub struct LayerContext<'a> {
    pub agent: AgentView,
    pub world: &'a dyn WorldFacade,
    pub commands: &'a mut CommandBuffer,
    pub config: &'a BotConfig,
    pub claims: &'a mut ClaimRegistry,
    pub awareness: &'a Awareness,
    /// Copy of the mission state taken this tick, when missions are enabled
    pub mission: Option<&'a MissionSnapshot>,
    pub events: &'a mut EventLog,
    pub rng: &'a mut ChaCha8Rng,
    pub now: Seconds,
}

impl<'a> LayerContext<'a> {
    /// Narrow view handed to the active task
    pub fn tasks(&mut self) -> TaskContext<'_> {
        TaskContext {
            agent: self.agent,
            world: self.world,
            commands: &mut *self.commands,
            config: &self.config.tasks,
            rng: &mut *self.rng,
            now: self.now,
        }
    }

    pub fn emit(&mut self, kind: BotEventKind) {
        self.events.push(self.now, kind);
    }
}
