//! Per-agent arbitration between behavior layers
//!
//! Layers are polled highest priority first; the first active one wins. Every
//! call into a layer is guarded: a layer error is logged with the agent and
//! call site, recorded as an event, and replaced by a safe default.

use crate::behavior::context::LayerContext;
use crate::behavior::layer::BehaviorLayer;
use crate::behavior::looting::LootingLayer;
use crate::behavior::questing::QuestingLayer;
use crate::behavior::squad::{EscortLayer, MedicLayer};
use crate::core::config::BotConfig;
use crate::core::error::Result;
use crate::core::types::AgentId;
use crate::events::BotEventKind;
use crate::tasks::{ActionDescriptor, Goal};

pub struct AgentBrain {
    agent: AgentId,
    /// Sorted by priority, highest first; equal priorities keep registration order
    layers: Vec<Box<dyn BehaviorLayer>>,
    active: Option<usize>,
}

impl AgentBrain {
    pub fn new(agent: AgentId) -> Self {
        Self {
            agent,
            layers: Vec::new(),
            active: None,
        }
    }

    /// Medic, escort, looting and questing, in that order of precedence
    pub fn with_default_layers(agent: AgentId, config: &BotConfig) -> Self {
        let mut brain = Self::new(agent);
        brain.add_layer(Box::new(LootingLayer::new(agent, &config.targeting)));
        brain.add_layer(Box::new(QuestingLayer::new()));
        brain.add_layer(Box::new(MedicLayer::new()));
        brain.add_layer(Box::new(EscortLayer::new()));
        brain
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn add_layer(&mut self, layer: Box<dyn BehaviorLayer>) {
        let priority = layer.priority();
        let pos = self
            .layers
            .iter()
            .position(|l| priority > l.priority())
            .unwrap_or(self.layers.len());
        self.layers.insert(pos, layer);
        if let Some(active) = self.active.as_mut() {
            if pos <= *active {
                *active += 1;
            }
        }
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    pub fn active_layer(&self) -> Option<&'static str> {
        self.active.and_then(|i| self.layers.get(i)).map(|l| l.name())
    }

    fn guard<T>(&self, ctx: &mut LayerContext, site: &'static str, result: Result<T>, fallback: T) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(agent = %self.agent, site, error = %err, "behavior layer failed");
                ctx.emit(BotEventKind::InvariantViolation {
                    agent: Some(self.agent),
                    site: site.to_string(),
                    detail: err.to_string(),
                });
                fallback
            }
        }
    }

    /// One arbitration and update step
    pub fn tick(&mut self, ctx: &mut LayerContext) {
        if !ctx.agent.alive {
            self.shutdown(ctx);
            return;
        }

        let mut winner = None;
        for index in 0..self.layers.len() {
            let result = self.layers[index].is_active(ctx);
            if self.guard(ctx, "brain.is_active", result, false) {
                winner = Some(index);
                break;
            }
        }

        if winner != self.active {
            self.switch_to(winner, ctx);
        }

        if let Some(index) = self.active {
            let result = self.layers[index].update(ctx);
            if result.is_err() {
                // Hold still this tick rather than act on a broken plan
                ctx.commands.stop(self.agent);
            }
            self.guard(ctx, "brain.update", result, ());
        }
    }

    fn switch_to(&mut self, next: Option<usize>, ctx: &mut LayerContext) {
        let from = self.active_layer().map(str::to_string);
        if let Some(previous) = self.active.take() {
            self.layers[previous].stop(ctx);
        }
        let to = next.and_then(|i| self.layers.get(i)).map(|l| l.name());
        tracing::debug!(agent = %self.agent, from = ?from, to = ?to, "layer switched");
        ctx.emit(BotEventKind::LayerSwitched {
            agent: self.agent,
            from,
            to: to.map(str::to_string),
        });
        if let Some(index) = next {
            let result = self.layers[index].start(ctx);
            self.guard(ctx, "brain.start", result, ());
            self.active = Some(index);
        }
    }

    /// The active layer's next goal; a pause when nothing is active or the layer fails
    pub fn next_action(&mut self, ctx: &mut LayerContext) -> ActionDescriptor {
        let pause = ActionDescriptor::new(Goal::pause(ctx.agent.position), "fallback pause");
        let Some(index) = self.active else {
            return pause;
        };
        let result = self.layers[index].next_action(ctx);
        self.guard(ctx, "brain.next_action", result, pause)
    }

    /// Whether the active action is finishing; "ending" when unknown
    pub fn is_action_ending(&self, ctx: &mut LayerContext) -> bool {
        let Some(layer) = self.active.and_then(|i| self.layers.get(i)) else {
            return true;
        };
        let result = layer.is_action_ending();
        self.guard(ctx, "brain.is_action_ending", result, true)
    }

    /// Stop the active layer, releasing whatever it holds
    pub fn shutdown(&mut self, ctx: &mut LayerContext) {
        if self.active.is_some() {
            self.switch_to(None, ctx);
        }
    }
}

impl std::fmt::Debug for AgentBrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentBrain")
            .field("agent", &self.agent)
            .field("layers", &self.layer_names())
            .field("active", &self.active_layer())
            .finish()
    }
}
