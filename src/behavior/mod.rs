//! Behavior arbitration
//!
//! Architecture:
//! - [`BehaviorLayer`] is one domain of behavior for one agent
//! - [`AgentBrain`] owns an agent's layers and picks the active one each tick
//! - [`ActivationGate`] applies the shared pacing policy (combat, cooldown, cap)
//! - [`TaskRunner`] owns the single task a layer is running

pub mod brain;
pub mod context;
pub mod gate;
pub mod layer;
pub mod looting;
pub mod objectives;
pub mod questing;
pub mod runner;
pub mod squad;

pub use brain::AgentBrain;
pub use context::LayerContext;
pub use gate::{ActivationGate, GatePolicy, GateReason, GateState};
pub use layer::BehaviorLayer;
pub use looting::{LootingLayer, LOOTING_PRIORITY};
pub use objectives::ObjectiveQueue;
pub use questing::{QuestingLayer, QUESTING_PRIORITY};
pub use runner::TaskRunner;
pub use squad::{EscortLayer, MedicLayer, ESCORT_PRIORITY, MEDIC_PRIORITY};
