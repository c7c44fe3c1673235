//! Bot Directive - behavior arbitration, target claims, task state machines
//! and squad missions for autonomous agents in a host-simulated world

pub mod behavior;
pub mod core;
pub mod director;
pub mod events;
pub mod mission;
pub mod sandbox;
pub mod targeting;
pub mod tasks;
pub mod world;

pub use crate::behavior::AgentBrain;
pub use crate::core::config::BotConfig;
pub use crate::core::error::{BotError, Result};
pub use crate::director::AgentDirector;
pub use crate::events::{BotEvent, BotEventKind, EventLog};
pub use crate::mission::MissionHandle;
