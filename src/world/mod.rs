//! World access facade: the services the core consumes from its host
//!
//! The core reads the world through [`SpatialQuery`] and [`Navigation`],
//! mutates inventories through [`InventoryService`], actuates agents by
//! emitting [`AgentCommand`]s, and drives missions through [`SquadServices`].

pub mod awareness;
pub mod commands;
pub mod entity;
pub mod inventory;
pub mod query;
pub mod squad;

pub use awareness::{Awareness, AwarenessAdapter};
pub use commands::{AgentCommand, CommandBuffer, InteractKind};
pub use entity::{EntityKind, WorldEntity, Zone, ZoneKind};
pub use inventory::{
    Completion, InventoryService, ItemDestination, MoveFailure, MoveRequest, MoveResult, OpInbox,
    OpPoll, OpResolution, OpSlot, OpTicket,
};
pub use query::{Navigation, SpatialQuery};
pub use squad::{Participant, PatientStatus, SpawnRequest, SquadServices, TreatmentEffect};

/// Everything an agent's tasks need from the host world
pub trait WorldFacade: SpatialQuery + Navigation + InventoryService {}

impl<T: SpatialQuery + Navigation + InventoryService + ?Sized> WorldFacade for T {}
