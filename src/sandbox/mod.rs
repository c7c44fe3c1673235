//! Self-contained world for tests and the headless runner
//!
//! [`SandboxWorld`] implements spatial queries, grid navigation, inventory
//! mutation and squad services. It stands in for a host engine; it is not
//! meant to be one.

pub mod awareness;
pub mod grid;
pub mod scenario;
pub mod spatial;
pub mod world;

pub use awareness::SandboxAwareness;
pub use grid::NavGrid;
pub use scenario::{Scenario, ScenarioSpec};
pub use spatial::SparseHashGrid;
pub use world::{InventoryMode, SandboxWorld, BASE_SPEED, INTERACT_RANGE};
