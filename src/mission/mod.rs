//! Squad mission controller
//!
//! A mission spawns a small squad around a patient, moves it into a defensive
//! ring, lets the lead treat the patient, then withdraws and dismisses the
//! squad. [`MissionHandle`] is the shared entry point; spawn and death reports
//! arrive through its [`MissionInbox`].

pub mod allegiance;
pub mod controller;
pub mod correlation;
pub mod formation;
pub mod handle;
pub mod inbox;
pub mod roster;

pub use allegiance::Allegiance;
pub use controller::{MissionController, MissionSnapshot};
pub use correlation::SpawnCorrelation;
pub use handle::MissionHandle;
pub use inbox::{MissionEvent, MissionInbox};
pub use roster::{Member, MemberRole, MissionPhase, Roster, TreatStage};
