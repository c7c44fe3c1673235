//! Target acquisition and claims
//!
//! Architecture:
//! - [`TargetScanner`] is owned by one agent: candidate queue, exclusions, current claim
//! - [`ClaimRegistry`] is shared by all agents of a director so no two agents
//!   ever work the same target
//! - [`scoring`] holds the priority formula

pub mod claims;
pub mod exclusion;
pub mod scanner;
pub mod scoring;
pub mod target;

pub use claims::ClaimRegistry;
pub use exclusion::{ExclusionEntry, ExclusionList};
pub use scanner::TargetScanner;
pub use target::{ScanFilters, Target, TargetCategory};
