//! Optional combat-awareness module, negotiated once at startup
//!
//! The host may or may not ship an external module that tracks threats per
//! agent. [`Awareness::resolve`] decides once whether it is usable; after
//! that every query goes through the resolved variant and never probes again.

use glam::Vec3;

use crate::core::error::AdapterError;
use crate::core::types::{AgentId, Seconds};

/// Interface of the external awareness module
pub trait AwarenessAdapter: Send + Sync {
    /// Capability handshake; `false` means the module is installed but unusable
    fn is_available(&self) -> bool;

    /// Seconds since the agent last sensed a threat; `None` if it never has
    fn time_since_threat_sensed(&self, agent: AgentId) -> Result<Option<Seconds>, AdapterError>;

    /// Whether the module thinks the agent may do something non-combat at `point`
    fn can_perform_non_combat_activity(&self, agent: AgentId, point: Vec3) -> Result<bool, AdapterError>;
}

/// Resolved awareness capability
#[derive(Default)]
pub enum Awareness {
    Present(Box<dyn AwarenessAdapter>),
    #[default]
    Absent,
}

impl Awareness {
    /// Negotiate once; an adapter that reports itself unavailable is treated as absent
    pub fn resolve(adapter: Option<Box<dyn AwarenessAdapter>>) -> Self {
        match adapter {
            Some(adapter) if adapter.is_available() => {
                tracing::info!("awareness module resolved");
                Awareness::Present(adapter)
            }
            Some(_) => {
                tracing::warn!("awareness module present but unavailable; using defaults");
                Awareness::Absent
            }
            None => Awareness::Absent,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Awareness::Present(_))
    }

    /// Combat-safety check: `true` if the agent sensed a threat within `grace` seconds.
    ///
    /// Absent module: permissive (`false`). Failing module: conservative (`true`).
    pub fn in_combat(&self, agent: AgentId, grace: Seconds) -> bool {
        match self {
            Awareness::Absent => false,
            Awareness::Present(adapter) => match adapter.time_since_threat_sensed(agent) {
                Ok(Some(elapsed)) => elapsed < grace,
                Ok(None) => false,
                Err(err) => {
                    tracing::warn!(agent = %agent, error = %err, "awareness query failed; assuming combat");
                    true
                }
            },
        }
    }

    /// Non-critical check; any failure or absence allows the activity.
    pub fn can_perform_non_combat_activity(&self, agent: AgentId, point: Vec3) -> bool {
        match self {
            Awareness::Absent => true,
            Awareness::Present(adapter) => match adapter.can_perform_non_combat_activity(agent, point) {
                Ok(allowed) => allowed,
                Err(err) => {
                    tracing::debug!(agent = %agent, error = %err, "awareness query failed; allowing");
                    true
                }
            },
        }
    }
}

impl std::fmt::Debug for Awareness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Awareness::Present(_) => f.write_str("Awareness::Present"),
            Awareness::Absent => f.write_str("Awareness::Absent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAdapter {
        available: bool,
        since_threat: Result<Option<Seconds>, AdapterError>,
        allow: Result<bool, AdapterError>,
    }

    impl AwarenessAdapter for FixedAdapter {
        fn is_available(&self) -> bool {
            self.available
        }

        fn time_since_threat_sensed(&self, _agent: AgentId) -> Result<Option<Seconds>, AdapterError> {
            self.since_threat.clone()
        }

        fn can_perform_non_combat_activity(&self, _agent: AgentId, _point: Vec3) -> Result<bool, AdapterError> {
            self.allow.clone()
        }
    }

    fn adapter(
        since_threat: Result<Option<Seconds>, AdapterError>,
        allow: Result<bool, AdapterError>,
    ) -> Option<Box<dyn AwarenessAdapter>> {
        Some(Box::new(FixedAdapter {
            available: true,
            since_threat,
            allow,
        }))
    }

    #[test]
    fn test_absent_is_permissive() {
        let awareness = Awareness::resolve(None);
        assert!(!awareness.is_available());
        assert!(!awareness.in_combat(AgentId::new(), 30.0));
        assert!(awareness.can_perform_non_combat_activity(AgentId::new(), Vec3::ZERO));
    }

    #[test]
    fn test_unavailable_module_resolves_absent() {
        let awareness = Awareness::resolve(Some(Box::new(FixedAdapter {
            available: false,
            since_threat: Ok(Some(0.0)),
            allow: Ok(false),
        })));
        assert!(!awareness.is_available());
        assert!(!awareness.in_combat(AgentId::new(), 30.0));
    }

    #[test]
    fn test_recent_threat_means_combat() {
        let awareness = Awareness::resolve(adapter(Ok(Some(5.0)), Ok(true)));
        assert!(awareness.in_combat(AgentId::new(), 30.0));
        assert!(!awareness.in_combat(AgentId::new(), 2.0));
    }

    #[test]
    fn test_failing_module_is_conservative_for_combat() {
        let awareness = Awareness::resolve(adapter(
            Err(AdapterError::CallFailed("boom".into())),
            Err(AdapterError::CallFailed("boom".into())),
        ));
        assert!(awareness.in_combat(AgentId::new(), 30.0));
        assert!(awareness.can_perform_non_combat_activity(AgentId::new(), Vec3::ZERO));
    }
}
