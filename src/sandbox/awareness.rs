//! Scriptable stand-in for the external awareness module

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ahash::{AHashMap, AHashSet};
use glam::Vec3;

use crate::core::error::AdapterError;
use crate::core::types::{AgentId, Seconds};
use crate::world::AwarenessAdapter;

#[derive(Debug, Default)]
struct Inner {
    now: Seconds,
    threats: AHashMap<AgentId, Seconds>,
    restricted: AHashSet<AgentId>,
    failing: bool,
    unavailable: bool,
}

/// Cloneable; tests keep one handle and give another to `Awareness::resolve`
#[derive(Debug, Clone, Default)]
pub struct SandboxAwareness {
    inner: Arc<Mutex<Inner>>,
}

impl SandboxAwareness {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_time(&self, now: Seconds) {
        self.lock().now = now;
    }

    pub fn sense_threat(&self, agent: AgentId, at: Seconds) {
        self.lock().threats.insert(agent, at);
    }

    /// Deny non-combat activity for `agent`
    pub fn restrict(&self, agent: AgentId) {
        self.lock().restricted.insert(agent);
    }

    /// Every query fails from now on
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }
}

impl AwarenessAdapter for SandboxAwareness {
    fn is_available(&self) -> bool {
        !self.lock().unavailable
    }

    fn time_since_threat_sensed(&self, agent: AgentId) -> Result<Option<Seconds>, AdapterError> {
        let inner = self.lock();
        if inner.failing {
            return Err(AdapterError::CallFailed("threat query failed".to_string()));
        }
        Ok(inner.threats.get(&agent).map(|&at| inner.now - at))
    }

    fn can_perform_non_combat_activity(&self, agent: AgentId, _point: Vec3) -> Result<bool, AdapterError> {
        let inner = self.lock();
        if inner.failing {
            return Err(AdapterError::CallFailed("activity query failed".to_string()));
        }
        Ok(!inner.restricted.contains(&agent))
    }
}
