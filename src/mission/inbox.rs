//! Spawn and death reports posted by the host from any context

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, AgentRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionEvent {
    AgentSpawned { agent: AgentId, role: AgentRole },
    AgentDied { agent: AgentId },
}

/// Message queue drained by the controller at the start of each tick.
///
/// Guarded by its own lock, so posting never waits on the controller state.
#[derive(Debug, Clone, Default)]
pub struct MissionInbox {
    queue: Arc<Mutex<VecDeque<MissionEvent>>>,
}

impl MissionInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, event: MissionEvent) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(event);
    }

    pub fn drain(&self) -> Vec<MissionEvent> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
