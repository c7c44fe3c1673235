//! Observable record of decisions made by the core
//!
//! Every claim, task transition, layer switch and mission phase change is
//! pushed here. The log is drained by the host (or the sandbox runner) and is
//! serializable for offline inspection.

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, AgentRole, EntityId, Seconds};
use crate::mission::MissionPhase;
use crate::tasks::{GoalKind, TaskOutcome};

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BotEventKind {
    TargetClaimed {
        agent: AgentId,
        target: EntityId,
        priority: f32,
    },
    TargetReleased {
        agent: AgentId,
        target: EntityId,
    },
    /// Target excluded for this agent after a failed attempt
    TargetBlacklisted {
        agent: AgentId,
        target: EntityId,
    },
    TaskStarted {
        agent: AgentId,
        goal: GoalKind,
    },
    TaskCompleted {
        agent: AgentId,
        goal: GoalKind,
        outcome: TaskOutcome,
    },
    LayerSwitched {
        agent: AgentId,
        from: Option<String>,
        to: Option<String>,
    },
    MissionRequested {
        patient: EntityId,
    },
    MissionRejected {
        patient: EntityId,
        reason: String,
    },
    MissionPhaseChanged {
        from: MissionPhase,
        to: MissionPhase,
    },
    MemberJoined {
        agent: AgentId,
        role: AgentRole,
    },
    MemberLost {
        agent: AgentId,
    },
    LeadPromoted {
        agent: AgentId,
    },
    /// Required state was missing; the tick degraded instead of crashing
    InvariantViolation {
        agent: Option<AgentId>,
        site: String,
        detail: String,
    },
}

/// A timestamped event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotEvent {
    pub at: Seconds,
    pub kind: BotEventKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<BotEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: Seconds, kind: BotEventKind) {
        self.events.push(BotEvent { at, kind });
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = BotEvent>) {
        self.events.extend(events);
    }

    pub fn drain(&mut self) -> Vec<BotEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BotEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_drain() {
        let mut log = EventLog::new();
        let agent = AgentId::new();
        log.push(1.0, BotEventKind::MemberLost { agent });
        log.push(
            2.0,
            BotEventKind::TaskStarted {
                agent,
                goal: GoalKind::Pause,
            },
        );
        assert_eq!(log.len(), 2);

        let drained = log.drain();
        assert!(log.is_empty());
        assert_eq!(drained[0].at, 1.0);
    }

    #[test]
    fn test_events_serialize() {
        let event = BotEvent {
            at: 3.5,
            kind: BotEventKind::MissionPhaseChanged {
                from: MissionPhase::Idle,
                to: MissionPhase::Spawning,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: BotEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
