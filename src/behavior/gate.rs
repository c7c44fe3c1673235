//! Shared activation policy: alive, enabled, out of combat, under the action cap

use std::collections::VecDeque;

use crate::core::config::{LootingConfig, QuestingConfig};
use crate::core::types::{AgentView, Seconds};
use crate::world::Awareness;

/// Per-domain pacing knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatePolicy {
    pub enabled: bool,
    pub combat_grace: Seconds,
    pub cooldown: Seconds,
    pub max_actions: u32,
    pub window: Seconds,
}

impl From<&LootingConfig> for GatePolicy {
    fn from(config: &LootingConfig) -> Self {
        Self {
            enabled: config.enabled,
            combat_grace: config.combat_grace,
            cooldown: config.cooldown,
            max_actions: config.max_actions_per_window,
            window: config.window,
        }
    }
}

impl From<&QuestingConfig> for GatePolicy {
    fn from(config: &QuestingConfig) -> Self {
        Self {
            enabled: config.enabled,
            combat_grace: config.combat_grace,
            cooldown: config.cooldown,
            max_actions: config.max_actions_per_window,
            window: config.window,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    Dead,
    Disabled,
    InCombat,
    CapReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Open,
    /// Still allowed, but the last action finished less than `cooldown` ago
    Cooling,
    Closed(GateReason),
}

impl GateState {
    pub fn is_closed(&self) -> bool {
        matches!(self, GateState::Closed(_))
    }
}

/// Tracks cooldown and the rolling window of completed actions
#[derive(Debug, Clone, Default)]
pub struct ActivationGate {
    cooldown_until: Seconds,
    completions: VecDeque<Seconds>,
}

impl ActivationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &mut self,
        agent: &AgentView,
        awareness: &Awareness,
        policy: &GatePolicy,
        now: Seconds,
    ) -> GateState {
        if !agent.alive {
            return GateState::Closed(GateReason::Dead);
        }
        if !policy.enabled {
            return GateState::Closed(GateReason::Disabled);
        }
        if awareness.in_combat(agent.id, policy.combat_grace) {
            return GateState::Closed(GateReason::InCombat);
        }
        while self
            .completions
            .front()
            .is_some_and(|&at| now - at >= policy.window)
        {
            self.completions.pop_front();
        }
        if self.completions.len() >= policy.max_actions as usize {
            return GateState::Closed(GateReason::CapReached);
        }
        if now < self.cooldown_until {
            return GateState::Cooling;
        }
        GateState::Open
    }

    pub fn record_completion(&mut self, policy: &GatePolicy, now: Seconds) {
        self.completions.push_back(now);
        self.cooldown_until = now + policy.cooldown;
    }

    pub fn actions_in_window(&self) -> usize {
        self.completions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgentId, AgentRole, FactionId};
    use glam::Vec3;

    fn view(alive: bool) -> AgentView {
        AgentView {
            id: AgentId::new(),
            position: Vec3::ZERO,
            alive,
            faction: FactionId(1),
            role: AgentRole::Combatant,
            free_space: 10.0,
        }
    }

    fn policy() -> GatePolicy {
        GatePolicy {
            enabled: true,
            combat_grace: 10.0,
            cooldown: 2.0,
            max_actions: 2,
            window: 60.0,
        }
    }

    #[test]
    fn test_dead_and_disabled_closed() {
        let mut gate = ActivationGate::new();
        let awareness = Awareness::Absent;
        assert_eq!(
            gate.evaluate(&view(false), &awareness, &policy(), 0.0),
            GateState::Closed(GateReason::Dead)
        );
        let disabled = GatePolicy {
            enabled: false,
            ..policy()
        };
        assert_eq!(
            gate.evaluate(&view(true), &awareness, &disabled, 0.0),
            GateState::Closed(GateReason::Disabled)
        );
    }

    #[test]
    fn test_cooldown_then_open() {
        let mut gate = ActivationGate::new();
        let awareness = Awareness::Absent;
        let agent = view(true);
        gate.record_completion(&policy(), 0.0);
        assert_eq!(gate.evaluate(&agent, &awareness, &policy(), 1.0), GateState::Cooling);
        assert_eq!(gate.evaluate(&agent, &awareness, &policy(), 2.0), GateState::Open);
    }

    #[test]
    fn test_rolling_window_cap() {
        let mut gate = ActivationGate::new();
        let awareness = Awareness::Absent;
        let agent = view(true);
        gate.record_completion(&policy(), 0.0);
        gate.record_completion(&policy(), 10.0);
        assert_eq!(
            gate.evaluate(&agent, &awareness, &policy(), 30.0),
            GateState::Closed(GateReason::CapReached)
        );
        // The first completion leaves the window
        assert_eq!(gate.evaluate(&agent, &awareness, &policy(), 61.0), GateState::Open);
        assert_eq!(gate.actions_in_window(), 1);
    }
}
