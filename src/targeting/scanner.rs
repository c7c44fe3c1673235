//! Per-agent target scanner
//!
//! Produces a priority-ordered queue of candidates around the agent and hands
//! them out one at a time through the shared [`ClaimRegistry`]. Scans are
//! throttled per agent; a throttled call returns the cached queue.

use ordered_float::OrderedFloat;

use crate::core::config::TargetingConfig;
use crate::core::types::{flat_distance, AgentId, AgentView, EntityId, Seconds};
use crate::targeting::claims::ClaimRegistry;
use crate::targeting::exclusion::ExclusionList;
use crate::targeting::scoring;
use crate::targeting::target::{ScanFilters, Target, TargetCategory};
use crate::world::entity::WorldEntity;
use crate::world::WorldFacade;

#[derive(Debug, Clone)]
pub struct TargetScanner {
    agent: AgentId,
    /// Highest priority first; equal priorities keep scan order
    queue: Vec<Target>,
    exclusions: ExclusionList,
    last_scan_at: Option<Seconds>,
    last_cleanup_at: Option<Seconds>,
    current: Option<Target>,
}

impl TargetScanner {
    pub fn new(agent: AgentId, config: &TargetingConfig) -> Self {
        Self {
            agent,
            queue: Vec::new(),
            exclusions: ExclusionList::new(config.exclusion_capacity),
            last_scan_at: None,
            last_cleanup_at: None,
            current: None,
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn queue(&self) -> &[Target] {
        &self.queue
    }

    pub fn current(&self) -> Option<&Target> {
        self.current.as_ref()
    }

    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    /// Whether enough time has passed for a fresh scan
    pub fn scan_due(&self, config: &TargetingConfig, now: Seconds) -> bool {
        match self.last_scan_at {
            None => true,
            Some(last) => now - last >= config.rescan_interval,
        }
    }

    /// Rebuild the candidate queue; throttled by `rescan_interval`
    pub fn scan(
        &mut self,
        world: &dyn WorldFacade,
        claims: &ClaimRegistry,
        view: &AgentView,
        config: &TargetingConfig,
        filters: &ScanFilters,
        now: Seconds,
    ) -> &[Target] {
        if !self.scan_due(config, now) {
            return &self.queue;
        }
        self.last_scan_at = Some(now);

        let entities = world.find_nearby(view.position, config.scan_radius);
        let scanned = entities.len();
        let mut candidates: Vec<Target> = entities
            .iter()
            .filter_map(|entity| self.evaluate(world, claims, view, config, filters, entity))
            .collect();

        // Stable sort: ties keep the order the world reported them in
        candidates.sort_by_key(|t| std::cmp::Reverse(OrderedFloat(t.priority)));
        self.queue = candidates;

        tracing::debug!(
            agent = %self.agent,
            scanned,
            candidates = self.queue.len(),
            "target scan"
        );
        &self.queue
    }

    fn evaluate(
        &self,
        world: &dyn WorldFacade,
        claims: &ClaimRegistry,
        view: &AgentView,
        config: &TargetingConfig,
        filters: &ScanFilters,
        entity: &WorldEntity,
    ) -> Option<Target> {
        let category = TargetCategory::from_kind(entity.kind)?;
        if !filters.allows(category) {
            return None;
        }
        if self.exclusions.contains(entity.id) || claims.is_claimed_by_other(entity.id, self.agent) {
            return None;
        }
        if self.current.as_ref().is_some_and(|c| c.key == entity.id) {
            return None;
        }

        let (value, item_size) = match category {
            TargetCategory::LooseItem => {
                let item = entity.items.first()?;
                if view.free_space < item.size {
                    return None;
                }
                (item.value, item.size)
            }
            TargetCategory::Corpse | TargetCategory::Container => (entity.total_value(), 0.0),
        };
        if value < filters.min_value {
            return None;
        }
        if world.compute_path(view.position, entity.position).is_none() {
            return None;
        }

        let distance = flat_distance(view.position, entity.position);
        let priority = scoring::priority(
            value,
            distance,
            config.distance_floor,
            config.priority_ceiling,
        );
        if priority <= 0.0 {
            return None;
        }

        Some(Target {
            key: entity.id,
            category,
            position: entity.position,
            value,
            distance,
            priority,
            item_size,
        })
    }

    /// Pop and claim the best remaining candidate.
    ///
    /// Any target the agent still holds is released first. A claimed target is
    /// also excluded so it is not handed out again after release.
    pub fn claim_next(&mut self, claims: &mut ClaimRegistry, now: Seconds) -> Option<Target> {
        if let Some(previous) = self.current.take() {
            claims.release(self.agent, previous.key);
        }

        while !self.queue.is_empty() {
            let candidate = self.queue.remove(0);
            if self.exclusions.contains(candidate.key) {
                continue;
            }
            match claims.try_claim(self.agent, candidate.key) {
                Ok(()) => {
                    self.exclusions.insert(candidate.key, now);
                    tracing::debug!(
                        agent = %self.agent,
                        target = %candidate.key,
                        priority = candidate.priority,
                        "target claimed"
                    );
                    self.current = Some(candidate.clone());
                    return Some(candidate);
                }
                Err(err) => {
                    tracing::trace!(agent = %self.agent, error = %err, "candidate skipped");
                }
            }
        }
        None
    }

    /// Release `target` if this agent holds it
    pub fn release(&mut self, claims: &mut ClaimRegistry, target: EntityId) -> bool {
        if self.current.as_ref().is_some_and(|c| c.key == target) {
            self.current = None;
        }
        claims.release(self.agent, target)
    }

    /// Never reconsider `target` until its exclusion expires
    pub fn blacklist(&mut self, claims: &mut ClaimRegistry, target: EntityId, now: Seconds) {
        self.exclusions.insert(target, now);
        self.queue.retain(|t| t.key != target);
        self.release(claims, target);
        tracing::debug!(agent = %self.agent, target = %target, "target blacklisted");
    }

    /// Drop candidates whose entity vanished; time-gated by `cleanup_interval`
    pub fn cleanup(
        &mut self,
        world: &dyn WorldFacade,
        claims: &mut ClaimRegistry,
        config: &TargetingConfig,
        now: Seconds,
    ) -> usize {
        if let Some(last) = self.last_cleanup_at {
            if now - last < config.cleanup_interval {
                return 0;
            }
        }
        self.last_cleanup_at = Some(now);

        let before = self.queue.len();
        self.queue.retain(|t| world.entity(t.key).is_some());
        let mut dropped = before - self.queue.len();

        if let Some(current) = self.current.as_ref() {
            if world.entity(current.key).is_none() {
                let key = current.key;
                self.release(claims, key);
                dropped += 1;
            }
        }

        self.exclusions.set_capacity(config.exclusion_capacity);
        self.exclusions.expire_older_than(now - config.exclusion_ttl);

        if dropped > 0 {
            tracing::debug!(agent = %self.agent, dropped, "invalidated targets dropped");
        }
        dropped
    }

    /// Forget everything and release any held claim
    pub fn reset(&mut self, claims: &mut ClaimRegistry) {
        claims.release_agent(self.agent);
        self.queue.clear();
        self.current = None;
        self.last_scan_at = None;
    }
}
