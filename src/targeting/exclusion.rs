//! Bounded, time-ordered exclusion list
//!
//! Remembers targets an agent recently failed on or already claimed so the
//! next scan does not hand them out again. When the bound is exceeded the
//! oldest quarter is evicted in one batch; clearing everything would forget
//! recent failures and the agent would walk straight back to them.

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::core::types::{EntityId, Seconds};

/// One excluded target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionEntry {
    pub key: EntityId,
    pub inserted_at: Seconds,
}

#[derive(Debug, Clone)]
pub struct ExclusionList {
    capacity: usize,
    /// Oldest first; may hold superseded duplicates, resolved against `latest`
    order: VecDeque<ExclusionEntry>,
    latest: AHashMap<EntityId, Seconds>,
}

impl ExclusionList {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            latest: AHashMap::new(),
        }
    }

    /// Number of distinct excluded targets
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adopt a new bound; shrinking evicts immediately
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.enforce_bound();
    }

    pub fn contains(&self, key: EntityId) -> bool {
        self.latest.contains_key(&key)
    }

    /// Insert or refresh `key`; a refreshed key becomes the newest entry
    pub fn insert(&mut self, key: EntityId, now: Seconds) {
        if self.latest.insert(key, now) == Some(now) {
            return;
        }
        self.order.push_back(ExclusionEntry {
            key,
            inserted_at: now,
        });
        self.enforce_bound();
        self.compact_if_bloated();
    }

    pub fn remove(&mut self, key: EntityId) -> bool {
        // Lazy: the stale queue entry is skipped when it surfaces
        self.latest.remove(&key).is_some()
    }

    /// Drop entries inserted before `cutoff`
    pub fn expire_older_than(&mut self, cutoff: Seconds) -> usize {
        let mut expired = 0;
        while let Some(front) = self.order.front().copied() {
            if !self.is_live(&front) {
                self.order.pop_front();
                continue;
            }
            if front.inserted_at >= cutoff {
                break;
            }
            self.order.pop_front();
            self.latest.remove(&front.key);
            expired += 1;
        }
        expired
    }

    /// Live entries, oldest first
    pub fn entries(&self) -> Vec<ExclusionEntry> {
        self.order
            .iter()
            .filter(|entry| self.is_live(entry))
            .copied()
            .collect()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.latest.clear();
    }

    fn is_live(&self, entry: &ExclusionEntry) -> bool {
        self.latest.get(&entry.key) == Some(&entry.inserted_at)
    }

    fn enforce_bound(&mut self) {
        if self.latest.len() <= self.capacity {
            return;
        }
        let batch = self.capacity.div_ceil(4).max(self.latest.len() - self.capacity);
        let mut evicted = 0;
        while evicted < batch {
            let Some(front) = self.order.pop_front() else {
                break;
            };
            if self.is_live(&front) {
                self.latest.remove(&front.key);
                evicted += 1;
            }
        }
        tracing::debug!(evicted, remaining = self.latest.len(), "exclusion list evicted oldest batch");
    }

    fn compact_if_bloated(&mut self) {
        if self.order.len() > self.capacity * 4 {
            let latest = &self.latest;
            self.order
                .retain(|entry| latest.get(&entry.key) == Some(&entry.inserted_at));
        }
    }
}
