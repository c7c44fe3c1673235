//! Asynchronous inventory mutation and completion correlation
//!
//! Moving an item is fire-and-forget: the host receives a [`MoveRequest`]
//! together with a [`Completion`] handle and calls [`Completion::complete`]
//! whenever the move finishes, possibly synchronously inside
//! `attempt_move`, possibly ticks later, possibly never.
//!
//! Completions are never applied directly. They are posted as ticketed
//! messages into an [`OpInbox`] and picked up by the owning task on its next
//! poll through an [`OpSlot`]. The slot resolves each ticket exactly once:
//! either the callback or the safety timeout wins, and the loser is ignored.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, EntityId, ItemId, Seconds};

/// Where a moved item should end up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ItemDestination {
    /// Into the inventory of the given agent
    Agent(AgentId),
    /// Onto the ground at a point
    Ground(Vec3),
}

/// A single item move issued by a task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Agent performing the move
    pub agent: AgentId,
    pub item: ItemId,
    /// Entity the item is taken from; `None` when it comes from the agent's own inventory
    pub source: Option<EntityId>,
    pub destination: ItemDestination,
}

/// Why the host refused or failed a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveFailure {
    InventoryFull,
    ItemMissing,
    OutOfRange,
    Rejected,
}

/// Outcome delivered through a [`Completion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveResult {
    Moved,
    Failed(MoveFailure),
}

impl MoveResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MoveResult::Moved)
    }
}

/// Inventory mutation service supplied by the host
pub trait InventoryService {
    /// Start moving an item. The host must call `completion.complete` at most once.
    fn attempt_move(&self, request: MoveRequest, completion: Completion);
}

/// Correlates a completion with the request that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpTicket(pub u64);

#[derive(Debug, Default)]
struct InboxShared {
    stopped: AtomicBool,
    delivered: Mutex<VecDeque<(OpTicket, MoveResult)>>,
}

/// Message queue that receives completions for one task instance
#[derive(Debug, Clone, Default)]
pub struct OpInbox {
    shared: Arc<InboxShared>,
}

impl OpInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the handle handed to the host for `ticket`
    pub fn completion(&self, ticket: OpTicket) -> Completion {
        Completion {
            ticket,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Once stopped, completions are dropped at the door
    pub fn set_stopped(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    pub fn drain(&self) -> Vec<(OpTicket, MoveResult)> {
        let mut queue = self
            .shared
            .delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }
}

/// One-shot completion handle for a pending inventory move
#[derive(Debug)]
pub struct Completion {
    ticket: OpTicket,
    shared: Arc<InboxShared>,
}

impl Completion {
    pub fn ticket(&self) -> OpTicket {
        self.ticket
    }

    /// Deliver the result. Consumes the handle so a request completes at most once.
    pub fn complete(self, result: MoveResult) {
        if self.shared.stopped.load(Ordering::SeqCst) {
            tracing::trace!(ticket = self.ticket.0, "completion after stop ignored");
            return;
        }
        self.shared
            .delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((self.ticket, result));
    }
}

/// How an in-flight operation was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpResolution {
    Completed(MoveResult),
    /// The callback never arrived within the safety timeout
    TimedOut,
}

/// Result of polling an [`OpSlot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpPoll {
    Idle,
    Pending,
    Resolved(OpResolution),
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: OpTicket,
    issued_at: Seconds,
}

/// Tracks at most one in-flight operation for a task
#[derive(Debug, Default)]
pub struct OpSlot {
    inbox: OpInbox,
    next_ticket: u64,
    in_flight: Option<InFlight>,
    stale_dropped: u32,
}

impl OpSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh inbox for a new `start`; handles from the previous run stay stopped
    pub fn reset(&mut self) {
        self.inbox.set_stopped();
        self.inbox = OpInbox::new();
        self.in_flight = None;
        self.stale_dropped = 0;
    }

    /// Stop accepting completions; an in-flight request is left to finish and be ignored
    pub fn cancel(&mut self) {
        self.inbox.set_stopped();
        self.in_flight = None;
    }

    /// Mark an operation in flight and return the handle to pass to the host.
    ///
    /// The slot is marked before the host sees the handle, so a completion
    /// delivered synchronously from inside `attempt_move` still matches.
    pub fn begin(&mut self, now: Seconds) -> Completion {
        self.next_ticket += 1;
        let ticket = OpTicket(self.next_ticket);
        self.in_flight = Some(InFlight {
            ticket,
            issued_at: now,
        });
        self.inbox.completion(ticket)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Completions that arrived for tickets already resolved or replaced
    pub fn stale_dropped(&self) -> u32 {
        self.stale_dropped
    }

    pub fn poll(&mut self, now: Seconds, timeout: Seconds) -> OpPoll {
        let mut resolved = None;
        for (ticket, result) in self.inbox.drain() {
            match self.in_flight {
                Some(current) if current.ticket == ticket && resolved.is_none() => {
                    self.in_flight = None;
                    resolved = Some(OpResolution::Completed(result));
                }
                _ => {
                    self.stale_dropped += 1;
                    tracing::debug!(ticket = ticket.0, "stale completion dropped");
                }
            }
        }
        if let Some(resolution) = resolved {
            return OpPoll::Resolved(resolution);
        }

        match self.in_flight {
            Some(current) if now - current.issued_at >= timeout => {
                self.in_flight = None;
                tracing::warn!(
                    ticket = current.ticket.0,
                    waited = now - current.issued_at,
                    "inventory operation timed out waiting for completion"
                );
                OpPoll::Resolved(OpResolution::TimedOut)
            }
            Some(_) => OpPoll::Pending,
            None => OpPoll::Idle,
        }
    }
}

impl Drop for OpSlot {
    fn drop(&mut self) {
        self.inbox.set_stopped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synchronous_completion_matches_ticket() {
        let mut slot = OpSlot::new();
        let completion = slot.begin(0.0);
        assert!(slot.is_in_flight());
        completion.complete(MoveResult::Moved);

        assert_eq!(
            slot.poll(0.0, 5.0),
            OpPoll::Resolved(OpResolution::Completed(MoveResult::Moved))
        );
        assert_eq!(slot.poll(0.1, 5.0), OpPoll::Idle);
    }

    #[test]
    fn test_timeout_resolves_once_and_late_callback_is_stale() {
        let mut slot = OpSlot::new();
        let completion = slot.begin(0.0);

        assert_eq!(slot.poll(1.0, 5.0), OpPoll::Pending);
        assert_eq!(slot.poll(5.0, 5.0), OpPoll::Resolved(OpResolution::TimedOut));
        assert_eq!(slot.poll(6.0, 5.0), OpPoll::Idle);

        completion.complete(MoveResult::Moved);
        assert_eq!(slot.poll(7.0, 5.0), OpPoll::Idle);
        assert_eq!(slot.stale_dropped(), 1);
    }

    #[test]
    fn test_completion_after_cancel_is_dropped() {
        let mut slot = OpSlot::new();
        let completion = slot.begin(0.0);
        slot.cancel();
        completion.complete(MoveResult::Moved);
        assert_eq!(slot.poll(1.0, 5.0), OpPoll::Idle);
        assert_eq!(slot.stale_dropped(), 0);
    }

    #[test]
    fn test_dropped_slot_stops_inbox() {
        let mut slot = OpSlot::new();
        let completion = slot.begin(0.0);
        let inbox = slot.inbox.clone();
        drop(slot);
        assert!(inbox.is_stopped());
        completion.complete(MoveResult::Moved);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_reset_isolates_previous_run() {
        let mut slot = OpSlot::new();
        let old = slot.begin(0.0);
        slot.reset();
        let fresh = slot.begin(1.0);
        old.complete(MoveResult::Moved);
        assert_eq!(slot.poll(1.5, 5.0), OpPoll::Pending);
        fresh.complete(MoveResult::Failed(MoveFailure::InventoryFull));
        assert_eq!(
            slot.poll(2.0, 5.0),
            OpPoll::Resolved(OpResolution::Completed(MoveResult::Failed(
                MoveFailure::InventoryFull
            )))
        );
    }
}
