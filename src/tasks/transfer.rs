//! Sequential item transfer from a source entity into the agent's inventory

use crate::core::types::{EntityId, ItemInfo};
use crate::tasks::machine::TaskContext;
use crate::tasks::sampling::pick_items;
use crate::world::{ItemDestination, MoveFailure, MoveRequest, MoveResult, OpPoll, OpResolution, OpSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Working,
    Finished,
}

/// Moves planned items one at a time; the index advances once per resolved ticket.
#[derive(Debug, Default)]
pub struct ItemTransfer {
    picks: Vec<ItemInfo>,
    index: usize,
    op: OpSlot,
    moved: u32,
    failed: u32,
}

impl ItemTransfer {
    pub fn reset(&mut self) {
        self.op.reset();
        self.picks.clear();
        self.index = 0;
        self.moved = 0;
        self.failed = 0;
    }

    /// Choose which items to take; returns how many were planned
    pub fn plan(&mut self, ctx: &mut TaskContext, items: &[ItemInfo]) -> usize {
        self.picks = pick_items(items, ctx.agent.free_space, &mut *ctx.rng);
        self.index = 0;
        self.picks.len()
    }

    pub fn moved(&self) -> u32 {
        self.moved
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn cancel(&mut self) {
        self.op.cancel();
    }

    pub fn update(&mut self, ctx: &mut TaskContext, source: EntityId) -> TransferStatus {
        match self.op.poll(ctx.now, ctx.config.op_timeout) {
            OpPoll::Pending => return TransferStatus::Working,
            OpPoll::Resolved(resolution) => {
                self.index += 1;
                match resolution {
                    OpResolution::Completed(MoveResult::Moved) => self.moved += 1,
                    OpResolution::Completed(MoveResult::Failed(MoveFailure::InventoryFull)) => {
                        self.failed += 1;
                        tracing::debug!(agent = %ctx.agent.id, "inventory full, stopping transfer");
                        self.index = self.picks.len();
                    }
                    OpResolution::Completed(MoveResult::Failed(_)) | OpResolution::TimedOut => {
                        self.failed += 1;
                    }
                }
            }
            OpPoll::Idle => {}
        }

        let Some(item) = self.picks.get(self.index).copied() else {
            return TransferStatus::Finished;
        };
        let request = MoveRequest {
            agent: ctx.agent.id,
            item: item.id,
            source: Some(source),
            destination: ItemDestination::Agent(ctx.agent.id),
        };
        let completion = self.op.begin(ctx.now);
        ctx.world.attempt_move(request, completion);
        TransferStatus::Working
    }
}
