//! # Compensation Log
//!
//! Mutation operators record every applied change as a reversible action;
//! when a later row in the same batch fails, the log replays in strict
//! reverse application order through the table's own mutation path,
//! restoring the pre-operation state. The log is in-memory and scoped to
//! one operator invocation; it is independent of whatever durability log
//! the storage layer keeps.
//!
//! | Action | Rollback |
//! |--------|----------|
//! | Insert | delete the inserted row |
//! | Update | write the captured old bytes back in place |
//! | Delete | restore the snapshot at its original RecordId |

use crate::records::RecordId;
use crate::storage::Table;
use eyre::Result;
use smallvec::SmallVec;
use tracing::warn;

#[derive(Debug, Clone)]
pub enum UndoAction {
    Insert { rid: RecordId },
    Update { rid: RecordId, old: Vec<u8> },
    Delete { rid: RecordId, old: Vec<u8> },
}

#[derive(Debug, Default)]
pub struct CompensationLog {
    actions: SmallVec<[UndoAction; 8]>,
}

impl CompensationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: UndoAction) {
        self.actions.push(action);
    }

    /// Drops the most recent entry; the failed row's own action must not be
    /// replayed.
    pub fn pop_last(&mut self) -> Option<UndoAction> {
        self.actions.pop()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Replays all recorded actions in reverse order. A failing replay stops
    /// the sequence (later state cannot be trusted) but is reported so the
    /// caller can still propagate the original error.
    pub fn rollback(&mut self, table: &Table) -> Result<()> {
        while let Some(action) = self.actions.pop() {
            let outcome = match &action {
                UndoAction::Insert { rid } => table.delete_record(*rid).map(|_| ()),
                UndoAction::Update { rid, old } => table.update_record(*rid, old),
                UndoAction::Delete { rid, old } => table.restore_record(*rid, old.clone()),
            };
            if let Err(err) = outcome {
                warn!(table = table.name(), %err, "compensation replay failed");
                return Err(err);
            }
        }
        Ok(())
    }
}
