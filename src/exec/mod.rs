//! # Physical Operators — Volcano Model
//!
//! Pull-based iterator-protocol execution. Every operator implements
//! `Executor`:
//!
//! - `open(ctx)`: propagate to children first, then set up this operator's
//!   own cursor/scanner; fails fast on a child error and must not run twice
//! - `next()`: advance to the next qualifying row; `Ok(None)` is exhaustion
//!   and stays `Ok(None)` on repeated calls
//! - `close()`: release scanners/cursors, recursively close children; safe
//!   to call repeatedly and required on every exit path, error paths
//!   included
//!
//! Operators form a tree matching the physical plan:
//!
//! ```text
//! UpdateExecutor
//!     └── PredicateExecutor
//!             └── IndexScanExecutor
//!                     └── [index range scanner]
//! ```
//!
//! Leaf operators read storage (table scan, index scan), internal operators
//! transform (filter, project, join, sort, aggregate), root operators mutate
//! (insert, update, delete). A `Row` carries the materialized column values
//! plus, for storage-backed rows, the owning `Record` so mutation operators
//! can reach the raw bytes and row id.
//!
//! Execution is single-threaded and synchronous; the only blocking points
//! are collaborator calls (scanner advance, record fetch, transaction
//! visits). Cancellation is cooperative: stop calling `next()` and call
//! `close()`.

mod aggregate;
mod aggregator;
mod delete;
mod expr;
mod index_scan;
mod insert;
mod join;
mod predicate;
mod project;
mod sort;
mod table_scan;
mod undo;
mod update;

pub use aggregate::{AggregateExecutor, AggregateSpec};
pub use aggregator::{
    AggregateKind, Aggregator, AvgAggregator, CountAggregator, MaxAggregator, MinAggregator,
    SumAggregator,
};
pub use delete::DeleteExecutor;
pub use expr::{coerced_compare, ArithOp, CompOp, Expr};
pub use index_scan::IndexScanExecutor;
pub use insert::InsertExecutor;
pub use join::NestedLoopJoinExecutor;
pub use predicate::PredicateExecutor;
pub use project::ProjectExecutor;
pub use sort::{SortExecutor, SortKey};
pub use table_scan::TableScanExecutor;
pub use undo::{CompensationLog, UndoAction};
pub use update::UpdateExecutor;

use crate::error::EngineError;
use crate::records::Record;
use crate::trx::Trx;
use crate::types::Value;
use eyre::Result;
use std::sync::Arc;

/// Per-statement execution context shared by the whole operator tree.
#[derive(Clone)]
pub struct ExecContext {
    pub trx: Arc<dyn Trx>,
}

impl ExecContext {
    pub fn new(trx: Arc<dyn Trx>) -> Self {
        Self { trx }
    }
}

/// Operator lifecycle: Created → Opened → Exhausted → Closed. Errors leave
/// the operator in its current state; close() is legal from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Created,
    Opened,
    Exhausted,
    Closed,
}

impl ExecState {
    /// Guard for `open`: only a freshly-created operator may open.
    pub fn check_open(self) -> Result<()> {
        match self {
            ExecState::Created => Ok(()),
            other => {
                Err(EngineError::Internal(format!("open called in state {other:?}")).into())
            }
        }
    }

    /// Guard for `next`: returns Ok(true) when the operator should produce,
    /// Ok(false) when it is exhausted, and an error when it was never
    /// opened or already closed.
    pub fn check_next(self) -> Result<bool> {
        match self {
            ExecState::Opened => Ok(true),
            ExecState::Exhausted => Ok(false),
            other => {
                Err(EngineError::Internal(format!("next called in state {other:?}")).into())
            }
        }
    }
}

/// One row flowing up the operator tree.
#[derive(Debug, Clone)]
pub struct Row {
    pub values: Vec<Value<'static>>,
    pub record: Option<Record>,
}

impl Row {
    pub fn new(values: Vec<Value<'static>>) -> Self {
        Self {
            values,
            record: None,
        }
    }

    pub fn with_record(values: Vec<Value<'static>>, record: Record) -> Self {
        Self {
            values,
            record: Some(record),
        }
    }

    pub fn get(&self, idx: usize) -> Option<&Value<'static>> {
        self.values.get(idx)
    }

    pub fn column_count(&self) -> usize {
        self.values.len()
    }
}

/// The iterator protocol every physical operator implements.
pub trait Executor {
    fn open(&mut self, ctx: &ExecContext) -> Result<()>;
    fn next(&mut self) -> Result<Option<Row>>;
    fn close(&mut self) -> Result<()>;

    /// Short parameter description for plan display.
    fn param(&self) -> String {
        String::new()
    }
}

pub type BoxedExecutor = Box<dyn Executor>;
