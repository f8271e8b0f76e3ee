//! Full-table scan in RecordId order.
//!
//! The leaf operator for unindexed access: walks the heap, decodes each
//! record, applies the residual predicate conjunction, and asks the
//! transaction whether the row is visible under the scan's intent.
//! Invisible rows are skipped silently; any other collaborator error aborts
//! the scan.

use crate::error::{is_kind, EngineError};
use crate::exec::{ExecContext, ExecState, Executor, Expr, Row};
use crate::records::RecordId;
use crate::storage::Table;
use crate::trx::{ReadWriteMode, Trx};
use eyre::Result;
use std::sync::Arc;
use tracing::trace;

pub struct TableScanExecutor {
    table: Arc<Table>,
    mode: ReadWriteMode,
    predicates: Vec<Expr>,
    trx: Option<Arc<dyn Trx>>,
    rids: Vec<RecordId>,
    pos: usize,
    state: ExecState,
}

impl TableScanExecutor {
    pub fn new(table: Arc<Table>, mode: ReadWriteMode) -> Self {
        Self {
            table,
            mode,
            predicates: Vec::new(),
            trx: None,
            rids: Vec::new(),
            pos: 0,
            state: ExecState::Created,
        }
    }

    pub fn set_predicates(&mut self, predicates: Vec<Expr>) {
        self.predicates = predicates;
    }
}

impl Executor for TableScanExecutor {
    fn open(&mut self, ctx: &ExecContext) -> Result<()> {
        self.state.check_open()?;
        self.trx = Some(ctx.trx.clone());
        self.rids = self.table.rids();
        self.pos = 0;
        self.state = ExecState::Opened;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.state.check_next()? {
            return Ok(None);
        }
        let trx = self
            .trx
            .as_ref()
            .ok_or_else(|| EngineError::Internal("scan has no transaction".into()))?
            .clone();

        while self.pos < self.rids.len() {
            let rid = self.rids[self.pos];
            self.pos += 1;

            let record = self.table.get_record(rid)?;
            let values = self.table.read_row(&record)?;

            let mut qualified = true;
            for predicate in &self.predicates {
                if !predicate.eval_bool(&values)? {
                    qualified = false;
                    break;
                }
            }
            if !qualified {
                continue;
            }

            match trx.visit_record(&self.table, &record, self.mode) {
                Ok(()) => return Ok(Some(Row::with_record(values, record))),
                Err(err) if is_kind(&err, &EngineError::RecordInvisible) => {
                    trace!(%rid, "record invisible, skipped");
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        self.state = ExecState::Exhausted;
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        self.rids.clear();
        self.trx = None;
        self.state = ExecState::Closed;
        Ok(())
    }

    fn param(&self) -> String {
        self.table.name().to_string()
    }
}
