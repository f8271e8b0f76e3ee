//! # Delete Operator
//!
//! Root mutation over a child scan. `next()` drains the child, snapshots
//! each row's bytes into the compensation log, and deletes through the
//! transaction. When a delete fails, the failed row's own entry is dropped
//! and every prior action replays in reverse: deleted snapshots are
//! restored at their original RecordIds and any rows this operator had
//! inserted as a side effect (combined delete-and-reinsert flows) are
//! deleted again. The child is closed on every exit path.

use crate::error::EngineError;
use crate::exec::{CompensationLog, ExecContext, ExecState, Executor, Row, UndoAction};
use crate::storage::Table;
use crate::trx::Trx;
use eyre::Result;
use std::sync::Arc;
use tracing::warn;

pub struct DeleteExecutor {
    table: Arc<Table>,
    child: Box<dyn Executor>,
    trx: Option<Arc<dyn Trx>>,
    log: CompensationLog,
    rows_affected: usize,
    state: ExecState,
}

impl DeleteExecutor {
    pub fn new(table: Arc<Table>, child: Box<dyn Executor>) -> Self {
        Self {
            table,
            child,
            trx: None,
            log: CompensationLog::new(),
            rows_affected: 0,
            state: ExecState::Created,
        }
    }

    pub fn rows_affected(&self) -> usize {
        self.rows_affected
    }

    fn drain(&mut self) -> Result<()> {
        let trx = self
            .trx
            .as_ref()
            .ok_or_else(|| EngineError::Internal("delete has no transaction".into()))?
            .clone();

        while let Some(row) = self.child.next()? {
            let record = row.record.clone().ok_or_else(|| {
                EngineError::Internal("delete child produced a row without a record".into())
            })?;

            self.log.record(UndoAction::Delete {
                rid: record.rid(),
                old: record.data().to_vec(),
            });

            if let Err(err) = trx.delete_record(&self.table, &record) {
                warn!(rid = %record.rid(), %err, "delete failed, compensating prior rows");
                self.log.pop_last();
                if let Err(rollback_err) = self.log.rollback(&self.table) {
                    warn!(%rollback_err, "compensation incomplete");
                }
                return Err(err);
            }
            self.rows_affected += 1;
        }
        Ok(())
    }
}

impl Executor for DeleteExecutor {
    fn open(&mut self, ctx: &ExecContext) -> Result<()> {
        self.state.check_open()?;
        self.child.open(ctx)?;
        self.trx = Some(ctx.trx.clone());
        self.state = ExecState::Opened;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.state.check_next()? {
            return Ok(None);
        }
        let result = self.drain();
        self.state = ExecState::Exhausted;
        let close_result = self.child.close();
        self.log.clear();
        result?;
        close_result?;
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        self.log.clear();
        self.state = ExecState::Closed;
        self.child.close()
    }

    fn param(&self) -> String {
        self.table.name().to_string()
    }
}
