//! Insert operator. A root mutation with no child: the rows to insert
//! arrive as value lists, records are built through the table's validated
//! write path, and every insert goes through the transaction at `open()`.
//! If a later row fails, previously inserted rows of the same batch are
//! compensated away before the error propagates.

use crate::exec::{CompensationLog, ExecContext, ExecState, Executor, Row, UndoAction};
use crate::storage::Table;
use crate::types::Value;
use eyre::Result;
use std::sync::Arc;
use tracing::debug;

pub struct InsertExecutor {
    table: Arc<Table>,
    rows: Vec<Vec<Value<'static>>>,
    rows_affected: usize,
    state: ExecState,
}

impl InsertExecutor {
    pub fn new(table: Arc<Table>, rows: Vec<Vec<Value<'static>>>) -> Self {
        Self {
            table,
            rows,
            rows_affected: 0,
            state: ExecState::Created,
        }
    }

    pub fn rows_affected(&self) -> usize {
        self.rows_affected
    }
}

impl Executor for InsertExecutor {
    fn open(&mut self, ctx: &ExecContext) -> Result<()> {
        self.state.check_open()?;
        let mut log = CompensationLog::new();
        for values in &self.rows {
            let data = self.table.build_record(values)?;
            match ctx.trx.insert_record(&self.table, data) {
                Ok(rid) => {
                    log.record(UndoAction::Insert { rid });
                    self.rows_affected += 1;
                }
                Err(err) => {
                    log.rollback(&self.table)?;
                    self.rows_affected = 0;
                    return Err(err);
                }
            }
        }
        debug!(table = self.table.name(), rows = self.rows_affected, "insert applied");
        self.state = ExecState::Opened;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if self.state.check_next()? {
            self.state = ExecState::Exhausted;
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        self.rows.clear();
        self.state = ExecState::Closed;
        Ok(())
    }

    fn param(&self) -> String {
        self.table.name().to_string()
    }
}
