//! # Update Operator
//!
//! Root mutation over a child scan. `next()` drains the child to
//! exhaustion, and per row:
//!
//! 1. copies the current record bytes into a scratch buffer
//! 2. resolves each assignment's expression, coerces it to the column's
//!    kind, and writes it into the scratch image through the validated
//!    record writer (padding, oversize and nullability rules apply there)
//! 3. byte-compares scratch against the original — an identical image is a
//!    no-op: the transaction's write path is not called and the distinct
//!    NoopUpdate signal stops the statement
//! 4. records the (old bytes, row id) pair in the compensation log, then
//!    applies the new image through the transaction
//! 5. if the transaction write fails, the failed row's own log entry is
//!    dropped and all prior successful updates replay in reverse before the
//!    original error propagates
//!
//! The child is closed on every exit path: success, no-op, residual
//! failure, or compensation failure.

use crate::error::EngineError;
use crate::exec::{CompensationLog, ExecContext, ExecState, Executor, Expr, Row, UndoAction};
use crate::records::RecordWriter;
use crate::storage::{coerce_for_column, Table};
use crate::trx::Trx;
use crate::types::{DataType, Value};
use eyre::Result;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct UpdateExecutor {
    table: Arc<Table>,
    assignments: Vec<(String, Expr)>,
    child: Box<dyn Executor>,
    trx: Option<Arc<dyn Trx>>,
    log: CompensationLog,
    rows_affected: usize,
    state: ExecState,
}

impl UpdateExecutor {
    pub fn new(
        table: Arc<Table>,
        assignments: Vec<(String, Expr)>,
        child: Box<dyn Executor>,
    ) -> Self {
        Self {
            table,
            assignments,
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

    /// Builds the new row image for one child row. The scratch buffer
    /// starts as a copy of the current bytes; only assigned columns change.
    fn build_new_image(&self, row: &Row, old_data: &[u8]) -> Result<Vec<u8>> {
        let schema = self.table.schema();
        let mut scratch = old_data.to_vec();
        let mut writer = RecordWriter::new(&mut scratch, schema)?;
        for (column_name, expr) in &self.assignments {
            let (col, column) = schema
                .column_by_name(column_name)
                .ok_or_else(|| EngineError::FieldMissing(column_name.clone()))?;
            let value = expr.eval(&row.values)?;
            if value.is_null() {
                writer.set_null(col)?;
                continue;
            }
            let coerced = coerce_for_column(&value, column)?;
            match column.data_type() {
                DataType::Text => match &coerced {
                    Value::Text(s) | Value::Char(s) => {
                        writer.set_text(col, s, self.table.text_area())?
                    }
                    _ => {
                        return Err(EngineError::FieldTypeMismatch(format!(
                            "cannot store {} value in text column '{}'",
                            coerced.data_type(),
                            column.name()
                        ))
                        .into())
                    }
                },
                _ => writer.set_value(col, &coerced)?,
            }
        }
        Ok(scratch)
    }

    fn drain(&mut self) -> Result<()> {
        let trx = self
            .trx
            .as_ref()
            .ok_or_else(|| EngineError::Internal("update has no transaction".into()))?
            .clone();

        while let Some(row) = self.child.next()? {
            let record = row.record.clone().ok_or_else(|| {
                EngineError::Internal("update child produced a row without a record".into())
            })?;

            let new_image = self.build_new_image(&row, record.data())?;

            if new_image == record.data() {
                debug!(rid = %record.rid(), "new image equals old image, skipping statement");
                return Err(EngineError::NoopUpdate.into());
            }

            self.log.record(UndoAction::Update {
                rid: record.rid(),
                old: record.data().to_vec(),
            });

            if let Err(err) = trx.update_record(&self.table, &record, &new_image) {
                warn!(rid = %record.rid(), %err, "update failed, compensating prior rows");
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

impl Executor for UpdateExecutor {
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
        // the child is released here on every exit path; a later close()
        // on this operator is a no-op for it
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
