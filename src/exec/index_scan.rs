//! # Index-Bounded Range Scan
//!
//! Scans one index over `[left, right]` composite bounds, fetching the full
//! record for each matching id and keeping rows that pass the residual
//! predicate conjunction and the transaction's visibility check.
//!
//! The bounds are encoded at construction: each bound's column values are
//! laid out at their fixed offsets in a buffer sized to the index's combined
//! field lengths; Char values are copied only up to their actual length
//! (no padding) so a bound can constrain a prefix of the key. Construction
//! fails fast on bound values the index cannot hold.
//!
//! `next()` loop per candidate: scanner id → record fetch (error aborts) →
//! residual predicates (false skips, error aborts) → `trx.visit_record`
//! (RecordInvisible skips silently, anything else aborts).

use crate::error::{is_kind, EngineError};
use crate::exec::{ExecContext, ExecState, Executor, Expr, Row};
use crate::storage::{encode_bound_key, Index, IndexScanner, Table};
use crate::trx::{ReadWriteMode, Trx};
use crate::types::Value;
use eyre::Result;
use std::sync::Arc;
use tracing::{trace, warn};

pub struct IndexScanExecutor {
    table: Arc<Table>,
    index: Arc<dyn Index>,
    mode: ReadWriteMode,
    left_key: Vec<u8>,
    left_inclusive: bool,
    right_key: Vec<u8>,
    right_inclusive: bool,
    predicates: Vec<Expr>,
    scanner: Option<Box<dyn IndexScanner>>,
    trx: Option<Arc<dyn Trx>>,
    state: ExecState,
}

impl IndexScanExecutor {
    /// Builds the operator, encoding both composite bound keys. An empty
    /// bound value list leaves that side unbounded.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        table: Arc<Table>,
        index: Arc<dyn Index>,
        mode: ReadWriteMode,
        left_values: &[Value],
        left_inclusive: bool,
        right_values: &[Value],
        right_inclusive: bool,
    ) -> Result<Self> {
        let layout = index.key_layout();
        let left_key = encode_bound_key(layout, left_values)?;
        let right_key = encode_bound_key(layout, right_values)?;
        Ok(Self {
            table,
            index,
            mode,
            left_key,
            left_inclusive,
            right_key,
            right_inclusive,
            predicates: Vec::new(),
            scanner: None,
            trx: None,
            state: ExecState::Created,
        })
    }

    /// Residual predicates the range itself cannot resolve; evaluated as a
    /// conjunction per candidate row.
    pub fn set_predicates(&mut self, predicates: Vec<Expr>) {
        self.predicates = predicates;
    }

    fn filter(&self, values: &[Value<'static>]) -> Result<bool> {
        for predicate in &self.predicates {
            if !predicate.eval_bool(values)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Executor for IndexScanExecutor {
    fn open(&mut self, ctx: &ExecContext) -> Result<()> {
        self.state.check_open()?;
        let scanner = self
            .index
            .create_scanner(
                &self.left_key,
                self.left_inclusive,
                &self.right_key,
                self.right_inclusive,
            )
            .map_err(|err| {
                warn!(index = self.index.meta().name(), "failed to create index scanner");
                err
            })?;
        self.scanner = Some(scanner);
        self.trx = Some(ctx.trx.clone());
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
            .ok_or_else(|| EngineError::Internal("index scan has no transaction".into()))?
            .clone();

        loop {
            let entry = self
                .scanner
                .as_mut()
                .ok_or_else(|| EngineError::Internal("index scan has no scanner".into()))?
                .next_entry()?;
            let rid = match entry {
                Some(rid) => rid,
                None => break,
            };
            let record = self.table.get_record(rid)?;
            trace!(%rid, "index scan candidate");

            let values = self.table.read_row(&record)?;
            if !self.filter(&values)? {
                trace!(%rid, "record filtered");
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
        self.scanner = None;
        self.trx = None;
        self.state = ExecState::Closed;
        Ok(())
    }

    fn param(&self) -> String {
        format!("{} ON {}", self.index.meta().name(), self.table.name())
    }
}
