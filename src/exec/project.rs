//! Projection operator: reorders/narrows child rows to the given column
//! indices. The backing record does not survive projection; mutation
//! operators sit below projections, never above them.

use crate::error::EngineError;
use crate::exec::{ExecContext, ExecState, Executor, Row};
use eyre::Result;

pub struct ProjectExecutor {
    child: Box<dyn Executor>,
    columns: Vec<usize>,
    state: ExecState,
}

impl ProjectExecutor {
    pub fn new(child: Box<dyn Executor>, columns: Vec<usize>) -> Self {
        Self {
            child,
            columns,
            state: ExecState::Created,
        }
    }
}

impl Executor for ProjectExecutor {
    fn open(&mut self, ctx: &ExecContext) -> Result<()> {
        self.state.check_open()?;
        self.child.open(ctx)?;
        self.state = ExecState::Opened;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.state.check_next()? {
            return Ok(None);
        }
        match self.child.next()? {
            Some(row) => {
                let mut values = Vec::with_capacity(self.columns.len());
                for &idx in &self.columns {
                    let value = row.get(idx).cloned().ok_or_else(|| {
                        EngineError::Internal(format!("projection column {idx} out of range"))
                    })?;
                    values.push(value);
                }
                Ok(Some(Row::new(values)))
            }
            None => {
                self.state = ExecState::Exhausted;
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.state = ExecState::Closed;
        self.child.close()
    }
}
