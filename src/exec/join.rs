//! Nested-loop join. The right child is materialized at open and replayed
//! once per left row; the optional condition is evaluated against the
//! combined row (left columns first, right columns after).

use crate::exec::{ExecContext, ExecState, Executor, Expr, Row};
use eyre::Result;

pub struct NestedLoopJoinExecutor {
    left: Box<dyn Executor>,
    right: Box<dyn Executor>,
    condition: Option<Expr>,
    right_rows: Vec<Row>,
    current_left: Option<Row>,
    right_pos: usize,
    state: ExecState,
}

impl NestedLoopJoinExecutor {
    pub fn new(
        left: Box<dyn Executor>,
        right: Box<dyn Executor>,
        condition: Option<Expr>,
    ) -> Self {
        Self {
            left,
            right,
            condition,
            right_rows: Vec::new(),
            current_left: None,
            right_pos: 0,
            state: ExecState::Created,
        }
    }

    fn combine(left: &Row, right: &Row) -> Row {
        let mut values = Vec::with_capacity(left.column_count() + right.column_count());
        values.extend(left.values.iter().cloned());
        values.extend(right.values.iter().cloned());
        Row::new(values)
    }
}

impl Executor for NestedLoopJoinExecutor {
    fn open(&mut self, ctx: &ExecContext) -> Result<()> {
        self.state.check_open()?;
        self.left.open(ctx)?;
        self.right.open(ctx)?;
        while let Some(row) = self.right.next()? {
            self.right_rows.push(row);
        }
        self.right.close()?;
        self.state = ExecState::Opened;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Row>> {
        if !self.state.check_next()? {
            return Ok(None);
        }
        loop {
            if self.current_left.is_none() {
                match self.left.next()? {
                    Some(row) => {
                        self.current_left = Some(row);
                        self.right_pos = 0;
                    }
                    None => {
                        self.state = ExecState::Exhausted;
                        return Ok(None);
                    }
                }
            }

            let left_row = self.current_left.as_ref().unwrap();
            while self.right_pos < self.right_rows.len() {
                let right_row = &self.right_rows[self.right_pos];
                self.right_pos += 1;

                let combined = Self::combine(left_row, right_row);
                let keep = match &self.condition {
                    Some(cond) => cond.eval_bool(&combined.values)?,
                    None => true,
                };
                if keep {
                    return Ok(Some(combined));
                }
            }
            self.current_left = None;
        }
    }

    fn close(&mut self) -> Result<()> {
        self.right_rows.clear();
        self.current_left = None;
        self.state = ExecState::Closed;
        self.left.close()?;
        self.right.close()
    }
}
