//! Materializing sort operator. Drains the child on the first `next()`,
//! sorts by the key columns (Null sorts first, descending keys reverse),
//! then streams the buffered rows. Buffered rows are released at close.

use crate::exec::{ExecContext, ExecState, Executor, Row};
use eyre::Result;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    pub column: usize,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(column: usize) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: usize) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

pub struct SortExecutor {
    child: Box<dyn Executor>,
    keys: Vec<SortKey>,
    rows: Vec<Row>,
    pos: usize,
    materialized: bool,
    state: ExecState,
}

impl SortExecutor {
    pub fn new(child: Box<dyn Executor>, keys: Vec<SortKey>) -> Self {
        Self {
            child,
            keys,
            rows: Vec::new(),
            pos: 0,
            materialized: false,
            state: ExecState::Created,
        }
    }

    fn materialize(&mut self) -> Result<()> {
        while let Some(row) = self.child.next()? {
            self.rows.push(row);
        }
        let keys = self.keys.clone();
        self.rows.sort_by(|a, b| {
            for key in &keys {
                let av = a.get(key.column);
                let bv = b.get(key.column);
                let ord = match (av, bv) {
                    (Some(x), Some(y)) => x.compare_for_sort(y),
                    _ => Ordering::Equal,
                };
                let ord = if key.ascending { ord } else { ord.reverse() };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        self.materialized = true;
        Ok(())
    }
}

impl Executor for SortExecutor {
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
        if !self.materialized {
            self.materialize()?;
        }
        if self.pos < self.rows.len() {
            let row = self.rows[self.pos].clone();
            self.pos += 1;
            Ok(Some(row))
        } else {
            self.state = ExecState::Exhausted;
            Ok(None)
        }
    }

    fn close(&mut self) -> Result<()> {
        self.rows.clear();
        self.state = ExecState::Closed;
        self.child.close()
    }
}
