//! Filter operator: pulls from its child until a row satisfies the
//! predicate conjunction. A false predicate skips the row; a predicate
//! error aborts iteration (the caller still closes the tree).

use crate::exec::{ExecContext, ExecState, Executor, Expr, Row};
use eyre::Result;

pub struct PredicateExecutor {
    child: Box<dyn Executor>,
    predicates: Vec<Expr>,
    state: ExecState,
}

impl PredicateExecutor {
    pub fn new(child: Box<dyn Executor>, predicates: Vec<Expr>) -> Self {
        Self {
            child,
            predicates,
            state: ExecState::Created,
        }
    }
}

impl Executor for PredicateExecutor {
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
        while let Some(row) = self.child.next()? {
            let mut qualified = true;
            for predicate in &self.predicates {
                if !predicate.eval_bool(&row.values)? {
                    qualified = false;
                    break;
                }
            }
            if qualified {
                return Ok(Some(row));
            }
        }
        self.state = ExecState::Exhausted;
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        self.state = ExecState::Closed;
        self.child.close()
    }
}
