//! # Row Expressions
//!
//! A small expression tree evaluated against one row's values: column
//! references by index, literals, comparisons, arithmetic, and conjunction.
//! This is the shape residual predicates and update assignments arrive in
//! after planning; plan construction itself happens upstream.
//!
//! ## Comparison Semantics
//!
//! A comparison involving Null evaluates false (callers filter nulls
//! upstream when they need different behavior). When the two sides have
//! different kinds, the comparison picks a cast direction by `cast_cost`
//! (lower cost preferred, left-to-right on a tie) and compares in the
//! chosen kind; incompatible kinds fail FieldTypeMismatch.

use crate::error::EngineError;
use crate::types::Value;
use eyre::Result;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    fn matches(self, ord: Ordering) -> bool {
        match self {
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::Ne => ord != Ordering::Equal,
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Le => ord != Ordering::Greater,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Column(usize),
    Literal(Value<'static>),
    Compare {
        op: CompOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
}

impl Expr {
    pub fn col(idx: usize) -> Expr {
        Expr::Column(idx)
    }

    pub fn lit(value: Value<'static>) -> Expr {
        Expr::Literal(value)
    }

    pub fn cmp(op: CompOp, left: Expr, right: Expr) -> Expr {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Expr {
        Expr::cmp(CompOp::Eq, left, right)
    }

    pub fn arith(op: ArithOp, left: Expr, right: Expr) -> Expr {
        Expr::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eval(&self, row: &[Value<'static>]) -> Result<Value<'static>> {
        match self {
            Expr::Column(idx) => row
                .get(*idx)
                .cloned()
                .ok_or_else(|| {
                    EngineError::Internal(format!("column {idx} out of range for row")).into()
                }),
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Compare { op, left, right } => {
                let l = left.eval(row)?;
                let r = right.eval(row)?;
                match coerced_compare(&l, &r)? {
                    Some(ord) => Ok(Value::Bool(op.matches(ord))),
                    None => Ok(Value::Bool(false)),
                }
            }
            Expr::Arith { op, left, right } => {
                let l = left.eval(row)?;
                let r = right.eval(row)?;
                match op {
                    ArithOp::Add => l.add(&r),
                    ArithOp::Sub => l.subtract(&r),
                    ArithOp::Mul => l.multiply(&r),
                    ArithOp::Div => l.divide(&r),
                }
            }
            Expr::And(exprs) => {
                for expr in exprs {
                    if !expr.eval_bool(row)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
        }
    }

    /// Evaluates to a boolean; a non-boolean result is a planner bug.
    pub fn eval_bool(&self, row: &[Value<'static>]) -> Result<bool> {
        match self.eval(row)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(EngineError::Internal(format!(
                "predicate evaluated to {} instead of boolean",
                other.data_type()
            ))
            .into()),
        }
    }
}

/// Compares two values, casting across kinds when needed. The cast
/// direction with the lower `cast_cost` wins; on a tie the left side is
/// cast to the right side's kind first. `Ok(None)` means incomparable
/// because one side is Null.
pub fn coerced_compare(left: &Value, right: &Value) -> Result<Option<Ordering>> {
    if left.is_null() || right.is_null() {
        return Ok(None);
    }
    let lk = left.data_type();
    let rk = right.data_type();
    if lk == rk {
        return Ok(left.compare(right));
    }

    let left_to_right = lk.cast_cost(rk);
    let right_to_left = rk.cast_cost(lk);
    let try_ltr_first = left_to_right <= right_to_left;

    let attempt = |cast_left: bool| -> Result<Option<Ordering>> {
        if cast_left {
            let l = left.cast_to(rk)?;
            Ok(l.compare(right))
        } else {
            let r = right.cast_to(lk)?;
            Ok(left.compare(&r))
        }
    };

    match attempt(try_ltr_first) {
        Ok(ord) => Ok(ord),
        Err(first_err) => match attempt(!try_ltr_first) {
            Ok(ord) => Ok(ord),
            Err(_) => Err(first_err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjunction_short_circuits() {
        let row = vec![Value::Int(1)];
        let expr = Expr::And(vec![
            Expr::eq(Expr::col(0), Expr::lit(Value::Int(2))),
            // out-of-range column would error if evaluated
            Expr::eq(Expr::col(99), Expr::lit(Value::Int(1))),
        ]);
        assert!(!expr.eval_bool(&row).unwrap());
    }

    #[test]
    fn null_comparison_is_false() {
        let row = vec![Value::Null];
        let expr = Expr::eq(Expr::col(0), Expr::lit(Value::Int(1)));
        assert!(!expr.eval_bool(&row).unwrap());
        let expr = Expr::cmp(CompOp::Ne, Expr::col(0), Expr::lit(Value::Int(1)));
        assert!(!expr.eval_bool(&row).unwrap());
    }

    #[test]
    fn cross_kind_comparison_casts_by_cost() {
        // Char "10" vs Int 10: Int->Char costs 0, Char->Float is the
        // penalized pair; Char->Int costs 0 either way, both directions
        // agree here
        let ord = coerced_compare(&Value::char_from("10"), &Value::Int(10)).unwrap();
        assert_eq!(ord, Some(Ordering::Equal));

        let ord = coerced_compare(&Value::Int(3), &Value::Float(3.5)).unwrap();
        assert_eq!(ord, Some(Ordering::Less));
    }

    #[test]
    fn incompatible_kinds_fail() {
        let err = coerced_compare(&Value::Bool(true), &Value::Date(20240101)).unwrap_err();
        assert!(crate::error::engine_error(&err).is_some());
    }

    #[test]
    fn arithmetic_evaluates_per_kind() {
        let row = vec![Value::Int(6), Value::Int(7)];
        let expr = Expr::arith(ArithOp::Mul, Expr::col(0), Expr::col(1));
        assert_eq!(expr.eval(&row).unwrap(), Value::Int(42));

        let expr = Expr::arith(ArithOp::Div, Expr::col(0), Expr::lit(Value::Int(4)));
        assert_eq!(expr.eval(&row).unwrap(), Value::Float(1.5));
    }
}
