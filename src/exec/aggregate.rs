//! Hash aggregation operator.
//!
//! Drains the child on the first `next()`, bucketing rows by the group-by
//! columns (hash-grouped, insertion-ordered output) and feeding one
//! accumulator set per group. Output rows carry the group key columns
//! followed by the finalized aggregate values. With no group-by columns a
//! single global group is emitted even over empty input, which is how
//! `COUNT(*)` of an empty table yields 0.
//!
//! Grouping treats Null as equal to Null and floats equal by bit pattern,
//! matching the hash.

use crate::exec::aggregator::{AggregateKind, Aggregator};
use crate::exec::{ExecContext, ExecState, Executor, Row};
use crate::types::Value;
use eyre::Result;
use hashbrown::HashMap;
use std::hash::{Hash, Hasher};

/// One aggregate expression: which accumulator over which input column.
#[derive(Debug, Clone, Copy)]
pub struct AggregateSpec {
    pub kind: AggregateKind,
    pub column: usize,
}

impl AggregateSpec {
    pub fn new(kind: AggregateKind, column: usize) -> Self {
        Self { kind, column }
    }
}

struct GroupKey(Vec<Value<'static>>);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.0.iter().zip(other.0.iter()).all(|(a, b)| match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
            _ => a == b,
        })
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            value.hash_to(state);
        }
    }
}

pub struct AggregateExecutor {
    child: Box<dyn Executor>,
    group_by: Vec<usize>,
    specs: Vec<AggregateSpec>,
    groups: HashMap<GroupKey, usize>,
    group_keys: Vec<Vec<Value<'static>>>,
    group_aggs: Vec<Vec<Box<dyn Aggregator>>>,
    pos: usize,
    materialized: bool,
    state: ExecState,
}

impl AggregateExecutor {
    pub fn new(child: Box<dyn Executor>, group_by: Vec<usize>, specs: Vec<AggregateSpec>) -> Self {
        Self {
            child,
            group_by,
            specs,
            groups: HashMap::new(),
            group_keys: Vec::new(),
            group_aggs: Vec::new(),
            pos: 0,
            materialized: false,
            state: ExecState::Created,
        }
    }

    fn new_group(&mut self, key: Vec<Value<'static>>) -> usize {
        let idx = self.group_keys.len();
        self.group_keys.push(key.clone());
        self.group_aggs
            .push(self.specs.iter().map(|s| s.kind.create()).collect());
        self.groups.insert(GroupKey(key), idx);
        idx
    }

    fn materialize(&mut self) -> Result<()> {
        while let Some(row) = self.child.next()? {
            let key: Vec<Value<'static>> = self
                .group_by
                .iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or(Value::Null))
                .collect();
            let existing = self.groups.get(&GroupKey(key.clone())).copied();
            let group_idx = match existing {
                Some(idx) => idx,
                None => self.new_group(key),
            };
            for (spec, agg) in self.specs.iter().zip(self.group_aggs[group_idx].iter_mut()) {
                let value = row.get(spec.column).cloned().unwrap_or(Value::Null);
                agg.accumulate(&value)?;
            }
        }
        // a global aggregate has one group even over empty input
        if self.group_by.is_empty() && self.group_keys.is_empty() {
            self.new_group(Vec::new());
        }
        self.materialized = true;
        Ok(())
    }
}

impl Executor for AggregateExecutor {
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
        if self.pos >= self.group_keys.len() {
            self.state = ExecState::Exhausted;
            return Ok(None);
        }
        let idx = self.pos;
        self.pos += 1;

        let mut values = self.group_keys[idx].clone();
        for agg in &self.group_aggs[idx] {
            values.push(agg.evaluate()?);
        }
        Ok(Some(Row::new(values)))
    }

    fn close(&mut self) -> Result<()> {
        self.groups.clear();
        self.group_keys.clear();
        self.group_aggs.clear();
        self.state = ExecState::Closed;
        self.child.close()
    }
}
