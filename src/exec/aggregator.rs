//! # Aggregate Accumulators
//!
//! One accumulator per aggregate expression per group: created at
//! group-open, fed every row in the group through `accumulate`, finalized
//! once with `evaluate`, then discarded.
//!
//! Sum/Avg seed lazily from the first input and require every later input
//! to carry the same kind; Avg divides the running sum by the input count
//! and always produces Float. Max/Min keep the comparator-extreme value.
//! Count ignores the value entirely and counts calls.
//!
//! Nulls are not special-cased anywhere here: Count counts them, Sum/Avg
//! reject a post-seed kind change (a Null after a numeric seed included)
//! with FieldTypeMismatch, and Max/Min keep their current extreme because
//! the comparator reports Null as incomparable. Tests pin this behavior.

use crate::error::EngineError;
use crate::types::{DataType, Value};
use eyre::Result;
use std::cmp::Ordering;

pub trait Aggregator {
    fn accumulate(&mut self, value: &Value) -> Result<()>;
    fn evaluate(&self) -> Result<Value<'static>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Sum,
    Avg,
    Max,
    Min,
    Count,
}

impl AggregateKind {
    pub fn create(self) -> Box<dyn Aggregator> {
        match self {
            AggregateKind::Sum => Box::new(SumAggregator::default()),
            AggregateKind::Avg => Box::new(AvgAggregator::default()),
            AggregateKind::Max => Box::new(MaxAggregator::default()),
            AggregateKind::Min => Box::new(MinAggregator::default()),
            AggregateKind::Count => Box::new(CountAggregator::default()),
        }
    }
}

fn check_same_kind(current: &Value, incoming: &Value) -> Result<()> {
    if current.data_type() != incoming.data_type() {
        return Err(EngineError::FieldTypeMismatch(format!(
            "aggregate fed {} after seeding with {}",
            incoming.data_type(),
            current.data_type()
        ))
        .into());
    }
    Ok(())
}

#[derive(Default)]
pub struct SumAggregator {
    value: Option<Value<'static>>,
}

impl Aggregator for SumAggregator {
    fn accumulate(&mut self, value: &Value) -> Result<()> {
        match &self.value {
            None => {
                self.value = Some(value.to_owned_static());
                Ok(())
            }
            Some(current) => {
                check_same_kind(current, value)?;
                self.value = Some(current.add(value)?);
                Ok(())
            }
        }
    }

    fn evaluate(&self) -> Result<Value<'static>> {
        Ok(self.value.clone().unwrap_or(Value::Null))
    }
}

#[derive(Default)]
pub struct AvgAggregator {
    sum: Option<Value<'static>>,
    count: i32,
}

impl Aggregator for AvgAggregator {
    fn accumulate(&mut self, value: &Value) -> Result<()> {
        self.count += 1;
        match &self.sum {
            None => {
                self.sum = Some(value.to_owned_static());
                Ok(())
            }
            Some(current) => {
                check_same_kind(current, value)?;
                self.sum = Some(current.add(value)?);
                Ok(())
            }
        }
    }

    fn evaluate(&self) -> Result<Value<'static>> {
        match &self.sum {
            None => Ok(Value::Null),
            Some(Value::Null) => Ok(Value::Null),
            Some(sum) => {
                let sum = sum.cast_to(DataType::Float)?;
                sum.divide(&Value::Float(self.count as f64))
            }
        }
    }
}

#[derive(Default)]
pub struct MaxAggregator {
    value: Option<Value<'static>>,
}

impl Aggregator for MaxAggregator {
    fn accumulate(&mut self, value: &Value) -> Result<()> {
        match &self.value {
            None => {
                self.value = Some(value.to_owned_static());
            }
            Some(current) => {
                if !current.is_null() && !value.is_null() {
                    check_same_kind(current, value)?;
                }
                if current.compare(value) == Some(Ordering::Less) {
                    self.value = Some(value.to_owned_static());
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<Value<'static>> {
        Ok(self.value.clone().unwrap_or(Value::Null))
    }
}

#[derive(Default)]
pub struct MinAggregator {
    value: Option<Value<'static>>,
}

impl Aggregator for MinAggregator {
    fn accumulate(&mut self, value: &Value) -> Result<()> {
        match &self.value {
            None => {
                self.value = Some(value.to_owned_static());
            }
            Some(current) => {
                if !current.is_null() && !value.is_null() {
                    check_same_kind(current, value)?;
                }
                if current.compare(value) == Some(Ordering::Greater) {
                    self.value = Some(value.to_owned_static());
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<Value<'static>> {
        Ok(self.value.clone().unwrap_or(Value::Null))
    }
}

#[derive(Default)]
pub struct CountAggregator {
    count: i32,
}

impl Aggregator for CountAggregator {
    fn accumulate(&mut self, _value: &Value) -> Result<()> {
        self.count += 1;
        Ok(())
    }

    fn evaluate(&self) -> Result<Value<'static>> {
        Ok(Value::Int(self.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::engine_error;

    #[test]
    fn sum_accumulates_same_kind() {
        let mut agg = SumAggregator::default();
        for v in [1, 2, 3] {
            agg.accumulate(&Value::Int(v)).unwrap();
        }
        assert_eq!(agg.evaluate().unwrap(), Value::Int(6));
    }

    #[test]
    fn sum_rejects_kind_change_after_seed() {
        let mut agg = SumAggregator::default();
        agg.accumulate(&Value::Int(1)).unwrap();
        let err = agg.accumulate(&Value::Float(2.0)).unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::FieldTypeMismatch(_))
        ));
    }

    #[test]
    fn avg_of_integers_is_float() {
        let mut agg = AvgAggregator::default();
        for v in [2, 4, 6] {
            agg.accumulate(&Value::Int(v)).unwrap();
        }
        assert_eq!(agg.evaluate().unwrap(), Value::Float(4.0));
    }

    #[test]
    fn max_and_min_track_extremes() {
        let mut max = MaxAggregator::default();
        let mut min = MinAggregator::default();
        for v in [3, 9, 1, 7] {
            max.accumulate(&Value::Int(v)).unwrap();
            min.accumulate(&Value::Int(v)).unwrap();
        }
        assert_eq!(max.evaluate().unwrap(), Value::Int(9));
        assert_eq!(min.evaluate().unwrap(), Value::Int(1));
    }

    #[test]
    fn count_is_type_blind_and_counts_nulls() {
        // nulls are deliberately not filtered by any aggregator; Count
        // counts every input it is handed
        let mut agg = CountAggregator::default();
        agg.accumulate(&Value::Int(2)).unwrap();
        agg.accumulate(&Value::Null).unwrap();
        agg.accumulate(&Value::char_from("x")).unwrap();
        assert_eq!(agg.evaluate().unwrap(), Value::Int(3));
    }

    #[test]
    fn max_keeps_extreme_when_fed_null() {
        let mut agg = MaxAggregator::default();
        agg.accumulate(&Value::Int(5)).unwrap();
        agg.accumulate(&Value::Null).unwrap();
        assert_eq!(agg.evaluate().unwrap(), Value::Int(5));
    }

    #[test]
    fn sum_seeded_with_null_stays_null() {
        // first input wins the seed, nulls included; the later numeric
        // input is then a kind change
        let mut agg = SumAggregator::default();
        agg.accumulate(&Value::Null).unwrap();
        assert!(agg.accumulate(&Value::Int(1)).is_err());
        assert_eq!(agg.evaluate().unwrap(), Value::Null);
    }

    #[test]
    fn empty_aggregates_evaluate_to_null_except_count() {
        assert_eq!(SumAggregator::default().evaluate().unwrap(), Value::Null);
        assert_eq!(AvgAggregator::default().evaluate().unwrap(), Value::Null);
        assert_eq!(MaxAggregator::default().evaluate().unwrap(), Value::Null);
        assert_eq!(CountAggregator::default().evaluate().unwrap(), Value::Int(0));
    }
}
