//! # Runtime Value Representation
//!
//! This module provides `Value<'a>`, the tagged runtime representation for
//! column values. Text-like variants use `Cow` so values can borrow directly
//! from record buffers on the read path while owning their data when built
//! from literals or casts.
//!
//! ## Value Variants
//!
//! | Variant | Rust Type | Description |
//! |---------|-----------|-------------|
//! | Null | - | SQL NULL, no payload |
//! | Bool | bool | boolean |
//! | Int | i32 | 32-bit signed integer |
//! | Long | i64 | 64-bit signed integer |
//! | Float | f64 | 64-bit floating point |
//! | Date | i32 | YYYYMMDD-encoded calendar date |
//! | Char | Cow<str> | fixed-length character data (padding stripped) |
//! | Text | Cow<str> | out-of-line text, materialized |
//!
//! ## Operation Contract
//!
//! Binary operations require identical kinds; the only sanctioned bridge
//! between kinds is `cast_to`. `compare` returns `None` when either side is
//! Null or the kinds differ — callers decide what Null means in their
//! context (predicates treat it as false, sorting puts Null first).
//!
//! Arithmetic is defined for the numeric kinds only. Date arithmetic is
//! deliberately not provided and reports `Unsupported`. Division always
//! produces Float; a zero divisor and integer overflow report
//! `InvalidArgument` rather than wrapping.
//!
//! ## Casting
//!
//! Char-to-numeric casts tolerate trailing garbage by truncating the input
//! to its maximal valid numeric prefix before parsing ("12.5abc" casts to
//! Float 12.5). Char-to-Date validates full calendar correctness. Targets
//! with no defined conversion report `Unimplemented`.

use crate::error::EngineError;
use crate::types::date::{format_date, parse_date};
use crate::types::DataType;
use eyre::Result;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Runtime value for one column position.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f64),
    Date(i32),
    Char(Cow<'a, str>),
    Text(Cow<'a, str>),
}

impl<'a> Value<'a> {
    pub fn char_from(s: impl Into<String>) -> Value<'static> {
        Value::Char(Cow::Owned(s.into()))
    }

    pub fn text_from(s: impl Into<String>) -> Value<'static> {
        Value::Text(Cow::Owned(s.into()))
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::Long(_) => DataType::Long,
            Value::Float(_) => DataType::Float,
            Value::Date(_) => DataType::Date,
            Value::Char(_) => DataType::Char,
            Value::Text(_) => DataType::Text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parses a textual literal into a value of the given kind.
    pub fn from_str(kind: DataType, text: &str) -> Result<Value<'static>> {
        match kind {
            DataType::Null => Ok(Value::Null),
            DataType::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(Value::Bool(true)),
                "false" | "f" | "0" => Ok(Value::Bool(false)),
                _ => Err(EngineError::InvalidArgument(format!("invalid boolean '{text}'")).into()),
            },
            DataType::Int => text
                .trim()
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|_| EngineError::InvalidArgument(format!("invalid int '{text}'")).into()),
            DataType::Long => text
                .trim()
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|_| {
                    EngineError::InvalidArgument(format!("invalid bigint '{text}'")).into()
                }),
            DataType::Float => text
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| {
                    EngineError::InvalidArgument(format!("invalid float '{text}'")).into()
                }),
            DataType::Date => parse_date(text).map(Value::Date),
            DataType::Char => Ok(Value::char_from(text)),
            DataType::Text => Ok(Value::text_from(text)),
        }
    }

    /// Compares two values of identical kind. Returns `None` when either
    /// side is Null or the kinds differ; callers coerce first when they
    /// want cross-kind comparison.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Char(a), Value::Char(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Value::Text(a), Value::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            _ => None,
        }
    }

    /// Total order for sorting: Null sorts before every non-null value,
    /// incomparable pairs are treated as equal.
    pub fn compare_for_sort(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value<'static>> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map(Value::Int)
                .ok_or_else(|| EngineError::InvalidArgument("int overflow in add".into()).into()),
            (Value::Long(a), Value::Long(b)) => a
                .checked_add(*b)
                .map(Value::Long)
                .ok_or_else(|| EngineError::InvalidArgument("bigint overflow in add".into()).into()),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
            _ => arithmetic_unsupported(self, other),
        }
    }

    pub fn subtract(&self, other: &Value) -> Result<Value<'static>> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int).ok_or_else(|| {
                EngineError::InvalidArgument("int overflow in subtract".into()).into()
            }),
            (Value::Long(a), Value::Long(b)) => {
                a.checked_sub(*b).map(Value::Long).ok_or_else(|| {
                    EngineError::InvalidArgument("bigint overflow in subtract".into()).into()
                })
            }
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
            _ => arithmetic_unsupported(self, other),
        }
    }

    pub fn multiply(&self, other: &Value) -> Result<Value<'static>> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int).ok_or_else(|| {
                EngineError::InvalidArgument("int overflow in multiply".into()).into()
            }),
            (Value::Long(a), Value::Long(b)) => {
                a.checked_mul(*b).map(Value::Long).ok_or_else(|| {
                    EngineError::InvalidArgument("bigint overflow in multiply".into()).into()
                })
            }
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
            _ => arithmetic_unsupported(self, other),
        }
    }

    /// Division always produces Float so averaging over integer inputs does
    /// not truncate.
    pub fn divide(&self, other: &Value) -> Result<Value<'static>> {
        let (a, b) = match (self, other) {
            (Value::Int(a), Value::Int(b)) => (*a as f64, *b as f64),
            (Value::Long(a), Value::Long(b)) => (*a as f64, *b as f64),
            (Value::Float(a), Value::Float(b)) => (*a, *b),
            _ => return arithmetic_unsupported(self, other),
        };
        if b == 0.0 {
            return Err(EngineError::InvalidArgument("division by zero".into()).into());
        }
        Ok(Value::Float(a / b))
    }

    pub fn negative(&self) -> Result<Value<'static>> {
        match self {
            Value::Int(a) => a.checked_neg().map(Value::Int).ok_or_else(|| {
                EngineError::InvalidArgument("int overflow in negate".into()).into()
            }),
            Value::Long(a) => a.checked_neg().map(Value::Long).ok_or_else(|| {
                EngineError::InvalidArgument("bigint overflow in negate".into()).into()
            }),
            Value::Float(a) => Ok(Value::Float(-a)),
            _ => Err(EngineError::Unsupported("negation of non-numeric value").into()),
        }
    }

    /// Converts this value to the target kind. Null casts to Null for every
    /// target. Unparseable numeric text fails InvalidArgument; invalid
    /// calendar text fails FieldTypeMismatch; pairs with no defined
    /// conversion fail Unimplemented.
    pub fn cast_to(&self, target: DataType) -> Result<Value<'static>> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        match (self, target) {
            (Value::Bool(b), DataType::Bool) => Ok(Value::Bool(*b)),

            (Value::Int(i), DataType::Int) => Ok(Value::Int(*i)),
            (Value::Int(i), DataType::Long) => Ok(Value::Long(*i as i64)),
            (Value::Int(i), DataType::Float) => Ok(Value::Float(*i as f64)),
            (Value::Int(i), DataType::Char) => Ok(Value::char_from(i.to_string())),

            (Value::Long(l), DataType::Long) => Ok(Value::Long(*l)),
            (Value::Long(l), DataType::Int) => i32::try_from(*l).map(Value::Int).map_err(|_| {
                EngineError::InvalidArgument(format!("bigint {l} out of int range")).into()
            }),
            (Value::Long(l), DataType::Float) => Ok(Value::Float(*l as f64)),
            (Value::Long(l), DataType::Char) => Ok(Value::char_from(l.to_string())),

            (Value::Float(f), DataType::Float) => Ok(Value::Float(*f)),
            (Value::Float(f), DataType::Int) => {
                let rounded = f.round();
                if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
                    return Err(EngineError::InvalidArgument(format!(
                        "float {f} out of int range"
                    ))
                    .into());
                }
                Ok(Value::Int(rounded as i32))
            }
            (Value::Float(f), DataType::Long) => {
                let rounded = f.round();
                if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
                    return Err(EngineError::InvalidArgument(format!(
                        "float {f} out of bigint range"
                    ))
                    .into());
                }
                Ok(Value::Long(rounded as i64))
            }
            (Value::Float(f), DataType::Char) => Ok(Value::char_from(f.to_string())),

            (Value::Date(d), DataType::Date) => Ok(Value::Date(*d)),
            (Value::Date(d), DataType::Int) => Ok(Value::Int(*d)),
            (Value::Date(d), DataType::Float) => Ok(Value::Float(*d as f64)),
            (Value::Date(d), DataType::Char) => Ok(Value::char_from(format_date(*d))),

            (Value::Char(s) | Value::Text(s), DataType::Char) => Ok(Value::char_from(s.as_ref())),
            (Value::Char(s) | Value::Text(s), DataType::Text) => Ok(Value::text_from(s.as_ref())),
            (Value::Char(s) | Value::Text(s), DataType::Int) => {
                let prefix = numeric_prefix(s, false);
                prefix.parse::<i32>().map(Value::Int).map_err(|_| {
                    EngineError::InvalidArgument(format!("cannot cast '{s}' to int")).into()
                })
            }
            (Value::Char(s) | Value::Text(s), DataType::Long) => {
                let prefix = numeric_prefix(s, false);
                prefix.parse::<i64>().map(Value::Long).map_err(|_| {
                    EngineError::InvalidArgument(format!("cannot cast '{s}' to bigint")).into()
                })
            }
            (Value::Char(s) | Value::Text(s), DataType::Float) => {
                let prefix = numeric_prefix(s, true);
                prefix.parse::<f64>().map(Value::Float).map_err(|_| {
                    EngineError::InvalidArgument(format!("cannot cast '{s}' to float")).into()
                })
            }
            (Value::Char(s) | Value::Text(s), DataType::Date) => {
                parse_date(s).map(Value::Date)
            }

            _ => Err(EngineError::Unimplemented("cast between these kinds").into()),
        }
    }

    /// Clones into a fully-owned value detached from any record buffer.
    pub fn to_owned_static(&self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Int(*i),
            Value::Long(l) => Value::Long(*l),
            Value::Float(f) => Value::Float(*f),
            Value::Date(d) => Value::Date(*d),
            Value::Char(s) => Value::Char(Cow::Owned(s.to_string())),
            Value::Text(s) => Value::Text(Cow::Owned(s.to_string())),
        }
    }

    /// Hashes this value for grouping; floats hash by bit pattern.
    pub fn hash_to<H: Hasher>(&self, hasher: &mut H) {
        std::mem::discriminant(self).hash(hasher);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(hasher),
            Value::Int(i) => i.hash(hasher),
            Value::Long(l) => l.hash(hasher),
            Value::Float(f) => f.to_bits().hash(hasher),
            Value::Date(d) => d.hash(hasher),
            Value::Char(s) | Value::Text(s) => s.hash(hasher),
        }
    }
}

impl std::fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Date(d) => f.write_str(&format_date(*d)),
            Value::Char(s) | Value::Text(s) => f.write_str(s),
        }
    }
}

fn arithmetic_unsupported(left: &Value, right: &Value) -> Result<Value<'static>> {
    if left.data_type() == right.data_type() {
        Err(EngineError::Unsupported("arithmetic on non-numeric kind").into())
    } else {
        Err(EngineError::FieldTypeMismatch(format!(
            "arithmetic between {} and {}",
            left.data_type(),
            right.data_type()
        ))
        .into())
    }
}

/// Returns the longest leading slice of `text` that parses as a number:
/// optional sign, digits, and (for floats) an optional fractional part.
fn numeric_prefix(text: &str, allow_fraction: bool) -> &str {
    let bytes = text.trim_start().as_bytes();
    let text = text.trim_start();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let int_digits = end - digits_start;
    if allow_fraction && int_digits > 0 && end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        end = frac_end;
    }
    if int_digits == 0 {
        return "";
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::engine_error;

    #[test]
    fn compare_requires_identical_kinds() {
        assert_eq!(
            Value::Int(1).compare(&Value::Int(2)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Int(1).compare(&Value::Long(1)), None);
        assert_eq!(Value::Null.compare(&Value::Int(1)), None);
    }

    #[test]
    fn char_comparison_is_bytewise() {
        let a = Value::char_from("abc");
        let b = Value::char_from("abd");
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(a.compare(&Value::char_from("abc")), Some(Ordering::Equal));
    }

    #[test]
    fn integer_division_produces_float() {
        let q = Value::Int(12).divide(&Value::Int(3)).unwrap();
        assert_eq!(q, Value::Float(4.0));
    }

    #[test]
    fn division_by_zero_is_invalid_argument() {
        let err = Value::Int(1).divide(&Value::Int(0)).unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn date_arithmetic_is_unsupported() {
        let err = Value::Date(20240101)
            .add(&Value::Date(20240102))
            .unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::Unsupported(_))
        ));
    }

    #[test]
    fn char_cast_truncates_to_numeric_prefix() {
        assert_eq!(
            Value::char_from("12.5abc").cast_to(DataType::Float).unwrap(),
            Value::Float(12.5)
        );
        assert_eq!(
            Value::char_from("42rows").cast_to(DataType::Int).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            Value::char_from("-7.25xyz")
                .cast_to(DataType::Float)
                .unwrap(),
            Value::Float(-7.25)
        );
    }

    #[test]
    fn char_cast_without_numeric_prefix_fails() {
        let err = Value::char_from("abc").cast_to(DataType::Int).unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn char_to_date_validates_calendar() {
        assert_eq!(
            Value::char_from("2024-02-29")
                .cast_to(DataType::Date)
                .unwrap(),
            Value::Date(20240229)
        );
        let err = Value::char_from("2024-02-30")
            .cast_to(DataType::Date)
            .unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::FieldTypeMismatch(_))
        ));
    }

    #[test]
    fn date_char_roundtrip_compares_equal() {
        let original = Value::Date(20240307);
        let as_char = original.cast_to(DataType::Char).unwrap();
        assert_eq!(as_char, Value::char_from("2024-03-07"));
        let back = as_char.cast_to(DataType::Date).unwrap();
        assert_eq!(back.compare(&original), Some(Ordering::Equal));
    }

    #[test]
    fn int_char_roundtrip() {
        let v = Value::Int(-15);
        let back = v
            .cast_to(DataType::Char)
            .unwrap()
            .cast_to(DataType::Int)
            .unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn unsupported_cast_targets_report_unimplemented() {
        let err = Value::Bool(true).cast_to(DataType::Date).unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::Unimplemented(_))
        ));
    }

    #[test]
    fn null_casts_to_null() {
        assert_eq!(Value::Null.cast_to(DataType::Int).unwrap(), Value::Null);
    }

    #[test]
    fn sort_order_puts_null_first() {
        assert_eq!(
            Value::Null.compare_for_sort(&Value::Int(0)),
            Ordering::Less
        );
        assert_eq!(
            Value::Int(0).compare_for_sort(&Value::Null),
            Ordering::Greater
        );
    }
}
