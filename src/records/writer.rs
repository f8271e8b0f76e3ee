//! # RecordWriter — Schema-Aware Record Writes
//!
//! The write-side twin of `RecordView`: every mutation of record bytes goes
//! through here, keeping the null bitmap and the payload consistent.
//!
//! ## Write Rules
//!
//! - Char values longer than the column reject with InvalidArgument; shorter
//!   values are zero-padded so logically-equal strings stay byte-identical.
//! - Fixed-width kinds are copied verbatim little-endian.
//! - Writing a real value clears the column's null bit; writing Null sets it
//!   and leaves the payload bytes untouched.
//! - Null into a NOT NULL column rejects with FieldTypeMismatch.
//! - A value whose kind differs from the column rejects with
//!   FieldTypeMismatch; coercion is the caller's job (`cast_to`).
//! - Text payloads are appended to the table's text area first, then the
//!   returned locator is written into the fixed slot.

use crate::error::EngineError;
use crate::records::Schema;
use crate::schema::ColumnDef;
use crate::storage::TextArea;
use crate::types::{DataType, Value};
use eyre::{ensure, Result};

#[derive(Debug)]
pub struct RecordWriter<'a> {
    data: &'a mut [u8],
    schema: &'a Schema,
}

impl<'a> RecordWriter<'a> {
    pub fn new(data: &'a mut [u8], schema: &'a Schema) -> Result<Self> {
        ensure!(
            data.len() == schema.record_size(),
            "record buffer is {} bytes, schema expects {}",
            data.len(),
            schema.record_size()
        );
        Ok(Self { data, schema })
    }

    fn column(&self, col: usize) -> Result<&'a ColumnDef> {
        self.schema
            .column(col)
            .ok_or_else(|| EngineError::Internal(format!("column index {col} out of range")).into())
    }

    fn set_null_bit(&mut self, col: usize, null: bool) {
        let byte = col / 8;
        let bit = col % 8;
        if null {
            self.data[byte] |= 1 << bit;
        } else {
            self.data[byte] &= !(1 << bit);
        }
    }

    /// Marks the column null. The payload bytes are left as they are.
    pub fn set_null(&mut self, col: usize) -> Result<()> {
        let column = self.column(col)?;
        if !column.is_nullable() {
            return Err(EngineError::FieldTypeMismatch(format!(
                "column '{}' is not nullable",
                column.name()
            ))
            .into());
        }
        self.set_null_bit(col, true);
        Ok(())
    }

    /// Writes a value of the column's own kind into its slot.
    pub fn set_value(&mut self, col: usize, value: &Value) -> Result<()> {
        if value.is_null() {
            return self.set_null(col);
        }
        let column = self.column(col)?;
        let offset = self.schema.offset(col);
        let len = column.len();

        match (column.data_type(), value) {
            (DataType::Bool, Value::Bool(b)) => {
                self.data[offset] = *b as u8;
            }
            (DataType::Int, Value::Int(i)) => {
                self.data[offset..offset + 4].copy_from_slice(&i.to_le_bytes());
            }
            (DataType::Long, Value::Long(l)) => {
                self.data[offset..offset + 8].copy_from_slice(&l.to_le_bytes());
            }
            (DataType::Float, Value::Float(f)) => {
                self.data[offset..offset + 8].copy_from_slice(&f.to_le_bytes());
            }
            (DataType::Date, Value::Date(d)) => {
                self.data[offset..offset + 4].copy_from_slice(&d.to_le_bytes());
            }
            (DataType::Char, Value::Char(s)) => {
                let bytes = s.as_bytes();
                if bytes.len() > len {
                    return Err(EngineError::InvalidArgument(format!(
                        "value of {} bytes exceeds char column '{}' ({} bytes)",
                        bytes.len(),
                        column.name(),
                        len
                    ))
                    .into());
                }
                self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
                self.data[offset + bytes.len()..offset + len].fill(0);
            }
            (DataType::Text, _) => {
                return Err(EngineError::Internal(format!(
                    "text column '{}' must be written through set_text",
                    column.name()
                ))
                .into());
            }
            (expected, got) => {
                return Err(EngineError::FieldTypeMismatch(format!(
                    "cannot store {} value in {} column '{}'",
                    got.data_type(),
                    expected,
                    column.name()
                ))
                .into());
            }
        }
        self.set_null_bit(col, false);
        Ok(())
    }

    /// Appends the payload to the text area and writes the locator into the
    /// column's fixed slot.
    pub fn set_text(&mut self, col: usize, payload: &str, area: &TextArea) -> Result<()> {
        let column = self.column(col)?;
        ensure!(
            column.data_type() == DataType::Text,
            "column '{}' is not a text column",
            column.name()
        );
        let locator = area.append(payload.as_bytes());
        let offset = self.schema.offset(col);
        locator.encode(&mut self.data[offset..offset + column.len()])?;
        self.set_null_bit(col, false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{engine_error, EngineError};
    use crate::records::RecordView;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnDef::new("id", DataType::Int).not_null(),
            ColumnDef::chars("name", 4),
            ColumnDef::new("body", DataType::Text),
        ])
        .unwrap()
    }

    #[test]
    fn oversize_char_value_is_rejected() {
        let schema = schema();
        let mut data = vec![0u8; schema.record_size()];
        let mut writer = RecordWriter::new(&mut data, &schema).unwrap();
        let err = writer
            .set_value(1, &Value::char_from("too long"))
            .unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn short_char_value_is_zero_padded() {
        let schema = schema();
        let mut data = vec![0u8; schema.record_size()];
        RecordWriter::new(&mut data, &schema)
            .unwrap()
            .set_value(1, &Value::char_from("ab"))
            .unwrap();
        let offset = schema.offset(1);
        assert_eq!(&data[offset..offset + 4], b"ab\0\0");
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let schema = schema();
        let mut data = vec![0u8; schema.record_size()];
        let mut writer = RecordWriter::new(&mut data, &schema).unwrap();
        let err = writer.set_value(0, &Value::Float(1.0)).unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::FieldTypeMismatch(_))
        ));
    }

    #[test]
    fn null_into_not_null_column_is_rejected() {
        let schema = schema();
        let mut data = vec![0u8; schema.record_size()];
        let mut writer = RecordWriter::new(&mut data, &schema).unwrap();
        let err = writer.set_value(0, &Value::Null).unwrap_err();
        assert!(matches!(
            engine_error(&err),
            Some(EngineError::FieldTypeMismatch(_))
        ));
    }

    #[test]
    fn text_roundtrips_through_locator_and_area() {
        let schema = schema();
        let area = TextArea::new();
        let mut data = vec![0u8; schema.record_size()];
        RecordWriter::new(&mut data, &schema)
            .unwrap()
            .set_text(2, "a longer out-of-line payload", &area)
            .unwrap();

        let view = RecordView::new(&data, &schema).unwrap();
        let locator = view.text_locator(2).unwrap();
        assert_eq!(area.read(locator).unwrap(), "a longer out-of-line payload");
    }

    #[test]
    fn overwrite_clears_null_bit() {
        let schema = schema();
        let mut data = vec![0u8; schema.record_size()];
        {
            let mut writer = RecordWriter::new(&mut data, &schema).unwrap();
            writer.set_null(1).unwrap();
            writer.set_value(1, &Value::char_from("x")).unwrap();
        }
        let view = RecordView::new(&data, &schema).unwrap();
        assert!(!view.is_null(1));
        assert_eq!(view.value(1).unwrap(), Value::char_from("x"));
    }
}
