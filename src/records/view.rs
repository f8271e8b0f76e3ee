//! # RecordView — Schema-Aware Record Reads
//!
//! `RecordView` is the single validated read path over a record buffer. It
//! checks the buffer length against the schema once at construction, reads
//! the null bitmap, and decodes each column at its precomputed offset.
//! Nothing else in the crate does raw offset arithmetic on record bytes.
//!
//! Text columns decode to their locator here; materializing the payload
//! needs the owning table's text area and happens in `Table::read_row`.

use crate::error::EngineError;
use crate::records::Schema;
use crate::storage::TextRef;
use crate::types::{DataType, Value};
use eyre::{ensure, Result};
use std::borrow::Cow;

#[derive(Debug)]
pub struct RecordView<'a> {
    data: &'a [u8],
    schema: &'a Schema,
}

impl<'a> RecordView<'a> {
    pub fn new(data: &'a [u8], schema: &'a Schema) -> Result<Self> {
        ensure!(
            data.len() == schema.record_size(),
            "record is {} bytes, schema expects {}",
            data.len(),
            schema.record_size()
        );
        Ok(Self { data, schema })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn is_null(&self, col: usize) -> bool {
        let byte = col / 8;
        let bit = col % 8;
        (self.data[byte] & (1 << bit)) != 0
    }

    fn column_slice(&self, col: usize) -> Result<&'a [u8]> {
        let column = self
            .schema
            .column(col)
            .ok_or_else(|| EngineError::Internal(format!("column index {col} out of range")))?;
        let offset = self.schema.offset(col);
        Ok(&self.data[offset..offset + column.len()])
    }

    /// Decodes one column to a value. Null-bit set yields `Value::Null`
    /// regardless of the payload bytes; Text columns yield an error here,
    /// read them through `text_locator`.
    pub fn value(&self, col: usize) -> Result<Value<'a>> {
        if self.is_null(col) {
            return Ok(Value::Null);
        }
        let column = self
            .schema
            .column(col)
            .ok_or_else(|| EngineError::Internal(format!("column index {col} out of range")))?;
        let bytes = self.column_slice(col)?;
        match column.data_type() {
            DataType::Bool => Ok(Value::Bool(bytes[0] != 0)),
            DataType::Int => Ok(Value::Int(i32::from_le_bytes(bytes.try_into()?))),
            DataType::Long => Ok(Value::Long(i64::from_le_bytes(bytes.try_into()?))),
            DataType::Float => Ok(Value::Float(f64::from_le_bytes(bytes.try_into()?))),
            DataType::Date => Ok(Value::Date(i32::from_le_bytes(bytes.try_into()?))),
            DataType::Char => {
                let trimmed = match bytes.iter().position(|&b| b == 0) {
                    Some(end) => &bytes[..end],
                    None => bytes,
                };
                let s = std::str::from_utf8(trimmed).map_err(|e| {
                    EngineError::Internal(format!(
                        "char column '{}' holds invalid UTF-8: {e}",
                        column.name()
                    ))
                })?;
                Ok(Value::Char(Cow::Borrowed(s)))
            }
            DataType::Text => Err(EngineError::Internal(format!(
                "text column '{}' must be read through its locator",
                column.name()
            ))
            .into()),
            DataType::Null => Err(EngineError::Internal("null column kind in schema".into()).into()),
        }
    }

    /// Reads the out-of-line locator of a Text column.
    pub fn text_locator(&self, col: usize) -> Result<TextRef> {
        let column = self
            .schema
            .column(col)
            .ok_or_else(|| EngineError::Internal(format!("column index {col} out of range")))?;
        ensure!(
            column.data_type() == DataType::Text,
            "column '{}' is not a text column",
            column.name()
        );
        TextRef::decode(self.column_slice(col)?)
    }
}
