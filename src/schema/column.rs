//! Column definitions.
//!
//! A `ColumnDef` is the per-column slice of a table's metadata: name, kind,
//! declared byte length (meaningful for Char), and nullability. Byte offsets
//! are not stored here; the record `Schema` computes them from column order.

use crate::types::DataType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    name: String,
    data_type: DataType,
    len: usize,
    nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let len = data_type.fixed_size(0).unwrap_or(0);
        Self {
            name: name.into(),
            data_type,
            len,
            nullable: true,
        }
    }

    /// Fixed-length character column of the given byte length.
    pub fn chars(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Char,
            len,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Inline byte length of this column's slot in the record.
    pub fn len(&self) -> usize {
        self.data_type.fixed_size(self.len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}
