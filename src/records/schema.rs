//! # Record Schema
//!
//! `Schema` defines the byte layout of one table's records: the null-bitmap
//! size and a precomputed offset for every column, so field access is O(1)
//! and all offset arithmetic lives in one place.

use crate::error::EngineError;
use crate::schema::ColumnDef;
use crate::types::DataType;
use eyre::Result;

#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnDef>,
    offsets: Vec<usize>,
    null_bitmap_len: usize,
    record_size: usize,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        if columns.is_empty() {
            return Err(EngineError::InvalidArgument("schema needs at least one column".into()).into());
        }
        let null_bitmap_len = Self::null_bitmap_size(columns.len());
        let mut offsets = Vec::with_capacity(columns.len());
        let mut offset = null_bitmap_len;
        for col in &columns {
            if col.data_type() == DataType::Null {
                return Err(EngineError::InvalidArgument(format!(
                    "column '{}' cannot have the null kind",
                    col.name()
                ))
                .into());
            }
            if col.data_type() == DataType::Char && col.len() == 0 {
                return Err(EngineError::InvalidArgument(format!(
                    "char column '{}' needs a length",
                    col.name()
                ))
                .into());
            }
            offsets.push(offset);
            offset += col.len();
        }
        Ok(Self {
            columns,
            offsets,
            null_bitmap_len,
            record_size: offset,
        })
    }

    pub fn null_bitmap_size(column_count: usize) -> usize {
        column_count.div_ceil(8)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&ColumnDef> {
        self.columns.get(idx)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name().eq_ignore_ascii_case(name))
    }

    pub fn column_by_name(&self, name: &str) -> Option<(usize, &ColumnDef)> {
        self.column_index(name).map(|idx| (idx, &self.columns[idx]))
    }

    /// Byte offset of the column's slot within the record.
    pub fn offset(&self, idx: usize) -> usize {
        self.offsets[idx]
    }

    pub fn null_bitmap_len(&self) -> usize {
        self.null_bitmap_len
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }
}
