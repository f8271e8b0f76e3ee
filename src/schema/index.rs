//! # Index Metadata
//!
//! `IndexMeta` describes one composite index: its name, uniqueness, and the
//! ordered list of column names forming the key. Created at DDL time,
//! serialized into the catalog, resolved against the owning table's record
//! schema at table-open time, and immutable afterwards.
//!
//! Resolution fails with a field-missing condition when a named column no
//! longer exists, matching what a stale catalog entry must surface instead
//! of silently scanning garbage.

use crate::error::EngineError;
use crate::records::Schema;
use eyre::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    name: String,
    unique: bool,
    fields: Vec<String>,
}

impl IndexMeta {
    pub fn new(name: impl Into<String>, fields: Vec<impl Into<String>>, unique: bool) -> Self {
        Self {
            name: name.into(),
            unique,
            fields: fields.into_iter().map(|f| f.into()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Resolves the named fields to column indices in schema order.
    pub fn resolve_fields(&self, schema: &Schema) -> Result<Vec<usize>> {
        self.fields
            .iter()
            .map(|name| {
                schema
                    .column_index(name)
                    .ok_or_else(|| EngineError::FieldMissing(name.clone()).into())
            })
            .collect()
    }

    /// One-line description for plan display and catalog dumps.
    pub fn desc(&self) -> String {
        format!(
            "index name={}, unique={}, fields={}",
            self.name,
            self.unique,
            self.fields.join(" ")
        )
    }
}
