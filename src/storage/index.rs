//! # Composite-Key Index Contract
//!
//! Indexes are consumed through an opaque interface: the executor hands an
//! index a pair of encoded composite bound keys and gets back a scanner that
//! yields `RecordId`s in key order. The index algorithm behind the interface
//! (B-tree, skip list, whatever the storage layer ships) is not this crate's
//! business; `MemIndex` is the ordered in-memory implementation used by
//! tests and demos.
//!
//! ## Key Encoding
//!
//! A composite key is the concatenation of the indexed columns' bytes, each
//! at its cumulative offset in a buffer sized to the combined field lengths.
//! Keys extracted from records carry full zero-padded slots. Bound keys
//! built from values copy Char data only up to its actual length and the
//! key is truncated after the last value written, so a bound may cover just
//! a leading subset of the fields (a prefix bound).
//!
//! ## Key Comparison
//!
//! Keys compare field-wise with each field's own semantics (numeric kinds
//! decode before comparing; Char compares bytewise with implicit zero
//! padding, so an unpadded bound equals its padded stored form). A key that
//! ends before a field starts leaves the remaining fields unconstrained.

use crate::error::EngineError;
use crate::records::{RecordId, Schema};
use crate::schema::IndexMeta;
use crate::types::{DataType, Value};
use eyre::Result;
use parking_lot::RwLock;
use std::cmp::Ordering;
use tracing::warn;

/// One column's slice of a composite key.
#[derive(Debug, Clone, Copy)]
pub struct KeyField {
    pub data_type: DataType,
    pub len: usize,
}

/// Field types and lengths of a composite key, in key order.
#[derive(Debug, Clone)]
pub struct KeyLayout {
    fields: Vec<KeyField>,
    total_len: usize,
}

impl KeyLayout {
    pub fn from_schema(schema: &Schema, field_indices: &[usize]) -> Result<Self> {
        let mut fields = Vec::with_capacity(field_indices.len());
        let mut total_len = 0;
        for &idx in field_indices {
            let column = schema
                .column(idx)
                .ok_or_else(|| EngineError::Internal(format!("column index {idx} out of range")))?;
            if column.data_type() == DataType::Text {
                return Err(EngineError::Unsupported("text columns cannot be indexed").into());
            }
            fields.push(KeyField {
                data_type: column.data_type(),
                len: column.len(),
            });
            total_len += column.len();
        }
        Ok(Self { fields, total_len })
    }

    pub fn fields(&self) -> &[KeyField] {
        &self.fields
    }

    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// Field-wise key comparison; a key exhausted before a field starts
    /// compares Equal from that point on (prefix semantics).
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        let mut off = 0;
        for field in &self.fields {
            if a.len() <= off || b.len() <= off {
                return Ordering::Equal;
            }
            let a_field = &a[off..(off + field.len).min(a.len())];
            let b_field = &b[off..(off + field.len).min(b.len())];
            let ord = compare_field(field.data_type, a_field, b_field);
            if ord != Ordering::Equal {
                return ord;
            }
            off += field.len;
        }
        Ordering::Equal
    }
}

fn compare_field(data_type: DataType, a: &[u8], b: &[u8]) -> Ordering {
    match data_type {
        DataType::Char => compare_padded(a, b),
        DataType::Bool => a.cmp(b),
        DataType::Int | DataType::Date => match (decode_i32(a), decode_i32(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.cmp(b),
        },
        DataType::Long => match (decode_i64(a), decode_i64(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.cmp(b),
        },
        DataType::Float => match (decode_f64(a), decode_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(b),
        },
        DataType::Null | DataType::Text => a.cmp(b),
    }
}

/// Bytewise comparison with implicit zero padding to the longer side, so an
/// unpadded Char bound compares equal to its zero-padded stored form.
fn compare_padded(a: &[u8], b: &[u8]) -> Ordering {
    let n = a.len().max(b.len());
    for i in 0..n {
        let av = a.get(i).copied().unwrap_or(0);
        let bv = b.get(i).copied().unwrap_or(0);
        match av.cmp(&bv) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn decode_i32(bytes: &[u8]) -> Option<i32> {
    bytes.get(..4).map(|b| i32::from_le_bytes(b.try_into().unwrap()))
}

fn decode_i64(bytes: &[u8]) -> Option<i64> {
    bytes.get(..8).map(|b| i64::from_le_bytes(b.try_into().unwrap()))
}

fn decode_f64(bytes: &[u8]) -> Option<f64> {
    bytes.get(..8).map(|b| f64::from_le_bytes(b.try_into().unwrap()))
}

/// Encodes a bound value list into a composite key. Values are coerced to
/// their field's kind; Char data is copied at its actual length and the key
/// is truncated after the last value, supporting prefix bounds. An empty
/// value list encodes the unbounded side (empty key).
pub fn encode_bound_key(layout: &KeyLayout, values: &[Value]) -> Result<Vec<u8>> {
    if values.len() > layout.fields().len() {
        return Err(EngineError::InvalidArgument(format!(
            "bound has {} values but the index has {} fields",
            values.len(),
            layout.fields().len()
        ))
        .into());
    }
    let mut buf = vec![0u8; layout.total_len()];
    let mut end = 0;
    let mut offset = 0;
    for (value, field) in values.iter().zip(layout.fields()) {
        if value.is_null() {
            return Err(EngineError::InvalidArgument("null in index bound".into()).into());
        }
        let value = if value.data_type() == field.data_type {
            value.to_owned_static()
        } else {
            value.cast_to(field.data_type)?
        };
        match &value {
            Value::Bool(b) => {
                buf[offset] = *b as u8;
                end = offset + field.len;
            }
            Value::Int(i) => {
                buf[offset..offset + 4].copy_from_slice(&i.to_le_bytes());
                end = offset + field.len;
            }
            Value::Long(l) => {
                buf[offset..offset + 8].copy_from_slice(&l.to_le_bytes());
                end = offset + field.len;
            }
            Value::Float(f) => {
                buf[offset..offset + 8].copy_from_slice(&f.to_le_bytes());
                end = offset + field.len;
            }
            Value::Date(d) => {
                buf[offset..offset + 4].copy_from_slice(&d.to_le_bytes());
                end = offset + field.len;
            }
            Value::Char(s) => {
                let bytes = s.as_bytes();
                if bytes.len() > field.len {
                    return Err(EngineError::InvalidArgument(format!(
                        "bound value of {} bytes exceeds key field of {} bytes",
                        bytes.len(),
                        field.len
                    ))
                    .into());
                }
                buf[offset..offset + bytes.len()].copy_from_slice(bytes);
                end = offset + bytes.len();
            }
            Value::Null | Value::Text(_) => {
                return Err(EngineError::Unsupported("unindexable bound value kind").into());
            }
        }
        offset += field.len;
    }
    buf.truncate(end);
    Ok(buf)
}

/// Range scanner over one index; yields RecordIds in key order.
/// Resources are released when the scanner is dropped.
pub trait IndexScanner {
    fn next_entry(&mut self) -> Result<Option<RecordId>>;
}

/// Opaque index contract consumed by the executor.
pub trait Index {
    fn meta(&self) -> &IndexMeta;
    fn key_layout(&self) -> &KeyLayout;

    /// Opens a range scanner over `[left, right]` honoring each side's
    /// inclusivity flag. An empty key leaves that side unbounded.
    fn create_scanner(
        &self,
        left: &[u8],
        left_inclusive: bool,
        right: &[u8],
        right_inclusive: bool,
    ) -> Result<Box<dyn IndexScanner>>;

    fn insert_entry(&self, key: &[u8], rid: RecordId) -> Result<()>;
    fn delete_entry(&self, key: &[u8], rid: RecordId) -> Result<()>;
}

/// Ordered in-memory index implementation.
pub struct MemIndex {
    meta: IndexMeta,
    layout: KeyLayout,
    field_offsets: Vec<(usize, usize)>,
    entries: RwLock<Vec<(Vec<u8>, RecordId)>>,
}

impl MemIndex {
    pub fn new(meta: IndexMeta, schema: &Schema) -> Result<Self> {
        let field_indices = meta.resolve_fields(schema)?;
        let layout = KeyLayout::from_schema(schema, &field_indices)?;
        let field_offsets = field_indices
            .iter()
            .map(|&idx| (schema.offset(idx), schema.column(idx).unwrap().len()))
            .collect();
        Ok(Self {
            meta,
            layout,
            field_offsets,
            entries: RwLock::new(Vec::new()),
        })
    }

    /// Extracts this index's composite key from raw record bytes (full
    /// zero-padded slots).
    pub fn key_of(&self, record_data: &[u8]) -> Result<Vec<u8>> {
        let mut key = Vec::with_capacity(self.layout.total_len());
        for &(offset, len) in &self.field_offsets {
            if offset + len > record_data.len() {
                return Err(EngineError::Internal(format!(
                    "record of {} bytes too short for key field at {offset}+{len}",
                    record_data.len()
                ))
                .into());
            }
            key.extend_from_slice(&record_data[offset..offset + len]);
        }
        Ok(key)
    }

    fn position_for(&self, entries: &[(Vec<u8>, RecordId)], key: &[u8], rid: RecordId) -> usize {
        entries.partition_point(|(k, r)| {
            match self.layout.compare(k, key) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => *r < rid,
            }
        })
    }
}

impl Index for MemIndex {
    fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    fn key_layout(&self) -> &KeyLayout {
        &self.layout
    }

    fn create_scanner(
        &self,
        left: &[u8],
        left_inclusive: bool,
        right: &[u8],
        right_inclusive: bool,
    ) -> Result<Box<dyn IndexScanner>> {
        let entries = self.entries.read();
        let mut rids = Vec::new();
        for (key, rid) in entries.iter() {
            if !left.is_empty() {
                match self.layout.compare(key, left) {
                    Ordering::Less => continue,
                    Ordering::Equal if !left_inclusive => continue,
                    _ => {}
                }
            }
            if !right.is_empty() {
                match self.layout.compare(key, right) {
                    Ordering::Greater => break,
                    Ordering::Equal if !right_inclusive => continue,
                    _ => {}
                }
            }
            rids.push(*rid);
        }
        Ok(Box::new(MemIndexScanner {
            rids: rids.into_iter(),
        }))
    }

    fn insert_entry(&self, key: &[u8], rid: RecordId) -> Result<()> {
        let mut entries = self.entries.write();
        let pos = self.position_for(&entries, key, rid);
        if self.meta.is_unique() {
            let conflict = entries
                .get(pos)
                .map(|(k, r)| *r != rid && self.layout.compare(k, key) == Ordering::Equal)
                .unwrap_or(false)
                || pos
                    .checked_sub(1)
                    .and_then(|p| entries.get(p))
                    .map(|(k, r)| *r != rid && self.layout.compare(k, key) == Ordering::Equal)
                    .unwrap_or(false);
            if conflict {
                return Err(EngineError::DuplicateKey.into());
            }
        }
        entries.insert(pos, (key.to_vec(), rid));
        Ok(())
    }

    fn delete_entry(&self, key: &[u8], rid: RecordId) -> Result<()> {
        let mut entries = self.entries.write();
        match entries
            .iter()
            .position(|(k, r)| *r == rid && k.as_slice() == key)
        {
            Some(pos) => {
                entries.remove(pos);
                Ok(())
            }
            None => {
                warn!(index = self.meta.name(), %rid, "entry to delete not found");
                Err(EngineError::Internal(format!(
                    "index '{}' has no entry for {rid}",
                    self.meta.name()
                ))
                .into())
            }
        }
    }
}

struct MemIndexScanner {
    rids: std::vec::IntoIter<RecordId>,
}

impl IndexScanner for MemIndexScanner {
    fn next_entry(&mut self) -> Result<Option<RecordId>> {
        Ok(self.rids.next())
    }
}
