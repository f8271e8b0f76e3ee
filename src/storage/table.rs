//! # Table — Record Store Collaborator
//!
//! The table owns one schema, a heap of slotted pages holding record bytes,
//! the out-of-line text area, and the table's secondary indexes. Mutations
//! keep every index in step with the heap: insert adds entries, delete
//! removes them, update swaps old entries for new ones, and a unique-key
//! conflict rolls the half-applied entries back before surfacing
//! DuplicateKey.
//!
//! The heap here is in-memory; a paged, buffered heap behind the same
//! methods is the storage layer's business. Interior locks let one `Table`
//! be shared (`Arc`) across a whole operator tree while mutation operators
//! write through it.

use crate::error::EngineError;
use crate::records::{Record, RecordId, RecordView, RecordWriter, Schema};
use crate::schema::{ColumnDef, IndexMeta};
use crate::storage::index::{Index, MemIndex};
use crate::storage::TextArea;
use crate::types::{DataType, Value};
use eyre::{ensure, Result, WrapErr};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

const SLOTS_PER_PAGE: usize = 64;

#[derive(Default)]
struct Heap {
    pages: Vec<Vec<Option<Vec<u8>>>>,
}

impl Heap {
    fn insert(&mut self, data: Vec<u8>) -> RecordId {
        for (page_no, page) in self.pages.iter_mut().enumerate() {
            if let Some(slot) = page.iter().position(|s| s.is_none()) {
                page[slot] = Some(data);
                return RecordId::new(page_no as u32, slot as u16);
            }
        }
        let mut page = vec![None; SLOTS_PER_PAGE];
        page[0] = Some(data);
        self.pages.push(page);
        RecordId::new(self.pages.len() as u32 - 1, 0)
    }

    fn slot(&self, rid: RecordId) -> Option<&Vec<u8>> {
        self.pages
            .get(rid.page as usize)?
            .get(rid.slot as usize)?
            .as_ref()
    }

    fn slot_mut(&mut self, rid: RecordId) -> Option<&mut Option<Vec<u8>>> {
        self.pages
            .get_mut(rid.page as usize)?
            .get_mut(rid.slot as usize)
    }

    fn rids(&self) -> Vec<RecordId> {
        let mut out = Vec::new();
        for (page_no, page) in self.pages.iter().enumerate() {
            for (slot, data) in page.iter().enumerate() {
                if data.is_some() {
                    out.push(RecordId::new(page_no as u32, slot as u16));
                }
            }
        }
        out
    }
}

pub struct Table {
    name: String,
    schema: Schema,
    heap: RwLock<Heap>,
    text: TextArea,
    indexes: RwLock<Vec<Arc<MemIndex>>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            schema: Schema::new(columns)?,
            heap: RwLock::new(Heap::default()),
            text: TextArea::new(),
            indexes: RwLock::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn record_size(&self) -> usize {
        self.schema.record_size()
    }

    pub fn text_area(&self) -> &TextArea {
        &self.text
    }

    /// Creates a secondary index and backfills it from existing rows.
    pub fn add_index(&self, meta: IndexMeta) -> Result<Arc<MemIndex>> {
        let index = Arc::new(MemIndex::new(meta, &self.schema)?);
        {
            let heap = self.heap.read();
            for rid in heap.rids() {
                let data = heap.slot(rid).unwrap();
                index
                    .insert_entry(&index.key_of(data)?, rid)
                    .wrap_err_with(|| format!("backfilling index '{}'", index.meta().name()))?;
            }
        }
        self.indexes.write().push(index.clone());
        Ok(index)
    }

    pub fn index(&self, name: &str) -> Option<Arc<MemIndex>> {
        self.indexes
            .read()
            .iter()
            .find(|i| i.meta().name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn indexes(&self) -> Vec<Arc<MemIndex>> {
        self.indexes.read().clone()
    }

    /// Builds record bytes from one value per column, coercing each value to
    /// its column's kind. Incompatible kinds fail FieldTypeMismatch.
    pub fn build_record(&self, values: &[Value]) -> Result<Vec<u8>> {
        ensure!(
            values.len() == self.schema.column_count(),
            "row has {} values, table '{}' has {} columns",
            values.len(),
            self.name,
            self.schema.column_count()
        );
        let mut data = vec![0u8; self.schema.record_size()];
        let mut writer = RecordWriter::new(&mut data, &self.schema)?;
        for (col, value) in values.iter().enumerate() {
            let column = self.schema.column(col).unwrap();
            if value.is_null() {
                writer.set_null(col)?;
                continue;
            }
            let coerced = coerce_for_column(value, column)?;
            match column.data_type() {
                DataType::Text => match &coerced {
                    Value::Text(s) | Value::Char(s) => writer.set_text(col, s, &self.text)?,
                    _ => {
                        return Err(EngineError::FieldTypeMismatch(format!(
                            "cannot store {} value in text column '{}'",
                            coerced.data_type(),
                            column.name()
                        ))
                        .into())
                    }
                },
                _ => writer.set_value(col, &coerced)?,
            }
        }
        Ok(data)
    }

    pub fn insert_record(&self, data: Vec<u8>) -> Result<RecordId> {
        ensure!(
            data.len() == self.schema.record_size(),
            "record is {} bytes, table '{}' expects {}",
            data.len(),
            self.name,
            self.schema.record_size()
        );
        let rid = self.heap.write().insert(data.clone());
        if let Err(err) = self.index_all(&data, rid) {
            if let Some(slot) = self.heap.write().slot_mut(rid) {
                slot.take();
            }
            return Err(err);
        }
        debug!(table = %self.name, %rid, "inserted record");
        Ok(rid)
    }

    fn index_all(&self, data: &[u8], rid: RecordId) -> Result<()> {
        let indexes = self.indexes.read().clone();
        let mut applied: Vec<(Arc<MemIndex>, Vec<u8>)> = Vec::new();
        for index in indexes.iter() {
            let key = index.key_of(data)?;
            if let Err(err) = index.insert_entry(&key, rid) {
                for (idx, key) in &applied {
                    let _ = idx.delete_entry(key, rid);
                }
                return Err(err);
            }
            applied.push((index.clone(), key));
        }
        Ok(())
    }

    fn unindex_all(&self, data: &[u8], rid: RecordId) -> Result<()> {
        for index in self.indexes.read().iter() {
            index.delete_entry(&index.key_of(data)?, rid)?;
        }
        Ok(())
    }

    pub fn get_record(&self, rid: RecordId) -> Result<Record> {
        let heap = self.heap.read();
        let data = heap
            .slot(rid)
            .ok_or_else(|| EngineError::Internal(format!("no record at {rid}")))?;
        Ok(Record::new(rid, data.clone()))
    }

    pub fn rids(&self) -> Vec<RecordId> {
        self.heap.read().rids()
    }

    /// Removes the record and its index entries, returning the old bytes.
    pub fn delete_record(&self, rid: RecordId) -> Result<Vec<u8>> {
        let data = {
            let mut heap = self.heap.write();
            heap.slot_mut(rid)
                .and_then(|s| s.take())
                .ok_or_else(|| EngineError::Internal(format!("no record at {rid}")))?
        };
        self.unindex_all(&data, rid)?;
        debug!(table = %self.name, %rid, "deleted record");
        Ok(data)
    }

    /// Replaces the record bytes in place, swapping old index entries for
    /// new ones. A unique-key conflict restores the old entries and fails
    /// DuplicateKey without touching the heap.
    pub fn update_record(&self, rid: RecordId, new_data: &[u8]) -> Result<()> {
        ensure!(
            new_data.len() == self.schema.record_size(),
            "record is {} bytes, table '{}' expects {}",
            new_data.len(),
            self.name,
            self.schema.record_size()
        );
        let old_data = self.get_record(rid)?.into_data();
        self.unindex_all(&old_data, rid)?;
        if let Err(err) = self.index_all(new_data, rid) {
            self.index_all(&old_data, rid)
                .wrap_err("restoring index entries after conflicting update")?;
            return Err(err);
        }
        match self.heap.write().slot_mut(rid) {
            Some(slot) => *slot = Some(new_data.to_vec()),
            None => return Err(EngineError::Internal(format!("no record at {rid}")).into()),
        }
        debug!(table = %self.name, %rid, "updated record in place");
        Ok(())
    }

    /// Puts a previously-deleted record back at its original id; the
    /// compensation path of the delete operator.
    pub fn restore_record(&self, rid: RecordId, data: Vec<u8>) -> Result<()> {
        {
            let mut heap = self.heap.write();
            let slot = heap
                .slot_mut(rid)
                .ok_or_else(|| EngineError::Internal(format!("no slot at {rid}")))?;
            ensure!(slot.is_none(), "slot at {rid} is occupied");
            *slot = Some(data.clone());
        }
        self.index_all(&data, rid)?;
        debug!(table = %self.name, %rid, "restored record");
        Ok(())
    }

    /// Decodes a record into one value per column, materializing text
    /// payloads from the text area.
    pub fn read_row(&self, record: &Record) -> Result<Vec<Value<'static>>> {
        let view = RecordView::new(record.data(), &self.schema)?;
        let mut values = Vec::with_capacity(self.schema.column_count());
        for (col, column) in self.schema.columns().iter().enumerate() {
            if view.is_null(col) {
                values.push(Value::Null);
                continue;
            }
            match column.data_type() {
                DataType::Text => {
                    let text = self.text.read(view.text_locator(col)?)?;
                    values.push(Value::text_from(text));
                }
                _ => values.push(view.value(col)?.to_owned_static()),
            }
        }
        Ok(values)
    }
}

/// Coerces a non-null value to the column's kind; an undefined conversion is
/// a field-type mismatch at this boundary.
pub(crate) fn coerce_for_column(value: &Value, column: &ColumnDef) -> Result<Value<'static>> {
    let target = column.data_type();
    if value.data_type() == target {
        return Ok(value.to_owned_static());
    }
    value.cast_to(target).map_err(|err| {
        if crate::error::is_kind(&err, &EngineError::Unimplemented("")) {
            EngineError::FieldTypeMismatch(format!(
                "cannot store {} value in {} column '{}'",
                value.data_type(),
                target,
                column.name()
            ))
            .into()
        } else {
            err
        }
    })
}
