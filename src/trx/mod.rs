//! # Transaction Contract
//!
//! The execution core consumes transactions through the `Trx` trait: a
//! visibility check per candidate row and the three mutation entry points.
//! Concurrency-control internals (locking, snapshots, version chains) live
//! behind this trait in the transaction layer proper.
//!
//! One transaction handle is shared read-only by a whole operator subtree
//! during a statement (`Arc<dyn Trx>`); only mutation operators call the
//! state-changing methods, one in-flight mutation per row.
//!
//! `visit_record` answers "may this row version be observed/mutated by the
//! current transaction under this intent?". An invisible row is reported as
//! the `RecordInvisible` kind, which scan operators treat as "skip and
//! continue"; every other error aborts the scan.

use crate::records::{Record, RecordId};
use crate::storage::Table;
use eyre::Result;
use tracing::trace;

/// Intent a scan declares when visiting rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadWriteMode {
    ReadOnly,
    ReadWrite,
}

pub trait Trx {
    /// Visibility check for one candidate row under the given intent.
    /// `Err(RecordInvisible)` means skip; other errors abort.
    fn visit_record(&self, table: &Table, record: &Record, mode: ReadWriteMode) -> Result<()>;

    fn insert_record(&self, table: &Table, data: Vec<u8>) -> Result<RecordId>;

    fn delete_record(&self, table: &Table, record: &Record) -> Result<()>;

    /// Applies a full new row image in place of the given record.
    fn update_record(&self, table: &Table, record: &Record, new_data: &[u8]) -> Result<()>;
}

/// Pass-through transaction: every committed row is visible and mutations
/// apply directly to the table. The autocommit collaborator used by tests
/// and demos; a real MVCC transaction implements the same trait behind the
/// transaction layer.
#[derive(Debug, Default)]
pub struct VanillaTrx;

impl VanillaTrx {
    pub fn new() -> Self {
        Self
    }
}

impl Trx for VanillaTrx {
    fn visit_record(&self, _table: &Table, record: &Record, mode: ReadWriteMode) -> Result<()> {
        trace!(rid = %record.rid(), ?mode, "visit record");
        Ok(())
    }

    fn insert_record(&self, table: &Table, data: Vec<u8>) -> Result<RecordId> {
        table.insert_record(data)
    }

    fn delete_record(&self, table: &Table, record: &Record) -> Result<()> {
        table.delete_record(record.rid()).map(|_| ())
    }

    fn update_record(&self, table: &Table, record: &Record, new_data: &[u8]) -> Result<()> {
        table.update_record(record.rid(), new_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDef;
    use crate::types::{DataType, Value};

    #[test]
    fn vanilla_trx_applies_directly() {
        let table = Table::new("t", vec![ColumnDef::new("id", DataType::Int)]).unwrap();
        let trx = VanillaTrx::new();
        let rid = trx
            .insert_record(&table, table.build_record(&[Value::Int(1)]).unwrap())
            .unwrap();
        let record = table.get_record(rid).unwrap();
        assert!(trx
            .visit_record(&table, &record, ReadWriteMode::ReadOnly)
            .is_ok());
        trx.delete_record(&table, &record).unwrap();
        assert!(table.get_record(rid).is_err());
    }
}
