//! Index scan behavior: composite bounds, residual predicates, visibility
//! skips, and the operator state machine.

use rowdb::error::{engine_error, EngineError};
use rowdb::exec::{CompOp, ExecContext, Executor, Expr, IndexScanExecutor, TableScanExecutor};
use rowdb::records::{Record, RecordId};
use rowdb::schema::{ColumnDef, IndexMeta};
use rowdb::storage::Table;
use rowdb::trx::{ReadWriteMode, Trx, VanillaTrx};
use rowdb::types::{DataType, Value};
use std::collections::HashSet;
use std::sync::Arc;

fn users_table() -> Arc<Table> {
    let table = Table::new(
        "users",
        vec![
            ColumnDef::new("id", DataType::Int).not_null(),
            ColumnDef::chars("name", 10),
            ColumnDef::new("score", DataType::Float),
        ],
    )
    .unwrap();
    table
        .add_index(IndexMeta::new("users_pkey", vec!["id"], true))
        .unwrap();
    let table = Arc::new(table);
    for (id, name, score) in [
        (1, "alice", 3.0),
        (2, "bob", 7.5),
        (3, "carol", 1.0),
        (4, "dave", 9.0),
        (5, "erin", 5.5),
    ] {
        table
            .insert_record(
                table
                    .build_record(&[
                        Value::Int(id),
                        Value::char_from(name),
                        Value::Float(score),
                    ])
                    .unwrap(),
            )
            .unwrap();
    }
    table
}

fn scan_ids(scan: &mut IndexScanExecutor, ctx: &ExecContext) -> Vec<i32> {
    scan.open(ctx).unwrap();
    let mut ids = Vec::new();
    while let Some(row) = scan.next().unwrap() {
        match row.values[0] {
            Value::Int(id) => ids.push(id),
            ref other => panic!("unexpected id value {other:?}"),
        }
    }
    scan.close().unwrap();
    ids
}

fn ctx() -> ExecContext {
    ExecContext::new(Arc::new(VanillaTrx::new()))
}

#[test]
fn range_scan_honors_each_sides_inclusivity() {
    let table = users_table();
    let index = table.index("users_pkey").unwrap();
    let cases: [(bool, bool, &[i32]); 4] = [
        (true, true, &[2, 3, 4]),
        (false, true, &[3, 4]),
        (true, false, &[2, 3]),
        (false, false, &[3]),
    ];
    for (left_inclusive, right_inclusive, expected) in cases {
        let mut scan = IndexScanExecutor::new(
            table.clone(),
            index.clone(),
            ReadWriteMode::ReadOnly,
            &[Value::Int(2)],
            left_inclusive,
            &[Value::Int(4)],
            right_inclusive,
        )
        .unwrap();
        assert_eq!(
            scan_ids(&mut scan, &ctx()),
            expected,
            "bounds [2,4] incl=({left_inclusive},{right_inclusive})"
        );
    }
}

#[test]
fn unbounded_sides_scan_to_the_edges() {
    let table = users_table();
    let index = table.index("users_pkey").unwrap();
    let mut scan = IndexScanExecutor::new(
        table.clone(),
        index.clone(),
        ReadWriteMode::ReadOnly,
        &[],
        true,
        &[Value::Int(2)],
        true,
    )
    .unwrap();
    assert_eq!(scan_ids(&mut scan, &ctx()), vec![1, 2]);

    let mut scan = IndexScanExecutor::new(
        table.clone(),
        index,
        ReadWriteMode::ReadOnly,
        &[Value::Int(4)],
        true,
        &[],
        true,
    )
    .unwrap();
    assert_eq!(scan_ids(&mut scan, &ctx()), vec![4, 5]);
}

#[test]
fn rows_come_back_in_key_order() {
    let table = users_table();
    let index = table.index("users_pkey").unwrap();
    let mut scan = IndexScanExecutor::new(
        table,
        index,
        ReadWriteMode::ReadOnly,
        &[],
        true,
        &[],
        true,
    )
    .unwrap();
    assert_eq!(scan_ids(&mut scan, &ctx()), vec![1, 2, 3, 4, 5]);
}

#[test]
fn residual_predicates_are_a_conjunction() {
    let table = users_table();
    let index = table.index("users_pkey").unwrap();
    let mut scan = IndexScanExecutor::new(
        table,
        index,
        ReadWriteMode::ReadOnly,
        &[],
        true,
        &[],
        true,
    )
    .unwrap();
    scan.set_predicates(vec![
        Expr::cmp(CompOp::Gt, Expr::col(2), Expr::lit(Value::Float(2.0))),
        Expr::cmp(CompOp::Lt, Expr::col(0), Expr::lit(Value::Int(5))),
    ]);
    assert_eq!(scan_ids(&mut scan, &ctx()), vec![1, 2, 4]);
}

#[test]
fn false_predicate_short_circuits_later_ones() {
    let table = users_table();
    let index = table.index("users_pkey").unwrap();
    let mut scan = IndexScanExecutor::new(
        table,
        index,
        ReadWriteMode::ReadOnly,
        &[],
        true,
        &[],
        true,
    )
    .unwrap();
    // the second predicate errors if evaluated (column out of range); it
    // must never run because the first one is always false
    scan.set_predicates(vec![
        Expr::eq(Expr::col(0), Expr::lit(Value::Int(-1))),
        Expr::eq(Expr::col(99), Expr::lit(Value::Int(1))),
    ]);
    assert_eq!(scan_ids(&mut scan, &ctx()), Vec::<i32>::new());
}

#[test]
fn failing_predicate_aborts_the_scan() {
    let table = users_table();
    let index = table.index("users_pkey").unwrap();
    let mut scan = IndexScanExecutor::new(
        table,
        index,
        ReadWriteMode::ReadOnly,
        &[],
        true,
        &[],
        true,
    )
    .unwrap();
    scan.set_predicates(vec![Expr::eq(Expr::col(99), Expr::lit(Value::Int(1)))]);
    scan.open(&ctx()).unwrap();
    assert!(scan.next().is_err());
    scan.close().unwrap();
}

/// Visibility stub hiding a fixed set of rows.
struct PartialVisibilityTrx {
    hidden: HashSet<RecordId>,
    inner: VanillaTrx,
}

impl Trx for PartialVisibilityTrx {
    fn visit_record(&self, table: &Table, record: &Record, mode: ReadWriteMode) -> eyre::Result<()> {
        if self.hidden.contains(&record.rid()) {
            return Err(EngineError::RecordInvisible.into());
        }
        self.inner.visit_record(table, record, mode)
    }

    fn insert_record(&self, table: &Table, data: Vec<u8>) -> eyre::Result<RecordId> {
        self.inner.insert_record(table, data)
    }

    fn delete_record(&self, table: &Table, record: &Record) -> eyre::Result<()> {
        self.inner.delete_record(table, record)
    }

    fn update_record(&self, table: &Table, record: &Record, new_data: &[u8]) -> eyre::Result<()> {
        self.inner.update_record(table, record, new_data)
    }
}

#[test]
fn invisible_rows_are_skipped_not_fatal() {
    let table = users_table();
    let index = table.index("users_pkey").unwrap();

    // hide ids 2 and 4
    let mut hidden = HashSet::new();
    for rid in table.rids() {
        let row = table.read_row(&table.get_record(rid).unwrap()).unwrap();
        if matches!(row[0], Value::Int(2) | Value::Int(4)) {
            hidden.insert(rid);
        }
    }
    let ctx = ExecContext::new(Arc::new(PartialVisibilityTrx {
        hidden,
        inner: VanillaTrx::new(),
    }));

    let mut scan = IndexScanExecutor::new(
        table,
        index,
        ReadWriteMode::ReadOnly,
        &[],
        true,
        &[],
        true,
    )
    .unwrap();
    assert_eq!(scan_ids(&mut scan, &ctx), vec![1, 3, 5]);
}

#[test]
fn param_names_index_and_table() {
    let table = users_table();
    let index = table.index("users_pkey").unwrap();
    let scan = IndexScanExecutor::new(
        table,
        index,
        ReadWriteMode::ReadOnly,
        &[],
        true,
        &[],
        true,
    )
    .unwrap();
    assert_eq!(scan.param(), "users_pkey ON users");
}

#[test]
fn operator_state_machine_is_enforced() {
    let table = users_table();
    let mut scan = TableScanExecutor::new(table, ReadWriteMode::ReadOnly);
    let ctx = ctx();

    // next before open is a contract violation
    assert!(scan.next().is_err());

    scan.open(&ctx).unwrap();
    let err = scan.open(&ctx).unwrap_err();
    assert!(matches!(engine_error(&err), Some(EngineError::Internal(_))));

    while scan.next().unwrap().is_some() {}
    // exhaustion is sticky, not an error
    assert!(scan.next().unwrap().is_none());
    assert!(scan.next().unwrap().is_none());

    scan.close().unwrap();
    scan.close().unwrap();
}

#[test]
fn char_prefix_bounds_match_padded_rows() {
    let table = Table::new(
        "tags",
        vec![ColumnDef::new("id", DataType::Int), ColumnDef::chars("tag", 8)],
    )
    .unwrap();
    table
        .add_index(IndexMeta::new("idx_tag", vec!["tag"], false))
        .unwrap();
    let table = Arc::new(table);
    for (id, tag) in [(1, "net"), (2, "network"), (3, "disk")] {
        table
            .insert_record(
                table
                    .build_record(&[Value::Int(id), Value::char_from(tag)])
                    .unwrap(),
            )
            .unwrap();
    }
    let index = table.index("idx_tag").unwrap();
    // equality bound on the short value matches only the exact row, not
    // rows it prefixes
    let mut scan = IndexScanExecutor::new(
        table,
        index,
        ReadWriteMode::ReadOnly,
        &[Value::char_from("net")],
        true,
        &[Value::char_from("net")],
        true,
    )
    .unwrap();
    assert_eq!(scan_ids(&mut scan, &ctx()), vec![1]);
}
