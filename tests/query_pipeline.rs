//! Composed operator trees: filter, projection, sort, join, and
//! aggregation over in-memory tables.

use rowdb::exec::{
    AggregateExecutor, AggregateKind, AggregateSpec, CompOp, ExecContext, Executor, Expr,
    NestedLoopJoinExecutor, PredicateExecutor, ProjectExecutor, Row, SortExecutor, SortKey,
    TableScanExecutor,
};
use rowdb::schema::ColumnDef;
use rowdb::storage::Table;
use rowdb::trx::{ReadWriteMode, VanillaTrx};
use rowdb::types::{DataType, Value};
use std::sync::Arc;

fn ctx() -> ExecContext {
    ExecContext::new(Arc::new(VanillaTrx::new()))
}

fn collect(mut exec: Box<dyn Executor>) -> Vec<Row> {
    let ctx = ctx();
    exec.open(&ctx).unwrap();
    let mut rows = Vec::new();
    while let Some(row) = exec.next().unwrap() {
        rows.push(row);
    }
    exec.close().unwrap();
    rows
}

fn orders_table() -> Arc<Table> {
    let table = Arc::new(
        Table::new(
            "orders",
            vec![
                ColumnDef::new("id", DataType::Int).not_null(),
                ColumnDef::new("customer", DataType::Int),
                ColumnDef::new("amount", DataType::Float),
            ],
        )
        .unwrap(),
    );
    for (id, customer, amount) in [
        (1, 10, 25.0),
        (2, 20, 10.0),
        (3, 10, 75.0),
        (4, 30, 5.0),
        (5, 20, 40.0),
    ] {
        table
            .insert_record(
                table
                    .build_record(&[
                        Value::Int(id),
                        Value::Int(customer),
                        Value::Float(amount),
                    ])
                    .unwrap(),
            )
            .unwrap();
    }
    table
}

fn scan(table: &Arc<Table>) -> Box<dyn Executor> {
    Box::new(TableScanExecutor::new(table.clone(), ReadWriteMode::ReadOnly))
}

#[test]
fn filter_then_project() {
    let table = orders_table();
    let filter = PredicateExecutor::new(
        scan(&table),
        vec![Expr::cmp(
            CompOp::Ge,
            Expr::col(2),
            Expr::lit(Value::Float(25.0)),
        )],
    );
    let project = ProjectExecutor::new(Box::new(filter), vec![0]);
    let rows = collect(Box::new(project));
    let ids: Vec<_> = rows.iter().map(|r| r.values[0].clone()).collect();
    assert_eq!(ids, vec![Value::Int(1), Value::Int(3), Value::Int(5)]);
}

#[test]
fn sort_orders_rows_descending() {
    let table = orders_table();
    let sort = SortExecutor::new(scan(&table), vec![SortKey::desc(2)]);
    let rows = collect(Box::new(sort));
    let amounts: Vec<f64> = rows
        .iter()
        .map(|r| match r.values[2] {
            Value::Float(f) => f,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(amounts, vec![75.0, 40.0, 25.0, 10.0, 5.0]);
}

#[test]
fn sort_puts_nulls_first() {
    let table = Arc::new(
        Table::new("t", vec![ColumnDef::new("v", DataType::Int)]).unwrap(),
    );
    for v in [Value::Int(2), Value::Null, Value::Int(1)] {
        table
            .insert_record(table.build_record(&[v]).unwrap())
            .unwrap();
    }
    let sort = SortExecutor::new(scan(&table), vec![SortKey::asc(0)]);
    let rows = collect(Box::new(sort));
    assert_eq!(rows[0].values[0], Value::Null);
    assert_eq!(rows[1].values[0], Value::Int(1));
    assert_eq!(rows[2].values[0], Value::Int(2));
}

#[test]
fn join_matches_on_condition() {
    let orders = orders_table();
    let customers = Arc::new(
        Table::new(
            "customers",
            vec![
                ColumnDef::new("id", DataType::Int),
                ColumnDef::chars("name", 8),
            ],
        )
        .unwrap(),
    );
    for (id, name) in [(10, "acme"), (20, "globex")] {
        customers
            .insert_record(
                customers
                    .build_record(&[Value::Int(id), Value::char_from(name)])
                    .unwrap(),
            )
            .unwrap();
    }

    // orders.customer (col 1) = customers.id (col 3 after combine)
    let join = NestedLoopJoinExecutor::new(
        scan(&orders),
        scan(&customers),
        Some(Expr::eq(Expr::col(1), Expr::col(3))),
    );
    let rows = collect(Box::new(join));
    assert_eq!(rows.len(), 4);
    for row in &rows {
        assert_eq!(row.values[1], row.values[3]);
        assert_eq!(row.column_count(), 5);
    }
}

#[test]
fn global_aggregates_over_all_rows() {
    let table = orders_table();
    let agg = AggregateExecutor::new(
        scan(&table),
        vec![],
        vec![
            AggregateSpec::new(AggregateKind::Count, 0),
            AggregateSpec::new(AggregateKind::Sum, 2),
            AggregateSpec::new(AggregateKind::Min, 2),
            AggregateSpec::new(AggregateKind::Max, 2),
        ],
    );
    let rows = collect(Box::new(agg));
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].values,
        vec![
            Value::Int(5),
            Value::Float(155.0),
            Value::Float(5.0),
            Value::Float(75.0)
        ]
    );
}

#[test]
fn average_of_integers_is_float() {
    let table = Arc::new(
        Table::new("nums", vec![ColumnDef::new("v", DataType::Int)]).unwrap(),
    );
    for v in [2, 4, 6] {
        table
            .insert_record(table.build_record(&[Value::Int(v)]).unwrap())
            .unwrap();
    }
    let agg = AggregateExecutor::new(
        scan(&table),
        vec![],
        vec![AggregateSpec::new(AggregateKind::Avg, 0)],
    );
    let rows = collect(Box::new(agg));
    assert_eq!(rows[0].values, vec![Value::Float(4.0)]);
}

#[test]
fn count_includes_null_inputs() {
    // aggregation does not filter nulls; a null row still counts
    let table = Arc::new(
        Table::new("nums", vec![ColumnDef::new("v", DataType::Int)]).unwrap(),
    );
    for v in [Value::Int(2), Value::Int(4), Value::Null] {
        table
            .insert_record(table.build_record(&[v]).unwrap())
            .unwrap();
    }
    let agg = AggregateExecutor::new(
        scan(&table),
        vec![],
        vec![AggregateSpec::new(AggregateKind::Count, 0)],
    );
    let rows = collect(Box::new(agg));
    assert_eq!(rows[0].values, vec![Value::Int(3)]);
}

#[test]
fn grouped_aggregates_emit_one_row_per_group() {
    let table = orders_table();
    let agg = AggregateExecutor::new(
        scan(&table),
        vec![1],
        vec![
            AggregateSpec::new(AggregateKind::Count, 0),
            AggregateSpec::new(AggregateKind::Sum, 2),
        ],
    );
    let sort = SortExecutor::new(Box::new(agg), vec![SortKey::asc(0)]);
    let rows = collect(Box::new(sort));
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0].values,
        vec![Value::Int(10), Value::Int(2), Value::Float(100.0)]
    );
    assert_eq!(
        rows[1].values,
        vec![Value::Int(20), Value::Int(2), Value::Float(50.0)]
    );
    assert_eq!(
        rows[2].values,
        vec![Value::Int(30), Value::Int(1), Value::Float(5.0)]
    );
}

#[test]
fn count_star_of_empty_table_is_zero() {
    let table = Arc::new(
        Table::new("empty", vec![ColumnDef::new("v", DataType::Int)]).unwrap(),
    );
    let agg = AggregateExecutor::new(
        scan(&table),
        vec![],
        vec![AggregateSpec::new(AggregateKind::Count, 0)],
    );
    let rows = collect(Box::new(agg));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values, vec![Value::Int(0)]);
}

#[test]
fn text_columns_flow_through_the_pipeline() {
    let table = Arc::new(
        Table::new(
            "posts",
            vec![
                ColumnDef::new("id", DataType::Int),
                ColumnDef::new("body", DataType::Text),
            ],
        )
        .unwrap(),
    );
    let long_body = "an out-of-line payload well past any inline char slot";
    for (id, body) in [(1, "short"), (2, long_body)] {
        table
            .insert_record(
                table
                    .build_record(&[Value::Int(id), Value::text_from(body)])
                    .unwrap(),
            )
            .unwrap();
    }
    let filter = PredicateExecutor::new(
        scan(&table),
        vec![Expr::eq(Expr::col(0), Expr::lit(Value::Int(2)))],
    );
    let rows = collect(Box::new(filter));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values[1], Value::text_from(long_body));
}
