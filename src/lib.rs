//! # RowDB Execution Core
//!
//! RowDB is the execution core of a row-oriented relational engine: a
//! pull-based physical-operator pipeline that scans, filters, and mutates
//! rows stored in fixed-layout records, coordinating with a transaction
//! collaborator for row visibility and a typed value system for comparison,
//! casting, and aggregation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │   Physical Operators (exec)              │
//! │   scans · filter · join · sort · agg     │
//! │   insert · update · delete + undo log    │
//! ├──────────────────────────────────────────┤
//! │   Typed Values (types) │ Schema (schema) │
//! ├────────────────────────┴─────────────────┤
//! │   Fixed-Layout Records (records)         │
//! ├──────────────────────────────────────────┤
//! │   Storage Collaborators (storage, trx)   │
//! │   record store · index scan · text area  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Execution follows the Volcano model: a plan tree is opened top-down with
//! a transaction handle, `next()` pulls one row at a time bottom-up, and
//! mutation operators at the root drive their child scan to exhaustion,
//! applying one mutation per tuple with an in-memory compensation log for
//! partial-failure rollback.
//!
//! SQL parsing, plan optimization, on-disk paging, the index algorithm, and
//! transaction concurrency control are consumed through interfaces and live
//! outside this crate.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowdb::exec::{ExecContext, Executor, IndexScanExecutor};
//! use rowdb::trx::{ReadWriteMode, VanillaTrx};
//!
//! let ctx = ExecContext::new(Arc::new(VanillaTrx::new()));
//! let mut scan = IndexScanExecutor::new(
//!     table, index, ReadWriteMode::ReadOnly,
//!     &[Value::Int(1)], true,
//!     &[Value::Int(9)], false,
//! )?;
//! scan.open(&ctx)?;
//! while let Some(row) = scan.next()? {
//!     // consume row.values
//! }
//! scan.close()?;
//! ```
//!
//! ## Module Overview
//!
//! - [`types`]: `DataType` and `Value` with per-kind compare/cast/arithmetic
//! - [`schema`]: column and index metadata
//! - [`records`]: fixed-layout records, null bitmap, validated views
//! - [`storage`]: record store, composite-key index contract, text area
//! - [`trx`]: transaction visibility/mutation contract
//! - [`exec`]: the operator tree
//! - [`error`]: the closed failure-kind taxonomy

#[macro_use]
mod macros;

pub mod error;
pub mod exec;
pub mod records;
pub mod schema;
pub mod storage;
pub mod trx;
pub mod types;

pub use error::EngineError;
pub use records::{Record, RecordId};
pub use storage::Table;
pub use types::{DataType, Value};
