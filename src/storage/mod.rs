//! # Storage Collaborators
//!
//! The execution core treats storage as a set of contracts: a record store
//! keyed by `RecordId`, an opaque composite-key index exposing a bounded
//! range scanner, and an append-only out-of-line text area. This module
//! defines those contracts plus the in-memory implementations the crate
//! ships with (`Table`, `MemIndex`, `TextArea`).
//!
//! On-disk paging, buffer management, and the B-tree algorithm itself live
//! behind these interfaces and are not part of this crate.

mod index;
mod table;
mod text;

pub use index::{encode_bound_key, Index, IndexScanner, KeyField, KeyLayout, MemIndex};
pub(crate) use table::coerce_for_column;
pub use table::Table;
pub use text::{TextArea, TextRef};
