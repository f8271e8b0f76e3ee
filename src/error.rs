//! # Error Taxonomy
//!
//! This module defines `EngineError`, the closed set of failure kinds the
//! execution core reports. General fallible functions return `eyre::Result`;
//! conditions the control flow must branch on (visibility skips, no-op
//! mutations, schema shape errors) are raised as `EngineError` values so
//! callers can recover them with `Report::downcast_ref`.
//!
//! ## Kinds
//!
//! | Kind | Meaning | Caller reaction |
//! |------|---------|-----------------|
//! | RecordInvisible | row exists but is hidden from this transaction | skip, continue scanning |
//! | InvalidArgument | malformed cast input, oversize value write | surface |
//! | FieldTypeMismatch | value shape incompatible with column kind | surface |
//! | FieldNotExist | named column absent from the schema | surface |
//! | FieldMissing | index/assignment references a dropped column | surface |
//! | DuplicateKey | unique-index violation | surface |
//! | NoopUpdate | computed row image is byte-identical to the old row | statement-level no-op |
//! | Unimplemented | cast/operation deliberately not provided | surface |
//! | Unsupported | arithmetic on a non-numeric kind | surface |
//! | Internal | collaborator contract violated | surface |
//!
//! End-of-stream is intentionally absent: iterator-protocol methods return
//! `Result<Option<_>>` and exhaustion is `Ok(None)`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("record not visible to current transaction")]
    RecordInvisible,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("field type mismatch: {0}")]
    FieldTypeMismatch(String),

    #[error("no such field: {0}")]
    FieldNotExist(String),

    #[error("field missing: {0}")]
    FieldMissing(String),

    #[error("duplicate key")]
    DuplicateKey,

    #[error("update produced no change, skipped")]
    NoopUpdate,

    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Returns the typed kind carried by a report, if any.
pub fn engine_error(report: &eyre::Report) -> Option<&EngineError> {
    report.downcast_ref::<EngineError>()
}

/// Returns true if the report is the given kind, ignoring payload.
pub fn is_kind(report: &eyre::Report, kind: &EngineError) -> bool {
    engine_error(report)
        .map(|e| std::mem::discriminant(e) == std::mem::discriminant(kind))
        .unwrap_or(false)
}
