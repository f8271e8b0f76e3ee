//! # Data Type Discriminant
//!
//! The canonical `DataType` enum used across schema definitions, record
//! storage, and query evaluation.
//!
//! ## Design Principles
//!
//! 1. **Single source of truth**: one enum used everywhere
//! 2. **Storage-efficient**: `#[repr(u8)]` for single-byte catalog encoding
//! 3. **Metadata-free**: Char length lives in `ColumnDef`, not the enum
//!
//! ## Kinds
//!
//! | Kind | Storage | Fixed Size |
//! |------|---------|------------|
//! | Bool | 1 byte | 1 |
//! | Int | i32 little-endian | 4 |
//! | Long | i64 little-endian | 8 |
//! | Float | f64 little-endian | 8 |
//! | Date | i32 YYYYMMDD | 4 |
//! | Char | fixed-length, zero-padded | declared |
//! | Text | 16-byte out-of-line locator | 16 |
//! | Null | value kind only, no storage | - |

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Size of the (offset, length) locator stored inline for Text columns.
pub const TEXT_LOCATOR_SIZE: usize = 16;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Null = 0,
    Bool = 1,
    Int = 2,
    Long = 3,
    Float = 4,
    Date = 5,
    Char = 6,
    Text = 7,
}

impl DataType {
    /// Returns the inline byte size for this kind. `Char` takes its declared
    /// length from the column definition; `Null` occupies no storage.
    pub fn fixed_size(&self, declared_len: usize) -> Option<usize> {
        match self {
            DataType::Null => None,
            DataType::Bool => Some(1),
            DataType::Int => Some(4),
            DataType::Long => Some(8),
            DataType::Float => Some(8),
            DataType::Date => Some(4),
            DataType::Char => Some(declared_len),
            DataType::Text => Some(TEXT_LOCATOR_SIZE),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Long | DataType::Float)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DataType::Char | DataType::Text)
    }

    /// Ranks implicit-cast preference when a comparison must choose among
    /// candidate casts; lower is preferred. Char to Float is the one
    /// deliberately penalized conversion.
    pub fn cast_cost(&self, target: DataType) -> i32 {
        match (self, target) {
            (DataType::Char, DataType::Float) => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Null => "null",
            DataType::Bool => "boolean",
            DataType::Int => "int",
            DataType::Long => "bigint",
            DataType::Float => "float",
            DataType::Date => "date",
            DataType::Char => "char",
            DataType::Text => "text",
        };
        f.write_str(name)
    }
}

impl TryFrom<u8> for DataType {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DataType::Null),
            1 => Ok(DataType::Bool),
            2 => Ok(DataType::Int),
            3 => Ok(DataType::Long),
            4 => Ok(DataType::Float),
            5 => Ok(DataType::Date),
            6 => Ok(DataType::Char),
            7 => Ok(DataType::Text),
            other => Err(EngineError::Internal(format!(
                "invalid DataType discriminant: {other}"
            ))),
        }
    }
}
