//! # Out-of-Line Text Storage
//!
//! Text column payloads live outside the fixed row in an append-only byte
//! area; the row itself stores a 16-byte `TextRef` locator (offset, length).
//! `TextRef` is a zerocopy little-endian struct so the locator is written
//! and read as one validated unit instead of ad hoc byte copies.

use eyre::{ensure, Result};
use parking_lot::Mutex;
use zerocopy::little_endian::U64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Encoded size of a locator inside the fixed row region; the same width
/// the schema reserves for a Text column slot.
pub const TEXT_REF_SIZE: usize = crate::types::TEXT_LOCATOR_SIZE;

/// Locator of one text payload within the table's text area.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct TextRef {
    offset: U64,
    len: U64,
}

impl TextRef {
    pub fn new(offset: u64, len: u64) -> Self {
        Self {
            offset: U64::new(offset),
            len: U64::new(len),
        }
    }

    zerocopy_accessors! {
        offset: u64,
        len: u64,
    }

    /// Decodes a locator from the first 16 bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() >= TEXT_REF_SIZE,
            "text locator needs {} bytes, got {}",
            TEXT_REF_SIZE,
            bytes.len()
        );
        TextRef::read_from_bytes(&bytes[..TEXT_REF_SIZE])
            .map_err(|_| eyre::eyre!("malformed text locator"))
    }

    /// Encodes this locator into the first 16 bytes of `out`.
    pub fn encode(&self, out: &mut [u8]) -> Result<()> {
        ensure!(
            out.len() >= TEXT_REF_SIZE,
            "text locator needs {} bytes, got {}",
            TEXT_REF_SIZE,
            out.len()
        );
        out[..TEXT_REF_SIZE].copy_from_slice(self.as_bytes());
        Ok(())
    }
}

/// Append-only text payload store for one table.
#[derive(Debug, Default)]
pub struct TextArea {
    buf: Mutex<Vec<u8>>,
}

impl TextArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a payload and returns its locator. Existing payloads are
    /// never moved or reclaimed here; compaction belongs to the storage
    /// layer behind this interface.
    pub fn append(&self, payload: &[u8]) -> TextRef {
        let mut buf = self.buf.lock();
        let offset = buf.len() as u64;
        buf.extend_from_slice(payload);
        TextRef::new(offset, payload.len() as u64)
    }

    pub fn read(&self, locator: TextRef) -> Result<String> {
        let buf = self.buf.lock();
        let start = locator.offset() as usize;
        let end = start + locator.len() as usize;
        ensure!(
            end <= buf.len(),
            "text locator ({}, {}) out of bounds (area is {} bytes)",
            locator.offset(),
            locator.len(),
            buf.len()
        );
        String::from_utf8(buf[start..end].to_vec())
            .map_err(|e| eyre::eyre!("text payload is not valid UTF-8: {e}"))
    }

    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_is_exactly_16_bytes() {
        assert_eq!(std::mem::size_of::<TextRef>(), TEXT_REF_SIZE);
    }

    #[test]
    fn locator_encode_decode_roundtrip() {
        let r = TextRef::new(1234, 56);
        let mut buf = [0u8; TEXT_REF_SIZE];
        r.encode(&mut buf).unwrap();
        let back = TextRef::decode(&buf).unwrap();
        assert_eq!(back, r);
        assert_eq!(back.offset(), 1234);
        assert_eq!(back.len(), 56);
    }

    #[test]
    fn append_then_read_roundtrips() {
        let area = TextArea::new();
        let a = area.append(b"hello");
        let b = area.append(b"world, longer payload");
        assert_eq!(area.read(a).unwrap(), "hello");
        assert_eq!(area.read(b).unwrap(), "world, longer payload");
    }

    #[test]
    fn out_of_bounds_locator_is_rejected() {
        let area = TextArea::new();
        area.append(b"tiny");
        assert!(area.read(TextRef::new(2, 100)).is_err());
    }
}
