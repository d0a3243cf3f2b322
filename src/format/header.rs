//! The fixed 32-byte signature header at the start of a 7z archive.

use crate::sink::{FieldValue, StructureSink};
use crate::{Error, Result};

use super::{SIGNATURE, SIGNATURE_HEADER_SIZE};

/// The signature header of a 7z archive.
///
/// This is the fixed-size prologue occupying bytes `[0, 32)` of the file.
/// It locates the "next header" (the property tree describing the archive
/// contents) relative to byte 32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Archive format version - major number.
    pub version_major: u8,
    /// Archive format version - minor number.
    pub version_minor: u8,
    /// CRC of the following 20 bytes (offset, size, crc). Stored as
    /// declared; agreement is reported as a diagnostic, never enforced.
    pub start_header_crc: u32,
    /// Offset from the end of the signature header to the next header.
    pub next_header_offset: u64,
    /// Size of the next header (compressed if encoded).
    pub next_header_size: u64,
    /// CRC of the next header data, as declared.
    pub next_header_crc: u32,
}

impl SignatureHeader {
    /// Parses the signature header from the first bytes of the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if fewer than 32 bytes are
    /// available or the magic bytes do not match. These are the only
    /// fatal conditions in the whole decoder: without a signature header
    /// there is nothing to report.
    pub fn parse(prologue: &[u8]) -> Result<Self> {
        if prologue.len() < SIGNATURE_HEADER_SIZE as usize {
            return Err(Error::InvalidFormat(format!(
                "file too small for a signature header: {} bytes, need 32",
                prologue.len()
            )));
        }
        if prologue[..6] != SIGNATURE[..] {
            return Err(Error::InvalidFormat("invalid 7z signature".into()));
        }

        let version_major = prologue[6];
        let version_minor = prologue[7];
        let start_header_crc = u32::from_le_bytes(prologue[8..12].try_into().unwrap());
        let next_header_offset = u64::from_le_bytes(prologue[12..20].try_into().unwrap());
        let next_header_size = u64::from_le_bytes(prologue[20..28].try_into().unwrap());
        let next_header_crc = u32::from_le_bytes(prologue[28..32].try_into().unwrap());

        Ok(Self {
            version_major,
            version_minor,
            start_header_crc,
            next_header_offset,
            next_header_size,
            next_header_crc,
        })
    }

    /// Returns the absolute byte position where the next header starts.
    ///
    /// Saturates rather than wrapping for hostile offsets near `u64::MAX`.
    pub fn next_header_position(&self) -> u64 {
        SIGNATURE_HEADER_SIZE.saturating_add(self.next_header_offset)
    }

    /// Registers the signature header fields with the annotation sink.
    pub fn describe(&self, sink: &mut dyn StructureSink) {
        sink.begin_node("SignatureHeader", 0);
        sink.field(
            "Signature",
            0..6,
            FieldValue::Bytes(SIGNATURE.to_vec()),
            "7z signature",
        );
        sink.field(
            "Version",
            6..8,
            FieldValue::Unsigned(u64::from(self.version_major) << 8 | u64::from(self.version_minor)),
            &format!("{}.{}", self.version_major, self.version_minor),
        );
        sink.field(
            "StartHeaderCRC",
            8..12,
            FieldValue::Unsigned(self.start_header_crc.into()),
            &format!("{:#010x}", self.start_header_crc),
        );
        sink.field(
            "NextHeaderOffset",
            12..20,
            FieldValue::Unsigned(self.next_header_offset),
            &format!("{} (absolute {})", self.next_header_offset, self.next_header_position()),
        );
        sink.field(
            "NextHeaderSize",
            20..28,
            FieldValue::Unsigned(self.next_header_size),
            &self.next_header_size.to_string(),
        );
        sink.field(
            "NextHeaderCRC",
            28..32,
            FieldValue::Unsigned(self.next_header_crc.into()),
            &format!("{:#010x}", self.next_header_crc),
        );
        sink.end_node(SIGNATURE_HEADER_SIZE);
    }
}
