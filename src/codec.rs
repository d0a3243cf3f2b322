//! Method IDs and display names for 7z coders.
//!
//! Only the mapping from raw id bytes to a human-readable name lives
//! here; no codec is ever instantiated. An id outside the known table
//! renders as `Codec_<hex>` so a new method never fails a decode.

use std::borrow::Cow;

/// Method IDs for compression, filter and encryption algorithms.
pub mod method {
    /// Copy (no compression).
    pub const COPY: &[u8] = &[0x00];
    /// LZMA compression.
    pub const LZMA: &[u8] = &[0x03, 0x01, 0x01];
    /// LZMA2 compression.
    pub const LZMA2: &[u8] = &[0x21];
    /// Deflate compression.
    pub const DEFLATE: &[u8] = &[0x04, 0x01, 0x08];
    /// Deflate64 compression.
    pub const DEFLATE64: &[u8] = &[0x04, 0x01, 0x09];
    /// BZip2 compression.
    pub const BZIP2: &[u8] = &[0x04, 0x02, 0x02];
    /// PPMd compression.
    pub const PPMD: &[u8] = &[0x03, 0x04, 0x01];
    /// LZ4 compression.
    pub const LZ4: &[u8] = &[0x04, 0xF7, 0x11, 0x04];
    /// ZSTD compression.
    pub const ZSTD: &[u8] = &[0x04, 0xF7, 0x11, 0x01];
    /// Brotli compression.
    pub const BROTLI: &[u8] = &[0x04, 0xF7, 0x11, 0x02];
    /// BCJ (x86) filter.
    pub const BCJ_X86: &[u8] = &[0x03, 0x03, 0x01, 0x03];
    /// BCJ (ARM) filter.
    pub const BCJ_ARM: &[u8] = &[0x03, 0x03, 0x05, 0x01];
    /// BCJ (ARM64/AArch64) filter.
    pub const BCJ_ARM64: &[u8] = &[0x0A];
    /// BCJ (ARM Thumb) filter.
    pub const BCJ_ARM_THUMB: &[u8] = &[0x03, 0x03, 0x07, 0x01];
    /// BCJ (PowerPC) filter.
    pub const BCJ_PPC: &[u8] = &[0x03, 0x03, 0x02, 0x05];
    /// BCJ (SPARC) filter.
    pub const BCJ_SPARC: &[u8] = &[0x03, 0x03, 0x08, 0x05];
    /// BCJ (IA64) filter.
    pub const BCJ_IA64: &[u8] = &[0x03, 0x03, 0x04, 0x01];
    /// BCJ (RISC-V) filter.
    pub const BCJ_RISCV: &[u8] = &[0x0B];
    /// BCJ2 (4-stream x86) filter.
    pub const BCJ2: &[u8] = &[0x03, 0x03, 0x01, 0x1B];
    /// Delta filter.
    pub const DELTA: &[u8] = &[0x03];
    /// AES-256-CBC encryption (7zAES, key derived via SHA-256).
    pub const AES: &[u8] = &[0x06, 0xF1, 0x07, 0x01];

    /// Returns true if the method ID represents a filter (BCJ, Delta)
    /// rather than a codec.
    pub fn is_filter(method_id: &[u8]) -> bool {
        matches!(
            method_id,
            BCJ_X86
                | BCJ_ARM
                | BCJ_ARM64
                | BCJ_ARM_THUMB
                | BCJ_PPC
                | BCJ_SPARC
                | BCJ_IA64
                | BCJ_RISCV
                | DELTA
        )
    }

    /// Returns true if the method ID represents encryption.
    pub fn is_encryption(method_id: &[u8]) -> bool {
        method_id == AES
    }
}

/// Returns a human-readable name for a method ID.
///
/// Unknown ids map to `Codec_<hex>` (big-endian hex of the id bytes); the
/// fallback guarantees the decoder never fails on a new codec.
pub fn name(id: &[u8]) -> Cow<'static, str> {
    let known = match id {
        method::COPY => "Copy",
        method::LZMA => "LZMA",
        method::LZMA2 => "LZMA2",
        method::DEFLATE => "Deflate",
        method::DEFLATE64 => "Deflate64",
        method::BZIP2 => "BZip2",
        method::PPMD => "PPMd",
        method::LZ4 => "LZ4",
        method::ZSTD => "ZSTD",
        method::BROTLI => "Brotli",
        method::BCJ_X86 => "BCJ (x86)",
        method::BCJ_ARM => "BCJ (ARM)",
        method::BCJ_ARM64 => "BCJ (ARM64)",
        method::BCJ_ARM_THUMB => "BCJ (ARM Thumb)",
        method::BCJ_PPC => "BCJ (PowerPC)",
        method::BCJ_SPARC => "BCJ (SPARC)",
        method::BCJ_IA64 => "BCJ (IA64)",
        method::BCJ_RISCV => "BCJ (RISC-V)",
        method::BCJ2 => "BCJ2",
        method::DELTA => "Delta",
        method::AES => "AES-256",
        _ => return Cow::Owned(format!("Codec_{}", hex(id))),
    };
    Cow::Borrowed(known)
}

/// Big-endian hex rendering of id bytes, e.g. `[0x03, 0x01, 0x01]` -> `030101`.
pub fn hex(id: &[u8]) -> String {
    id.iter().map(|b| format!("{b:02X}")).collect()
}
