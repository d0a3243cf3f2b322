//! Low-level cursor over an in-memory header buffer.
//!
//! Header decoding must terminate on arbitrary input, so no read here can
//! fail: reads past the end of the buffer yield zero and still advance
//! the position by the nominal width. Truncation is latched in the cursor
//! and reported once by the caller instead of aborting the decode.

/// A forward-only cursor over a header buffer.
///
/// The position is monotonic: every read advances it by the width it
/// requested, even when the buffer has run out. This keeps loops over
/// truncated headers bounded without any error plumbing.
#[derive(Debug)]
pub struct HeaderCursor<'a> {
    buf: &'a [u8],
    pos: u64,
    truncated: bool,
}

impl<'a> HeaderCursor<'a> {
    /// Creates a cursor at the start of the buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            truncated: false,
        }
    }

    /// Current position, in bytes from the start of the buffer.
    ///
    /// May exceed the buffer length after degraded reads.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Returns true if any read has run past the end of the buffer.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Bytes remaining before the end of the buffer.
    pub fn remaining(&self) -> u64 {
        (self.buf.len() as u64).saturating_sub(self.pos)
    }

    /// Returns the next byte without advancing, or `None` at the end.
    pub fn peek_u8(&self) -> Option<u8> {
        self.buf.get(usize::try_from(self.pos).ok()?).copied()
    }

    fn take(&mut self, width: u64) -> Option<&'a [u8]> {
        let start = self.pos;
        self.pos = self.pos.saturating_add(width);
        if self.pos <= self.buf.len() as u64 {
            Some(&self.buf[start as usize..self.pos as usize])
        } else {
            self.truncated = true;
            None
        }
    }

    /// Reads one byte; zero past the end.
    pub fn read_u8(&mut self) -> u8 {
        self.take(1).map_or(0, |b| b[0])
    }

    /// Reads a 32-bit little-endian integer; zero past the end.
    pub fn read_u32_le(&mut self) -> u32 {
        self.take(4)
            .map_or(0, |b| u32::from_le_bytes(b.try_into().unwrap()))
    }

    /// Reads a 64-bit little-endian integer; zero past the end.
    pub fn read_u64_le(&mut self) -> u64 {
        self.take(8)
            .map_or(0, |b| u64::from_le_bytes(b.try_into().unwrap()))
    }

    /// Reads `count` raw bytes, zero-padded past the end of the buffer.
    pub fn read_bytes(&mut self, count: usize) -> Vec<u8> {
        let start = self.pos;
        self.pos = self.pos.saturating_add(count as u64);
        let available_end = self.pos.min(self.buf.len() as u64);
        let mut out = if start < available_end {
            self.buf[start as usize..available_end as usize].to_vec()
        } else {
            Vec::new()
        };
        if out.len() < count {
            self.truncated = true;
            out.resize(count, 0);
        }
        out
    }

    /// Reads a 7z variable-length encoded u64.
    ///
    /// The first byte's high bits indicate the number of additional bytes:
    ///
    /// - `0xxxxxxx` (1 byte): value 0-127
    /// - `10xxxxxx` + 1 byte: value 0-16383
    /// - `110xxxxx` + 2 bytes: value 0-2097151
    /// - And so on...
    /// - `11111111` + 8 bytes: full u64
    ///
    /// Past the end of the buffer this degrades to a 1-byte zero read.
    pub fn read_number(&mut self) -> u64 {
        let first = self.read_u8() as u64;

        let mut mask = 0x80u64;
        let mut value = 0u64;

        for i in 0..8 {
            if (first & mask) == 0 {
                // The remaining low bits of the first byte form the high
                // part of the value.
                return value | ((first & (mask - 1)) << (8 * i));
            }
            value |= (self.read_u8() as u64) << (8 * i);
            mask >>= 1;
        }

        // All 8 high bits were set: the value is the 8 trailing bytes,
        // and the first byte contributes nothing.
        value
    }

    /// Advances the position by `count` bytes.
    pub fn skip(&mut self, count: u64) {
        self.pos = self.pos.saturating_add(count);
        if self.pos > self.buf.len() as u64 {
            self.truncated = true;
        }
    }

    /// Advances to `target` if it is ahead of the current position.
    ///
    /// Used to resynchronize after length-prefixed properties; the cursor
    /// never rewinds.
    pub fn seek_forward(&mut self, target: u64) {
        if target > self.pos {
            self.pos = target;
            if self.pos > self.buf.len() as u64 {
                self.truncated = true;
            }
        }
    }
}

/// Appends the variable-length encoding of `value` to `buf`.
///
/// This is the inverse of [`HeaderCursor::read_number`] and exists to
/// build header fixtures.
pub fn write_number(buf: &mut Vec<u8>, value: u64) {
    if value < 0x80 {
        buf.push(value as u8);
        return;
    }

    // Count how many full trailing bytes the value needs, then set that
    // many leading one-bits in the first byte and pack the remaining high
    // bits below them.
    let mut extra = 1usize;
    while extra < 8 {
        let high_bits = 8 - extra - 1;
        let limit = 1u64 << (8 * extra + high_bits);
        if value < limit {
            break;
        }
        extra += 1;
    }

    let mut first = 0u8;
    for i in 0..extra {
        first |= 0x80 >> i;
    }
    if extra < 8 {
        first |= (value >> (8 * extra)) as u8;
    }
    buf.push(first);
    for i in 0..extra {
        buf.push((value >> (8 * i)) as u8);
    }
}
