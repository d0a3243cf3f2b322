//! Byte-accounting for the regions of an archive file.
//!
//! The layout is computed purely from the signature header and the total
//! file size, with checked arithmetic throughout: a hostile offset or size
//! marks the header region invalid instead of wrapping, and everything
//! past the accounted regions is reported as overlay.

use std::ops::Range;

use crate::format::header::SignatureHeader;
use crate::format::{SIGNATURE, SIGNATURE_HEADER_SIZE};

/// Trailing bytes past the accounted archive regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    /// Absolute offset where the overlay starts.
    pub offset: u64,
    /// Overlay length in bytes.
    pub length: u64,
    /// True when the overlay starts with the 7z signature, which usually
    /// means a following volume was concatenated onto this file.
    pub looks_like_next_volume: bool,
}

impl Overlay {
    /// Marks the overlay as a candidate next volume when the probe bytes
    /// read at its start carry the 7z signature.
    pub fn classify(&mut self, probe: &[u8]) {
        self.looks_like_next_volume = probe.len() >= SIGNATURE.len() && probe[..6] == SIGNATURE[..];
    }
}

/// The byte regions of an archive file.
///
/// `end_of_archive_data` is never below 32: a file with a valid signature
/// header accounts for at least that prologue, whatever the rest claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    /// Total file size in bytes.
    pub file_size: u64,
    /// The fixed signature header, always `0..32`.
    pub signature_header: Range<u64>,
    /// Packed streams region, between the signature header and the next
    /// header. Empty archives have none.
    pub packed_streams: Option<Range<u64>>,
    /// The next header region, when its declared offset and size fit
    /// inside the file.
    pub header_region: Option<Range<u64>>,
    /// End of all accounted archive data.
    pub end_of_archive_data: u64,
    /// Unaccounted trailing bytes, if any.
    pub overlay: Option<Overlay>,
}

impl ArchiveLayout {
    /// Computes the layout from the signature header and the file size.
    ///
    /// The declared header region is validated against the file: when the
    /// offset or size overflows or runs past the end, the region is
    /// `None`, archive data ends at byte 32, and everything after is
    /// overlay. Overlay classification is left to the caller, which can
    /// read the probe bytes.
    pub fn compute(sig: &SignatureHeader, file_size: u64) -> Self {
        let header_start = sig.next_header_position();
        let header_end = header_start.checked_add(sig.next_header_size);

        let header_region = match header_end {
            Some(end) if end <= file_size && header_start >= SIGNATURE_HEADER_SIZE => {
                Some(header_start..end)
            }
            _ => None,
        };

        let (packed_streams, end_of_archive_data) = match &header_region {
            Some(region) => {
                let packed = (region.start > SIGNATURE_HEADER_SIZE)
                    .then(|| SIGNATURE_HEADER_SIZE..region.start);
                (packed, region.end)
            }
            // Invalid header declaration: only the prologue is accounted.
            None => (None, SIGNATURE_HEADER_SIZE),
        };

        let overlay = (file_size > end_of_archive_data).then(|| Overlay {
            offset: end_of_archive_data,
            length: file_size - end_of_archive_data,
            looks_like_next_volume: false,
        });

        Self {
            file_size,
            signature_header: 0..SIGNATURE_HEADER_SIZE,
            packed_streams,
            header_region,
            end_of_archive_data,
            overlay,
        }
    }

    /// Returns true when the declared header region was unusable.
    pub fn header_region_invalid(&self) -> bool {
        self.header_region.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(offset: u64, size: u64) -> SignatureHeader {
        SignatureHeader {
            version_major: 0,
            version_minor: 4,
            start_header_crc: 0,
            next_header_offset: offset,
            next_header_size: size,
            next_header_crc: 0,
        }
    }

    #[test]
    fn test_empty_archive() {
        // Header immediately after the prologue, zero length.
        let layout = ArchiveLayout::compute(&sig(0, 0), 32);
        assert_eq!(layout.signature_header, 0..32);
        assert_eq!(layout.packed_streams, None);
        assert_eq!(layout.header_region, Some(32..32));
        assert_eq!(layout.end_of_archive_data, 32);
        assert_eq!(layout.overlay, None);
    }

    #[test]
    fn test_typical_archive() {
        // 500 bytes of packed data, then a 60-byte header.
        let layout = ArchiveLayout::compute(&sig(500, 60), 592);
        assert_eq!(layout.packed_streams, Some(32..532));
        assert_eq!(layout.header_region, Some(532..592));
        assert_eq!(layout.end_of_archive_data, 592);
        assert_eq!(layout.overlay, None);
    }

    #[test]
    fn test_overlay_counted_exactly() {
        let layout = ArchiveLayout::compute(&sig(100, 40), 572);
        assert_eq!(layout.end_of_archive_data, 172);
        let overlay = layout.overlay.unwrap();
        assert_eq!(overlay.offset, 172);
        assert_eq!(overlay.length, 400);
        assert!(!overlay.looks_like_next_volume);
    }

    #[test]
    fn test_header_region_past_eof_is_invalid() {
        let layout = ArchiveLayout::compute(&sig(100, 1000), 200);
        assert!(layout.header_region_invalid());
        assert_eq!(layout.end_of_archive_data, 32);
        let overlay = layout.overlay.unwrap();
        assert_eq!(overlay.offset, 32);
        assert_eq!(overlay.length, 168);
    }

    #[test]
    fn test_hostile_offset_does_not_wrap() {
        let layout = ArchiveLayout::compute(&sig(u64::MAX, u64::MAX), 1024);
        assert!(layout.header_region_invalid());
        assert_eq!(layout.end_of_archive_data, 32);
    }

    #[test]
    fn test_overlay_classify() {
        let mut overlay = Overlay {
            offset: 32,
            length: 64,
            looks_like_next_volume: false,
        };
        overlay.classify(&[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, 0x00, 0x04]);
        assert!(overlay.looks_like_next_volume);

        overlay.classify(b"garbage");
        assert!(!overlay.looks_like_next_volume);

        overlay.classify(&[0x37, 0x7A]);
        assert!(!overlay.looks_like_next_volume);
    }
}
