//! Top-level archive inspection.
//!
//! [`scan`] ties the pieces together: read the signature header, account
//! the file's byte regions, decode the next-header property tree, and
//! classify any trailing overlay. Payload bytes are never decompressed;
//! the only fatal errors are I/O failures and a missing or invalid
//! signature header.

use crate::format::header::SignatureHeader;
use crate::format::parser::{decode_header, ArchiveHeader};
use crate::format::streams::Limits;
use crate::format::SIGNATURE_HEADER_SIZE;
use crate::layout::ArchiveLayout;
use crate::sink::StructureSink;
use crate::source::ByteSource;
use crate::Result;

/// Everything a scan learned about an archive.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// The parsed 32-byte prologue.
    pub signature_header: SignatureHeader,
    /// The decoded header property tree; `None` for empty archives,
    /// unusable header regions, or unrecognized top-level tags.
    pub header: Option<ArchiveHeader>,
    /// Byte accounting for the whole file.
    pub layout: ArchiveLayout,
    /// All warnings raised during the scan.
    pub warnings: Vec<String>,
}

impl ArchiveSummary {
    /// Returns true when the archive declares no next header at all.
    pub fn is_empty_archive(&self) -> bool {
        self.signature_header.next_header_size == 0
    }
}

/// Scans an archive with default limits.
pub fn scan<S>(source: &mut S, sink: &mut dyn StructureSink) -> Result<ArchiveSummary>
where
    S: ByteSource + ?Sized,
{
    scan_with_limits(source, sink, &Limits::default())
}

/// Scans an archive, reporting structure to `sink` as it decodes.
///
/// # Errors
///
/// Fails only on I/O errors from the source or when the file has no
/// valid signature header. Everything downstream of the prologue
/// degrades to warnings in the returned summary.
pub fn scan_with_limits<S>(
    source: &mut S,
    sink: &mut dyn StructureSink,
    limits: &Limits,
) -> Result<ArchiveSummary>
where
    S: ByteSource + ?Sized,
{
    let file_size = source.len()?;
    let mut warnings = Vec::new();

    let prologue = source.read_at(0, SIGNATURE_HEADER_SIZE)?;
    let sig = SignatureHeader::parse(&prologue)?;
    sig.describe(sink);

    log::info!(
        "7z archive, format version {}.{}, {} bytes",
        sig.version_major,
        sig.version_minor,
        file_size
    );

    // CRC agreement over the 20 start-header bytes is a diagnostic, not
    // a gate: a mismatch is exactly the situation where decoding what is
    // there matters most.
    let computed = crc32fast::hash(&prologue[12..32]);
    if computed != sig.start_header_crc {
        let message = format!(
            "start header CRC mismatch: declared {:#010x}, computed {computed:#010x}",
            sig.start_header_crc
        );
        log::warn!("{message}");
        warnings.push(message);
    }

    let mut layout = ArchiveLayout::compute(&sig, file_size);
    if layout.header_region_invalid() && sig.next_header_size > 0 {
        let message = format!(
            "declared next header (offset {}, size {}) lies outside the {file_size}-byte file",
            sig.next_header_offset, sig.next_header_size
        );
        log::warn!("{message}");
        warnings.push(message);
    }

    let header = match &layout.header_region {
        Some(region) if sig.next_header_size > 0 => {
            let buf = source.read_at(region.start, sig.next_header_size)?;
            let decode = decode_header(&buf, region.start, limits, sink);
            warnings.extend(decode.warnings);

            if let Some(header) = &decode.header {
                if header.header_encoded {
                    log::info!(
                        "header is compressed (kEncodedHeader); its contents are not decoded"
                    );
                } else {
                    log::info!(
                        "decoded header: {} folder(s), {} file name(s)",
                        header.folders().len(),
                        header.file_names().len()
                    );
                    for folder in header.folders() {
                        log::debug!("folder pipeline: {}", folder.pipeline());
                    }
                }
                if header.uses_encryption() {
                    log::info!("archive uses encrypted folders");
                }
            }
            decode.header
        }
        _ => {
            if sig.next_header_size == 0 {
                log::info!("empty archive: no next header declared");
            }
            None
        }
    };

    if let Some(overlay) = layout.overlay.as_mut() {
        let probe = source.read_at(overlay.offset, 6)?;
        overlay.classify(&probe);
        let message = if overlay.looks_like_next_volume {
            format!(
                "{} overlay byte(s) at offset {} start with a 7z signature; \
                 this looks like a concatenated next volume",
                overlay.length, overlay.offset
            )
        } else {
            format!(
                "{} unaccounted overlay byte(s) at offset {}",
                overlay.length, overlay.offset
            )
        };
        log::warn!("{message}");
        warnings.push(message);
    }

    Ok(ArchiveSummary {
        signature_header: sig,
        header,
        layout,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SIGNATURE;
    use crate::sink::NullSink;
    use crate::Error;

    fn build_archive(payload: &[u8], header: &[u8]) -> Vec<u8> {
        let mut tail = Vec::new();
        tail.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        tail.extend_from_slice(&(header.len() as u64).to_le_bytes());
        tail.extend_from_slice(&crc32fast::hash(header).to_le_bytes());

        let mut data = Vec::new();
        data.extend_from_slice(SIGNATURE);
        data.extend_from_slice(&[0x00, 0x04]);
        data.extend_from_slice(&crc32fast::hash(&tail).to_le_bytes());
        data.extend_from_slice(&tail);
        data.extend_from_slice(payload);
        data.extend_from_slice(header);
        data
    }

    #[test]
    fn test_empty_archive_scan() {
        let data = build_archive(&[], &[]);
        let mut src: &[u8] = &data;
        let summary = scan(&mut src, &mut NullSink).unwrap();

        assert!(summary.is_empty_archive());
        assert!(summary.header.is_none());
        assert_eq!(summary.layout.end_of_archive_data, 32);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_not_an_archive() {
        let data = b"PK\x03\x04 definitely a zip".to_vec();
        let mut src: &[u8] = &data[..];
        let err = scan(&mut src, &mut NullSink).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_scan_decodes_header() {
        let header = [0x01, 0x04, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00];
        let data = build_archive(&[0xAB; 50], &header);
        let mut src: &[u8] = &data;
        let summary = scan(&mut src, &mut NullSink).unwrap();

        let decoded = summary.header.unwrap();
        assert_eq!(decoded.num_pack_streams(), 1);
        assert_eq!(summary.layout.packed_streams, Some(32..82));
        assert_eq!(summary.layout.header_region, Some(82..90));
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_crc_mismatch_is_warning_only() {
        let mut data = build_archive(&[], &[]);
        data[8] ^= 0xFF; // corrupt the declared start header CRC
        let mut src: &[u8] = &data;
        let summary = scan(&mut src, &mut NullSink).unwrap();
        assert!(summary.warnings.iter().any(|w| w.contains("CRC mismatch")));
    }

    #[test]
    fn test_overlay_next_volume() {
        let mut data = build_archive(&[], &[]);
        data.extend_from_slice(&build_archive(&[], &[])); // concatenated volume
        let mut src: &[u8] = &data;
        let summary = scan(&mut src, &mut NullSink).unwrap();

        let overlay = summary.layout.overlay.unwrap();
        assert_eq!(overlay.offset, 32);
        assert_eq!(overlay.length, 32);
        assert!(overlay.looks_like_next_volume);
        assert!(summary
            .warnings
            .iter()
            .any(|w| w.contains("next volume")));
    }

    #[test]
    fn test_header_region_outside_file() {
        let mut tail = Vec::new();
        tail.extend_from_slice(&10_000u64.to_le_bytes()); // offset
        tail.extend_from_slice(&500u64.to_le_bytes()); // size
        tail.extend_from_slice(&0u32.to_le_bytes());

        let mut data = Vec::new();
        data.extend_from_slice(SIGNATURE);
        data.extend_from_slice(&[0x00, 0x04]);
        data.extend_from_slice(&crc32fast::hash(&tail).to_le_bytes());
        data.extend_from_slice(&tail);

        let mut src: &[u8] = &data;
        let summary = scan(&mut src, &mut NullSink).unwrap();

        assert!(summary.header.is_none());
        assert!(summary.layout.header_region_invalid());
        assert!(summary
            .warnings
            .iter()
            .any(|w| w.contains("outside the")));
    }
}
