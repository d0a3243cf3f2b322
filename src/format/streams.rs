//! Streams info structures for 7z archives.
//!
//! These records describe the packed byte ranges and the folder/coder
//! pipelines that would reconstruct the uncompressed streams. Only the
//! describing metadata is decoded; no coder is ever run.

use std::borrow::Cow;

use crate::codec;
use crate::sink::FieldValue;

use super::parser::DecodeContext;
use super::property_id;
use super::reader::HeaderCursor;

/// Safety caps for decoding hostile or corrupt headers.
///
/// Counts declared by the header are clamped to these limits; hitting a
/// cap emits a warning and stops the affected loop instead of erroring.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum number of folders decoded from UnpackInfo.
    pub max_folders: usize,
    /// Maximum number of coders decoded per folder.
    pub max_coders_per_folder: usize,
    /// Maximum number of entries (files, streams, sizes) per record.
    pub max_entries: usize,
    /// Maximum declared size of the file-name table in bytes.
    pub max_name_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_folders: 100_000,
            max_coders_per_folder: 16,
            max_entries: 1_000_000,
            max_name_bytes: 64 << 20,
        }
    }
}

impl Limits {
    /// Creates limits with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of folders.
    pub fn max_folders(mut self, max: usize) -> Self {
        self.max_folders = max;
        self
    }

    /// Sets the maximum number of coders per folder.
    pub fn max_coders_per_folder(mut self, max: usize) -> Self {
        self.max_coders_per_folder = max;
        self
    }

    /// Sets the maximum number of entries per record.
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Sets the maximum file-name table size in bytes.
    pub fn max_name_bytes(mut self, max: u64) -> Self {
        self.max_name_bytes = max;
        self
    }

}

/// Information about packed (compressed) streams.
#[derive(Debug, Clone, Default)]
pub struct PackInfo {
    /// Position of the first pack stream, relative to the archive data
    /// start (byte 32). Reported but not otherwise used.
    pub pack_pos: u64,
    /// Number of pack streams, as declared.
    pub num_pack_streams: u64,
    /// Sizes of each packed stream, when the kSize run was present.
    pub pack_sizes: Vec<u64>,
}

impl PackInfo {
    /// Decodes PackInfo; the cursor is positioned after the kPackInfo tag.
    pub(crate) fn decode(cur: &mut HeaderCursor<'_>, ctx: &mut DecodeContext<'_>) -> Self {
        let start = cur.position();
        let pack_pos = cur.read_number();
        ctx.field(
            "PackPos",
            start,
            cur.position(),
            FieldValue::Unsigned(pack_pos),
            &pack_pos.to_string(),
        );

        let start = cur.position();
        let num_pack_streams = cur.read_number();
        ctx.field(
            "NumPackStreams",
            start,
            cur.position(),
            FieldValue::Unsigned(num_pack_streams),
            &num_pack_streams.to_string(),
        );

        let mut pack_sizes = Vec::new();
        loop {
            match cur.read_u8() {
                property_id::END => break,
                property_id::SIZE => {
                    let count = ctx.clamp(num_pack_streams, ctx.limits.max_entries, "pack stream");
                    for _ in 0..count {
                        if cur.is_truncated() {
                            break;
                        }
                        let start = cur.position();
                        let size = cur.read_number();
                        ctx.field(
                            "PackSize",
                            start,
                            cur.position(),
                            FieldValue::Unsigned(size),
                            &size.to_string(),
                        );
                        pack_sizes.push(size);
                    }
                }
                // An unrecognized tag ends this record; the byte stays
                // consumed, the cursor never rewinds.
                _ => break,
            }
        }

        Self {
            pack_pos,
            num_pack_streams,
            pack_sizes,
        }
    }

    /// Total declared packed size.
    pub fn total_packed_size(&self) -> u64 {
        self.pack_sizes.iter().fold(0, |acc, s| acc.saturating_add(*s))
    }
}

/// One compression, filter or encryption stage within a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coder {
    /// Raw method id bytes (0-15 bytes).
    pub id: Vec<u8>,
    /// The coder declared explicit input/output stream counts.
    pub is_complex: bool,
    /// The coder carried a settings blob.
    pub has_attributes: bool,
    /// Declared input stream count; `None` for simple coders.
    ///
    /// Stored for display only; bind pairs between complex coders are
    /// never resolved.
    pub num_in_streams: Option<u64>,
    /// Declared output stream count; `None` for simple coders.
    pub num_out_streams: Option<u64>,
    /// Length of the settings blob that was skipped, if any.
    pub properties_len: Option<u64>,
}

impl Coder {
    /// Human-readable codec name, falling back to `Codec_<hex>`.
    pub fn name(&self) -> Cow<'static, str> {
        codec::name(&self.id)
    }

    /// Returns true if this stage is a filter rather than a codec.
    pub fn is_filter(&self) -> bool {
        codec::method::is_filter(&self.id)
    }

    /// Returns true if this stage is an encryption method.
    pub fn is_encryption(&self) -> bool {
        codec::method::is_encryption(&self.id)
    }

    pub(crate) fn decode(cur: &mut HeaderCursor<'_>, ctx: &mut DecodeContext<'_>) -> Self {
        let start = cur.position();
        let flags = cur.read_u8();
        let id_len = (flags & 0x0F) as usize;
        let is_complex = (flags & 0x10) != 0;
        let has_attributes = (flags & 0x20) != 0;
        ctx.field(
            "CoderFlags",
            start,
            cur.position(),
            FieldValue::Unsigned(flags.into()),
            &format!(
                "id_len={id_len}, complex={}, attributes={}",
                is_complex as u8, has_attributes as u8
            ),
        );

        let start = cur.position();
        let id = cur.read_bytes(id_len);
        let display = if codec::method::is_filter(&id) {
            format!("{} (filter)", codec::name(&id))
        } else {
            codec::name(&id).into_owned()
        };
        ctx.field(
            "CoderId",
            start,
            cur.position(),
            FieldValue::Bytes(id.clone()),
            &display,
        );

        let (num_in_streams, num_out_streams) = if is_complex {
            let start = cur.position();
            let num_in = cur.read_number();
            ctx.field(
                "NumInStreams",
                start,
                cur.position(),
                FieldValue::Unsigned(num_in),
                &num_in.to_string(),
            );
            let start = cur.position();
            let num_out = cur.read_number();
            ctx.field(
                "NumOutStreams",
                start,
                cur.position(),
                FieldValue::Unsigned(num_out),
                &num_out.to_string(),
            );
            (Some(num_in), Some(num_out))
        } else {
            (None, None)
        };

        let properties_len = if has_attributes {
            let start = cur.position();
            let len = cur.read_number();
            ctx.field(
                "PropertiesSize",
                start,
                cur.position(),
                FieldValue::Unsigned(len),
                &len.to_string(),
            );
            let start = cur.position();
            cur.skip(len);
            // The blob is opaque to the metadata decoder.
            ctx.field(
                "Properties",
                start,
                cur.position(),
                FieldValue::None,
                "settings blob (skipped)",
            );
            Some(len)
        } else {
            None
        };

        Self {
            id,
            is_complex,
            has_attributes,
            num_in_streams,
            num_out_streams,
            properties_len,
        }
    }
}

/// A folder: an ordered chain of coders reconstructing one stream.
///
/// Declaration order is bitstream order and is meaningful for coder
/// chaining. The uncompressed size arrives in a second pass under the
/// kCodersUnPackSize tag; until that pass runs the folder is incomplete
/// and `unpack_size` is `None` — unknown, never zero.
#[derive(Debug, Clone, Default)]
pub struct Folder {
    /// Coders in declaration order.
    pub coders: Vec<Coder>,
    /// Uncompressed size, once the kCodersUnPackSize pass has run.
    pub unpack_size: Option<u64>,
}

impl Folder {
    pub(crate) fn decode(cur: &mut HeaderCursor<'_>, ctx: &mut DecodeContext<'_>) -> Self {
        let start = cur.position();
        let num_coders = cur.read_number();
        ctx.field(
            "NumCoders",
            start,
            cur.position(),
            FieldValue::Unsigned(num_coders),
            &num_coders.to_string(),
        );

        let count = ctx.clamp(num_coders, ctx.limits.max_coders_per_folder, "coder");
        let mut coders = Vec::with_capacity(count);
        for _ in 0..count {
            if cur.is_truncated() {
                break;
            }
            ctx.begin("Coder", cur.position());
            let coder = Coder::decode(cur, ctx);
            ctx.end(cur.position());
            coders.push(coder);
        }

        Self {
            coders,
            unpack_size: None,
        }
    }

    /// Renders the coder chain, e.g. `LZMA2 -> BCJ (x86)`.
    pub fn pipeline(&self) -> String {
        let names: Vec<_> = self.coders.iter().map(|c| c.name().into_owned()).collect();
        names.join(" -> ")
    }

    /// Returns true if any coder in the chain is an encryption method.
    pub fn uses_encryption(&self) -> bool {
        self.coders.iter().any(Coder::is_encryption)
    }
}

/// Unpack info: the folder definitions and their uncompressed sizes.
#[derive(Debug, Clone, Default)]
pub struct UnpackInfo {
    /// Decoded folders, in declaration order.
    pub folders: Vec<Folder>,
}

impl UnpackInfo {
    /// Decodes UnpackInfo; the cursor is positioned after the kUnPackInfo tag.
    pub(crate) fn decode(cur: &mut HeaderCursor<'_>, ctx: &mut DecodeContext<'_>) -> Self {
        let mut folders = Vec::new();

        loop {
            match cur.read_u8() {
                property_id::END => break,

                property_id::FOLDER => {
                    let start = cur.position();
                    let external = cur.read_u8();
                    ctx.field(
                        "External",
                        start,
                        cur.position(),
                        FieldValue::Unsigned(external.into()),
                        &external.to_string(),
                    );
                    if external != 0 {
                        ctx.warn(format!(
                            "kFolder external flag is {external}; folder data may live outside this header"
                        ));
                    }

                    let start = cur.position();
                    let num_folders = cur.read_number();
                    ctx.field(
                        "NumFolders",
                        start,
                        cur.position(),
                        FieldValue::Unsigned(num_folders),
                        &num_folders.to_string(),
                    );

                    let count = ctx.clamp(num_folders, ctx.limits.max_folders, "folder");
                    for _ in 0..count {
                        if cur.is_truncated() {
                            break;
                        }
                        ctx.begin("Folder", cur.position());
                        let folder = Folder::decode(cur, ctx);
                        ctx.end(cur.position());
                        folders.push(folder);
                    }
                }

                property_id::CODERS_UNPACK_SIZE => {
                    // Second pass: one size per folder, declaration order.
                    for folder in folders.iter_mut() {
                        if cur.is_truncated() {
                            break;
                        }
                        let start = cur.position();
                        let size = cur.read_number();
                        ctx.field(
                            "UnPackSize",
                            start,
                            cur.position(),
                            FieldValue::Unsigned(size),
                            &size.to_string(),
                        );
                        folder.unpack_size = Some(size);
                    }
                }

                _ => break,
            }
        }

        Self { folders }
    }

    /// Number of decoded folders.
    pub fn num_folders(&self) -> usize {
        self.folders.len()
    }
}

/// Sub-stream info: how folders split into individual file streams.
#[derive(Debug, Clone, Default)]
pub struct SubStreamsInfo {
    /// Per-folder sub-stream counts, when kNumUnPackStream was present.
    pub num_unpack_streams: Option<Vec<u64>>,
    /// Decoded sub-stream sizes.
    pub sizes: Vec<u64>,
    /// True when `sizes` came from the exact per-folder computation
    /// rather than the heuristic scan.
    pub sizes_exact: bool,
}

impl SubStreamsInfo {
    /// Decodes SubStreamsInfo; the cursor is positioned after the tag.
    ///
    /// When kNumUnPackStream was seen the kSize run length is computed
    /// exactly (per folder: count - 1 explicit sizes, the last implicit
    /// from the folder's unpack size). Without the counts there is no
    /// byte-exact way to know how many sizes follow, so the decoder
    /// consumes VarInts until the next byte looks like a known property
    /// tag — a documented best-effort, not an error condition.
    pub(crate) fn decode(
        cur: &mut HeaderCursor<'_>,
        ctx: &mut DecodeContext<'_>,
        folders: &[Folder],
    ) -> Self {
        let mut num_unpack_streams: Option<Vec<u64>> = None;
        let mut sizes = Vec::new();
        let mut sizes_exact = false;

        loop {
            match cur.read_u8() {
                property_id::END => break,

                property_id::NUM_UNPACK_STREAM => {
                    let mut counts = Vec::with_capacity(folders.len());
                    for _ in folders {
                        if cur.is_truncated() {
                            break;
                        }
                        let start = cur.position();
                        let count = cur.read_number();
                        ctx.field(
                            "NumUnPackStream",
                            start,
                            cur.position(),
                            FieldValue::Unsigned(count),
                            &count.to_string(),
                        );
                        counts.push(count);
                    }
                    num_unpack_streams = Some(counts);
                }

                property_id::SIZE => match &num_unpack_streams {
                    Some(counts) => {
                        sizes_exact = true;
                        for (folder, &declared) in folders.iter().zip(counts) {
                            if declared == 0 {
                                continue;
                            }
                            let count =
                                ctx.clamp(declared, ctx.limits.max_entries, "sub-stream");
                            let mut explicit_sum = 0u64;
                            for _ in 1..count {
                                if cur.is_truncated() {
                                    break;
                                }
                                let start = cur.position();
                                let size = cur.read_number();
                                ctx.field(
                                    "Size",
                                    start,
                                    cur.position(),
                                    FieldValue::Unsigned(size),
                                    &size.to_string(),
                                );
                                explicit_sum = explicit_sum.saturating_add(size);
                                sizes.push(size);
                            }
                            // The last sub-stream size is implicit.
                            match folder.unpack_size {
                                Some(total) => sizes.push(total.saturating_sub(explicit_sum)),
                                None => ctx.warn(
                                    "folder unpack size unknown; final sub-stream size omitted"
                                        .into(),
                                ),
                            }
                        }
                    }
                    None => {
                        // Heuristic terminator: a value byte can coincide
                        // with a tag byte, so this run is approximate.
                        log::debug!("sub-stream sizes scanned heuristically (no counts declared)");
                        while let Some(next) = cur.peek_u8() {
                            if property_id::is_known(next) || sizes.len() >= ctx.limits.max_entries
                            {
                                break;
                            }
                            let start = cur.position();
                            let size = cur.read_number();
                            ctx.field(
                                "Size",
                                start,
                                cur.position(),
                                FieldValue::Unsigned(size),
                                &size.to_string(),
                            );
                            sizes.push(size);
                        }
                    }
                },

                // kCRC and anything else ends this record.
                _ => break,
            }
        }

        Self {
            num_unpack_streams,
            sizes,
            sizes_exact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parser::DecodeContext;
    use crate::format::reader::write_number;
    use crate::sink::NullSink;

    fn ctx<'a>(sink: &'a mut NullSink, limits: &'a Limits) -> DecodeContext<'a> {
        DecodeContext::new(sink, limits, 0)
    }

    #[test]
    fn test_pack_info_with_sizes() {
        let mut data = Vec::new();
        write_number(&mut data, 0); // pack_pos
        write_number(&mut data, 2); // num streams
        data.push(property_id::SIZE);
        write_number(&mut data, 1000);
        write_number(&mut data, 2000);
        data.push(property_id::END);

        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = ctx(&mut sink, &limits);
        let mut cur = HeaderCursor::new(&data);
        let info = PackInfo::decode(&mut cur, &mut ctx);

        assert_eq!(info.num_pack_streams, 2);
        assert_eq!(info.pack_sizes, vec![1000, 2000]);
        assert_eq!(info.total_packed_size(), 3000);
        assert_eq!(cur.position(), data.len() as u64);
    }

    #[test]
    fn test_pack_info_unrecognized_tag_terminates() {
        let mut data = Vec::new();
        write_number(&mut data, 0);
        write_number(&mut data, 1);
        data.push(0x42); // not a PackInfo tag; consumed, ends the record

        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = ctx(&mut sink, &limits);
        let mut cur = HeaderCursor::new(&data);
        let info = PackInfo::decode(&mut cur, &mut ctx);

        assert_eq!(info.num_pack_streams, 1);
        assert!(info.pack_sizes.is_empty());
        assert_eq!(cur.position(), 3);
    }

    #[test]
    fn test_coder_simple_with_attributes() {
        // flags 0x21: id_len=1, attributes; id 0x21 = LZMA2
        let data = [0x21, 0x21, 0x02, 0xAA, 0xBB];
        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = ctx(&mut sink, &limits);
        let mut cur = HeaderCursor::new(&data);
        let coder = Coder::decode(&mut cur, &mut ctx);

        assert_eq!(coder.name(), "LZMA2");
        assert!(!coder.is_complex);
        assert!(coder.has_attributes);
        assert_eq!(coder.properties_len, Some(2));
        assert_eq!(cur.position(), 5);
    }

    #[test]
    fn test_coder_complex_counts_consumed_and_kept() {
        // flags 0x11: id_len=1, complex; id 0x21; 2 in, 1 out
        let data = [0x11, 0x21, 0x02, 0x01];
        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = ctx(&mut sink, &limits);
        let mut cur = HeaderCursor::new(&data);
        let coder = Coder::decode(&mut cur, &mut ctx);

        assert_eq!(coder.name(), "LZMA2");
        assert!(coder.is_complex);
        assert_eq!(coder.num_in_streams, Some(2));
        assert_eq!(coder.num_out_streams, Some(1));
        assert_eq!(cur.position(), 4);
    }

    #[test]
    fn test_coder_unknown_id_renders_fallback() {
        let data = [0x02, 0x7E, 0x7F];
        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = ctx(&mut sink, &limits);
        let mut cur = HeaderCursor::new(&data);
        let coder = Coder::decode(&mut cur, &mut ctx);

        assert_eq!(coder.name(), "Codec_7E7F");
    }

    #[test]
    fn test_unpack_info_two_phase_sizes() {
        let mut data = Vec::new();
        data.push(property_id::FOLDER);
        data.push(0x00); // external
        write_number(&mut data, 2); // two folders
        // each folder: one simple LZMA coder
        for _ in 0..2 {
            write_number(&mut data, 1); // num coders
            data.push(0x03); // flags: id_len=3
            data.extend_from_slice(&[0x03, 0x01, 0x01]);
        }
        data.push(property_id::CODERS_UNPACK_SIZE);
        write_number(&mut data, 4096);
        write_number(&mut data, 8192);
        data.push(property_id::END);

        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = ctx(&mut sink, &limits);
        let mut cur = HeaderCursor::new(&data);
        let info = UnpackInfo::decode(&mut cur, &mut ctx);

        assert_eq!(info.num_folders(), 2);
        assert_eq!(info.folders[0].pipeline(), "LZMA");
        assert_eq!(info.folders[0].unpack_size, Some(4096));
        assert_eq!(info.folders[1].unpack_size, Some(8192));
    }

    #[test]
    fn test_unpack_info_missing_size_pass_leaves_unknown() {
        let mut data = Vec::new();
        data.push(property_id::FOLDER);
        data.push(0x00);
        write_number(&mut data, 1);
        write_number(&mut data, 1);
        data.push(0x01); // flags: id_len=1
        data.push(0x00); // Copy
        data.push(property_id::END);

        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = ctx(&mut sink, &limits);
        let mut cur = HeaderCursor::new(&data);
        let info = UnpackInfo::decode(&mut cur, &mut ctx);

        // Unknown, not zero-length.
        assert_eq!(info.folders[0].unpack_size, None);
    }

    #[test]
    fn test_sub_streams_exact_sizes() {
        let mut folder = Folder::default();
        folder.unpack_size = Some(100);
        let folders = [folder];

        let mut data = Vec::new();
        data.push(property_id::NUM_UNPACK_STREAM);
        write_number(&mut data, 3); // three sub-streams in the folder
        data.push(property_id::SIZE);
        write_number(&mut data, 20);
        write_number(&mut data, 30);
        data.push(property_id::END);

        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = ctx(&mut sink, &limits);
        let mut cur = HeaderCursor::new(&data);
        let info = SubStreamsInfo::decode(&mut cur, &mut ctx, &folders);

        assert!(info.sizes_exact);
        assert_eq!(info.sizes, vec![20, 30, 50]); // last implicit
        assert_eq!(cur.position(), data.len() as u64);
    }

    #[test]
    fn test_sub_streams_heuristic_scan() {
        let folders = [Folder::default()];

        let mut data = Vec::new();
        data.push(property_id::SIZE);
        write_number(&mut data, 300); // 2-byte varint, first byte not a tag
        write_number(&mut data, 400);
        data.push(property_id::CRC); // known tag terminates the run
        data.push(property_id::END);

        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = ctx(&mut sink, &limits);
        let mut cur = HeaderCursor::new(&data);
        let info = SubStreamsInfo::decode(&mut cur, &mut ctx, &folders);

        assert!(!info.sizes_exact);
        assert_eq!(info.sizes, vec![300, 400]);
        // kCRC itself ends the record.
        assert_eq!(cur.position(), data.len() as u64 - 1);
    }

    #[test]
    fn test_folder_coder_cap() {
        let mut data = Vec::new();
        write_number(&mut data, 500); // absurd coder count
        let mut sink = NullSink;
        let limits = Limits::default();
        let mut ctx = DecodeContext::new(&mut sink, &limits, 0);
        let mut cur = HeaderCursor::new(&data);
        let folder = Folder::decode(&mut cur, &mut ctx);
        assert!(folder.coders.len() <= limits.max_coders_per_folder);
        assert!(!ctx.warnings.is_empty());
    }
}
