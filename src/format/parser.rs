//! The property-tree header decoder.
//!
//! A 7z "next header" is a recursive sequence of tagged properties. The
//! decoder walks it with a [`HeaderCursor`], dispatching on property tags
//! and reporting every recognized field to the annotation sink. Nothing in
//! here returns an error: malformed input degrades to warnings, and the
//! monotonic cursor guarantees termination.

use crate::sink::{FieldValue, StructureSink};

use super::files::FilesInfo;
use super::property_id;
use super::reader::HeaderCursor;
use super::streams::{Folder, Limits, PackInfo, SubStreamsInfo, UnpackInfo};

/// Shared state threaded through the structure decoders.
///
/// Field positions inside the header buffer are relative; the context adds
/// `base` (the absolute file offset of the buffer) so sink annotations
/// carry absolute file ranges.
pub(crate) struct DecodeContext<'a> {
    sink: &'a mut dyn StructureSink,
    pub(crate) limits: &'a Limits,
    base: u64,
    pub(crate) warnings: Vec<String>,
}

impl<'a> DecodeContext<'a> {
    pub(crate) fn new(sink: &'a mut dyn StructureSink, limits: &'a Limits, base: u64) -> Self {
        Self {
            sink,
            limits,
            base,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }

    /// Clamps a header-declared count, warning when the cap bites.
    pub(crate) fn clamp(&mut self, declared: u64, cap: usize, what: &str) -> usize {
        if declared > cap as u64 {
            self.warn(format!("{what} count {declared} exceeds limit {cap}; clamping"));
            cap
        } else {
            declared as usize
        }
    }

    pub(crate) fn begin(&mut self, name: &str, start: u64) {
        self.sink.begin_node(name, self.base.saturating_add(start));
    }

    pub(crate) fn end(&mut self, end: u64) {
        self.sink.end_node(self.base.saturating_add(end));
    }

    pub(crate) fn field(
        &mut self,
        name: &str,
        start: u64,
        end: u64,
        value: FieldValue,
        display: &str,
    ) {
        self.sink.field(
            name,
            self.base.saturating_add(start)..self.base.saturating_add(end),
            value,
            display,
        );
    }
}

/// The decoded property tree of an archive header.
#[derive(Debug, Clone, Default)]
pub struct ArchiveHeader {
    /// Packed stream positions and sizes.
    pub pack_info: Option<PackInfo>,
    /// Folder definitions and unpack sizes.
    pub unpack_info: Option<UnpackInfo>,
    /// Sub-stream partitioning of folders.
    pub sub_streams_info: Option<SubStreamsInfo>,
    /// The file table.
    pub files_info: Option<FilesInfo>,
    /// True when the header was a kEncodedHeader wrapper: the records
    /// above describe the compressed header stream itself, not the
    /// archive contents.
    pub header_encoded: bool,
}

impl ArchiveHeader {
    /// The decoded folders, or an empty slice.
    pub fn folders(&self) -> &[Folder] {
        self.unpack_info.as_ref().map_or(&[], |u| u.folders.as_slice())
    }

    /// The decoded file names, or an empty slice.
    pub fn file_names(&self) -> &[String] {
        self.files_info.as_ref().map_or(&[], |f| &f.names[..])
    }

    /// Declared number of packed streams; zero without PackInfo.
    pub fn num_pack_streams(&self) -> u64 {
        self.pack_info.as_ref().map_or(0, |p| p.num_pack_streams)
    }

    /// Returns true if any folder's coder chain includes encryption.
    pub fn uses_encryption(&self) -> bool {
        self.folders().iter().any(Folder::uses_encryption)
    }
}

/// Outcome of decoding a header buffer.
#[derive(Debug, Clone)]
pub struct HeaderDecode {
    /// The decoded header, or `None` when the top-level tag was not
    /// recognized.
    pub header: Option<ArchiveHeader>,
    /// Bytes of the buffer the decode consumed.
    pub consumed: u64,
    /// True when any read ran past the end of the buffer.
    pub truncated: bool,
    /// Warnings accumulated during the decode.
    pub warnings: Vec<String>,
}

/// Decodes a header buffer read from absolute file offset `base`.
///
/// The top-level tag selects the grammar: `kHeader` decodes the full
/// property tree, `kEncodedHeader` decodes the restricted wrapper that
/// only describes where the compressed real header lives. Any other tag
/// yields no header and a warning; there is nothing safe to decode after
/// an unknown top-level tag.
pub fn decode_header(
    buf: &[u8],
    base: u64,
    limits: &Limits,
    sink: &mut dyn StructureSink,
) -> HeaderDecode {
    let mut ctx = DecodeContext::new(sink, limits, base);
    let mut cur = HeaderCursor::new(buf);

    let tag = cur.read_u8();
    let header = match tag {
        property_id::HEADER => {
            ctx.begin("Header", 0);
            ctx.field("Tag", 0, 1, FieldValue::Unsigned(tag.into()), "kHeader");
            let header = decode_main(&mut cur, &mut ctx);
            ctx.end(cur.position());
            Some(header)
        }
        property_id::ENCODED_HEADER => {
            ctx.begin("EncodedHeader", 0);
            ctx.field(
                "Tag",
                0,
                1,
                FieldValue::Unsigned(tag.into()),
                "kEncodedHeader",
            );
            let header = decode_encoded(&mut cur, &mut ctx);
            ctx.end(cur.position());
            Some(header)
        }
        other => {
            ctx.warn(format!(
                "unrecognized top-level header tag {other:#04x}; structural decode stops at the signature header"
            ));
            None
        }
    };

    if cur.is_truncated() {
        ctx.warn("header data is truncated; fields past the end decoded as zero".into());
    }

    HeaderDecode {
        header,
        consumed: cur.position(),
        truncated: cur.is_truncated(),
        warnings: ctx.warnings,
    }
}

/// The full kHeader grammar: streams info and the file table.
fn decode_main(cur: &mut HeaderCursor<'_>, ctx: &mut DecodeContext<'_>) -> ArchiveHeader {
    let mut header = ArchiveHeader::default();

    loop {
        let tag_pos = cur.position();
        match cur.read_u8() {
            property_id::END => break,
            property_id::MAIN_STREAMS_INFO => {
                ctx.begin("MainStreamsInfo", tag_pos);
                decode_streams_info(cur, ctx, &mut header);
                ctx.end(cur.position());
            }
            property_id::FILES_INFO => {
                ctx.begin("FilesInfo", tag_pos);
                header.files_info = Some(FilesInfo::decode(cur, ctx));
                ctx.end(cur.position());
            }
            other => {
                // Consumed, and ends this level.
                log::debug!("unhandled header property {other:#04x}, stopping header walk");
                break;
            }
        }
    }

    header
}

/// The restricted kEncodedHeader grammar.
///
/// Only PackInfo and UnpackInfo are meaningful here; they locate and
/// describe the compressed header stream. The stream itself is never
/// decompressed.
fn decode_encoded(cur: &mut HeaderCursor<'_>, ctx: &mut DecodeContext<'_>) -> ArchiveHeader {
    let mut header = ArchiveHeader {
        header_encoded: true,
        ..Default::default()
    };

    loop {
        let tag_pos = cur.position();
        match cur.read_u8() {
            property_id::END => break,
            property_id::PACK_INFO => {
                ctx.begin("PackInfo", tag_pos);
                header.pack_info = Some(PackInfo::decode(cur, ctx));
                ctx.end(cur.position());
            }
            property_id::UNPACK_INFO => {
                ctx.begin("UnPackInfo", tag_pos);
                header.unpack_info = Some(UnpackInfo::decode(cur, ctx));
                ctx.end(cur.position());
            }
            _ => break,
        }
    }

    header
}

/// The nested streams info record shared by kMainStreamsInfo.
fn decode_streams_info(
    cur: &mut HeaderCursor<'_>,
    ctx: &mut DecodeContext<'_>,
    header: &mut ArchiveHeader,
) {
    loop {
        let tag_pos = cur.position();
        match cur.read_u8() {
            property_id::END => break,
            property_id::PACK_INFO => {
                ctx.begin("PackInfo", tag_pos);
                header.pack_info = Some(PackInfo::decode(cur, ctx));
                ctx.end(cur.position());
            }
            property_id::UNPACK_INFO => {
                ctx.begin("UnPackInfo", tag_pos);
                header.unpack_info = Some(UnpackInfo::decode(cur, ctx));
                ctx.end(cur.position());
            }
            property_id::SUBSTREAMS_INFO => {
                ctx.begin("SubStreamsInfo", tag_pos);
                // Sub-stream decoding needs the folder sizes from the
                // preceding UnpackInfo.
                let folders: &[Folder] = header
                    .unpack_info
                    .as_ref()
                    .map_or(&[], |u| u.folders.as_slice());
                let sub = SubStreamsInfo::decode(cur, ctx, folders);
                header.sub_streams_info = Some(sub);
                ctx.end(cur.position());
            }
            _ => break,
        }
    }
}
