//! FilesInfo: the file table of a decoded header.
//!
//! Every FilesInfo property is length-prefixed, so unknown properties are
//! labeled and skipped wholesale and the cursor resynchronizes at the
//! declared end of each one. Only kName is decoded; the rest are reported
//! as opaque ranges.

use crate::sink::FieldValue;

use super::parser::DecodeContext;
use super::property_id;
use super::reader::HeaderCursor;

/// The file table: declared entry count and decoded names.
#[derive(Debug, Clone, Default)]
pub struct FilesInfo {
    /// Number of entries the header declares.
    pub num_files: u64,
    /// Decoded file names, in table order. May be shorter than
    /// `num_files` when the name property is truncated or absent.
    pub names: Vec<String>,
}

impl FilesInfo {
    /// Decodes FilesInfo; the cursor is positioned after the kFilesInfo tag.
    pub(crate) fn decode(cur: &mut HeaderCursor<'_>, ctx: &mut DecodeContext<'_>) -> Self {
        let start = cur.position();
        let num_files = cur.read_number();
        ctx.field(
            "NumFiles",
            start,
            cur.position(),
            FieldValue::Unsigned(num_files),
            &num_files.to_string(),
        );

        let cap = ctx.clamp(num_files, ctx.limits.max_entries, "file");
        let mut names = Vec::new();

        loop {
            let tag_pos = cur.position();
            let tag = cur.read_u8();
            if tag == property_id::END {
                break;
            }

            let len = cur.read_number();
            let body_start = cur.position();
            let body_end = body_start.saturating_add(len);

            match tag {
                property_id::NAME if len > ctx.limits.max_name_bytes => {
                    ctx.warn(format!(
                        "file-name table declares {len} bytes, over the {} byte limit; skipping",
                        ctx.limits.max_name_bytes
                    ));
                    ctx.field(
                        "Names",
                        tag_pos,
                        body_end,
                        FieldValue::None,
                        &format!("{len} bytes (skipped)"),
                    );
                }
                property_id::NAME => {
                    ctx.begin("Names", tag_pos);
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
                            "kName external flag is {external}; names may live outside this header"
                        ));
                    }

                    while cur.position() < body_end && names.len() < cap {
                        let name_start = cur.position();
                        let name = read_utf16le_name(cur, body_end);
                        ctx.field(
                            "Name",
                            name_start,
                            cur.position(),
                            FieldValue::Text(name.clone()),
                            &name,
                        );
                        names.push(name);
                        if cur.is_truncated() {
                            break;
                        }
                    }
                    ctx.end(cur.position().min(body_end));
                }
                other => {
                    let label = property_id::name(other).unwrap_or("kUnknown");
                    ctx.field(
                        label,
                        tag_pos,
                        body_end,
                        FieldValue::None,
                        &format!("{len} bytes (skipped)"),
                    );
                }
            }

            // Length-prefixed properties are self-delimiting: jump to the
            // declared end regardless of how much the body decode consumed.
            cur.seek_forward(body_end);
        }

        Self { num_files, names }
    }
}

/// Reads one null-terminated UTF-16LE string, bounded by `limit`.
///
/// Unpaired surrogates are replaced rather than failing; display names
/// never abort a decode.
fn read_utf16le_name(cur: &mut HeaderCursor<'_>, limit: u64) -> String {
    let mut units = Vec::new();
    while cur.position().saturating_add(2) <= limit {
        let lo = cur.read_u8();
        let hi = cur.read_u8();
        let unit = u16::from_le_bytes([lo, hi]);
        if unit == 0 {
            break;
        }
        units.push(unit);
        if cur.is_truncated() {
            break;
        }
    }
    String::from_utf16_lossy(&units)
}
