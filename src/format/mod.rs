//! 7z archive format constants, definitions, and low-level decoding.
//!
//! This module contains the magic numbers, property IDs, and the cursor
//! and structure decoders for the 7z "end header" property tree.

pub mod files;
pub mod header;
pub mod parser;
pub mod reader;
pub mod streams;

/// The 7z file signature (magic bytes).
///
/// Every valid 7z archive starts with these 6 bytes: `'7' 'z' 0xBC 0xAF 0x27 0x1C`
pub const SIGNATURE: &[u8; 6] = &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];

/// Size of the signature header in bytes.
///
/// The signature header contains:
/// - 6 bytes: signature
/// - 2 bytes: version (major, minor)
/// - 4 bytes: start header CRC
/// - 8 bytes: next header offset
/// - 8 bytes: next header size
/// - 4 bytes: next header CRC
pub const SIGNATURE_HEADER_SIZE: u64 = 32;

/// Property IDs used in 7z archive headers.
pub mod property_id {
    /// End of header marker.
    pub const END: u8 = 0x00;
    /// Header marker.
    pub const HEADER: u8 = 0x01;
    /// Archive properties.
    pub const ARCHIVE_PROPERTIES: u8 = 0x02;
    /// Additional streams info.
    pub const ADDITIONAL_STREAMS_INFO: u8 = 0x03;
    /// Main streams info.
    pub const MAIN_STREAMS_INFO: u8 = 0x04;
    /// Files info.
    pub const FILES_INFO: u8 = 0x05;
    /// Pack info.
    pub const PACK_INFO: u8 = 0x06;
    /// Unpack info.
    pub const UNPACK_INFO: u8 = 0x07;
    /// Substreams info.
    pub const SUBSTREAMS_INFO: u8 = 0x08;
    /// Size info.
    pub const SIZE: u8 = 0x09;
    /// CRC info.
    pub const CRC: u8 = 0x0A;
    /// Folder info.
    pub const FOLDER: u8 = 0x0B;
    /// Coders unpack size.
    pub const CODERS_UNPACK_SIZE: u8 = 0x0C;
    /// Number of unpack streams in folders.
    pub const NUM_UNPACK_STREAM: u8 = 0x0D;
    /// Empty stream indicator.
    pub const EMPTY_STREAM: u8 = 0x0E;
    /// Empty file indicator.
    pub const EMPTY_FILE: u8 = 0x0F;
    /// Anti-file indicator.
    pub const ANTI: u8 = 0x10;
    /// File names.
    pub const NAME: u8 = 0x11;
    /// Creation time.
    pub const CTIME: u8 = 0x12;
    /// Access time.
    pub const ATIME: u8 = 0x13;
    /// Modification time.
    pub const MTIME: u8 = 0x14;
    /// Windows file attributes.
    pub const WIN_ATTRIBUTES: u8 = 0x15;
    /// Comment.
    pub const COMMENT: u8 = 0x16;
    /// Encoded header.
    pub const ENCODED_HEADER: u8 = 0x17;
    /// Start position.
    pub const START_POS: u8 = 0x18;
    /// Dummy marker (padding).
    pub const DUMMY: u8 = 0x19;

    /// Returns the display name for a property ID, or `None` for IDs
    /// outside the known table.
    ///
    /// The full table is retained even though only a subset drives control
    /// flow: the names label skipped FilesInfo properties, and membership
    /// in this table is the terminator test for the SubStreamsInfo size
    /// scan.
    pub fn name(id: u8) -> Option<&'static str> {
        Some(match id {
            END => "kEnd",
            HEADER => "kHeader",
            ARCHIVE_PROPERTIES => "kArchiveProperties",
            ADDITIONAL_STREAMS_INFO => "kAdditionalStreamsInfo",
            MAIN_STREAMS_INFO => "kMainStreamsInfo",
            FILES_INFO => "kFilesInfo",
            PACK_INFO => "kPackInfo",
            UNPACK_INFO => "kUnPackInfo",
            SUBSTREAMS_INFO => "kSubStreamsInfo",
            SIZE => "kSize",
            CRC => "kCRC",
            FOLDER => "kFolder",
            CODERS_UNPACK_SIZE => "kCodersUnPackSize",
            NUM_UNPACK_STREAM => "kNumUnPackStream",
            EMPTY_STREAM => "kEmptyStream",
            EMPTY_FILE => "kEmptyFile",
            ANTI => "kAnti",
            NAME => "kName",
            CTIME => "kCTime",
            ATIME => "kATime",
            MTIME => "kMTime",
            WIN_ATTRIBUTES => "kWinAttributes",
            COMMENT => "kComment",
            ENCODED_HEADER => "kEncodedHeader",
            START_POS => "kStartPos",
            DUMMY => "kDummy",
            _ => return None,
        })
    }

    /// Returns true if the byte is a property ID in the known table.
    pub fn is_known(id: u8) -> bool {
        name(id).is_some()
    }
}
