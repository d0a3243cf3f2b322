//! A structural inspector for 7z archive containers.
//!
//! `sevenz-inspect` decodes the metadata of a 7z archive — the signature
//! header, the property-tree "next header", folder and coder definitions,
//! and the file table — and accounts for every byte region of the file,
//! without ever decompressing payload data. It is built for forensics,
//! triage, and format tooling: corrupt, truncated, and hostile inputs
//! produce a best-effort decode plus warnings instead of errors.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use sevenz_inspect::{scan, NullSink, ReadSeekSource};
//!
//! # fn main() -> sevenz_inspect::Result<()> {
//! let file = File::open("archive.7z")?;
//! let mut source = ReadSeekSource::new(file);
//! let summary = scan(&mut source, &mut NullSink)?;
//!
//! println!("{} byte(s) of archive data", summary.layout.end_of_archive_data);
//! if let Some(header) = &summary.header {
//!     for folder in header.folders() {
//!         println!("folder: {}", folder.pipeline());
//!     }
//!     for name in header.file_names() {
//!         println!("file: {name}");
//!     }
//! }
//! for warning in &summary.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//!
//! Only two conditions are fatal: an I/O error from the byte source, and
//! a file too small or wrongly signed to be a 7z archive at all. Past the
//! signature header the decoder never fails — reads beyond the end of a
//! truncated buffer yield zeros, unrecognized property tags end the loop
//! level that met them, and counts from hostile headers are clamped by
//! [`Limits`]. Every decoded field is reported to a [`StructureSink`]
//! with its absolute byte range, so a caller can render an annotated
//! hex view or a structure tree from one pass.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod format;
pub mod inspect;
pub mod layout;
pub mod sink;
pub mod source;

pub use error::{Error, Result};
pub use format::files::FilesInfo;
pub use format::header::SignatureHeader;
pub use format::parser::{decode_header, ArchiveHeader, HeaderDecode};
pub use format::streams::{Coder, Folder, Limits, PackInfo, SubStreamsInfo, UnpackInfo};
pub use inspect::{scan, scan_with_limits, ArchiveSummary};
pub use layout::{ArchiveLayout, Overlay};
pub use sink::{FieldValue, Node, NullSink, StructureSink, TreeSink};
pub use source::{ByteSource, ReadSeekSource};
