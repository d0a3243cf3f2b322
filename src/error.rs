//! Error types for archive inspection.
//!
//! Inspection is deliberately hard to fail: truncated headers, unknown
//! property tags and out-of-range offsets all degrade to partial results
//! with warnings. The [`Error`] enum therefore only covers the two
//! conditions that make further work meaningless — the byte source
//! refusing a read, and input that is not a 7z archive at all.

use std::io;

/// The error type for archive inspection.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading from the byte source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a 7z archive (missing or malformed signature header).
    ///
    /// The string describes what was expected vs. found.
    #[error("Invalid 7z format: {0}")]
    InvalidFormat(String),
}

/// A specialized `Result` type for archive inspection.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_format() {
        let err = Error::InvalidFormat("bad signature".into());
        assert_eq!(err.to_string(), "Invalid 7z format: bad signature");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
