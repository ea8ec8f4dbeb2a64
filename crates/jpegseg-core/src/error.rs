//! Error types for the jpegseg-core library.
//!
//! Parse failures are fatal: the decomposer never hands back a partial
//! [`Image`](crate::Image). Every parse variant carries the byte offset at
//! which the stream stopped making sense.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for jpegseg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all jpegseg operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A byte expected to be the `0xFF` marker prefix was something else
    #[error("expected segment marker at offset {offset}, got {byte:#04x}")]
    MalformedStream {
        /// Byte offset of the offending byte
        offset: usize,
        /// The byte found instead of `0xFF`
        byte: u8,
    },

    /// The buffer ended inside a marker, length field or segment body
    #[error("unexpected end of stream at offset {offset}: need {needed} bytes, have {available}")]
    TruncatedStream {
        /// Byte offset of the unit being read
        offset: usize,
        /// Bytes required to complete the unit
        needed: usize,
        /// Bytes actually left in the buffer
        available: usize,
    },

    /// A restart marker appeared outside entropy-coded data
    #[error("unexpected RST{index} marker at offset {offset}")]
    UnexpectedRestartMarker {
        /// Byte offset of the marker prefix
        offset: usize,
        /// Restart index (0-7)
        index: u8,
    },

    /// Entropy-coded data ran to the end of the buffer without a terminating marker
    #[error("invalid entropy-coded data at offset {offset}: no terminating marker")]
    InvalidEntropyData {
        /// Byte offset where the scan data begins
        offset: usize,
    },

    /// The stream produced more units than the parser is configured to accept
    #[error("unit limit of {limit} exceeded")]
    UnitLimitExceeded {
        /// Configured maximum
        limit: usize,
    },

    /// Writing an image to a sink failed part way through
    #[error("write failed after {written} bytes: {source}")]
    Write {
        /// Bytes successfully written before the failure
        written: usize,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Creates a new malformed stream error
    pub fn malformed_stream(offset: usize, byte: u8) -> Self {
        Self::MalformedStream { offset, byte }
    }

    /// Creates a new truncated stream error
    pub fn truncated_stream(offset: usize, needed: usize, available: usize) -> Self {
        Self::TruncatedStream {
            offset,
            needed,
            available,
        }
    }

    /// Creates a new unexpected restart marker error
    pub fn unexpected_restart_marker(offset: usize, index: u8) -> Self {
        Self::UnexpectedRestartMarker { offset, index }
    }

    /// Creates a new invalid entropy data error
    pub fn invalid_entropy_data(offset: usize) -> Self {
        Self::InvalidEntropyData { offset }
    }

    /// Creates a new write error
    pub fn write(written: usize, source: std::io::Error) -> Self {
        Self::Write { written, source }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error describes a defect in the input stream
    /// rather than an I/O or configuration failure
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedStream { .. }
                | Self::TruncatedStream { .. }
                | Self::UnexpectedRestartMarker { .. }
                | Self::InvalidEntropyData { .. }
        )
    }

    /// Byte offset into the input where the stream failed, if known
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::MalformedStream { offset, .. }
            | Self::TruncatedStream { offset, .. }
            | Self::UnexpectedRestartMarker { offset, .. }
            | Self::InvalidEntropyData { offset } => Some(*offset),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::malformed_stream(12, 0x42);
        assert_eq!(
            err.to_string(),
            "expected segment marker at offset 12, got 0x42"
        );

        let err = Error::unexpected_restart_marker(4, 3);
        assert!(err.to_string().contains("RST3"));
    }

    #[test]
    fn test_is_parse_error() {
        assert!(Error::invalid_entropy_data(0).is_parse_error());
        assert!(Error::truncated_stream(0, 4, 1).is_parse_error());
        assert!(!Error::UnitLimitExceeded { limit: 1 }.is_parse_error());

        let missing = Error::file_read("/missing", std::io::ErrorKind::NotFound.into());
        assert!(!missing.is_parse_error());

        let denied = Error::directory_create("/out", std::io::ErrorKind::PermissionDenied.into());
        assert!(!denied.is_parse_error());
    }

    #[test]
    fn test_offset() {
        assert_eq!(Error::malformed_stream(7, 0x01).offset(), Some(7));
        assert_eq!(
            Error::write(3, std::io::ErrorKind::BrokenPipe.into()).offset(),
            None
        );
    }
}
