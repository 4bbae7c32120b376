//! Error types for legacy XLS reading.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding a legacy XLS workbook.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// OLE/CFB container error.
    #[error("OLE/CFB error: {0}")]
    CfbError(String),

    /// A record payload ended before a fixed-size field could be read.
    #[error("Truncated record 0x{record_id:04X}: needed {expected} bytes, found {found}")]
    TruncatedRecord {
        /// Record id the payload belongs to.
        record_id: u16,
        /// Number of bytes the decoder needed.
        expected: usize,
        /// Number of bytes actually available.
        found: usize,
    },

    /// A record is framed correctly but its content is inconsistent.
    #[error("Malformed record 0x{record_id:04X}: {message}")]
    MalformedRecord {
        /// Record id the payload belongs to.
        record_id: u16,
        /// What was wrong with it.
        message: String,
    },

    /// A worksheet could not be decoded. Other sheets stay readable.
    #[error("Sheet '{name}' failed to parse: {message}")]
    SheetParseError {
        /// Sheet name as declared in the workbook globals.
        name: String,
        /// Underlying failure.
        message: String,
    },
}

impl Error {
    /// Whether this error describes a broken record (as opposed to I/O or
    /// container trouble).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::TruncatedRecord { .. } | Error::MalformedRecord { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        let truncated = Error::TruncatedRecord {
            record_id: 0x0203,
            expected: 14,
            found: 6,
        };
        assert!(truncated.is_structural());
        assert_eq!(
            truncated.to_string(),
            "Truncated record 0x0203: needed 14 bytes, found 6"
        );

        let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(!io.is_structural());
    }
}
