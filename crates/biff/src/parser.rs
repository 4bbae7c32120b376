//! Compound file entry point.
//!
//! Locates the BIFF stream inside the OLE2 container, copies it into memory
//! and hands it to [`Workbook::from_stream`].

use crate::workbook::Workbook;
use cfb::CompoundFile;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use xls_core::{Error, Result};

/// Stream names tried in order: BIFF8 writes "Workbook", BIFF5 writes "Book".
const DEFAULT_STREAM_NAMES: [&str; 2] = ["Workbook", "Book"];

/// Parser for legacy XLS (OLE/CFB) files.
pub struct XlsParser {
    stream_names: Vec<String>,
}

impl XlsParser {
    /// Create a parser looking for the standard workbook streams.
    pub fn new() -> Self {
        Self {
            stream_names: DEFAULT_STREAM_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Look for these stream names instead, in preference order.
    pub fn with_stream_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stream_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a workbook from a compound file.
    ///
    /// A container without any of the expected streams yields an empty
    /// workbook rather than an error.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Workbook<Cursor<Vec<u8>>>> {
        let mut cfb = CompoundFile::open(reader)
            .map_err(|e| Error::CfbError(format!("Failed to open CFB container: {}", e)))?;

        let Some(path) = self.find_stream(&cfb) else {
            log::warn!(
                "No workbook stream found (looked for {:?}); returning an empty workbook",
                self.stream_names
            );
            return Ok(Workbook::empty());
        };

        let mut stream = cfb.open_stream(&path).map_err(|e| {
            Error::CfbError(format!("Failed to open stream {}: {}", path.display(), e))
        })?;

        let mut data = Vec::new();
        stream
            .read_to_end(&mut data)
            .map_err(|e| Error::CfbError(format!("Failed to read stream: {}", e)))?;

        log::debug!("Read {} bytes from {}", data.len(), path.display());
        Workbook::from_stream(Cursor::new(data))
    }

    /// Path of the preferred workbook stream present in the container.
    fn find_stream<R: Read + Seek>(&self, cfb: &CompoundFile<R>) -> Option<PathBuf> {
        let streams: Vec<(String, PathBuf)> = cfb
            .walk()
            .filter(|entry| entry.is_stream())
            .map(|entry| (entry.name().to_string(), entry.path().to_path_buf()))
            .collect();

        self.stream_names.iter().find_map(|wanted| {
            streams
                .iter()
                .find(|(name, _)| name == wanted)
                .map(|(_, path)| path.clone())
        })
    }
}

impl Default for XlsParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Open an `.xls` file from disk.
pub fn open(path: impl AsRef<Path>) -> Result<Workbook<Cursor<Vec<u8>>>> {
    let file = File::open(path.as_ref())?;
    XlsParser::new().parse(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stream_names() {
        let parser = XlsParser::default();
        assert_eq!(parser.stream_names, vec!["Workbook", "Book"]);

        let parser = XlsParser::new().with_stream_names(["Book"]);
        assert_eq!(parser.stream_names, vec!["Book"]);
    }

    #[test]
    fn test_invalid_container_is_cfb_error() {
        let err = XlsParser::new()
            .parse(Cursor::new(vec![0u8; 64]))
            .err()
            .unwrap();
        assert!(matches!(err, Error::CfbError(_)));
    }
}
