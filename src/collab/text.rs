//! Plain-text parser for `.txt` and `.md` uploads.
//!
//! Rich formats (`.docx`, `.pdf`) need extraction libraries and are left to
//! other [`Parser`] implementations; this one reports them as unsupported.

use std::io::Read as _;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use super::Parser;
use crate::document::ParsedDocument;
use crate::error::{ReviewError, ReviewResult};

/// Max bytes to check for binary content detection.
const BINARY_CHECK_BYTES: u64 = 8192;

const TEXT_PATTERNS: &[&str] = &["*.txt", "*.md"];

/// Reads UTF-8 text files verbatim, normalizing line endings to `\n`.
#[derive(Debug, Clone)]
pub struct PlainTextParser {
    accepted: GlobSet,
}

impl PlainTextParser {
    pub fn new() -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in TEXT_PATTERNS {
            builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
        }
        Ok(Self {
            accepted: builder.build()?,
        })
    }

    pub fn accepts(&self, file_name: &str) -> bool {
        self.accepted.is_match(file_name)
    }
}

impl Parser for PlainTextParser {
    fn parse(&self, path: &Path) -> ReviewResult<ParsedDocument> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_type = file_type_of(&file_name);

        if !self.accepts(&file_name) {
            return Err(ReviewError::UnsupportedFormat { file_type });
        }

        let io_err = |source| ReviewError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = std::fs::File::open(path).map_err(io_err)?;
        let mut head = Vec::new();
        file.by_ref()
            .take(BINARY_CHECK_BYTES)
            .read_to_end(&mut head)
            .map_err(io_err)?;
        if head.contains(&0) {
            return Err(ReviewError::ParseFailure {
                file_name,
                reason: "binary content in a text upload".to_owned(),
            });
        }

        let mut bytes = head;
        file.read_to_end(&mut bytes).map_err(io_err)?;
        let text = String::from_utf8(bytes).map_err(|e| ReviewError::ParseFailure {
            file_name: file_name.clone(),
            reason: format!("not valid UTF-8: {e}"),
        })?;

        debug!(file = file_name, bytes = text.len(), "parsed text upload");

        Ok(ParsedDocument {
            text: text.replace("\r\n", "\n"),
            file_name,
            file_type,
        })
    }
}

/// Lower-cased extension including the dot, or empty.
fn file_type_of(file_name: &str) -> String {
    file_name
        .rfind('.')
        .map(|i| file_name[i..].to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> PlainTextParser {
        PlainTextParser::new().expect("patterns compile")
    }

    #[test]
    fn test_parse_txt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("MSA.TXT");
        std::fs::write(&path, "1. Term.\r\n\r\n2. Payment.").expect("write");

        let doc = parser().parse(&path).expect("parse");
        assert_eq!(doc.text, "1. Term.\n\n2. Payment.");
        assert_eq!(doc.file_name, "MSA.TXT");
        assert_eq!(doc.file_type, ".txt");
    }

    #[test]
    fn test_parse_markdown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nda.md");
        std::fs::write(&path, "# NDA\n\nConfidentiality survives termination.").expect("write");
        assert_eq!(parser().parse(&path).expect("parse").file_type, ".md");
    }

    #[test]
    fn test_docx_unsupported() {
        let err = parser().parse(Path::new("/nonexistent/contract.docx")).expect_err("unsupported");
        match err {
            ReviewError::UnsupportedFormat { file_type } => assert_eq!(file_type, ".docx"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_binary_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fake.txt");
        std::fs::write(&path, b"PK\x03\x04\x00\x00").expect("write");
        assert!(matches!(
            parser().parse(&path),
            Err(ReviewError::ParseFailure { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io() {
        assert!(matches!(
            parser().parse(Path::new("/nonexistent/contract.txt")),
            Err(ReviewError::Io { .. })
        ));
    }
}
