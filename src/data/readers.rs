//! Document readers for the supported note formats
//!
//! Each reader turns one file into source records carrying provenance
//! metadata. Failures are returned to the caller; deciding whether to skip a
//! bad file or abort the run belongs to the ingestion orchestrator, not the
//! reader.

use crate::data::{ChunkMetadata, SourceRecord};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Capability to extract text records from one document format
pub trait DocumentReader {
    /// Extract all source records from the file at `path`
    fn read(&self, path: &Path) -> Result<Vec<SourceRecord>>;

    /// Check whether this reader handles the given file
    fn can_read(&self, path: &Path) -> bool;
}

fn doc_title(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn read_whole_file(path: &Path) -> Result<Vec<SourceRecord>> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Reader(format!("failed to read {}: {}", path.display(), e)))?;

    Ok(vec![SourceRecord {
        text,
        metadata: ChunkMetadata::for_document(doc_title(path), path.to_string_lossy()),
    }])
}

/// Plain-text reader (`.txt`)
pub struct TextReader;

impl DocumentReader for TextReader {
    fn read(&self, path: &Path) -> Result<Vec<SourceRecord>> {
        read_whole_file(path)
    }

    fn can_read(&self, path: &Path) -> bool {
        matches!(path.extension().and_then(|e| e.to_str()), Some("txt"))
    }
}

/// Markdown reader (`.md`, `.markdown`)
pub struct MarkdownReader;

impl DocumentReader for MarkdownReader {
    fn read(&self, path: &Path) -> Result<Vec<SourceRecord>> {
        read_whole_file(path)
    }

    fn can_read(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("md") | Some("markdown")
        )
    }
}

/// PDF reader (`.pdf`), available with the `pdf` feature
///
/// `pdf-extract` yields the document's text as a whole, so PDF records carry
/// no page number.
pub struct PdfReader;

impl DocumentReader for PdfReader {
    fn read(&self, _path: &Path) -> Result<Vec<SourceRecord>> {
        #[cfg(feature = "pdf")]
        {
            let text = pdf_extract::extract_text(_path).map_err(|e| {
                Error::Reader(format!(
                    "failed to extract text from {}: {}",
                    _path.display(),
                    e
                ))
            })?;

            Ok(vec![SourceRecord {
                text,
                metadata: ChunkMetadata::for_document(
                    doc_title(_path),
                    _path.to_string_lossy(),
                ),
            }])
        }

        #[cfg(not(feature = "pdf"))]
        {
            Err(Error::Reader(
                "PDF support not enabled. Compile with --features pdf".to_string(),
            ))
        }
    }

    fn can_read(&self, path: &Path) -> bool {
        matches!(path.extension().and_then(|e| e.to_str()), Some("pdf"))
    }
}

/// Reader that delegates to the format-specific readers
pub struct CompositeReader {
    readers: Vec<Box<dyn DocumentReader>>,
}

impl CompositeReader {
    pub fn new() -> Self {
        let readers: Vec<Box<dyn DocumentReader>> = vec![
            Box::new(TextReader),
            Box::new(MarkdownReader),
            Box::new(PdfReader),
        ];
        Self { readers }
    }

    /// Whether any registered reader handles this file
    pub fn can_read(&self, path: &Path) -> bool {
        self.readers.iter().any(|r| r.can_read(path))
    }

    /// Read a single file with the appropriate reader
    pub fn read(&self, path: &Path) -> Result<Vec<SourceRecord>> {
        for reader in &self.readers {
            if reader.can_read(path) {
                return reader.read(path);
            }
        }
        Err(Error::Reader(format!(
            "unsupported file type: {}",
            path.display()
        )))
    }

    /// Read every supported file under `dir`, recursively
    ///
    /// Policy: a file that fails to read is logged and skipped so one corrupt
    /// note cannot abort a whole corpus ingestion; unsupported extensions are
    /// skipped silently at debug level.
    pub fn read_directory(&self, dir: &Path) -> Result<Vec<SourceRecord>> {
        let mut records = Vec::new();

        let entries = fs::read_dir(dir)
            .map_err(|e| Error::Reader(format!("failed to read directory {}: {}", dir.display(), e)))?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                records.extend(self.read_directory(&path)?);
            } else if self.can_read(&path) {
                match self.read(&path) {
                    Ok(recs) => records.extend(recs),
                    Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
                }
            } else {
                tracing::debug!("Ignoring unsupported file: {}", path.display());
            }
        }

        Ok(records)
    }
}

impl Default for CompositeReader {
    fn default() -> Self {
        Self::new()
    }
}
