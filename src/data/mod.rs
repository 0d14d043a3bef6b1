//! Document ingestion data model
//!
//! Provides the metadata and chunk types shared by the readers, the chunker,
//! the vector index, and the evaluation harness.

use serde::{Deserialize, Serialize};

pub mod chunker;
pub mod readers;

// Re-exports for convenience
pub use chunker::{chunk_text, ChunkConfig};
pub use readers::*;

/// Provenance metadata carried by every chunk
///
/// `page` and `slide_title` are only present for formats that expose them;
/// the gold-matching rule in evaluation treats a missing page as a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Display title of the source document (its file name)
    pub doc_title: String,
    /// Path the document was read from
    pub source_path: String,
    /// 1-indexed page number, when the format has pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Slide title, for slide-deck sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_title: Option<String>,
}

impl ChunkMetadata {
    /// Metadata for a whole-document source without page structure
    pub fn for_document(doc_title: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            doc_title: doc_title.into(),
            source_path: source_path.into(),
            page: None,
            slide_title: None,
        }
    }
}

/// One extracted unit of source text, before chunking
///
/// Whole file for text and Markdown, whole document for PDF; page-granular
/// when the format exposes pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A contiguous span of source-document text, the retrieval unit
///
/// Immutable once created; identity is positional within the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}
