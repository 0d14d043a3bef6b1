//! Vector index
//!
//! Brute-force exact-search index over chunk embeddings, persisted as a
//! single JSON file. A personal note corpus is small enough that exact cosine
//! scan beats maintaining an approximate index.

use crate::data::Chunk;
use crate::embedding::{cosine_similarity, Embedding};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const INDEX_FILE: &str = "index.json";

/// Index header, persisted alongside the entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Model name used for the stored embeddings
    pub model_name: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Number of chunks indexed
    pub num_chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Embedding,
}

/// A chunk scored against a query embedding
///
/// `distance` is cosine distance (`1 - cosine similarity`); lower is closer.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// In-memory vector index with JSON persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryIndex {
    metadata: IndexMetadata,
    entries: Vec<IndexEntry>,
}

impl MemoryIndex {
    /// Create an empty index for the given embedding model
    pub fn new(model_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            metadata: IndexMetadata {
                model_name: model_name.into(),
                dimension,
                num_chunks: 0,
            },
            entries: Vec::new(),
        }
    }

    /// Add chunks with their embeddings
    pub fn add(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Embedding>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::Store(format!(
                "chunk count ({}) does not match embedding count ({})",
                chunks.len(),
                embeddings.len()
            )));
        }

        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            if embedding.len() != self.metadata.dimension {
                return Err(Error::Store(format!(
                    "embedding dimension {} does not match index dimension {}",
                    embedding.len(),
                    self.metadata.dimension
                )));
            }
            self.entries.push(IndexEntry { chunk, embedding });
        }

        self.metadata.num_chunks = self.entries.len();
        Ok(())
    }

    /// Return the `top_k` nearest chunks by cosine distance, ascending
    pub fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                distance: 1.0 - cosine_similarity(embedding, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(top_k);
        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    /// Persist the index under `dir` (created if missing)
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let path = dir.join(INDEX_FILE);
        let json = serde_json::to_string(self)?;
        fs::write(&path, json)?;
        tracing::debug!("Saved {} chunks to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Load the index under `dir`, or start a fresh one if none exists yet
    ///
    /// An existing but unreadable index is an error, not grounds for a
    /// silent rebuild.
    pub fn load_or_new(dir: &Path, model_name: &str, dimension: usize) -> Result<Self> {
        if dir.join(INDEX_FILE).exists() {
            Self::load(dir, model_name)
        } else {
            Ok(Self::new(model_name, dimension))
        }
    }

    /// Load a persisted index from `dir`
    ///
    /// `expected_model` guards against querying with vectors from a different
    /// embedder than the one that built the index.
    pub fn load(dir: &Path, expected_model: &str) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        let json = fs::read_to_string(&path).map_err(|e| {
            Error::Store(format!(
                "failed to read index at {} (run `studyrag ingest` first): {}",
                path.display(),
                e
            ))
        })?;
        let index: Self = serde_json::from_str(&json)?;

        if index.metadata.model_name != expected_model {
            tracing::warn!(
                "Embedder model mismatch: index={}, configured={}",
                index.metadata.model_name,
                expected_model
            );
        }

        Ok(index)
    }
}
