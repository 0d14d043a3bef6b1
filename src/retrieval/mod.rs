//! Query-time retrieval
//!
//! Embeds a query and returns the nearest chunks from the vector index,
//! in descending relevance order.

use crate::data::ChunkMetadata;
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::store::MemoryIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One retrieved chunk with provenance and similarity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedItem {
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Similarity derived as `1 / (1 + distance)`; higher is better
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Trait for retrieval engines
pub trait Retriever: Send + Sync {
    /// Retrieve the top-k most relevant chunks for a query, best first
    ///
    /// An empty result is valid and means no match.
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedItem>>;

    /// Get the name of this retriever
    fn name(&self) -> &str;
}

/// Dense retriever over an injected index and embedder
///
/// Both collaborators are constructed by the caller and passed in; the
/// retriever holds no hidden state of its own.
pub struct VectorRetriever {
    index: MemoryIndex,
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    pub fn new(index: MemoryIndex, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }
}

impl Retriever for VectorRetriever {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedItem>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .map_err(|e| Error::Retrieval(format!("failed to embed query: {}", e)))?;

        let scored = self.index.query(&query_embedding, top_k)?;

        Ok(scored
            .into_iter()
            .map(|s| RetrievedItem {
                text: s.chunk.text,
                metadata: s.chunk.metadata,
                score: Some(1.0 / (1.0 + f64::from(s.distance))),
            })
            .collect())
    }

    fn name(&self) -> &str {
        "vector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Chunk, ChunkMetadata};
    use crate::embedding::HashedEmbedder;

    fn build_retriever(texts: &[&str]) -> VectorRetriever {
        let embedder = Arc::new(HashedEmbedder::new("hashed-bow", 128));
        let mut index = MemoryIndex::new("hashed-bow", 128);

        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Chunk::new(
                    *t,
                    ChunkMetadata::for_document(format!("doc{}.md", i), "/notes"),
                )
            })
            .collect();
        let embeddings = chunks
            .iter()
            .map(|c| embedder.embed(&c.text).unwrap())
            .collect();
        index.add(chunks, embeddings).unwrap();

        VectorRetriever::new(index, embedder)
    }

    #[test]
    fn test_retrieve_ranks_matching_text_first() {
        let retriever = build_retriever(&[
            "rust borrow checker ownership lifetimes",
            "gardening tips for tomato plants",
        ]);

        let results = retriever.retrieve("borrow checker ownership", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].text.contains("borrow checker"));
        assert!(results[0].score.unwrap() >= results[1].score.unwrap());
    }

    #[test]
    fn test_scores_are_similarities_in_unit_range() {
        let retriever = build_retriever(&["alpha beta", "gamma delta"]);
        let results = retriever.retrieve("alpha", 2).unwrap();

        for item in &results {
            let score = item.score.unwrap();
            // 1/(1+d) with cosine distance d in [0, 2]
            assert!(score > 0.0 && score <= 1.0);
        }
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let retriever = build_retriever(&[]);
        assert!(retriever.retrieve("anything", 5).unwrap().is_empty());
    }
}
