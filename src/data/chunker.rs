//! Word-window chunking
//!
//! Splits raw text on whitespace and emits overlapping windows of a fixed
//! number of words, rejoined with single spaces.

use serde::{Deserialize, Serialize};

/// Configuration for word-window chunking
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Window size in words
    pub chunk_size: usize,
    /// Words shared between consecutive windows
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 900,
            chunk_overlap: 120,
        }
    }
}

impl ChunkConfig {
    /// Chunk `text` with this configuration
    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.chunk_size, self.chunk_overlap)
    }
}

/// Split `text` into overlapping word windows
///
/// The window start advances by `chunk_size - chunk_overlap` words each step.
/// When `chunk_overlap >= chunk_size` the start would never advance, so
/// chunking stops after the current window instead of stalling. Whitespace-only
/// windows are dropped, and the walk terminates once a window's end reaches
/// the end of the word list.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();

    if chunk_size == 0 {
        return chunks;
    }

    let mut start = 0;
    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        let chunk = words[start..end].join(" ");
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
        if end == words.len() {
            break;
        }
        let next = end.saturating_sub(chunk_overlap);
        if next <= start {
            break;
        }
        start = next;
    }

    chunks
}
