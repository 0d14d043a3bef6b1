//! Persistent embedding cache
//!
//! SQLite-backed cache keyed on (text hash, model name), so re-ingesting an
//! unchanged corpus never re-embeds a chunk.

use crate::embedding::Embedding;
use crate::error::Result;
use rusqlite::{params, Connection};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Embedding cache backed by SQLite
pub struct EmbeddingCache {
    conn: Connection,
    model_name: String,
}

impl EmbeddingCache {
    /// Open (or create) a cache database at `db_path`
    pub fn open(db_path: &Path, model_name: String) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS vectors (
                text_hash TEXT NOT NULL,
                model TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                vector BLOB NOT NULL,
                PRIMARY KEY (text_hash, model)
            )",
            [],
        )?;

        Ok(Self { conn, model_name })
    }

    fn hash_text(text: &str) -> String {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    fn encode(embedding: &Embedding) -> Vec<u8> {
        embedding.iter().flat_map(|&f| f.to_le_bytes()).collect()
    }

    fn decode(bytes: &[u8]) -> Result<Embedding> {
        if bytes.len() % 4 != 0 {
            return Err(crate::Error::Store(
                "invalid cached vector length".to_string(),
            ));
        }
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Look up a cached vector for `text`
    pub fn get(&self, text: &str) -> Result<Option<Embedding>> {
        let result = self.conn.query_row(
            "SELECT vector FROM vectors WHERE text_hash = ?1 AND model = ?2",
            params![Self::hash_text(text), self.model_name],
            |row| row.get::<_, Vec<u8>>(0),
        );

        match result {
            Ok(bytes) => Ok(Some(Self::decode(&bytes)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store a vector for `text`
    pub fn put(&self, text: &str, embedding: &Embedding) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO vectors (text_hash, model, dimension, vector)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                Self::hash_text(text),
                self.model_name,
                embedding.len() as i64,
                Self::encode(embedding)
            ],
        )?;
        Ok(())
    }

    /// Get a cached vector or compute and store it
    pub fn get_or_compute<F>(&self, text: &str, compute: F) -> Result<Embedding>
    where
        F: FnOnce(&str) -> Result<Embedding>,
    {
        if let Some(embedding) = self.get(text)? {
            tracing::debug!("Cache hit ({} floats)", embedding.len());
            return Ok(embedding);
        }

        let embedding = compute(text)?;
        self.put(text, &embedding)?;
        Ok(embedding)
    }

    /// Number of cached vectors for the current model
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM vectors WHERE model = ?1",
            params![self.model_name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_put_get() {
        let file = NamedTempFile::new().unwrap();
        let cache = EmbeddingCache::open(file.path(), "test-model".to_string()).unwrap();

        assert!(cache.get("hello").unwrap().is_none());

        let embedding = vec![1.0, 2.0, 3.0];
        cache.put("hello", &embedding).unwrap();

        assert_eq!(cache.get("hello").unwrap().unwrap(), embedding);
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_get_or_compute_only_computes_once() {
        let file = NamedTempFile::new().unwrap();
        let cache = EmbeddingCache::open(file.path(), "test-model".to_string()).unwrap();

        let mut calls = 0;
        let first = cache
            .get_or_compute("some text", |_| {
                calls += 1;
                Ok(vec![4.0, 5.0])
            })
            .unwrap();
        assert_eq!(first, vec![4.0, 5.0]);
        assert_eq!(calls, 1);

        let second = cache
            .get_or_compute("some text", |_| {
                calls += 1;
                Ok(vec![9.0, 9.0])
            })
            .unwrap();
        assert_eq!(second, vec![4.0, 5.0]);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_models_are_isolated() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let a = EmbeddingCache::open(&path, "model-a".to_string()).unwrap();
        a.put("shared text", &vec![1.0]).unwrap();
        drop(a);

        let b = EmbeddingCache::open(&path, "model-b".to_string()).unwrap();
        assert!(b.get("shared text").unwrap().is_none());
        assert_eq!(b.len().unwrap(), 0);
    }
}
