//! Embedding backend implementations
//!
//! The hashed backend is the default: deterministic, offline, good enough for
//! a small personal corpus. The OpenAI backend calls the embeddings API.

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::embedding::{normalize_embedding, Embedder, Embedding};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Deterministic bag-of-hashed-tokens embedder
///
/// Each token is hashed to a vector position; the counts are term-frequency
/// scaled and L2-normalized. No models, no network.
pub struct HashedEmbedder {
    model: String,
    dimension: usize,
}

impl HashedEmbedder {
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
        }
    }

    fn generate(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0; self.dimension];

        let tokens: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            return embedding;
        }

        for token in &tokens {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.dimension;
            embedding[idx] += 1.0;
        }

        let total = tokens.len() as f32;
        for val in embedding.iter_mut() {
            *val /= total;
        }

        normalize_embedding(&mut embedding);
        embedding
    }
}

impl Embedder for HashedEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.generate(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|&t| self.generate(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI embeddings API backend
pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: String, dimension: usize) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            model,
            dimension,
        }
    }

    fn request(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let body = EmbeddingRequest {
            input: texts.iter().map(|t| (*t).to_string()).collect(),
            model: self.model.clone(),
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .map_err(|e| Error::Embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::Embedding(format!("HTTP {}: {}", status, body)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| Error::Embedding(format!("invalid response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        self.request(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("empty response".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Create an embedder from resolved settings
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::Hashed => Ok(Arc::new(HashedEmbedder::new(
            settings.model.clone(),
            settings.dimension,
        ))),
        EmbeddingProvider::OpenAi => {
            let api_key = settings.api_key.clone().ok_or_else(|| {
                Error::Embedding("OPENAI_API_KEY not set for the openai provider".to_string())
            })?;
            Ok(Arc::new(OpenAiEmbedder::new(
                api_key,
                settings.model.clone(),
                settings.dimension,
            )))
        }
    }
}
