//! Runtime configuration
//!
//! All provider and path options are resolved once at startup from the
//! environment and threaded through as parameters. Leaf functions never
//! consult the environment themselves.

use std::env;
use std::path::PathBuf;

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Deterministic hashed bag-of-tokens vectors, no network or models
    Hashed,
    /// OpenAI embeddings API
    OpenAi,
}

impl EmbeddingProvider {
    fn parse(name: &str) -> Self {
        match name {
            "openai" => Self::OpenAi,
            "hashed" => Self::Hashed,
            other => {
                tracing::warn!("Unknown embedding provider '{}', using hashed", other);
                Self::Hashed
            }
        }
    }
}

/// Embedding backend settings
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Model name (used by the OpenAI backend and as the cache key)
    pub model: String,
    /// Vector dimension for the hashed backend
    pub dimension: usize,
    /// API key for the OpenAI backend, if present in the environment
    pub api_key: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashed,
            model: "hashed-bow".to_string(),
            dimension: 384,
            api_key: None,
        }
    }
}

/// Answer-generation settings
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Chat model name
    pub model: String,
    /// API key for the OpenAI backend, if present in the environment
    pub api_key: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key: None,
        }
    }
}

/// Top-level configuration, constructed once in `main` and passed by
/// reference into every command
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Directory holding the persisted vector index and embedding cache
    pub db_dir: PathBuf,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            db_dir: PathBuf::from("./data/index"),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl RagConfig {
    /// Resolve configuration from the environment
    ///
    /// Recognized variables: `STUDYRAG_DB_DIR`, `STUDYRAG_EMBED_PROVIDER`
    /// (`hashed` or `openai`), `STUDYRAG_EMBED_MODEL`, `STUDYRAG_EMBED_DIM`,
    /// `STUDYRAG_LLM_MODEL`, `OPENAI_API_KEY`. Unset variables fall back to
    /// the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let db_dir = env::var("STUDYRAG_DB_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_dir);

        let provider = env::var("STUDYRAG_EMBED_PROVIDER")
            .map(|v| EmbeddingProvider::parse(&v))
            .unwrap_or(defaults.embedding.provider);

        let model = match provider {
            EmbeddingProvider::OpenAi => env::var("STUDYRAG_EMBED_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            EmbeddingProvider::Hashed => defaults.embedding.model,
        };

        let dimension = env::var("STUDYRAG_EMBED_DIM")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.embedding.dimension);

        let llm_model =
            env::var("STUDYRAG_LLM_MODEL").unwrap_or(defaults.generation.model);
        let api_key = env::var("OPENAI_API_KEY").ok();

        Self {
            db_dir,
            embedding: EmbeddingSettings {
                provider,
                model,
                dimension,
                api_key: api_key.clone(),
            },
            generation: GenerationSettings {
                model: llm_model,
                api_key,
            },
        }
    }
}
