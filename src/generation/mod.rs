//! Grounded text generation
//!
//! Answer, summary, and quiz generation over retrieved context, with one
//! citation per context chunk. The generated text itself is opaque; only the
//! text-plus-citations interface matters to the rest of the system.

use crate::config::GenerationSettings;
use crate::error::{Error, Result};
use crate::retrieval::RetrievedItem;
use serde::{Deserialize, Serialize};

pub mod openai;
pub mod prompts;

pub use openai::OpenAiGenerator;

/// Provenance reference attached to a generated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub doc_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_title: Option<String>,
    pub source_path: String,
}

/// A generated response grounded in retrieved context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// A multiple-choice quiz question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub rationale: String,
}

/// A generated quiz
///
/// When the model's output cannot be parsed as structured questions, the raw
/// text is kept instead of being discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Trait for grounded generation backends
pub trait Generator: Send + Sync {
    /// Answer a question using only the retrieved context
    fn answer(&self, question: &str, context: &[RetrievedItem]) -> Result<Answer>;

    /// Produce a short guided summary of a topic from the context
    fn summarize(&self, topic: &str, context: &[RetrievedItem]) -> Result<Answer>;

    /// Produce a multiple-choice quiz on a topic from the context
    fn quiz(&self, topic: &str, context: &[RetrievedItem]) -> Result<Quiz>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create a generator from resolved settings
pub fn create_generator(settings: &GenerationSettings) -> Result<Box<dyn Generator>> {
    let api_key = settings.api_key.clone().ok_or_else(|| {
        Error::Generation("OPENAI_API_KEY not set; pass --no-answer to skip generation".to_string())
    })?;
    Ok(Box::new(OpenAiGenerator::new(
        api_key,
        settings.model.clone(),
    )))
}

/// Format retrieved chunks as a numbered context block for prompting
pub fn format_context(context: &[RetrievedItem]) -> String {
    let mut parts = Vec::with_capacity(context.len());

    for (i, item) in context.iter().enumerate() {
        let meta = &item.metadata;
        let mut loc = match meta.page {
            Some(page) => format!("(p.{})", page),
            None => String::new(),
        };
        if let Some(slide) = &meta.slide_title {
            if loc.is_empty() {
                loc = slide.clone();
            } else {
                loc = format!("{} - {}", loc, slide);
            }
        }
        parts.push(format!("[{}] {} {}\n{}", i + 1, meta.doc_title, loc, item.text));
    }

    parts.join("\n\n")
}

/// One citation per retrieved chunk, in retrieval order
pub fn citations_for(context: &[RetrievedItem]) -> Vec<Citation> {
    context
        .iter()
        .map(|item| Citation {
            doc_title: item.metadata.doc_title.clone(),
            page: item.metadata.page,
            slide_title: item.metadata.slide_title.clone(),
            source_path: item.metadata.source_path.clone(),
        })
        .collect()
}

/// Parse a quiz from model output
///
/// The model is asked for JSON but replies with prose around it often enough
/// that we extract the outermost brace-delimited block; anything unparseable
/// falls back to the raw text.
pub fn parse_quiz(text: &str) -> Quiz {
    let start = text.find('{');
    let end = text.rfind('}');

    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            if let Ok(quiz) = serde_json::from_str::<Quiz>(&text[start..=end]) {
                return quiz;
            }
        }
    }

    Quiz {
        questions: Vec::new(),
        raw: Some(text.to_string()),
    }
}
