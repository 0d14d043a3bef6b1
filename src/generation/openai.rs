//! OpenAI chat-completions generation backend

use crate::error::{Error, Result};
use crate::generation::{
    citations_for, format_context, parse_quiz, prompts, Answer, Generator, Quiz,
};
use crate::retrieval::RetrievedItem;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Generator backed by the OpenAI chat completions API
pub struct OpenAiGenerator {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            model,
        }
    }

    fn chat(&self, system: &str, user: String) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .map_err(|e| Error::Generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::Generation(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| Error::Generation(format!("invalid response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Generation("response contained no message".to_string()))
    }
}

impl Generator for OpenAiGenerator {
    fn answer(&self, question: &str, context: &[RetrievedItem]) -> Result<Answer> {
        let user = format!(
            "QUESTION:\n{}\n\nCONTEXT:\n{}",
            question,
            format_context(context)
        );
        let text = self.chat(prompts::ANSWER_SYSTEM, user)?;

        Ok(Answer {
            text,
            citations: citations_for(context),
        })
    }

    fn summarize(&self, topic: &str, context: &[RetrievedItem]) -> Result<Answer> {
        let user = format!("TOPIC: {}\n\nCONTEXT:\n{}", topic, format_context(context));
        let text = self.chat(prompts::SUMMARY_SYSTEM, user)?;

        Ok(Answer {
            text,
            citations: citations_for(context),
        })
    }

    fn quiz(&self, topic: &str, context: &[RetrievedItem]) -> Result<Quiz> {
        let user = format!("TOPIC: {}\n\nCONTEXT:\n{}", topic, format_context(context));
        let text = self.chat(prompts::QUIZ_SYSTEM, user)?;
        Ok(parse_quiz(&text))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
