//! Title/author extraction through an OpenAI-compatible chat-completions API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LlmConfig;
use crate::models::ExtractedGuess;
use crate::sources::{MetadataExtractor, ResolveError};
use crate::utils::HttpClient;

/// Instruction sent as the system message of every request
pub const SYSTEM_PROMPT: &str = "You will be provided with a part of an article. \
Please provide the title and the author. If a field is unknown, leave it as an empty string. \
Respond in the language of the article. Return only a JSON object with the keys \"title\" and \"author\".";

/// Language-model backed [`MetadataExtractor`]
#[derive(Debug, Clone)]
pub struct OpenAiExtractor {
    client: HttpClient,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiExtractor {
    pub fn new(config: &LlmConfig, client: HttpClient) -> Result<Self, ResolveError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ResolveError::Config(
                    "No API key for the language model. Set OPENAI_API_KEY or llm.api_key."
                        .to_string(),
                )
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl MetadataExtractor for OpenAiExtractor {
    async fn extract(&self, document_text: &str) -> Result<ExtractedGuess, ResolveError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: document_text,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                "Language model request failed with status {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            );
            return Err(ResolveError::Upstream {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let envelope: ChatResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::Parse(format!("Invalid completion envelope: {}", e)))?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ResolveError::Parse("Completion has no message content".to_string()))?;

        let guess = parse_guess(&content)?;
        tracing::debug!("Model guess: title={:?}, author={:?}", guess.title, guess.author);
        Ok(guess)
    }
}

/// Parse the model's message content into a guess.
///
/// Accepts a bare JSON object, one wrapped in a Markdown code fence (with or
/// without a line break after the opening backticks) or one embedded in
/// surrounding text. Arrays
/// of names are joined with a space; `null` counts as unknown. An object with
/// neither key is rejected.
pub(crate) fn parse_guess(content: &str) -> Result<ExtractedGuess, ResolveError> {
    let json = json_object_span(content);
    let value: Value = serde_json::from_str(json)?;

    let object = value
        .as_object()
        .ok_or_else(|| ResolveError::Parse(format!("Expected a JSON object, got: {}", json)))?;

    if !object.contains_key("title") && !object.contains_key("author") {
        return Err(ResolveError::Parse(format!(
            "Response lacks both title and author: {}",
            json
        )));
    }

    Ok(ExtractedGuess {
        title: field_text(object.get("title")),
        author: field_text(object.get("author")),
    })
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

/// Slice from the first `{` to the last `}`, which drops Markdown fences and
/// any prose the model wrapped around the object
fn json_object_span(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
