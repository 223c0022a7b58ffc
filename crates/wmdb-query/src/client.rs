//! OpenAI-compatible chat-completions client for query parsing.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::fallback;
use crate::types::ParsedQuery;
use crate::QueryError;

const SYSTEM_PROMPT: &str = "You extract structured search filters from free-text \
luxury watch queries. Respond with a single JSON object and nothing else. Fields \
(all optional): brand (string), model (string), reference (string, the \
manufacturer reference number), min_price (string, numeric), max_price (string, \
numeric), min_condition (one of: new, unworn, excellent, very_good, good, fair), \
keywords (array of strings, any remaining descriptive terms). Omit fields you \
cannot determine. Do not wrap the JSON in markdown fences.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Parses free-text queries, preferring the remote model when configured.
pub struct QueryParser {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl QueryParser {
    /// Creates a parser. With `api_key = None` every call takes the
    /// deterministic fallback path.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("wmdb/0.1 (watch-market)")
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
        })
    }

    /// Parses `text` into structured filters. Never fails: any remote
    /// problem is logged at `warn!` and the fallback parser answers instead.
    pub async fn parse(&self, text: &str) -> ParsedQuery {
        if self.api_key.is_none() {
            return fallback::parse(text);
        }
        match self.parse_remote(text).await {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(error = %err, "remote query parsing failed — using fallback parser");
                fallback::parse(text)
            }
        }
    }

    /// The remote path on its own, surfacing errors instead of falling back.
    ///
    /// # Errors
    ///
    /// - [`QueryError::MissingApiKey`] when no key is configured.
    /// - [`QueryError::Http`] on network failure.
    /// - [`QueryError::UnexpectedStatus`] on a non-2xx response.
    /// - [`QueryError::EmptyResponse`] when the model returns no choices.
    /// - [`QueryError::Deserialize`] when the envelope or the model's JSON
    ///   payload does not parse.
    pub async fn parse_remote(&self, text: &str) -> Result<ParsedQuery, QueryError> {
        let api_key = self.api_key.as_ref().ok_or(QueryError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let envelope: ChatResponse =
            serde_json::from_str(&body).map_err(|e| QueryError::Deserialize {
                context: "chat/completions envelope".to_owned(),
                source: e,
            })?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(QueryError::EmptyResponse)?;

        // Models occasionally fence the JSON despite the instruction.
        let payload = strip_fences(&content);
        serde_json::from_str(payload).map_err(|e| QueryError::Deserialize {
            context: "model JSON payload".to_owned(),
            source: e,
        })
    }
}

/// Strips a leading/trailing markdown code fence, if present.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}
