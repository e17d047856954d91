//! Generative commentary over the Gemini `generateContent` HTTP API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::ProviderError;
use crate::game::EventTag;

use super::CommentaryProvider;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Hype commentator backed by a hosted language model.
#[derive(Debug, Clone)]
pub struct GeminiCommentary {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiCommentary {
    /// Provider for `model` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Network` if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{API_BASE}/{model}:generateContent"),
            api_key: api_key.into(),
            timeout,
        })
    }

    /// Reads the key from [`API_KEY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::MissingApiKey` if the variable is unset or empty.
    pub fn from_env(model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey(API_KEY_ENV))?;
        Self::new(key, model, timeout)
    }
}

/// Prompt sent for one event.
#[must_use]
pub fn build_prompt(event: EventTag, score: u32) -> String {
    format!(
        "You are a hype football commentator. Provide a one-sentence reaction to this event: \
         \"{event}\". The current score is {score}. Keep it excited and banana-themed if possible!"
    )
}

fn extract_text(body: &[u8]) -> Result<String, ProviderError> {
    let response: GenerateResponse =
        serde_json::from_slice(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    Ok(response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join(" "))
}

#[async_trait::async_trait]
impl CommentaryProvider for GeminiCommentary {
    async fn narrate(&self, event: EventTag, score: u32) -> Result<String, ProviderError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(event, score) }] }]
        });

        debug!(event = %event, "requesting commentary");
        let request = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ProviderError::Timeout)??;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus(status.as_u16()));
        }

        let bytes = tokio::time::timeout(self.timeout, response.bytes())
            .await
            .map_err(|_| ProviderError::Timeout)??;
        extract_text(&bytes)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_event_and_score() {
        let prompt = build_prompt(EventTag::GoalScored, 2);
        assert!(prompt.contains("\"GOAL SCORED\""));
        assert!(prompt.contains("score is 2"));
    }

    #[test]
    fn extracts_candidate_text() {
        let body = br#"{"candidates":[{"content":{"parts":[{"text":"Bananas everywhere!"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "Bananas everywhere!");
    }

    #[test]
    fn no_candidates_is_empty_text() {
        assert_eq!(extract_text(br#"{"candidates":[]}"#).unwrap(), "");
        assert_eq!(extract_text(b"{}").unwrap(), "");
    }

    #[test]
    fn garbage_is_invalid_response() {
        assert!(matches!(
            extract_text(b"<html>"),
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
