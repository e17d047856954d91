//! HTTP banana-puzzle provider.
//!
//! Each request to the puzzle API returns one image URL plus its numeric
//! solution. Requests for a sequence are issued in parallel and the whole
//! batch fails if any one of them does.

use std::time::Duration;

use futures::future::try_join_all;
use reqwest::redirect;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;

use super::{Challenge, ChallengeProvider};

/// Public banana puzzle endpoint.
pub const DEFAULT_BANANA_URL: &str = "https://marcconrad.com/uob/banana/api.php?out=json";

/// Maximum accepted response size (64 KB).
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct BananaResponse {
    question: String,
    solution: i64,
}

/// Fetches puzzles from the banana API.
#[derive(Debug, Clone)]
pub struct BananaApiProvider {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl BananaApiProvider {
    /// Provider for `url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Network` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::limited(3))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    async fn fetch_one(&self) -> Result<Challenge, ProviderError> {
        let response = tokio::time::timeout(self.timeout, self.client.get(&self.url).send())
            .await
            .map_err(|_| ProviderError::Timeout)??;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus(status.as_u16()));
        }

        let bytes = tokio::time::timeout(self.timeout, response.bytes())
            .await
            .map_err(|_| ProviderError::Timeout)??;

        if bytes.len() > MAX_RESPONSE_SIZE {
            return Err(ProviderError::InvalidResponse(format!(
                "response body exceeds {MAX_RESPONSE_SIZE} byte limit"
            )));
        }

        parse_response(&bytes)
    }
}

fn parse_response(bytes: &[u8]) -> Result<Challenge, ProviderError> {
    let body: BananaResponse =
        serde_json::from_slice(bytes).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    if body.question.trim().is_empty() {
        return Err(ProviderError::InvalidResponse("empty question".to_owned()));
    }
    Ok(Challenge::new(body.question, body.solution))
}

#[async_trait::async_trait]
impl ChallengeProvider for BananaApiProvider {
    async fn fetch_challenges(&self, count: usize) -> Result<Vec<Challenge>, ProviderError> {
        debug!(url = %self.url, count, "fetching banana puzzles");
        try_join_all((0..count).map(|_| self.fetch_one())).await
    }

    fn name(&self) -> &'static str {
        "banana"
    }
}
