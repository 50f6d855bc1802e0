//! HTTP completion client.
//!
//! POSTs a [`CompletionRequest`] as JSON and expects `{"response": "..."}`
//! back. Every non-2xx status, transport error, or unparsable body is mapped
//! to a [`CompletionError`]; there is no retry.

use async_trait::async_trait;
use quanta_config::CompletionConfig;
use quanta_core::completion::{CompletionRequest, CompletionResponse, CompletionService};
use quanta_core::error::CompletionError;
use std::time::Duration;
use tracing::{debug, warn};

/// A completion service reached over HTTP.
pub struct HttpCompletionClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpCompletionClient {
    /// Create a client posting to `{base_url}{path}`.
    pub fn new(
        base_url: impl Into<String>,
        path: impl AsRef<str>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::NotConfigured(format!("HTTP client: {e}")))?;

        let base_url = base_url.into();
        let path = path.as_ref();
        let endpoint = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        Ok(Self {
            endpoint,
            api_key: None,
            client,
        })
    }

    /// Create a client from the `[completion]` config section.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let client = Self::new(&config.base_url, &config.path, config.http_timeout())?;
        Ok(match &config.api_key {
            Some(key) => client.with_api_key(key),
            None => client,
        })
    }

    /// Send `key` as a bearer token.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionService for HttpCompletionClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionError> {
        debug!(
            endpoint = %self.endpoint,
            agent = %request.agent,
            context = request.context.len(),
            "Sending completion request"
        );

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Completion service returned error");
            return Err(CompletionError::ApiError {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        serde_json::from_slice::<CompletionResponse>(&body)
            .map_err(|e| CompletionError::MalformedResponse(format!("Failed to parse response: {e}")))
    }
}
