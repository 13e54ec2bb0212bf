//! HTTP transport seam for completion calls

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use super::messages::{CompletionRequest, CompletionResponse};
use crate::common::errors::{AiError, Result};

/// Longest response body kept in a status error
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Sends one completion request; exactly one HTTP round trip per call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post_completion(
        &self,
        url: &str,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse>;
}

/// reqwest-backed transport with a fixed per-call timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Configuration(format!("failed to build http client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    #[instrument(skip(self, api_key, request), fields(model = %request.model))]
    async fn post_completion(
        &self,
        url: &str,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        debug!(messages = request.messages.len(), "http.request");

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let payload: CompletionResponse = response.json().await.map_err(classify_reqwest_error)?;
        debug!(choices = payload.choices.len(), "http.response");
        Ok(payload)
    }
}

/// Lift the error kinds reqwest exposes into typed variants
fn classify_reqwest_error(err: reqwest::Error) -> AiError {
    if err.is_timeout() {
        AiError::Timeout(err.to_string())
    } else if err.is_connect() {
        AiError::Network(err.to_string())
    } else {
        AiError::HttpRequest(err)
    }
}
