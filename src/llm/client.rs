//! Chat-completion client shared by the provider adapters

use std::sync::Arc;
use tracing::{debug, instrument};

use super::credential::CredentialStore;
use super::messages::{ChatMessage, CompletionRequest};
use super::retry::{Retried, RetryPolicy};
use super::transport::ChatTransport;
use crate::common::errors::Result;
use crate::config::types::ProviderConfig;

/// Completion client for one OpenAI-compatible backend
#[derive(Clone)]
pub struct ChatClient {
    /// Backend name used in errors and logs
    provider: &'static str,
    /// Full completion URL
    endpoint: String,
    model: String,
    temperature: f64,
    top_p: f64,
    max_tokens: Option<u32>,
    /// Read again before every attempt so rotation takes effect mid-retry
    credential: CredentialStore,
    retry: RetryPolicy,
    transport: Arc<dyn ChatTransport>,
}

impl ChatClient {
    /// Create a client from backend settings
    pub fn new(
        provider: &'static str,
        config: &ProviderConfig,
        retry: RetryPolicy,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            provider,
            endpoint: config.endpoint(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            credential: CredentialStore::with_key(config.api_key.as_deref().unwrap_or_default()),
            retry,
            transport,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Shared handle to the API key slot
    pub fn credentials(&self) -> &CredentialStore {
        &self.credential
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn build_request(&self, system: &str, user: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        }
    }

    /// Send a system/user prompt pair and return the assistant text
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        Ok(self.complete_traced(system, user).await?.value)
    }

    /// Like [`complete`](Self::complete), also reporting the retries it took
    ///
    /// A missing key fails before any request is sent.
    #[instrument(skip(self, system, user), fields(provider = self.provider, model = %self.model))]
    pub async fn complete_traced(&self, system: &str, user: &str) -> Result<Retried<String>> {
        self.credential.require(self.provider).await?;

        let request = self.build_request(system, user);
        let request = &request;

        self.retry
            .run(|attempt| async move {
                let api_key = self.credential.require(self.provider).await?;
                debug!(attempt, "completion.attempt");
                self.transport
                    .post_completion(&self.endpoint, &api_key, request)
                    .await?
                    .into_content()
            })
            .await
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
