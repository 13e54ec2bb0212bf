//! Concrete backends over the shared [`ProviderCore`]
//!
//! DeepSeek and DashScope (Qwen) speak the same chat-completion dialect, so a
//! backend differs only in its name and configuration defaults. Some DashScope
//! deployments return the text in `output_text`; that fallback is handled while
//! reading the response.

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

use super::pipeline::ProviderCore;
use crate::common::errors::Result;
use crate::common::traits::Provider;
use crate::common::types::{Article, SentimentSummary};
use crate::config::types::{ProviderConfig, ProviderKind, RetrySettings};
use crate::decision::context::DecisionRequest;
use crate::decision::response::DecisionResponse;
use crate::llm::client::ChatClient;
use crate::llm::credential::CredentialStore;
use crate::llm::transport::{ChatTransport, HttpTransport};

/// Static identity of a backend
pub trait BackendKind: Send + Sync + 'static {
    const KIND: ProviderKind;
}

#[derive(Debug, Clone, Copy)]
pub struct DeepSeek;

impl BackendKind for DeepSeek {
    const KIND: ProviderKind = ProviderKind::DeepSeek;
}

#[derive(Debug, Clone, Copy)]
pub struct Qwen;

impl BackendKind for Qwen {
    const KIND: ProviderKind = ProviderKind::Qwen;
}

/// Decision provider backed by DeepSeek
pub type DeepSeekProvider = Backend<DeepSeek>;

/// Decision provider backed by Qwen
pub type QwenProvider = Backend<Qwen>;

/// A decision provider for backend `B`
#[derive(Debug, Clone)]
pub struct Backend<B> {
    core: ProviderCore,
    _kind: PhantomData<B>,
}

impl<B: BackendKind> Backend<B> {
    /// Create a provider using a reqwest transport with the configured timeout
    pub fn new(config: ProviderConfig, retry: &RetrySettings) -> Result<Self> {
        let config = config.normalized(B::KIND)?;
        let transport = HttpTransport::new(config.timeout())?;
        Ok(Self::build(&config, retry, Arc::new(transport)))
    }

    /// Create a provider over a caller-supplied transport
    pub fn with_transport(
        config: ProviderConfig,
        retry: &RetrySettings,
        transport: Arc<dyn ChatTransport>,
    ) -> Result<Self> {
        let config = config.normalized(B::KIND)?;
        Ok(Self::build(&config, retry, transport))
    }

    fn build(config: &ProviderConfig, retry: &RetrySettings, transport: Arc<dyn ChatTransport>) -> Self {
        let chat = ChatClient::new(B::KIND.as_str(), config, retry.policy(), transport);
        Self {
            core: ProviderCore::new(chat, config.confidence_scale),
            _kind: PhantomData,
        }
    }

    /// Shared key slot; rotating it affects in-flight retry loops too
    pub fn credentials(&self) -> &CredentialStore {
        self.core.chat.credentials()
    }

    pub async fn set_api_key(&self, key: &str) {
        self.credentials().set(key).await;
    }
}

#[async_trait]
impl<B: BackendKind> Provider for Backend<B> {
    async fn analyze_news(&self, articles: &[Article]) -> Result<SentimentSummary> {
        self.core.analyze_news(articles).await
    }

    async fn generate_decision(&self, request: &DecisionRequest) -> Result<DecisionResponse> {
        self.core.generate_decision(request).await
    }

    fn provider_name(&self) -> &'static str {
        B::KIND.as_str()
    }
}
