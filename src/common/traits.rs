//! Trait definitions for decision providers

use async_trait::async_trait;

use super::errors::Result;
use super::types::{Article, SentimentSummary};
use crate::decision::context::DecisionRequest;
use crate::decision::response::DecisionResponse;

/// Trait for LLM-backed decision providers (DeepSeek, Qwen, etc.)
///
/// Implementations hold a credential, an HTTP transport and static settings,
/// nothing else. Each call is a self-contained request/response cycle, so a
/// single provider may be shared across symbol pipelines.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Summarize a batch of news articles into a sentiment reading
    ///
    /// An empty batch yields a neutral summary without touching the network.
    async fn analyze_news(&self, articles: &[Article]) -> Result<SentimentSummary>;

    /// Turn a decision request into a parsed and validated decision
    async fn generate_decision(&self, request: &DecisionRequest) -> Result<DecisionResponse>;

    /// Get the name of the backend
    fn provider_name(&self) -> &'static str;
}
