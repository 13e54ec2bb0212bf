//! LLM Trade Decision Library
//!
//! Turns a snapshot of an account and its markets into a validated trading
//! decision by prompting an LLM backend (DeepSeek or Qwen), parsing its
//! free-form reply and checking it against hard risk limits.

pub mod common;
pub mod config;
pub mod decision;
pub mod llm;
pub mod providers;

// Re-export commonly used types
pub use common::errors::{AiError, Result};
pub use common::traits::Provider;
pub use common::types::{Article, SentimentSummary};
pub use config::types::{AppConfig, ConfidenceScale, ProviderConfig, ProviderKind, RetrySettings};
pub use decision::{
    parse_decision, strip_code_fence, validate_decision, AdjustmentPlan, DecisionAction,
    DecisionContext, DecisionRequest, DecisionResponse, ParsedDecision, PromptBuilder, Prompts,
    RiskLimits,
};
pub use llm::{ChatClient, ChatTransport, CredentialStore, HttpTransport, RetryPolicy};
pub use providers::{build_provider, DeepSeekProvider, QwenProvider};
