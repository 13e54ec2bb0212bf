//! Concrete decision providers

pub mod backend;
pub mod pipeline;

use std::sync::Arc;

pub use backend::{Backend, BackendKind, DeepSeekProvider, QwenProvider};
pub use pipeline::ProviderCore;

use crate::common::errors::{AiError, Result};
use crate::common::traits::Provider;
use crate::config::types::{AppConfig, ProviderKind};

/// Build the configured backend behind the [`Provider`] trait
pub fn build_provider(config: &AppConfig, kind: ProviderKind) -> Result<Arc<dyn Provider>> {
    let settings = config.provider(kind);
    if !settings.enabled {
        return Err(AiError::Configuration(format!("{} provider is disabled", kind)));
    }

    let provider: Arc<dyn Provider> = match kind {
        ProviderKind::DeepSeek => Arc::new(DeepSeekProvider::new(settings.clone(), &config.retry)?),
        ProviderKind::Qwen => Arc::new(QwenProvider::new(settings.clone(), &config.retry)?),
    };
    Ok(provider)
}
