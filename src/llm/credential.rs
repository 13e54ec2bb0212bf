//! Hot-rotatable API key holder

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::common::errors::{AiError, Result};

/// Shared, rotatable API key
///
/// Every outbound call reads the current value, so an operator can rotate the
/// key while decision pipelines keep running. Clones share the same slot.
#[derive(Clone, Default)]
pub struct CredentialStore {
    key: Arc<RwLock<Option<String>>>,
}

impl CredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `key`; blank keys count as unset
    pub fn with_key(key: impl AsRef<str>) -> Self {
        Self {
            key: Arc::new(RwLock::new(normalize(key.as_ref()))),
        }
    }

    /// Replace the key; a blank value clears it
    pub async fn set(&self, key: &str) {
        let normalized = normalize(key);
        let masked = normalized.as_deref().map(mask_key).unwrap_or_default();
        *self.key.write().await = normalized;
        info!(masked = %masked, "api key updated");
    }

    /// Remove the key
    pub async fn clear(&self) {
        *self.key.write().await = None;
        info!("api key cleared");
    }

    /// Current key, if any
    pub async fn current(&self) -> Option<String> {
        self.key.read().await.clone()
    }

    pub async fn is_configured(&self) -> bool {
        self.key.read().await.is_some()
    }

    /// Current key, or a configuration error naming the provider
    pub async fn require(&self, provider: &str) -> Result<String> {
        self.current()
            .await
            .ok_or_else(|| AiError::Configuration(format!("{} api key is not set", provider)))
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

fn normalize(key: &str) -> Option<String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Mask a key for logging, e.g. `sk-a***xyz`
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}***{}", head, tail)
}
