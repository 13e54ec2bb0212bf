//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::errors::{AiError, Result};
use crate::decision::context::RiskLimits;
use crate::llm::retry::{ErrorClassifier, RetryPolicy, DEFAULT_FALLBACK_MARKERS};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// DeepSeek backend
    #[serde(default = "ProviderConfig::deepseek")]
    pub deepseek: ProviderConfig,
    /// Qwen (DashScope) backend
    #[serde(default = "ProviderConfig::qwen")]
    pub qwen: ProviderConfig,
    /// Retry behaviour shared by all backends
    #[serde(default)]
    pub retry: RetrySettings,
    /// Default risk limits applied when a request carries none
    #[serde(default)]
    pub risk: RiskLimits,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            deepseek: ProviderConfig::deepseek(),
            qwen: ProviderConfig::qwen(),
            retry: RetrySettings::default(),
            risk: RiskLimits::default(),
            settings: AppSettings::default(),
        }
    }
}

impl AppConfig {
    /// Settings for one backend
    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::DeepSeek => &self.deepseek,
            ProviderKind::Qwen => &self.qwen,
        }
    }

    /// Replace zero values with defaults and check URLs
    pub fn normalized(mut self) -> Result<Self> {
        self.deepseek = self.deepseek.normalized(ProviderKind::DeepSeek)?;
        self.qwen = self.qwen.normalized(ProviderKind::Qwen)?;
        Ok(self)
    }
}

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    DeepSeek,
    Qwen,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Qwen => "qwen",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "qwen" => Ok(ProviderKind::Qwen),
            other => Err(AiError::Configuration(format!("unknown provider: {}", other))),
        }
    }
}

/// Scale a backend reports confidence on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceScale {
    /// 0 to 100, the canonical scale
    #[default]
    Percent,
    /// 0 to 1
    Unit,
}

impl ConfidenceScale {
    /// Convert a reported value to the 0-100 scale
    pub fn to_percent(self, value: f64) -> f64 {
        match self {
            ConfidenceScale::Percent => value,
            ConfidenceScale::Unit => value * 100.0,
        }
    }
}

/// Settings for one OpenAI-compatible backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub completion_path: String,
    /// Initial API key; may be rotated at runtime
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub top_p: f64,
    /// Omitted from requests when unset
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Per-call timeout in seconds
    #[serde(default)]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub confidence_scale: ConfidenceScale,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::deepseek()
    }
}

impl ProviderConfig {
    /// DeepSeek defaults
    pub fn deepseek() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.deepseek.com".to_string(),
            completion_path: "/v1/chat/completions".to_string(),
            api_key: None,
            model: "deepseek-chat".to_string(),
            temperature: 0.5,
            top_p: 0.9,
            max_tokens: Some(2000),
            timeout_seconds: 120,
            confidence_scale: ConfidenceScale::Percent,
        }
    }

    /// Qwen (DashScope) defaults
    pub fn qwen() -> Self {
        Self {
            enabled: true,
            base_url: "https://dashscope.aliyuncs.com".to_string(),
            completion_path: "/api/v1/chat/completions".to_string(),
            api_key: None,
            model: "qwen-turbo".to_string(),
            temperature: 0.4,
            top_p: 0.8,
            max_tokens: None,
            timeout_seconds: 20,
            confidence_scale: ConfidenceScale::Percent,
        }
    }

    pub fn defaults_for(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::DeepSeek => Self::deepseek(),
            ProviderKind::Qwen => Self::qwen(),
        }
    }

    /// Fill blank/zero fields from the backend defaults and validate the base URL
    pub fn normalized(mut self, kind: ProviderKind) -> Result<Self> {
        let defaults = Self::defaults_for(kind);
        if self.base_url.trim().is_empty() {
            self.base_url = defaults.base_url;
        }
        if self.completion_path.trim().is_empty() {
            self.completion_path = defaults.completion_path;
        }
        if self.model.trim().is_empty() {
            self.model = defaults.model;
        }
        if self.temperature == 0.0 {
            self.temperature = defaults.temperature;
        }
        if self.top_p == 0.0 {
            self.top_p = defaults.top_p;
        }
        if self.max_tokens == Some(0) || (self.max_tokens.is_none() && defaults.max_tokens.is_some()) {
            self.max_tokens = defaults.max_tokens;
        }
        if self.timeout_seconds == 0 {
            self.timeout_seconds = defaults.timeout_seconds;
        }

        url::Url::parse(&self.base_url).map_err(|e| {
            AiError::Configuration(format!("invalid {} base url {}: {}", kind, self.base_url, e))
        })?;
        if !self.completion_path.starts_with('/') {
            self.completion_path = format!("/{}", self.completion_path);
        }
        Ok(self)
    }

    /// Full completion URL
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.completion_path
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_enabled() -> bool {
    true
}

/// Retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Substrings that mark an unstructured transport error as transient
    #[serde(default = "default_fallback_markers")]
    pub fallback_markers: Vec<String>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            fallback_markers: default_fallback_markers(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
            .with_classifier(ErrorClassifier::new(self.fallback_markers.iter().cloned()))
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_fallback_markers() -> Vec<String> {
    DEFAULT_FALLBACK_MARKERS.iter().map(|m| m.to_string()).collect()
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend used when none is given on the command line
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_provider: default_provider(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> ProviderKind {
    ProviderKind::DeepSeek
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_fall_back_to_defaults() {
        let config = ProviderConfig {
            enabled: true,
            base_url: String::new(),
            completion_path: String::new(),
            api_key: None,
            model: String::new(),
            temperature: 0.0,
            top_p: 0.0,
            max_tokens: Some(0),
            timeout_seconds: 0,
            confidence_scale: ConfidenceScale::Percent,
        };
        let normalized = config.normalized(ProviderKind::DeepSeek).unwrap();
        assert_eq!(normalized.model, "deepseek-chat");
        assert_eq!(normalized.temperature, 0.5);
        assert_eq!(normalized.max_tokens, Some(2000));
        assert_eq!(normalized.timeout(), Duration::from_secs(120));
        assert_eq!(
            normalized.endpoint(),
            "https://api.deepseek.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_qwen_keeps_max_tokens_unset() {
        let normalized = ProviderConfig::qwen().normalized(ProviderKind::Qwen).unwrap();
        assert_eq!(normalized.max_tokens, None);
        assert_eq!(
            normalized.endpoint(),
            "https://dashscope.aliyuncs.com/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = ProviderConfig::deepseek();
        config.base_url = "not a url".to_string();
        assert!(matches!(
            config.normalized(ProviderKind::DeepSeek),
            Err(AiError::Configuration(_))
        ));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let mut config = ProviderConfig::deepseek();
        config.base_url = "http://localhost:8080/".to_string();
        config.completion_path = "chat/completions".to_string();
        let normalized = config.normalized(ProviderKind::DeepSeek).unwrap();
        assert_eq!(normalized.endpoint(), "http://localhost:8080/chat/completions");
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("DeepSeek".parse::<ProviderKind>().unwrap(), ProviderKind::DeepSeek);
        assert_eq!(" qwen ".parse::<ProviderKind>().unwrap(), ProviderKind::Qwen);
        assert!("openai".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_confidence_scale() {
        assert_eq!(ConfidenceScale::Percent.to_percent(72.0), 72.0);
        assert_eq!(ConfidenceScale::Unit.to_percent(0.72), 72.0);
    }

    #[test]
    fn test_retry_settings_policy() {
        let policy = RetrySettings::default().policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.classifier.fallback_markers().len(), 5);
    }
}
