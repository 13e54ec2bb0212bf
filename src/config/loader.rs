//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::{AppConfig, AppSettings, ProviderConfig, RetrySettings};
use crate::common::errors::{AiError, Result};
use crate::decision::context::RiskLimits;

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP__, e.g. `APP__DEEPSEEK__MODEL`)
/// 2. Configuration file (TOML format)
/// 3. Default values
///
/// Provider API keys are picked up from `DEEPSEEK_API_KEY` / `QWEN_API_KEY`
/// when the file and `APP__` variables leave them unset.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| AiError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| AiError::Configuration(e.to_string()))?;

    if app.deepseek.api_key.is_none() {
        app.deepseek.api_key = env_value("DEEPSEEK_API_KEY");
    }
    if app.qwen.api_key.is_none() {
        app.qwen.api_key = env_value("QWEN_API_KEY");
    }

    app.normalized()
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    // Try to load from .env file
    dotenvy::dotenv().ok();

    let deepseek = ProviderConfig {
        api_key: env_value("DEEPSEEK_API_KEY"),
        base_url: env_value("DEEPSEEK_BASE_URL").unwrap_or_default(),
        model: env_value("DEEPSEEK_MODEL").unwrap_or_default(),
        ..ProviderConfig::deepseek()
    };

    let qwen = ProviderConfig {
        api_key: env_value("QWEN_API_KEY"),
        base_url: env_value("QWEN_BASE_URL").unwrap_or_default(),
        model: env_value("QWEN_MODEL").unwrap_or_default(),
        ..ProviderConfig::qwen()
    };

    let settings = AppSettings {
        log_level: env_value("LOG_LEVEL").unwrap_or_else(|| AppSettings::default().log_level),
        ..AppSettings::default()
    };

    AppConfig {
        deepseek,
        qwen,
        retry: RetrySettings::default(),
        risk: RiskLimits::default(),
        settings,
    }
    .normalized()
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{ConfidenceScale, ProviderKind};
    use std::io::Write;

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[deepseek]
model = "deepseek-reasoner"
timeout_seconds = 30

[qwen]
enabled = false
confidence_scale = "unit"

[retry]
max_attempts = 5
base_delay_ms = 10
"#
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.deepseek.model, "deepseek-reasoner");
        assert_eq!(config.deepseek.timeout_seconds, 30);
        assert_eq!(config.deepseek.temperature, 0.5);
        assert!(!config.qwen.enabled);
        assert_eq!(config.qwen.confidence_scale, ConfidenceScale::Unit);
        assert_eq!(config.provider(ProviderKind::Qwen).model, "qwen-turbo");
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Some("/nonexistent/llm-decide.toml")).unwrap();
        assert_eq!(
            config.deepseek.endpoint(),
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert_eq!(config.qwen.timeout_seconds, 20);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert_eq!(config.settings.default_provider, ProviderKind::DeepSeek);
    }

    #[test]
    fn test_load_from_env_reads_provider_variables() {
        std::env::set_var("DEEPSEEK_MODEL", "deepseek-reasoner");
        std::env::set_var("QWEN_BASE_URL", "http://localhost:9000/");

        let config = load_from_env();

        std::env::remove_var("DEEPSEEK_MODEL");
        std::env::remove_var("QWEN_BASE_URL");

        let config = config.unwrap();
        assert_eq!(config.deepseek.model, "deepseek-reasoner");
        assert_eq!(config.deepseek.timeout_seconds, 120);
        assert_eq!(
            config.qwen.endpoint(),
            "http://localhost:9000/api/v1/chat/completions"
        );
        assert_eq!(config.qwen.model, "qwen-turbo");
    }
}
