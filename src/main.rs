//! llm-decide - Main Entry Point
//!
//! Reads a decision request from disk, optionally folds in a news sentiment
//! reading, asks the configured LLM backend for a decision and prints it.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use llm_trade_decision::config::load_config;
use llm_trade_decision::{build_provider, Article, DecisionRequest, ProviderKind, RiskLimits};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Backend to ask (deepseek, qwen)
    #[arg(short, long, env = "LLM_DECIDE_PROVIDER")]
    provider: Option<ProviderKind>,

    /// DecisionRequest JSON file
    #[arg(short, long)]
    request: PathBuf,

    /// Optional JSON array of news articles to analyze first
    #[arg(long)]
    news: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(&args.config)).context("failed to load configuration")?;

    // Initialize logging
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let kind = args.provider.unwrap_or(config.settings.default_provider);
    info!(provider = %kind, config = %args.config, "starting llm-decide");

    let provider = build_provider(&config, kind)?;

    let raw = std::fs::read_to_string(&args.request)
        .with_context(|| format!("failed to read request {}", args.request.display()))?;
    let mut request: DecisionRequest = serde_json::from_str(&raw)
        .with_context(|| format!("invalid request json in {}", args.request.display()))?;

    if request.risk_limits == RiskLimits::default() {
        request.risk_limits = config.risk.clone();
    }

    if let Some(path) = &args.news {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read news {}", path.display()))?;
        let articles: Vec<Article> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid news json in {}", path.display()))?;
        request.news_sentiment = provider
            .analyze_news(&articles)
            .await
            .context("news analysis failed")?;
        info!(sentiment = %request.news_sentiment.label(), "news sentiment ready");
    }

    // Dropping the decision future on Ctrl-C cancels any in-flight attempt or backoff
    let outcome = tokio::select! {
        outcome = provider.generate_decision(&request) => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received shutdown signal, abandoning decision");
            return Ok(());
        }
    };

    match outcome {
        Ok(decision) => {
            println!("{}", serde_json::to_string_pretty(&decision)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "decision failed");
            Err(e.into())
        }
    }
}
