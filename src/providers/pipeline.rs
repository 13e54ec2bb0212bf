//! Request/response cycle shared by every backend

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::common::errors::{AiError, Result};
use crate::common::types::{Article, SentimentSummary};
use crate::config::types::ConfidenceScale;
use crate::decision::context::DecisionRequest;
use crate::decision::parser::{parse_decision, parse_json_object, strip_code_fence};
use crate::decision::prompt::PromptBuilder;
use crate::decision::response::DecisionResponse;
use crate::decision::validator::validate_decision;
use crate::llm::client::ChatClient;

/// Titles shown in the `news.request` log line
const MAX_TITLE_PREVIEW: usize = 5;

const NEWS_TASK: &str = "crypto_news_sentiment";

const NEWS_INSTRUCTIONS: &str = "Analyze the following crypto news and reply with JSON \
{\"sentiment\":string, \"score\":number(0-1), \"highlights\":[], \"riskFactors\":[]}.";

const NEWS_SYSTEM_PROMPT: &str = "You are a senior crypto market analyst.";

/// Backend-independent core: a chat client plus how to read its confidence
#[derive(Debug, Clone)]
pub struct ProviderCore {
    pub chat: ChatClient,
    pub confidence_scale: ConfidenceScale,
}

#[derive(Serialize)]
struct NewsPayload<'a> {
    task: &'static str,
    instructions: &'static str,
    articles: &'a [Article],
}

impl ProviderCore {
    pub fn new(chat: ChatClient, confidence_scale: ConfidenceScale) -> Self {
        Self {
            chat,
            confidence_scale,
        }
    }

    /// prompt -> completion -> parse -> normalize -> validate
    #[instrument(skip(self, request), fields(provider = self.chat.provider(), symbol = %request.symbol))]
    pub async fn generate_decision(&self, request: &DecisionRequest) -> Result<DecisionResponse> {
        let clock = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let prompts = PromptBuilder::new(request).with_clock(clock).build();
        debug!(
            system_len = prompts.system.len(),
            user_len = prompts.user.len(),
            "decision.prompt"
        );

        let content = match self.chat.complete(&prompts.system, &prompts.user).await {
            Ok(content) => content,
            Err(e) => {
                error!(error = %e, "decision.error");
                return Err(e);
            }
        };

        let mut parsed = match parse_decision(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "decision.parse.error");
                return Err(e);
            }
        };
        parsed.payload.confidence = self.confidence_scale.to_percent(parsed.payload.confidence);

        match validate_decision(parsed, &request.risk_limits) {
            Ok(decision) => {
                info!(
                    action = decision.action_label(),
                    confidence = decision.confidence,
                    "decision.response"
                );
                Ok(decision)
            }
            Err(e) => {
                warn!(error = %e, "decision.validate.error");
                Err(e)
            }
        }
    }

    /// Summarize articles; an empty batch is neutral and sends nothing
    #[instrument(skip(self, articles), fields(provider = self.chat.provider(), count = articles.len()))]
    pub async fn analyze_news(&self, articles: &[Article]) -> Result<SentimentSummary> {
        if articles.is_empty() {
            return Ok(SentimentSummary::neutral());
        }

        let payload = serde_json::to_string(&NewsPayload {
            task: NEWS_TASK,
            instructions: NEWS_INSTRUCTIONS,
            articles,
        })?;
        let user = format!("Process the following context:\n```json\n{}\n```", payload);

        info!(titles = %title_preview(articles), "news.request");

        let content = match self.chat.complete(NEWS_SYSTEM_PROMPT, &user).await {
            Ok(content) => content,
            Err(e) => {
                error!(error = %e, "news.error");
                return Err(e);
            }
        };

        let cleaned = strip_code_fence(&content);
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            let e = AiError::Parse("model returned no content".to_string());
            warn!(error = %e, "news.parse.error");
            return Err(e);
        }

        let (mut summary, parsed_from) = match parse_json_object::<SentimentSummary>(cleaned) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "news.parse.error");
                return Err(e);
            }
        };
        if summary.sentiment.trim().is_empty() {
            summary.sentiment = "neutral".to_string();
        }
        debug!(payload = %parsed_from, "news.response");
        Ok(summary)
    }
}

/// `a | b | c ...` from the first few non-empty titles
fn title_preview(articles: &[Article]) -> String {
    let titles: Vec<&str> = articles
        .iter()
        .map(|a| a.title.trim())
        .filter(|t| !t.is_empty())
        .collect();
    let mut preview = titles
        .iter()
        .take(MAX_TITLE_PREVIEW)
        .copied()
        .collect::<Vec<_>>()
        .join(" | ");
    if titles.len() > MAX_TITLE_PREVIEW {
        preview.push_str(" ...");
    }
    preview
}
