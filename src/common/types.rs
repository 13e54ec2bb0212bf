//! News types shared between providers and the decision request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news item handed to the sentiment path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: String::new(),
            url: String::new(),
            source: String::new(),
            published_at: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }
}

/// Result of news sentiment analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSummary {
    #[serde(default)]
    pub sentiment: String,
    /// 0.0 to 1.0
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

impl SentimentSummary {
    /// Summary used when there is nothing to analyze
    pub fn neutral() -> Self {
        Self {
            sentiment: "neutral".to_string(),
            ..Self::default()
        }
    }

    /// True when the summary carries no information worth prompting with
    pub fn is_uninformative(&self) -> bool {
        let sentiment = self.sentiment.trim();
        sentiment.is_empty() || (sentiment.eq_ignore_ascii_case("neutral") && self.score == 0.0)
    }

    /// Short label such as `bullish(0.72)`
    pub fn label(&self) -> String {
        if self.score == 0.0 {
            self.sentiment.clone()
        } else {
            format!("{}({:.2})", self.sentiment, self.score)
        }
    }
}
