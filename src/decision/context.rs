//! Decision request and context model
//!
//! Plain data handed to the pipeline by the scheduler. Nothing here is
//! validated: odd upstream values (negative quantities, zero prices) pass
//! through unchanged and are rendered into the prompt as-is.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::common::types::SentimentSummary;

/// Upper bound on learning snippets rendered into a prompt
pub const MAX_LEARNING_SNIPPETS: usize = 10;

/// Full input for one decision cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecisionRequest {
    pub trader_name: String,
    pub exchange: String,
    pub symbol: String,
    pub current_price: f64,
    pub strategy_signal: String,
    pub account_balance: f64,
    pub available_balance: f64,
    #[serde(rename = "unrealizedPnl")]
    pub unrealized_pnl: f64,
    pub positions: Vec<PositionSnapshot>,
    pub learning_snippets: Vec<String>,
    pub news_sentiment: SentimentSummary,
    pub risk_limits: RiskLimits,
    pub context: DecisionContext,
}

impl DecisionRequest {
    /// Equity used for sizing hints: context equity when known, else the balance
    pub fn account_equity(&self) -> f64 {
        if self.context.account.total_equity > 0.0 {
            self.context.account.total_equity
        } else {
            self.account_balance
        }
    }

    /// The most recent learning snippets, bounded by [`MAX_LEARNING_SNIPPETS`]
    pub fn recent_learning_snippets(&self) -> &[String] {
        let skip = self
            .learning_snippets
            .len()
            .saturating_sub(MAX_LEARNING_SNIPPETS);
        &self.learning_snippets[skip..]
    }
}

/// Compact position view carried on the request itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub side: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub leverage: f64,
    #[serde(rename = "unrealizedPnl")]
    pub unrealized_pnl: f64,
}

/// Hard risk boundaries. Zero means "unset".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskLimits {
    pub max_daily_loss_percent: f64,
    #[serde(rename = "maxPositionNotionalUsd")]
    pub max_position_notional_usd: f64,
    pub max_concurrent_positions: u32,
    pub max_leverage: f64,
    pub btc_eth_notional_multiple: f64,
    pub alt_notional_multiple: f64,
    pub min_risk_reward_ratio: f64,
}

/// Richer state describing the account and market at decision time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecisionContext {
    /// Pre-formatted wall clock time, e.g. `2024-05-01 12:00:00`
    pub current_time: String,
    pub runtime_minutes: i64,
    pub call_count: i64,
    pub account: AccountContext,
    pub positions: Vec<PositionContext>,
    pub candidate_coins: Vec<CandidateContext>,
    pub market_data: HashMap<String, MarketDataSnapshot>,
    #[serde(rename = "oiTopData")]
    pub oi_top_data: HashMap<String, OiTopSnapshot>,
    pub performance: PerformanceStats,
    #[serde(rename = "btcEthLeverage")]
    pub btc_eth_leverage: u32,
    pub altcoin_leverage: u32,
    pub margin_usage: f64,
    pub initial_equity: f64,
    #[serde(rename = "pnlPercent")]
    pub pnl_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountContext {
    pub total_equity: f64,
    pub available: f64,
    #[serde(rename = "unrealizedPnl")]
    pub unrealized_pnl: f64,
    pub daily_realized: f64,
    pub max_drawdown: f64,
    pub margin_usage: f64,
}

/// Detailed view of one open position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionContext {
    pub symbol: String,
    pub side: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub leverage: f64,
    #[serde(rename = "unrealizedPnl")]
    pub unrealized_pnl: f64,
    pub holding_minutes: i64,
    pub mark_price: f64,
    pub unrealized_pct: f64,
    pub margin_used: f64,
    #[serde(rename = "liquidationPrice")]
    pub liquidation_price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateContext {
    pub symbol: String,
    pub weight: f64,
    pub reason: String,
}

/// Indicator snapshot for one symbol, computed upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketDataSnapshot {
    pub symbol: String,
    pub current_price: f64,
    #[serde(rename = "priceChange1h")]
    pub price_change_1h: f64,
    #[serde(rename = "priceChange4h")]
    pub price_change_4h: f64,
    #[serde(rename = "ema20")]
    pub ema20: f64,
    pub macd: f64,
    pub macd_signal: f64,
    #[serde(rename = "rsi7")]
    pub rsi7: f64,
    #[serde(rename = "rsi14")]
    pub rsi14: f64,
    pub funding_rate: f64,
    pub open_interest: f64,
    #[serde(rename = "volume24h")]
    pub volume_24h: f64,
    pub data_interval: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OiTopSnapshot {
    pub symbol: String,
    pub rank: u32,
    pub open_interest: f64,
    pub notional: f64,
}

/// Realized trading performance; the Sharpe ratio drives prompt policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceStats {
    pub sharpe_ratio: f64,
    /// Fraction, 0.0 to 1.0
    pub win_rate: f64,
    pub total_trades: i64,
    pub profit_factor: f64,
}
