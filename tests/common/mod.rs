//! Common test utilities and fixtures

#![allow(dead_code)]

use llm_trade_decision::config::types::{ProviderConfig, RetrySettings};
use llm_trade_decision::decision::context::{
    AccountContext, DecisionContext, MarketDataSnapshot, PerformanceStats, PositionContext,
};
use llm_trade_decision::{DecisionRequest, RiskLimits};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::collections::HashMap;

pub const TEST_API_KEY: &str = "sk-integration-test";

/// A BTC request with one open long and strict limits
pub static SAMPLE_REQUEST: Lazy<DecisionRequest> = Lazy::new(|| {
    let mut market_data = HashMap::new();
    market_data.insert(
        "BTCUSDT".to_string(),
        MarketDataSnapshot {
            symbol: "BTCUSDT".to_string(),
            current_price: 64_250.0,
            macd: 112.4,
            macd_signal: 98.1,
            funding_rate: 0.0001,
            open_interest: 81_000.0,
            data_interval: "3m".to_string(),
            ..MarketDataSnapshot::default()
        },
    );

    DecisionRequest {
        trader_name: "alpha".to_string(),
        exchange: "binance".to_string(),
        symbol: "BTCUSDT".to_string(),
        current_price: 64_250.0,
        strategy_signal: "ema_cross_up".to_string(),
        account_balance: 10_000.0,
        available_balance: 7_500.0,
        learning_snippets: vec!["Stops under 1% got hunted last week".to_string()],
        risk_limits: sample_limits(),
        context: DecisionContext {
            current_time: "2024-05-01 12:00:00".to_string(),
            runtime_minutes: 90,
            call_count: 30,
            account: AccountContext {
                total_equity: 10_250.0,
                available: 7_500.0,
                ..AccountContext::default()
            },
            positions: vec![PositionContext {
                symbol: "BTCUSDT".to_string(),
                side: "long".to_string(),
                quantity: 0.05,
                entry_price: 63_800.0,
                leverage: 3.0,
                holding_minutes: 95,
                mark_price: 64_250.0,
                ..PositionContext::default()
            }],
            market_data,
            performance: PerformanceStats {
                sharpe_ratio: 0.4,
                win_rate: 0.55,
                total_trades: 20,
                ..PerformanceStats::default()
            },
            btc_eth_leverage: 5,
            altcoin_leverage: 3,
            ..DecisionContext::default()
        },
        ..DecisionRequest::default()
    }
});

pub fn sample_limits() -> RiskLimits {
    RiskLimits {
        max_daily_loss_percent: 5.0,
        max_position_notional_usd: 20_000.0,
        max_concurrent_positions: 3,
        max_leverage: 10.0,
        btc_eth_notional_multiple: 5.0,
        alt_notional_multiple: 2.0,
        min_risk_reward_ratio: 2.0,
    }
}

/// Provider settings pointed at a mock server
pub fn provider_config(base: ProviderConfig, server_uri: &str) -> ProviderConfig {
    ProviderConfig {
        base_url: server_uri.to_string(),
        api_key: Some(TEST_API_KEY.to_string()),
        timeout_seconds: 1,
        ..base
    }
}

/// Default retry behaviour with millisecond backoff
pub fn fast_retry() -> RetrySettings {
    RetrySettings {
        base_delay_ms: 10,
        ..RetrySettings::default()
    }
}

/// Chat-completion body with a single assistant message
pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

/// Model replies in the shapes seen in practice
pub mod replies {
    /// Reasoning preamble followed by a fenced decision
    pub const FENCED_WITH_REASONING: &str = "Trend is up and funding is flat, adding to the long.\n```json\n{\"action\":\"increase_long\",\"confidence\":72,\"reason\":\"momentum\",\"adjustments\":{\"sizeMultiplier\":1.2,\"targetLeverage\":5,\"stopLossPercent\":1.5,\"takeProfitPercent\":4.5},\"riskNotes\":\"watch funding; cpi tomorrow\"}\n```";

    pub const EXCESSIVE_LEVERAGE: &str = "{\"action\":\"open_long\",\"confidence\":90,\"adjustments\":{\"targetLeverage\":25}}";

    pub const UNIT_CONFIDENCE: &str = "{\"action\":\"hold\",\"confidence\":0.8,\"reason\":\"range bound\"}";

    pub const SENTIMENT: &str = "```json\n{\"sentiment\":\"bullish\",\"score\":0.7,\"highlights\":[\"ETF inflows\"],\"riskFactors\":[]}\n```";
}
