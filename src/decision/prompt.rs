//! Prompt synthesis
//!
//! Renders the system prompt (objective, reflection policy, hard constraints,
//! output schema) and the user prompt (live account and market context) for a
//! [`DecisionRequest`]. Rendering is a pure function of the request plus an
//! optional fallback clock string, so identical inputs always produce
//! identical prompts.

use std::fmt::Write as _;

use super::context::{DecisionRequest, PerformanceStats, PositionContext, RiskLimits};
use super::response::DecisionAction;

/// Leverage used when neither the context nor the limits specify one
const DEFAULT_LEVERAGE: u32 = 5;

/// Performance tier selected by the current Sharpe ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerformanceTier {
    /// Sharpe < -0.5
    Halt,
    /// -0.5 <= Sharpe < 0
    Caution,
    /// 0 <= Sharpe < 0.7
    Steady,
    /// Sharpe >= 0.7
    Expand,
}

impl PerformanceTier {
    /// Select a tier, checking the most punitive band first.
    ///
    /// NaN lands in `Halt`.
    pub fn from_sharpe(sharpe: f64) -> Self {
        if sharpe.is_nan() || sharpe < -0.5 {
            PerformanceTier::Halt
        } else if sharpe < 0.0 {
            PerformanceTier::Caution
        } else if sharpe < 0.7 {
            PerformanceTier::Steady
        } else {
            PerformanceTier::Expand
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::Halt => "halt",
            PerformanceTier::Caution => "caution",
            PerformanceTier::Steady => "steady",
            PerformanceTier::Expand => "expand",
        }
    }

    /// Directive bundle rendered into the reflection section
    pub fn directive(&self) -> &'static str {
        match self {
            PerformanceTier::Halt => concat!(
                "**Sharpe ratio < -0.5** (sustained losses):\n",
                "  → 🛑 Stop trading: stay flat for at least 6 consecutive evaluation cycles.\n",
                "  → Do NOT open any new position during the cooldown.\n",
                "  → 🔍 Root-cause analysis:\n",
                "     • Trading too often? (more than 2 trades per hour is overtrading)\n",
                "     • Closing too early? (holding less than 30 minutes is premature)\n",
                "     • Signals too weak? (confidence below 75)\n",
                "     • Only trading one direction? (a long-only bias is a mistake)\n\n",
            ),
            PerformanceTier::Caution => concat!(
                "**Sharpe ratio -0.5 ~ 0** (minor losses):\n",
                "  → ⚠️ Strict risk control: only act with confidence ≥ 80, at most 1 new position per hour.\n",
                "  → 📉 Lower risk: smaller position sizes, tighter stop-losses.\n\n",
            ),
            PerformanceTier::Steady => concat!(
                "**Sharpe ratio 0 ~ 0.7** (steady profit):\n",
                "  → ✅ Keep the strategy: continue the current pattern within the hard constraints.\n",
                "  → 📈 Incremental tuning only: look for small improvements.\n\n",
            ),
            PerformanceTier::Expand => concat!(
                "**Sharpe ratio ≥ 0.7** (excellent performance):\n",
                "  → 🚀 Expand carefully: modestly larger position sizes are permitted.\n",
                "  → Replicate the patterns behind recent successful trades.\n\n",
            ),
        }
    }
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Render a holding duration such as `45 minutes` or `2 hours 1 minute`
///
/// Values below an hour, negative ones included, are rendered as minutes.
pub fn format_holding_duration(minutes: i64) -> String {
    fn plural(value: i64, unit: &str) -> String {
        if value == 1 {
            format!("{} {}", value, unit)
        } else {
            format!("{} {}s", value, unit)
        }
    }

    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        plural(hours, "hour")
    } else {
        format!("{} {}", plural(hours, "hour"), plural(rest, "minute"))
    }
}

/// System and user prompt pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub system: String,
    pub user: String,
}

/// Builds prompts for a single decision request
#[derive(Debug, Clone)]
pub struct PromptBuilder<'a> {
    request: &'a DecisionRequest,
    clock: Option<String>,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(request: &'a DecisionRequest) -> Self {
        Self {
            request,
            clock: None,
        }
    }

    /// Timestamp used when the request context carries none
    pub fn with_clock(mut self, now: impl Into<String>) -> Self {
        self.clock = Some(now.into());
        self
    }

    pub fn build(&self) -> Prompts {
        Prompts {
            system: self.system_prompt(),
            user: self.user_prompt(),
        }
    }

    /// Leverage caps for (BTC/ETH, altcoins) after applying fallbacks
    pub fn leverage_caps(&self) -> (u32, u32) {
        let context = &self.request.context;
        let mut btc_eth = context.btc_eth_leverage;
        if btc_eth == 0 {
            btc_eth = self.request.risk_limits.max_leverage.max(0.0) as u32;
        }
        if btc_eth == 0 {
            btc_eth = DEFAULT_LEVERAGE;
        }
        let altcoin = if context.altcoin_leverage == 0 {
            btc_eth
        } else {
            context.altcoin_leverage
        };
        (btc_eth, altcoin)
    }

    pub fn system_prompt(&self) -> String {
        let limits = &self.request.risk_limits;
        let (btc_eth_leverage, altcoin_leverage) = self.leverage_caps();
        let equity = self.request.account_equity();

        let mut sb = String::new();
        sb.push_str("You are a professional crypto trading AI trading autonomously on perpetual futures markets.\n\n");
        sb.push_str("# 🎯 Core objective\n\n");
        sb.push_str("**Maximize the long-run Sharpe ratio**, not raw profit, and keep the equity curve stable.\n\n");

        sb.push_str(&reflection_prompt(
            &self.request.context.performance,
            &self.request.context.positions,
        ));

        sb.push_str("# 📏 Hard constraints\n\n");
        sb.push_str("- Every decision must be returned as JSON with all fields present.\n");
        sb.push_str("- Risk parameters are binding:\n");
        let _ = writeln!(
            sb,
            "  * BTC/ETH max leverage {}x, notional cap {:.1} × account equity.",
            btc_eth_leverage, limits.btc_eth_notional_multiple
        );
        let _ = writeln!(
            sb,
            "  * Altcoin max leverage {}x, notional cap {:.1} × account equity.",
            altcoin_leverage, limits.alt_notional_multiple
        );
        if limits.max_position_notional_usd > 0.0 {
            let _ = writeln!(
                sb,
                "  * A single position's notional must not exceed {:.2} USDT.",
                limits.max_position_notional_usd
            );
        }
        if limits.max_concurrent_positions > 0 {
            let _ = writeln!(
                sb,
                "  * Maximum concurrent positions: {}.",
                limits.max_concurrent_positions
            );
        }
        if limits.min_risk_reward_ratio > 0.0 {
            let _ = writeln!(
                sb,
                "  * Take-profit / stop-loss must satisfy risk/reward ≥ {:.1}.",
                limits.min_risk_reward_ratio
            );
        }
        if equity > 0.0 {
            let _ = writeln!(
                sb,
                "- Current account equity ≈ {:.2} USDT; prefer entries using 8~10 USDT of margin.",
                equity
            );
        }

        sb.push_str("\n# ✅ Required decision fields\n\n");
        sb.push_str("First write your reasoning, then return one JSON object with exactly these fields:\n");
        sb.push_str("{\"action\": string, \"confidence\": number(0-100), \"reason\": string, ");
        sb.push_str("\"adjustments\": {\"sizeMultiplier\": number, \"targetLeverage\": number, ");
        sb.push_str("\"stopLossPercent\": number, \"takeProfitPercent\": number, \"trailingStopPercent\": number}, ");
        sb.push_str("\"riskNotes\": [string]}\n");
        let actions: Vec<&str> = DecisionAction::ALL.iter().map(|a| a.as_str()).collect();
        let _ = writeln!(sb, "action must be one of: {}.", actions.join(", "));
        sb.push_str("If there is no signal, return action=\"wait\" and explain why.\n");

        sb
    }

    pub fn user_prompt(&self) -> String {
        let request = self.request;
        let context = &request.context;
        let now = if !context.current_time.is_empty() {
            context.current_time.as_str()
        } else {
            self.clock.as_deref().unwrap_or("n/a")
        };

        let mut sb = String::new();
        let _ = writeln!(
            sb,
            "**Time**: {} | **Runtime**: {} minutes | **Cycle**: #{}\n",
            now, context.runtime_minutes, context.call_count
        );
        let _ = writeln!(
            sb,
            "**Account**: equity {:.2} | available {:.2} | unrealized PnL {:+.2} | margin usage {:.2}% | positions {}\n",
            context.account.total_equity,
            context.account.available,
            context.account.unrealized_pnl,
            context.account.margin_usage,
            context.positions.len()
        );
        let _ = writeln!(
            sb,
            "**Pair**: {} ({}) | price {:.2} | strategy signal {}\n",
            request.symbol,
            request.exchange.to_uppercase(),
            request.current_price,
            request.strategy_signal
        );

        sb.push_str("## Positions\n");
        if context.positions.is_empty() {
            sb.push_str("- No open positions\n\n");
        } else {
            for (idx, pos) in context.positions.iter().enumerate() {
                let liquidation = if pos.liquidation_price > 0.0 {
                    format!("{:.4}", pos.liquidation_price)
                } else {
                    "--".to_string()
                };
                let holding = if pos.holding_minutes > 0 {
                    format!(" | held {}", format_holding_duration(pos.holding_minutes))
                } else {
                    String::new()
                };
                let _ = writeln!(
                    sb,
                    "{}. {} {} | entry {:.4} mark {:.4} | PnL {:+.2}% | leverage {:.1}x | margin {:.2} | liquidation {}{}",
                    idx + 1,
                    pos.symbol,
                    pos.side.to_uppercase(),
                    pos.entry_price,
                    pos.mark_price,
                    pos.unrealized_pct,
                    pos.leverage,
                    pos.margin_used,
                    liquidation,
                    holding
                );
                let _ = writeln!(
                    sb,
                    "- quantity {:.4} | unrealized PnL {:+.2}\n",
                    pos.quantity, pos.unrealized_pnl
                );
            }
        }

        if !request.news_sentiment.is_uninformative() {
            sb.push_str("## News sentiment\n");
            let _ = writeln!(sb, "- Summary: {}", request.news_sentiment.label());
            for highlight in &request.news_sentiment.highlights {
                let _ = writeln!(sb, "- {}", highlight);
            }
            sb.push('\n');
        }

        let snippets = request.recent_learning_snippets();
        if !snippets.is_empty() {
            sb.push_str("## Learning snippets\n");
            for snippet in snippets {
                let _ = writeln!(sb, "- {}", snippet);
            }
            sb.push('\n');
        }

        if !context.candidate_coins.is_empty() {
            sb.push_str("## Candidate coins\n");
            for coin in &context.candidate_coins {
                let _ = writeln!(
                    sb,
                    "- {} weight {:.2} reason: {}",
                    coin.symbol, coin.weight, coin.reason
                );
            }
            sb.push('\n');
        }

        if !context.market_data.is_empty() {
            let mut symbols: Vec<&String> = context.market_data.keys().collect();
            symbols.sort();
            sb.push_str("## Market snapshot\n");
            for symbol in symbols {
                let snapshot = &context.market_data[symbol];
                let _ = writeln!(
                    sb,
                    "- {} price {:.4} 1h:{:+.2}% 4h:{:+.2}% EMA20={:.2} MACD={:.4} signal={:.4} RSI7={:.2} RSI14={:.2} Funding={:.5} OI={:.2}",
                    symbol,
                    snapshot.current_price,
                    snapshot.price_change_1h,
                    snapshot.price_change_4h,
                    snapshot.ema20,
                    snapshot.macd,
                    snapshot.macd_signal,
                    snapshot.rsi7,
                    snapshot.rsi14,
                    snapshot.funding_rate,
                    snapshot.open_interest
                );
            }
            sb.push('\n');
        }

        let performance = &context.performance;
        if performance.total_trades > 0 {
            sb.push_str("## Performance\n");
            let _ = writeln!(
                sb,
                "- Trades: {}\n- Win rate: {:.2}%\n- Sharpe: {:.2}\n- Profit factor: {:.2}\n",
                performance.total_trades,
                performance.win_rate * 100.0,
                performance.sharpe_ratio,
                performance.profit_factor
            );
        }

        sb.push_str("## System constraints\n");
        let _ = writeln!(sb, "```json\n{}\n```", risk_limits_json(&request.risk_limits));

        sb
    }
}

fn risk_limits_json(limits: &RiskLimits) -> String {
    serde_json::to_string(limits).unwrap_or_else(|_| "{}".to_string())
}

/// Sharpe-driven reflection section of the system prompt
fn reflection_prompt(performance: &PerformanceStats, positions: &[PositionContext]) -> String {
    let tier = PerformanceTier::from_sharpe(performance.sharpe_ratio);

    let mut sb = String::new();
    sb.push_str("## 📊 Sharpe-ratio reflection framework\n\n");
    let _ = writeln!(
        sb,
        "Current Sharpe ratio: {:.2} → tier: {}\n",
        performance.sharpe_ratio,
        tier.as_str().to_uppercase()
    );
    sb.push_str(tier.directive());

    sb.push_str("## 📏 Multi-dimension reflection checklist\n\n");
    sb.push_str("**Trade frequency**:\n");
    sb.push_str("- Good traders: 2-4 trades per day = 0.1-0.2 trades per hour\n");
    sb.push_str("- Overtrading: more than 2 trades per hour is a serious problem\n");
    sb.push_str("- Best rhythm: hold for at least 30-60 minutes after opening\n\n");
    sb.push_str("**Self-check**:\n");
    sb.push_str("If you find yourself trading every cycle, your bar is too low.\n\n");
    sb.push_str("**Opening standards (strict)**:\n");
    sb.push_str("- Confidence ≥ 75 (100 means extremely confident)\n");
    sb.push_str("- Multi-dimension confirmation (price + indicators + volume + OI + trend)\n");
    sb.push_str("- Risk/reward ≥ 1:3 (hard requirement)\n");
    sb.push_str("- Never decide on a single indicator\n\n");
    sb.push_str("**Avoid low-quality signals**:\n");
    sb.push_str("- Single dimension (only one indicator)\n");
    sb.push_str("- Contradictions (price up while volume shrinks)\n");
    sb.push_str("- Sideways chop\n\n");

    if !positions.is_empty() {
        sb.push_str("## ⏰ Current position analysis\n");
        for pos in positions.iter().filter(|p| p.holding_minutes > 0) {
            let _ = writeln!(
                sb,
                "- {} {}: held {}, PnL {:+.2}%",
                pos.symbol,
                pos.side.to_uppercase(),
                format_holding_duration(pos.holding_minutes),
                pos.unrealized_pct
            );
        }
        sb.push('\n');
    }

    sb.push_str("## 🔄 Reflection procedure\n");
    sb.push_str("1. **Analyze the Sharpe ratio**: is the current approach working? Does it need adjusting?\n");
    sb.push_str("2. **Review positions**: has the trend changed? Take profit or cut losses?\n");
    sb.push_str("3. **Look for new opportunities**: any strong long or short signal?\n");
    sb.push_str("4. **Output the decision**: chain-of-thought analysis followed by JSON\n\n");

    sb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::SentimentSummary;
    use crate::decision::context::{CandidateContext, MarketDataSnapshot};

    fn request_with_sharpe(sharpe: f64) -> DecisionRequest {
        let mut request = DecisionRequest {
            symbol: "BTCUSDT".to_string(),
            exchange: "binance".to_string(),
            current_price: 65000.0,
            strategy_signal: "bullish_crossover".to_string(),
            ..Default::default()
        };
        request.context.current_time = "2024-05-01 12:00:00".to_string();
        request.context.performance.sharpe_ratio = sharpe;
        request
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(PerformanceTier::from_sharpe(-0.51), PerformanceTier::Halt);
        assert_eq!(PerformanceTier::from_sharpe(-0.5), PerformanceTier::Caution);
        assert_eq!(PerformanceTier::from_sharpe(-0.0001), PerformanceTier::Caution);
        assert_eq!(PerformanceTier::from_sharpe(0.0), PerformanceTier::Steady);
        assert_eq!(PerformanceTier::from_sharpe(-0.0), PerformanceTier::Steady);
        assert_eq!(PerformanceTier::from_sharpe(0.69), PerformanceTier::Steady);
        assert_eq!(PerformanceTier::from_sharpe(0.7), PerformanceTier::Expand);
        assert_eq!(PerformanceTier::from_sharpe(5.0), PerformanceTier::Expand);
        assert_eq!(PerformanceTier::from_sharpe(f64::NEG_INFINITY), PerformanceTier::Halt);
        assert_eq!(PerformanceTier::from_sharpe(f64::NAN), PerformanceTier::Halt);
    }

    #[test]
    fn test_tier_selects_directive_in_system_prompt() {
        let halt = PromptBuilder::new(&request_with_sharpe(-1.0)).system_prompt();
        assert!(halt.contains("at least 6 consecutive evaluation cycles"));
        assert!(!halt.contains("confidence ≥ 80"));

        let caution = PromptBuilder::new(&request_with_sharpe(-0.5)).system_prompt();
        assert!(caution.contains("confidence ≥ 80, at most 1 new position per hour"));

        let steady = PromptBuilder::new(&request_with_sharpe(0.0)).system_prompt();
        assert!(steady.contains("Incremental tuning only"));

        let expand = PromptBuilder::new(&request_with_sharpe(0.7)).system_prompt();
        assert!(expand.contains("modestly larger position sizes"));
    }

    #[test]
    fn test_holding_duration_pluralization() {
        assert_eq!(format_holding_duration(1), "1 minute");
        assert_eq!(format_holding_duration(45), "45 minutes");
        assert_eq!(format_holding_duration(60), "1 hour");
        assert_eq!(format_holding_duration(61), "1 hour 1 minute");
        assert_eq!(format_holding_duration(125), "2 hours 5 minutes");
        assert_eq!(format_holding_duration(180), "3 hours");
        assert_eq!(format_holding_duration(-5), "-5 minutes");
    }

    #[test]
    fn test_leverage_fallbacks() {
        let mut request = request_with_sharpe(0.0);
        assert_eq!(PromptBuilder::new(&request).leverage_caps(), (5, 5));

        request.risk_limits.max_leverage = 8.0;
        assert_eq!(PromptBuilder::new(&request).leverage_caps(), (8, 8));

        request.context.btc_eth_leverage = 10;
        request.context.altcoin_leverage = 3;
        assert_eq!(PromptBuilder::new(&request).leverage_caps(), (10, 3));
    }

    #[test]
    fn test_system_prompt_lists_configured_limits_only() {
        let mut request = request_with_sharpe(0.2);
        request.risk_limits.max_concurrent_positions = 3;
        request.risk_limits.min_risk_reward_ratio = 3.0;
        let prompt = PromptBuilder::new(&request).system_prompt();
        assert!(prompt.contains("Maximum concurrent positions: 3."));
        assert!(prompt.contains("risk/reward ≥ 3.0"));
        assert!(!prompt.contains("must not exceed"));
        assert!(prompt.contains("open_long, open_short"));
    }

    #[test]
    fn test_user_prompt_is_deterministic() {
        let mut request = request_with_sharpe(0.3);
        for symbol in ["SOLUSDT", "BTCUSDT", "ETHUSDT"] {
            request.context.market_data.insert(
                symbol.to_string(),
                MarketDataSnapshot {
                    symbol: symbol.to_string(),
                    current_price: 100.0,
                    ..Default::default()
                },
            );
        }
        let first = PromptBuilder::new(&request).build();
        let second = PromptBuilder::new(&request.clone()).build();
        assert_eq!(first, second);

        let btc = first.user.find("- BTCUSDT price").unwrap();
        let eth = first.user.find("- ETHUSDT price").unwrap();
        let sol = first.user.find("- SOLUSDT price").unwrap();
        assert!(btc < eth && eth < sol);
    }

    #[test]
    fn test_user_prompt_clock_fallback() {
        let mut request = request_with_sharpe(0.0);
        request.context.current_time.clear();
        let prompt = PromptBuilder::new(&request)
            .with_clock("2030-01-01 00:00:00")
            .user_prompt();
        assert!(prompt.starts_with("**Time**: 2030-01-01 00:00:00"));
    }

    #[test]
    fn test_user_prompt_omits_neutral_news() {
        let mut request = request_with_sharpe(0.0);
        request.news_sentiment = SentimentSummary::neutral();
        let prompt = PromptBuilder::new(&request).user_prompt();
        assert!(!prompt.contains("## News sentiment"));

        request.news_sentiment = SentimentSummary {
            sentiment: "bullish".to_string(),
            score: 0.72,
            highlights: vec!["ETF inflows accelerate".to_string()],
            ..Default::default()
        };
        let prompt = PromptBuilder::new(&request).user_prompt();
        assert!(prompt.contains("- Summary: bullish(0.72)"));
        assert!(prompt.contains("- ETF inflows accelerate"));
    }

    #[test]
    fn test_user_prompt_sections() {
        let mut request = request_with_sharpe(0.0);
        request.learning_snippets = vec!["avoid chasing breakouts".to_string()];
        request.context.candidate_coins.push(CandidateContext {
            symbol: "SOLUSDT".to_string(),
            weight: 0.8,
            reason: "OI surge".to_string(),
        });
        request.context.positions.push(PositionContext {
            symbol: "ETHUSDT".to_string(),
            side: "long".to_string(),
            quantity: 0.5,
            entry_price: 3000.0,
            mark_price: 3100.0,
            holding_minutes: 95,
            ..Default::default()
        });
        request.risk_limits.max_leverage = 5.0;

        let prompt = PromptBuilder::new(&request).user_prompt();
        assert!(prompt.contains("1. ETHUSDT LONG | entry 3000.0000 mark 3100.0000"));
        assert!(prompt.contains("liquidation --"));
        assert!(prompt.contains("held 1 hour 35 minutes"));
        assert!(prompt.contains("- avoid chasing breakouts"));
        assert!(prompt.contains("- SOLUSDT weight 0.80 reason: OI surge"));
        assert!(!prompt.contains("## Performance"));
        assert!(prompt.contains("\"maxLeverage\":5.0"));
    }

    #[test]
    fn test_user_prompt_flat_account() {
        let request = request_with_sharpe(0.0);
        let prompt = PromptBuilder::new(&request).user_prompt();
        assert!(prompt.contains("- No open positions"));
        assert!(prompt.contains("**Pair**: BTCUSDT (BINANCE)"));
    }
}
