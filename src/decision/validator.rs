//! Hard-limit validation, the last gate before execution

use super::context::RiskLimits;
use super::parser::ParsedDecision;
use super::response::{DecisionAction, DecisionResponse};
use crate::common::errors::{AiError, Result};

/// Slack added to the risk/reward ratio before comparing against the floor
const RISK_REWARD_EPSILON: f64 = 1e-9;

/// Validate a parsed decision against the risk limits.
///
/// Nothing is clamped or corrected; any violation rejects the whole decision.
pub fn validate_decision(parsed: ParsedDecision, limits: &RiskLimits) -> Result<DecisionResponse> {
    let ParsedDecision {
        payload,
        raw_content,
        cot_trace,
    } = parsed;

    let action_text = payload.action.trim();
    let action = if action_text.is_empty() {
        None
    } else {
        Some(DecisionAction::parse(action_text).ok_or_else(|| {
            AiError::Validation(format!("unknown action: {}", payload.action))
        })?)
    };

    let plan = &payload.adjustments;
    let target_leverage = plan.target_leverage;
    if target_leverage < 0.0 {
        return Err(AiError::Validation(
            "targetLeverage must not be negative".to_string(),
        ));
    }
    if limits.max_leverage > 0.0 && target_leverage > limits.max_leverage {
        return Err(AiError::Validation(format!(
            "targetLeverage {:.2} exceeds limit {:.2}",
            target_leverage, limits.max_leverage
        )));
    }

    if limits.min_risk_reward_ratio > 0.0 {
        if let Some(ratio) = plan.risk_reward_ratio() {
            if ratio + RISK_REWARD_EPSILON < limits.min_risk_reward_ratio {
                return Err(AiError::Validation(format!(
                    "risk/reward {:.2} below required {:.2}",
                    ratio, limits.min_risk_reward_ratio
                )));
            }
        }
    }

    Ok(DecisionResponse {
        action,
        confidence: payload.confidence,
        reason: payload.reason,
        adjustments: payload.adjustments,
        risk_notes: payload.risk_notes,
        raw_content,
        cot_trace,
    })
}
