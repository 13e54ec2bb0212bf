//! Tolerant extraction of a structured decision from model output
//!
//! Models wrap their JSON in code fences, prefix it with free-text reasoning,
//! append commentary after it and disagree on the shape of `riskNotes`. The
//! parser accepts all of that, but never a partially understood object.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::response::{null_as_default, AdjustmentPlan};
use crate::common::errors::{AiError, Result};

/// Longest slice of model output echoed back in a parse error
const MAX_ECHO_CHARS: usize = 500;

const FENCE: &str = "```";

/// The JSON object a model is asked to emit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecisionPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(deserialize_with = "null_as_default")]
    pub adjustments: AdjustmentPlan,
    #[serde(deserialize_with = "deserialize_risk_notes")]
    pub risk_notes: Vec<String>,
}

/// A payload together with the audit artifacts it was recovered from
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDecision {
    pub payload: DecisionPayload,
    /// Exact text the payload was parsed from
    pub raw_content: String,
    /// Reasoning written before the JSON object, possibly empty
    pub cot_trace: String,
}

/// Remove a surrounding code fence and its optional language tag.
///
/// Text that does not start with a fence is returned untouched.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return text.to_string();
    };

    // A language tag sits on the same line as the opening fence
    let rest = match rest.split_once('\n') {
        Some((first_line, body)) if is_language_tag(first_line) => body,
        None if is_language_tag(rest) => "",
        None => strip_inline_tag(rest),
        _ => rest,
    };

    let inner = rest.trim();
    let inner = inner.strip_suffix(FENCE).unwrap_or(inner);
    inner.trim().to_string()
}

/// Single-line fences put the tag directly before the object: "```json{...}```"
fn strip_inline_tag(rest: &str) -> &str {
    match rest.find('{') {
        Some(idx) if idx > 0 && is_language_tag(&rest[..idx]) => &rest[idx..],
        _ => rest,
    }
}

fn is_language_tag(line: &str) -> bool {
    let tag = line.trim();
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Reasoning written before the first `{`, with fence residue removed
pub fn extract_cot_trace(content: &str) -> String {
    let Some(idx) = content.find('{') else {
        return String::new();
    };
    let mut trace = content[..idx].trim_end();

    // Drop a dangling "```json" line left between the prose and the object
    if let Some(pos) = trace.rfind('\n') {
        let last_line = trace[pos + 1..].trim();
        if last_line.starts_with(FENCE) && is_fence_line(last_line) {
            trace = trace[..pos].trim_end();
        }
    } else if trace.trim().starts_with(FENCE) && is_fence_line(trace.trim()) {
        trace = "";
    }

    trace.trim().trim_matches('`').trim().to_string()
}

fn is_fence_line(line: &str) -> bool {
    let tag = line.trim_start_matches('`');
    tag.is_empty() || is_language_tag(tag)
}

/// Parse raw model output into a decision payload.
///
/// Tries the whole fence-stripped text first, then the slice between the
/// first `{` and the last `}`.
pub fn parse_decision(raw: &str) -> Result<ParsedDecision> {
    let content = strip_code_fence(raw);
    let content = content.trim();
    if content.is_empty() {
        return Err(AiError::Parse("model returned no content".to_string()));
    }

    let (payload, raw_content) = parse_json_object::<DecisionPayload>(content)?;
    Ok(ParsedDecision {
        payload,
        raw_content,
        cot_trace: extract_cot_trace(content),
    })
}

/// Deserialize `content`, falling back to its outermost `{ ... }` slice.
///
/// Only a JSON object is accepted; arrays and scalars are rejected even when
/// they would fit the target type positionally.
/// Returns the value together with the exact text it was parsed from.
pub fn parse_json_object<T: DeserializeOwned>(content: &str) -> Result<(T, String)> {
    if let Ok(value) = decode_object::<T>(content) {
        return Ok((value, content.to_string()));
    }

    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if end > start {
            let snippet = &content[start..=end];
            return match decode_object::<T>(snippet) {
                Ok(value) => Ok((value, snippet.to_string())),
                Err(e) => Err(AiError::Parse(format!(
                    "unable to parse model output ({}): {}",
                    e,
                    truncate_for_echo(snippet)
                ))),
            };
        }
    }

    Err(AiError::Parse(format!(
        "unable to parse model output: {}",
        truncate_for_echo(content)
    )))
}

fn decode_object<T: DeserializeOwned>(text: &str) -> std::result::Result<T, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).map_err(|e| e.to_string()),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Normalize the many shapes models use for `riskNotes`
pub fn coerce_risk_notes(value: Value) -> std::result::Result<Vec<String>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(note) => {
            if note.trim().is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![note])
            }
        }
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect()),
        other => Err(format!("riskNotes cannot be parsed: {}", other)),
    }
}

fn deserialize_risk_notes<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_risk_notes(value).map_err(serde::de::Error::custom)
}

fn truncate_for_echo(text: &str) -> String {
    if text.chars().count() <= MAX_ECHO_CHARS {
        return text.to_string();
    }
    let mut echoed: String = text.chars().take(MAX_ECHO_CHARS).collect();
    echoed.push_str("...");
    echoed
}
