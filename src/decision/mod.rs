//! Decision pipeline: context model, prompt synthesis, parsing and validation
//!
//! ```text
//! DecisionRequest ──► PromptBuilder ──► (system, user) prompts
//!                                            │
//!                                     ChatClient (llm)
//!                                            │
//!                                       raw model text
//!                                            │
//!                  parse_decision ──► ParsedDecision ──► validate_decision ──► DecisionResponse
//! ```
//!
//! Everything in this module is pure; the only I/O in the pipeline lives in
//! [`crate::llm`].

pub mod context;
pub mod parser;
pub mod prompt;
pub mod response;
pub mod validator;

pub use context::{
    AccountContext, CandidateContext, DecisionContext, DecisionRequest, MarketDataSnapshot,
    OiTopSnapshot, PerformanceStats, PositionContext, PositionSnapshot, RiskLimits,
    MAX_LEARNING_SNIPPETS,
};
pub use parser::{coerce_risk_notes, parse_decision, strip_code_fence, DecisionPayload, ParsedDecision};
pub use prompt::{format_holding_duration, PerformanceTier, PromptBuilder, Prompts};
pub use response::{AdjustmentPlan, DecisionAction, DecisionResponse};
pub use validator::validate_decision;
