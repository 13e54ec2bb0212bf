//! Validated decision output

use serde::{Deserialize, Deserializer, Serialize};

/// Actions a model is allowed to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    OpenLong,
    OpenShort,
    IncreaseLong,
    IncreaseShort,
    Close,
    Exit,
    Reduce,
    Hold,
    Wait,
}

impl DecisionAction {
    pub const ALL: [DecisionAction; 9] = [
        DecisionAction::OpenLong,
        DecisionAction::OpenShort,
        DecisionAction::IncreaseLong,
        DecisionAction::IncreaseShort,
        DecisionAction::Close,
        DecisionAction::Exit,
        DecisionAction::Reduce,
        DecisionAction::Hold,
        DecisionAction::Wait,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionAction::OpenLong => "open_long",
            DecisionAction::OpenShort => "open_short",
            DecisionAction::IncreaseLong => "increase_long",
            DecisionAction::IncreaseShort => "increase_short",
            DecisionAction::Close => "close",
            DecisionAction::Exit => "exit",
            DecisionAction::Reduce => "reduce",
            DecisionAction::Hold => "hold",
            DecisionAction::Wait => "wait",
        }
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored
    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(wanted))
    }

    /// Opens or adds to exposure
    pub fn is_entry(&self) -> bool {
        matches!(
            self,
            DecisionAction::OpenLong
                | DecisionAction::OpenShort
                | DecisionAction::IncreaseLong
                | DecisionAction::IncreaseShort
        )
    }

    /// Removes some or all exposure
    pub fn is_exit(&self) -> bool {
        matches!(
            self,
            DecisionAction::Close | DecisionAction::Exit | DecisionAction::Reduce
        )
    }
}

impl std::fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position and risk tweaks proposed by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdjustmentPlan {
    #[serde(deserialize_with = "null_as_default")]
    pub size_multiplier: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub target_leverage: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub stop_loss_percent: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub take_profit_percent: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub trailing_stop_percent: f64,
}

/// Read an explicit `null` as the type's zero value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AdjustmentPlan {
    /// Take-profit distance over stop-loss distance, when both are set
    pub fn risk_reward_ratio(&self) -> Option<f64> {
        if self.stop_loss_percent > 0.0 && self.take_profit_percent > 0.0 {
            Some(self.take_profit_percent / self.stop_loss_percent)
        } else {
            None
        }
    }
}

/// A decision that passed parsing and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    /// `None` when the model left the action blank
    pub action: Option<DecisionAction>,
    /// Canonical 0-100 scale
    pub confidence: f64,
    pub reason: String,
    pub adjustments: AdjustmentPlan,
    pub risk_notes: Vec<String>,
    /// Text that was successfully parsed, kept for audit
    pub raw_content: String,
    /// Reasoning preamble the model wrote before its JSON
    pub cot_trace: String,
}

impl DecisionResponse {
    /// Action label, `wait` when unspecified
    pub fn action_label(&self) -> &'static str {
        self.action.map(|a| a.as_str()).unwrap_or("wait")
    }
}
