//! Error types for the decision pipeline

use thiserror::Error;

/// Result type alias using our AiError
pub type Result<T> = std::result::Result<T, AiError>;

/// Main error type for the decision pipeline
///
/// Variants are grouped the way callers need to react to them: configuration
/// problems never reach the network, transport failures may be retried,
/// provider/parse/validation failures end the cycle.
#[derive(Error, Debug)]
pub enum AiError {
    /// Missing credential, disabled provider, bad endpoint
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP request errors surfaced by the transport
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Per-call deadline elapsed
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Low-level network failure (DNS, connect, socket reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status code
    #[error("Server returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Every attempt failed with a retryable error
    #[error("request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<AiError>,
    },

    /// Backend reported a business error in its payload
    #[error("Provider error: {0}")]
    Provider(String),

    /// Backend answered without any choices
    #[error("Provider returned no choices")]
    EmptyChoices,

    /// Model output could not be turned into a decision
    #[error("Parse error: {0}")]
    Parse(String),

    /// Decision violates a hard risk constraint
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl AiError {
    /// Whether the default classifier would retry this error
    pub fn is_retryable(&self) -> bool {
        crate::llm::retry::ErrorClassifier::default().is_retryable(self)
    }

    /// Number of attempts made before giving up, when retries were exhausted
    pub fn attempts(&self) -> Option<u32> {
        match self {
            AiError::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
