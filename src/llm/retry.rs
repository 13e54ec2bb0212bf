//! Error classification and bounded retry with linear backoff

use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::common::errors::{AiError, Result};

/// Total attempts, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay unit; the wait before attempt n+1 is n times this
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Lower-cased fragments that mark an unstructured transport error as transient
pub const DEFAULT_FALLBACK_MARKERS: [&str; 5] =
    ["connection", "network", "timeout", "reset", "refused"];

/// Decides whether an error is worth another attempt
///
/// Structured checks come first. The substring markers are only consulted
/// for transport errors whose kind is not exposed, walking the whole
/// `source()` chain so wrapping depth does not matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassifier {
    fallback_markers: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_MARKERS.iter().map(|m| m.to_string()))
    }
}

impl ErrorClassifier {
    pub fn new(markers: impl IntoIterator<Item = String>) -> Self {
        Self {
            fallback_markers: markers
                .into_iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn fallback_markers(&self) -> &[String] {
        &self.fallback_markers
    }

    pub fn is_retryable(&self, err: &AiError) -> bool {
        match err {
            AiError::Timeout(_) | AiError::Network(_) => true,
            AiError::HttpRequest(e) => {
                e.is_timeout() || e.is_connect() || self.matches_fallback(err)
            }
            AiError::Configuration(_)
            | AiError::HttpStatus { .. }
            | AiError::RetriesExhausted { .. }
            | AiError::Provider(_)
            | AiError::EmptyChoices
            | AiError::Parse(_)
            | AiError::Validation(_)
            | AiError::JsonParse(_) => false,
        }
    }

    /// True when any error in the chain mentions a fallback marker
    pub fn matches_fallback(&self, err: &(dyn StdError + 'static)) -> bool {
        let mut current: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(e) = current {
            let text = e.to_string().to_lowercase();
            if self.fallback_markers.iter().any(|m| text.contains(m.as_str())) {
                return true;
            }
            current = e.source();
        }
        false
    }
}

/// One failed attempt that was followed by a retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryRecord {
    /// 1-based attempt that failed
    pub attempt: u32,
    /// Wait before the next attempt
    pub delay: Duration,
    pub error: String,
}

/// Successful value plus the retries it took
#[derive(Debug, Clone)]
pub struct Retried<T> {
    pub value: T,
    pub retries: Vec<RetryRecord>,
}

/// Bounded, sequential retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub classifier: ErrorClassifier,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            classifier: ErrorClassifier::default(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            classifier: ErrorClassifier::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Linear backoff: `failed_attempt × base_delay`, no jitter
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.base_delay * failed_attempt
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// The closure receives the 1-based attempt number. Attempts never overlap.
    /// Dropping the returned future cancels an in-flight attempt or backoff.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<Retried<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut retries = Vec::new();
        let mut attempt = 1;

        loop {
            let err = match operation(attempt).await {
                Ok(value) => return Ok(Retried { value, retries }),
                Err(err) => err,
            };

            if !self.classifier.is_retryable(&err) {
                return Err(err);
            }
            if attempt >= max_attempts {
                return Err(AiError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.delay_after(attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retry.attempt"
            );
            retries.push(RetryRecord {
                attempt,
                delay,
                error: err.to_string(),
            });
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_test::{assert_err, assert_ok};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "request failed")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_structured_classification() {
        let classifier = ErrorClassifier::default();
        assert!(classifier.is_retryable(&AiError::Timeout("deadline".into())));
        assert!(classifier.is_retryable(&AiError::Network("dns lookup failed".into())));
        assert!(!classifier.is_retryable(&AiError::Configuration("no key".into())));
        assert!(!classifier.is_retryable(&AiError::EmptyChoices));
        assert!(!classifier.is_retryable(&AiError::HttpStatus {
            status: 401,
            body: "connection not authorized".into()
        }));
        assert!(!classifier.is_retryable(&AiError::Provider("upstream timeout".into())));
        assert!(!classifier.is_retryable(&AiError::Parse("bad".into())));
        assert!(!classifier.is_retryable(&AiError::Validation("bad".into())));
    }

    #[test]
    fn test_fallback_walks_source_chain() {
        let classifier = ErrorClassifier::default();
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "Connection Reset by peer");
        assert!(classifier.matches_fallback(&Wrapped(inner)));

        let inner = std::io::Error::new(std::io::ErrorKind::Other, "invalid certificate");
        assert!(!classifier.matches_fallback(&Wrapped(inner)));
    }

    #[test]
    fn test_custom_markers() {
        let classifier = ErrorClassifier::new(vec![" Broken Pipe ".to_string(), "".to_string()]);
        assert_eq!(classifier.fallback_markers(), &["broken pipe".to_string()]);
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "broken pipe");
        assert!(classifier.matches_fallback(&inner));
    }

    #[test]
    fn test_linear_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_two_failures_then_success() {
        let policy = fast_policy();
        let calls = AtomicU32::new(0);
        let outcome = policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(AiError::Network("connection refused".into()))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        let outcome = assert_ok!(outcome);
        assert_eq!(outcome.value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.retries.len(), 2);
        assert_eq!(outcome.retries[0].attempt, 1);
        assert_eq!(outcome.retries[0].delay, Duration::from_millis(1));
        assert_eq!(outcome.retries[1].attempt, 2);
        assert_eq!(outcome.retries[1].delay, Duration::from_millis(2));
    }

    #[tokio::test]
    async fn test_exhaustion_names_attempts() {
        let policy = fast_policy();
        let calls = AtomicU32::new(0);
        let result: Result<Retried<()>> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AiError::Timeout("deadline elapsed".into())) }
            })
            .await;
        let err = assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.attempts(), Some(3));
        assert!(err.to_string().contains("after 3 attempts"));
        assert!(err.to_string().contains("deadline elapsed"));
    }

    #[tokio::test]
    async fn test_permanent_error_returns_immediately() {
        let policy = fast_policy();
        let calls = AtomicU32::new(0);
        let result: Result<Retried<()>> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AiError::Provider("invalid model".into())) }
            })
            .await;
        assert!(matches!(result, Err(AiError::Provider(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropping_future_cancels_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_secs(60));
        let run = policy.run(|_| async { Err::<(), _>(AiError::Network("reset".into())) });
        let cancelled = tokio::time::timeout(Duration::from_millis(50), run).await;
        assert!(cancelled.is_err());
    }
}
