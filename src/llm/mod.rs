//! LLM invocation: wire types, transport, credentials and retry

pub mod client;
pub mod credential;
pub mod messages;
pub mod retry;
pub mod transport;

pub use client::ChatClient;
pub use credential::{mask_key, CredentialStore};
pub use messages::{ChatMessage, CompletionRequest, CompletionResponse, Role};
pub use retry::{ErrorClassifier, Retried, RetryPolicy, RetryRecord};
pub use transport::{ChatTransport, HttpTransport};
