//! Provider adapters: turn a prompt pair into a parsed analysis object.

pub mod client;
pub mod native;
pub mod openrouter;
pub mod parse;

use crate::config::{BackendKind, ProviderDescriptor};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub use native::NativeClient;
pub use openrouter::OpenRouterClient;

/// Error bodies are cut to this many characters before logging.
const ERROR_BODY_MAX_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response had no message content")]
    EmptyResponse,
    #[error("response was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl AdapterError {
    pub(crate) fn status(status: u16, body: &str) -> Self {
        AdapterError::Status {
            status,
            body: truncate_str(body, ERROR_BODY_MAX_CHARS).to_string(),
        }
    }
}

/// Something that can analyze one test file.
pub trait Analyzer {
    fn analyze(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<Value, AdapterError>>;
}

/// The two supported call shapes behind one capability
pub enum ProviderClient {
    Native(NativeClient),
    OpenRouter(OpenRouterClient),
}

impl ProviderClient {
    pub fn from_descriptor(provider: &ProviderDescriptor) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http(provider, http))
    }

    pub fn with_http(provider: &ProviderDescriptor, http: reqwest::Client) -> Self {
        match provider.kind {
            BackendKind::Native => ProviderClient::Native(NativeClient::new(provider, http)),
            BackendKind::OpenRouter => {
                ProviderClient::OpenRouter(OpenRouterClient::new(provider, http))
            }
        }
    }
}

impl Analyzer for ProviderClient {
    async fn analyze(&self, system: &str, user: &str) -> Result<Value, AdapterError> {
        match self {
            ProviderClient::Native(client) => client.analyze(system, user).await,
            ProviderClient::OpenRouter(client) => client.analyze(system, user).await,
        }
    }
}

/// Run one analysis under a deadline.
///
/// The timer lives only as long as this call; it is dropped whichever side
/// finishes first.
pub async fn analyze_with_deadline<A: Analyzer>(
    analyzer: &A,
    system: &str,
    user: &str,
    deadline: Duration,
) -> Result<Value, AdapterError> {
    match tokio::time::timeout(deadline, analyzer.analyze(system, user)).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout(deadline.as_secs())),
    }
}

/// Truncate a string for display (Unicode-safe)
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
