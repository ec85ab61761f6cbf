use super::client::{post_chat, ChatRequest};
use super::{AdapterError, Analyzer};
use crate::config::ProviderDescriptor;
use serde_json::Value;

/// OpenAI-compatible backend that requests a JSON response format.
pub struct NativeClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl NativeClient {
    pub fn new(provider: &ProviderDescriptor, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: provider.endpoint.clone(),
            api_key: provider.api_key.clone(),
            model: provider.model.clone(),
        }
    }
}

impl Analyzer for NativeClient {
    async fn analyze(&self, system: &str, user: &str) -> Result<Value, AdapterError> {
        let body = ChatRequest::new(&self.model, system, user).json_mode();
        let request = self.http.post(&self.endpoint).bearer_auth(&self.api_key);
        let content = post_chat(request, &body).await?;
        // JSON mode: the content is the object itself
        Ok(serde_json::from_str(&content)?)
    }
}
