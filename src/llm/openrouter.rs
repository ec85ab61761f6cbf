use super::client::{post_chat, ChatRequest};
use super::parse::extract_json;
use super::{AdapterError, Analyzer};
use crate::config::ProviderDescriptor;
use serde_json::Value;

/// Raw POST backend. Free-tier models often wrap the JSON in prose, so the
/// object is scraped out of the message content.
pub struct OpenRouterClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(provider: &ProviderDescriptor, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: provider.endpoint.clone(),
            api_key: provider.api_key.clone(),
            model: provider.model.clone(),
        }
    }
}

impl Analyzer for OpenRouterClient {
    async fn analyze(&self, system: &str, user: &str) -> Result<Value, AdapterError> {
        let body = ChatRequest::new(&self.model, system, user);
        let request = self
            .http
            .post(&self.endpoint)
            .header("HTTP-Referer", "https://github.com/specdoc")
            .header("X-Title", "specdoc")
            .bearer_auth(&self.api_key);
        let content = post_chat(request, &body).await?;
        Ok(extract_json(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn descriptor(endpoint: String) -> ProviderDescriptor {
        ProviderDescriptor {
            batch_index: 5,
            name: "test-openrouter".to_string(),
            api_key: "sk-or-v1-test-key".to_string(),
            kind: BackendKind::OpenRouter,
            model: "vendor/model:free".to_string(),
            endpoint,
        }
    }

    fn http() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn test_openrouter_extracts_json_from_prose() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/chat/completions")
            .match_header("authorization", "Bearer sk-or-v1-test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "vendor/model:free",
                "temperature": 0.1
            })))
            .with_status(200)
            .with_body(
                json!({
                    "choices": [{
                        "message": {
                            "content": "Here is the result: {\"testTitle\":\"X\"} Thanks!"
                        }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = OpenRouterClient::new(
            &descriptor(format!("{}/api/v1/chat/completions", server.url())),
            http(),
        );
        let value = client.analyze("system", "user").await.unwrap();
        mock.assert_async().await;
        assert_eq!(value, json!({"testTitle": "X"}));
    }

    #[tokio::test]
    async fn test_openrouter_does_not_request_json_mode() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/chat/completions")
            .match_body(Matcher::Regex("response_format".to_string()))
            .expect(0)
            .create_async()
            .await;
        let _fallback = server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"{\"ok\":true}"}}]}"#)
            .create_async()
            .await;

        let client = OpenRouterClient::new(
            &descriptor(format!("{}/api/v1/chat/completions", server.url())),
            http(),
        );
        let value = client.analyze("system", "user").await.unwrap();
        mock.assert_async().await;
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_openrouter_empty_choices_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = OpenRouterClient::new(
            &descriptor(format!("{}/api/v1/chat/completions", server.url())),
            http(),
        );
        let err = client.analyze("system", "user").await.unwrap_err();
        assert!(matches!(err, AdapterError::EmptyResponse));
    }
}
