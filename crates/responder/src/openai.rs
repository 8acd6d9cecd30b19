use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use crate::{ResponderError, TextResponder};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a compassionate mental health companion. Provide \
     supportive, empathetic replies that help people process their feelings. Keep replies warm, \
     validating, and at most 2-3 sentences. Never provide medical advice; suggest professional \
     help when appropriate, and maintain hope.";

#[derive(Clone)]
pub struct OpenAiResponder {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiResponder {
    pub fn new(api_key: String, model: String) -> Result<Self, ResponderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

impl TextResponder for OpenAiResponder {
    async fn generate(&self, text: &str) -> Result<String, ResponderError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text }
            ],
            "max_tokens": 150,
            "temperature": 0.7
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResponderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        extract_reply_text(&body).ok_or(ResponderError::EmptyReply)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn extract_reply_text(body: &serde_json::Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_first_choice_text() {
        let body = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  you are heard  " } }
            ]
        });

        assert_eq!(extract_reply_text(&body).as_deref(), Some("you are heard"));
    }

    #[test]
    fn missing_or_blank_content_yields_none() {
        assert!(extract_reply_text(&json!({})).is_none());
        assert!(extract_reply_text(&json!({
            "choices": [ { "message": { "content": "   " } } ]
        }))
        .is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_a_request_error() {
        let responder = OpenAiResponder::new("test-key".to_string(), "test-model".to_string())
            .unwrap()
            .with_endpoint("http://127.0.0.1:1/v1/chat/completions");

        let result = responder.generate("hello").await;
        assert!(matches!(result, Err(ResponderError::Request(_))));
    }
}
