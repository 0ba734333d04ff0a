use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GenerationError;

/// Hosted text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat-completions client. One attempt per call, bounded by `timeout`.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
        };

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("text generation rate limited");
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status: status.as_u16(), body });
        }

        let parsed: ChatCompletionResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer, timeout: Duration) -> OpenAiGenerator {
        OpenAiGenerator::new(&format!("{}/v1", server.uri()), "sk-test", "gpt-3.5-turbo", timeout).unwrap()
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Asha fits."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = generator(&server, Duration::from_secs(5)).generate("sys", "prompt").await.unwrap();
        assert_eq!(out, "Asha fits.");
    }

    #[tokio::test]
    async fn status_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = generator(&server, Duration::from_secs(5)).generate("sys", "p").await.unwrap_err();
        assert!(matches!(err, GenerationError::RateLimited));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = generator(&server, Duration::from_secs(5)).generate("sys", "p").await.unwrap_err();
        match err {
            GenerationError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = generator(&server, Duration::from_millis(100)).generate("sys", "p").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout));
    }

    #[tokio::test]
    async fn blank_reply_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "  "}}]
            })))
            .mount(&server)
            .await;

        let err = generator(&server, Duration::from_secs(5)).generate("sys", "p").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }
}
