use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::ChatModel;
use super::types::ChatRequest;
use crate::core::errors::AssistantError;

/// Chat completions over the OpenAI wire format (`/chat/completions`).
///
/// OpenAI and Groq differ only in base URL, credential and default model.
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    name: &'static str,
    key_env: &'static str,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: &'static str,
        key_env: &'static str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            name,
            key_env,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: 0.7,
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn validate(&self) -> Result<(), AssistantError> {
        if self.api_key.trim().is_empty() {
            return Err(AssistantError::config(format!(
                "{} is not set; the {} provider cannot be used",
                self.key_env, self.name
            )));
        }
        Ok(())
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, AssistantError> {
        self.validate()?;
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature.unwrap_or(self.temperature),
            "stream": false,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::adapter(self.name, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AssistantError::adapter(
                self.name,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| AssistantError::adapter(self.name, e))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.to_string())
            .ok_or_else(|| AssistantError::adapter(self.name, "response contained no message content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn groq(server: &MockServer, key: &str) -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(
            "groq",
            "GROQ_API_KEY",
            key,
            "llama-3.1-70b-versatile",
            &server.uri(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn chat_sends_bearer_and_token_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer gsk-test"))
            .and(body_partial_json(json!({
                "model": "llama-3.1-70b-versatile",
                "max_tokens": 150,
                "messages": [{ "role": "user", "content": "hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Hello!" } }]
            })))
            .mount(&server)
            .await;

        let reply = groq(&server, "gsk-test")
            .chat(ChatRequest::new(vec![ChatMessage::user("hi")]).with_max_tokens(150))
            .await
            .expect("chat");

        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn server_error_is_adapter_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = groq(&server, "gsk-test")
            .chat(ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::Adapter { adapter: "groq", .. }));
    }

    #[test]
    fn missing_key_names_the_variable() {
        let server_less = OpenAiCompatProvider::new(
            "openai",
            "OPENAI_API_KEY",
            "",
            "gpt-4o-mini",
            "http://127.0.0.1:1",
            Duration::from_secs(1),
        );
        let err = server_less.validate().unwrap_err();
        assert!(matches!(err, AssistantError::Config(msg) if msg.contains("OPENAI_API_KEY")));
    }
}
