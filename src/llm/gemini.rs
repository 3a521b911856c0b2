use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{ChatModel, VisionModel};
use super::types::{ChatMessage, ChatRequest, ChatRole};
use crate::core::errors::AssistantError;
use crate::vision::PreparedImage;

const ADAPTER: &str = "gemini";

/// Google Generative Language API (`models/{model}:generateContent`).
///
/// The same client serves plain chat and multimodal image description; the
/// vision instance is simply built with the vision model and temperature.
#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
    client: Client,
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Self {
        Self {
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

    fn ensure_key(&self) -> Result<(), AssistantError> {
        if self.api_key.trim().is_empty() {
            return Err(AssistantError::config(
                "GOOGLE_API_KEY is not set; the gemini provider cannot be used",
            ));
        }
        Ok(())
    }

    async fn generate(&self, body: Value) -> Result<String, AssistantError> {
        self.ensure_key()?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&self.api_key)
        );

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::adapter(ADAPTER, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AssistantError::adapter(
                ADAPTER,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| AssistantError::adapter(ADAPTER, e))?;

        extract_candidate_text(&payload).ok_or_else(|| {
            AssistantError::adapter(ADAPTER, "response contained no candidate text")
        })
    }
}

fn gemini_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::Assistant => "model",
        _ => "user",
    }
}

/// Splits system messages into `systemInstruction` and the rest into `contents`.
fn build_chat_body(request: &ChatRequest, default_temperature: f64) -> Value {
    let system_text = request
        .messages
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let contents: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m: &ChatMessage| {
            json!({
                "role": gemini_role(m.role),
                "parts": [{ "text": m.content }],
            })
        })
        .collect();

    let mut generation_config = json!({
        "temperature": request.temperature.unwrap_or(default_temperature),
    });
    if let Some(max_tokens) = request.max_tokens {
        generation_config["maxOutputTokens"] = json!(max_tokens);
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation_config,
    });
    if !system_text.is_empty() {
        body["systemInstruction"] = json!({ "parts": [{ "text": system_text }] });
    }
    body
}

fn extract_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect::<Vec<_>>()
        .join("");
    Some(text)
}

#[async_trait]
impl ChatModel for GeminiProvider {
    fn name(&self) -> &str {
        ADAPTER
    }

    fn validate(&self) -> Result<(), AssistantError> {
        self.ensure_key()
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, AssistantError> {
        let body = build_chat_body(&request, self.temperature);
        self.generate(body).await
    }
}

#[async_trait]
impl VisionModel for GeminiProvider {
    fn name(&self) -> &str {
        ADAPTER
    }

    async fn describe(&self, image: &PreparedImage, prompt: &str) -> Result<String, AssistantError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": image.mime_type(),
                            "data": image.base64_data(),
                        }
                    },
                    { "text": prompt },
                ],
            }],
            "generationConfig": { "temperature": self.temperature },
        });
        self.generate(body).await
    }
}
