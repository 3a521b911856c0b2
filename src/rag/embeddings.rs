use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::errors::AssistantError;

const ADAPTER: &str = "embeddings";
/// Upper bound on texts per `batchEmbedContents` request.
const MAX_BATCH: usize = 100;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AssistantError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AssistantError>;
}

/// Google `embedding-001` through the Generative Language API.
#[derive(Clone)]
pub struct GoogleEmbeddings {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GoogleEmbeddings {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Self {
        let model = model.into();
        let model = if model.starts_with("models/") {
            model
        } else {
            format!("models/{}", model)
        };
        Self {
            api_key: api_key.into(),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn url(&self, action: &str) -> Result<String, AssistantError> {
        if self.api_key.trim().is_empty() {
            return Err(AssistantError::config(
                "GOOGLE_API_KEY is not set; document embeddings are unavailable",
            ));
        }
        Ok(format!(
            "{}/{}:{}?key={}",
            self.base_url,
            self.model,
            action,
            urlencoding::encode(&self.api_key)
        ))
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, AssistantError> {
        let res = self
            .client
            .post(url)
            .json(body)
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

        res.json()
            .await
            .map_err(|e| AssistantError::adapter(ADAPTER, e))
    }
}

fn parse_values(value: &Value) -> Option<Vec<f32>> {
    value["values"]
        .as_array()
        .map(|vals| vals.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect())
}

#[async_trait]
impl Embedder for GoogleEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AssistantError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.url("batchEmbedContents")?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            let requests: Vec<Value> = batch
                .iter()
                .map(|text| {
                    json!({
                        "model": self.model,
                        "content": { "parts": [{ "text": text }] },
                        "taskType": "RETRIEVAL_DOCUMENT",
                    })
                })
                .collect();

            let payload = self.post(&url, &json!({ "requests": requests })).await?;
            let items = payload["embeddings"].as_array().cloned().unwrap_or_default();
            if items.len() != batch.len() {
                return Err(AssistantError::adapter(
                    ADAPTER,
                    format!("expected {} embeddings, got {}", batch.len(), items.len()),
                ));
            }
            for item in &items {
                let values = parse_values(item).ok_or_else(|| {
                    AssistantError::adapter(ADAPTER, "embedding without values")
                })?;
                embeddings.push(values);
            }
        }

        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AssistantError> {
        let url = self.url("embedContent")?;
        let body = json!({
            "model": self.model,
            "content": { "parts": [{ "text": text }] },
            "taskType": "RETRIEVAL_QUERY",
        });
        let payload = self.post(&url, &body).await?;
        parse_values(&payload["embedding"])
            .ok_or_else(|| AssistantError::adapter(ADAPTER, "embedding without values"))
    }
}
