//! Typed view over the merged configuration document.
//!
//! Every section is optional in `config.yml`; missing keys fall back to the
//! constants in [`super::defaults`].

use serde::{Deserialize, Serialize};

use super::defaults;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub llm: LlmSettings,
    pub rag: RagSettings,
    pub search: SearchSettings,
    pub response: ResponseSettings,
    pub context: ContextSettings,
    pub image: ImageSettings,
    pub server: ServerSettings,
}

/// Provider credentials. Each one is optional until the matching adapter is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub google_api_key: String,
    pub openai_api_key: String,
    pub groq_api_key: String,
    pub serper_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub default_provider: String,
    pub gemini_model: String,
    pub openai_model: String,
    pub groq_model: String,
    pub vision_model: String,
    pub temperature: f64,
    pub vision_temperature: f64,
    pub request_timeout_secs: u64,
    pub gemini_base_url: String,
    pub openai_base_url: String,
    pub groq_base_url: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            default_provider: defaults::DEFAULT_PROVIDER.to_string(),
            gemini_model: defaults::DEFAULT_GEMINI_MODEL.to_string(),
            openai_model: defaults::DEFAULT_OPENAI_MODEL.to_string(),
            groq_model: defaults::DEFAULT_GROQ_MODEL.to_string(),
            vision_model: defaults::DEFAULT_GEMINI_MODEL.to_string(),
            temperature: 0.7,
            vision_temperature: 0.4,
            request_timeout_secs: 60,
            gemini_base_url: defaults::GEMINI_BASE_URL.to_string(),
            openai_base_url: defaults::OPENAI_BASE_URL.to_string(),
            groq_base_url: defaults::GROQ_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_retrieved_docs: usize,
    pub embedding_model: String,
    pub max_file_size_mb: u64,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: defaults::CHUNK_SIZE,
            chunk_overlap: defaults::CHUNK_OVERLAP,
            max_retrieved_docs: defaults::MAX_RETRIEVED_DOCS,
            embedding_model: defaults::DEFAULT_EMBEDDING_MODEL.to_string(),
            max_file_size_mb: defaults::MAX_FILE_SIZE_MB,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_search_results: usize,
    pub endpoint: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_search_results: defaults::MAX_SEARCH_RESULTS,
            endpoint: defaults::SERPER_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseSettings {
    pub concise_max_tokens: u32,
    pub detailed_max_tokens: u32,
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self {
            concise_max_tokens: defaults::CONCISE_MAX_TOKENS,
            detailed_max_tokens: defaults::DETAILED_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    pub system_prompt: String,
    /// Upper bound for a single context source (documents, web, vision).
    pub source_timeout_secs: u64,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            system_prompt: defaults::DEFAULT_SYSTEM_PROMPT.to_string(),
            source_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub max_image_size_mb: u64,
    pub max_dimension: u32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_image_size_mb: defaults::MAX_IMAGE_SIZE_MB,
            max_dimension: defaults::MAX_IMAGE_DIMENSION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_yields_documented_defaults() {
        let config: AppConfig = serde_json::from_value(json!({})).expect("defaults");
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.rag.chunk_overlap, 200);
        assert_eq!(config.rag.max_retrieved_docs, 4);
        assert_eq!(config.search.max_search_results, 5);
        assert_eq!(config.response.concise_max_tokens, 150);
        assert_eq!(config.response.detailed_max_tokens, 1000);
        assert_eq!(config.llm.default_provider, "gemini");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig =
            serde_json::from_value(json!({ "rag": { "chunk_size": 500 } })).expect("parse");
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.chunk_overlap, 200);
    }
}
