use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::gemini::GeminiProvider;
use super::openai_compat::OpenAiCompatProvider;
use super::provider::{ChatModel, VisionModel};
use crate::core::config::AppConfig;
use crate::core::errors::AssistantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Groq,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AssistantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            "groq" => Ok(ProviderKind::Groq),
            other => Err(AssistantError::config(format!(
                "unknown LLM provider '{}' (expected gemini, openai or groq)",
                other
            ))),
        }
    }
}

/// Resolves the provider for a turn: an explicit request wins over `llm.default_provider`.
pub fn resolve_provider(
    requested: Option<&str>,
    config: &AppConfig,
) -> Result<ProviderKind, AssistantError> {
    match requested.filter(|name| !name.trim().is_empty()) {
        Some(name) => name.parse(),
        None => config.llm.default_provider.parse(),
    }
}

pub fn build_chat_model(kind: ProviderKind, config: &AppConfig) -> Arc<dyn ChatModel> {
    let llm = &config.llm;
    let timeout = Duration::from_secs(llm.request_timeout_secs);
    match kind {
        ProviderKind::Gemini => Arc::new(
            GeminiProvider::new(
                config.credentials.google_api_key.clone(),
                llm.gemini_model.clone(),
                &llm.gemini_base_url,
                timeout,
            )
            .with_temperature(llm.temperature),
        ),
        ProviderKind::OpenAi => Arc::new(
            OpenAiCompatProvider::new(
                "openai",
                "OPENAI_API_KEY",
                config.credentials.openai_api_key.clone(),
                llm.openai_model.clone(),
                &llm.openai_base_url,
                timeout,
            )
            .with_temperature(llm.temperature),
        ),
        ProviderKind::Groq => Arc::new(
            OpenAiCompatProvider::new(
                "groq",
                "GROQ_API_KEY",
                config.credentials.groq_api_key.clone(),
                llm.groq_model.clone(),
                &llm.groq_base_url,
                timeout,
            )
            .with_temperature(llm.temperature),
        ),
    }
}

/// Image understanding always goes through Gemini, whatever the chat provider is.
pub fn build_vision_model(config: &AppConfig) -> Arc<dyn VisionModel> {
    let llm = &config.llm;
    Arc::new(
        GeminiProvider::new(
            config.credentials.google_api_key.clone(),
            llm.vision_model.clone(),
            &llm.gemini_base_url,
            Duration::from_secs(llm.request_timeout_secs),
        )
        .with_temperature(llm.vision_temperature),
    )
}
