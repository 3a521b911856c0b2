use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::AssistantError;
use crate::vision::PreparedImage;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// provider name (e.g. "gemini", "openai", "groq")
    fn name(&self) -> &str;

    /// fail with `AssistantError::Config` when the provider cannot be called at all
    fn validate(&self) -> Result<(), AssistantError>;

    /// chat completion (non-streaming); the reply text is returned verbatim
    async fn chat(&self, request: ChatRequest) -> Result<String, AssistantError>;
}

#[async_trait]
pub trait VisionModel: Send + Sync {
    fn name(&self) -> &str;

    /// describe a prepared image in response to `prompt`
    async fn describe(&self, image: &PreparedImage, prompt: &str) -> Result<String, AssistantError>;
}
