pub mod factory;
pub mod gemini;
pub mod openai_compat;
pub mod provider;
pub mod types;

pub use factory::{build_chat_model, build_vision_model, resolve_provider, ProviderKind};
pub use provider::{ChatModel, VisionModel};
pub use types::{ChatMessage, ChatRequest, ChatRole};
