//! Per-turn context orchestration.
//!
//! A turn runs in four stages: decide which sources to consult, fold an image
//! description into the query, gather document and web context concurrently,
//! then make exactly one chat-model call over the assembled prompt. Optional
//! sources degrade to warnings; only the chat call can fail a turn.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::conversation::ConversationTurn;
use super::fragment::{ContextFragment, ContextSource};
use super::heuristic::resolve_web_search;
use super::prompt::{apply_image_description, build_augmented_query, build_messages};
use super::response_mode::ResponseMode;
use super::worker::WorkerPipeline;
use super::workers::{RagWorker, SearchWorker, VisionWorker};
use crate::core::config::settings::{AppConfig, ResponseSettings};
use crate::core::errors::AssistantError;
use crate::llm::{ChatModel, ChatRequest, VisionModel};
use crate::rag::Retriever;
use crate::tools::search::WebSearch;
use crate::vision::PreparedImage;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub system_prompt: String,
    pub max_retrieved_docs: usize,
    pub max_search_results: usize,
    pub source_timeout: Duration,
    pub response: ResponseSettings,
}

impl From<&AppConfig> for OrchestratorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            system_prompt: config.context.system_prompt.clone(),
            max_retrieved_docs: config.rag.max_retrieved_docs,
            max_search_results: config.search.max_search_results,
            source_timeout: Duration::from_secs(config.context.source_timeout_secs),
            response: config.response.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnFlags {
    pub use_rag: bool,
    pub use_web_search: bool,
}

#[derive(Clone)]
pub struct TurnRequest {
    pub query: String,
    pub image: Option<Arc<PreparedImage>>,
    pub flags: TurnFlags,
    pub mode: ResponseMode,
}

impl TurnRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            image: None,
            flags: TurnFlags::default(),
            mode: ResponseMode::default(),
        }
    }

    pub fn with_image(mut self, image: Arc<PreparedImage>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_flags(mut self, flags: TurnFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_mode(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Which optional sources actually contributed to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeaturesUsed {
    pub rag: bool,
    pub web_search: bool,
    pub auto_web_search: bool,
    pub image_analysis: bool,
    pub mode: ResponseMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnReply {
    Answer(String),
    /// The chat call failed; `message` is what the learner sees.
    Failed {
        message: String,
        error: AssistantError,
    },
}

impl TurnReply {
    fn failed(error: AssistantError) -> Self {
        TurnReply::Failed {
            message: format!("Error getting response: {}", error),
            error,
        }
    }

    /// Text recorded as the assistant turn.
    pub fn text(&self) -> &str {
        match self {
            TurnReply::Answer(text) => text,
            TurnReply::Failed { message, .. } => message,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TurnReply::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: TurnReply,
    pub augmented_query: String,
    pub fragments: Vec<ContextFragment>,
    pub warnings: Vec<String>,
    pub features: FeaturesUsed,
}

pub struct ContextOrchestrator {
    chat: Arc<dyn ChatModel>,
    vision: Arc<dyn VisionModel>,
    search: Arc<dyn WebSearch>,
    settings: OrchestratorSettings,
}

impl ContextOrchestrator {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        vision: Arc<dyn VisionModel>,
        search: Arc<dyn WebSearch>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            chat,
            vision,
            search,
            settings,
        }
    }

    /// Answer one learner turn.
    ///
    /// `retriever` is the session's index handle, present only while that index
    /// is ready. An empty query is rejected before any collaborator is called.
    pub async fn answer(
        &self,
        history: &[ConversationTurn],
        retriever: Option<Retriever>,
        request: TurnRequest,
    ) -> Result<TurnOutcome, AssistantError> {
        if request.query.trim().is_empty() {
            return Err(AssistantError::validation("Query cannot be empty"));
        }

        let web = resolve_web_search(request.flags.use_web_search, &request.query);
        let mode = request.mode.config(&self.settings.response);
        let mut features = FeaturesUsed {
            rag: false,
            web_search: false,
            auto_web_search: web.auto_triggered,
            image_analysis: false,
            mode: request.mode,
        };

        if let Err(error) = self.chat.validate() {
            tracing::error!(provider = self.chat.name(), error = %error, "Chat model unavailable");
            return Ok(TurnOutcome {
                reply: TurnReply::failed(error),
                augmented_query: request.query,
                fragments: Vec::new(),
                warnings: Vec::new(),
                features,
            });
        }

        let mut fragments = Vec::new();
        let mut warnings = Vec::new();

        // Image description is folded in before any other context is gathered.
        let mut working_query = request.query.clone();
        if let Some(image) = &request.image {
            let report = WorkerPipeline::new(self.settings.source_timeout)
                .add_worker(Box::new(VisionWorker::new(self.vision.clone(), image.clone())))
                .run(&request.query)
                .await;
            warnings.extend(report.warnings);
            let vision = report
                .fragments
                .into_iter()
                .find(|f| f.source == ContextSource::Vision);
            working_query = apply_image_description(&request.query, vision.as_ref());
            features.image_analysis = vision.is_some();
            fragments.extend(vision);
        }

        let mut pipeline = WorkerPipeline::new(self.settings.source_timeout);
        match (request.flags.use_rag, retriever) {
            (true, Some(retriever)) => {
                pipeline = pipeline.add_worker(Box::new(RagWorker::new(
                    retriever,
                    self.settings.max_retrieved_docs,
                )));
            }
            (true, None) => tracing::debug!("Document retrieval requested but no index is ready"),
            (false, _) => {}
        }
        if web.enabled {
            if web.auto_triggered {
                tracing::info!("Web search auto-triggered by query keywords");
            }
            pipeline = pipeline.add_worker(Box::new(SearchWorker::new(
                self.search.clone(),
                self.settings.max_search_results,
            )));
        }

        let report = pipeline.run(&working_query).await;
        warnings.extend(report.warnings);
        features.rag = report.fragments.iter().any(|f| f.source == ContextSource::Rag);
        features.web_search = report.fragments.iter().any(|f| f.source == ContextSource::Web);

        let augmented_query = build_augmented_query(&working_query, &report.fragments);
        fragments.extend(report.fragments);
        fragments.sort_by_key(|f| f.source);

        let messages = build_messages(&self.settings.system_prompt, &mode, history, &augmented_query);
        let chat_request = ChatRequest::new(messages).with_max_tokens(mode.max_tokens);

        let reply = match self.chat.chat(chat_request).await {
            Ok(text) => TurnReply::Answer(text),
            Err(error) => {
                tracing::error!(provider = self.chat.name(), error = %error, "Chat completion failed");
                TurnReply::failed(error)
            }
        };

        Ok(TurnOutcome {
            reply,
            augmented_query,
            fragments,
            warnings,
            features,
        })
    }
}
