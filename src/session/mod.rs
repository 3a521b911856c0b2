//! Per-learner session state.
//!
//! A `Session` owns its conversation history, its retrieval index and at most
//! one image attached for the next turn. The manager hands out sessions behind
//! an async mutex, so a session serves one turn or one ingestion at a time.

pub mod manager;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::context::{
    ContextOrchestrator, ConversationTurn, ResponseMode, TurnFlags, TurnOutcome, TurnRequest,
    TurnRole,
};
use crate::core::errors::AssistantError;
use crate::rag::{Embedder, IndexState, IngestReport, RetrievalIndex};
use crate::vision::{ImageInfo, PreparedImage};

pub use manager::SessionManager;

pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    history: Vec<ConversationTurn>,
    index: RetrievalIndex,
    attached_image: Option<Arc<PreparedImage>>,
}

/// History entry as reported by the API; image bytes are not echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub role: TurnRole,
    pub text: String,
    pub has_image: bool,
}

/// Read-only view returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<MessageView>,
    pub documents: Vec<String>,
    pub index_state: IndexState,
    pub chunk_count: usize,
    pub attached_image: Option<ImageInfo>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            history: Vec::new(),
            index: RetrievalIndex::new(),
            attached_image: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn index(&self) -> &RetrievalIndex {
        &self.index
    }

    pub fn attached_image(&self) -> Option<&PreparedImage> {
        self.attached_image.as_deref()
    }

    /// Replaces any image already waiting for the next turn.
    pub fn attach_image(&mut self, image: PreparedImage) {
        self.attached_image = Some(Arc::new(image));
    }

    /// Returns whether an image was attached.
    pub fn remove_image(&mut self) -> bool {
        self.attached_image.take().is_some()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn reset_documents(&mut self) {
        self.index.reset();
        tracing::info!(session = %self.id, "Retrieval index reset");
    }

    pub async fn ingest_file(
        &mut self,
        path: &Path,
        embedder: &dyn Embedder,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<IngestReport, AssistantError> {
        self.index
            .ingest_file(path, embedder, chunk_size, chunk_overlap)
            .await
    }

    /// Runs one turn and records it.
    ///
    /// The user turn keeps the learner's own words, not the image-augmented
    /// query. A failed chat call is still recorded, with the formatted error as
    /// the assistant text. A rejected (empty) query records nothing and keeps
    /// the attached image.
    pub async fn run_turn(
        &mut self,
        orchestrator: &ContextOrchestrator,
        embedder: Arc<dyn Embedder>,
        query: &str,
        flags: TurnFlags,
        mode: ResponseMode,
    ) -> Result<TurnOutcome, AssistantError> {
        let mut request = TurnRequest::new(query).with_flags(flags).with_mode(mode);
        if let Some(image) = &self.attached_image {
            request = request.with_image(image.clone());
        }

        let retriever = self.index.retriever(embedder);
        let outcome = orchestrator.answer(&self.history, retriever, request).await?;

        let image = self
            .attached_image
            .take()
            .map(|image| image.bytes().to_vec());
        self.history.push(ConversationTurn::user(query, image));
        self.history
            .push(ConversationTurn::assistant(outcome.reply.text()));

        tracing::debug!(
            session = %self.id,
            turns = self.history.len(),
            failed = outcome.reply.is_failed(),
            "Turn recorded"
        );
        Ok(outcome)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            messages: self
                .history
                .iter()
                .map(|turn| MessageView {
                    role: turn.role,
                    text: turn.text.clone(),
                    has_image: turn.image.is_some(),
                })
                .collect(),
            documents: self.index.documents().to_vec(),
            index_state: self.index.state(),
            chunk_count: self.index.chunk_count(),
            attached_image: self.attached_image.as_ref().map(|image| image.info()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};

    use crate::context::OrchestratorSettings;
    use crate::core::config::AppConfig;
    use crate::llm::{ChatModel, ChatRequest, VisionModel};
    use crate::rag::index::tests::KeywordEmbedder;
    use crate::tools::search::{SearchHit, WebSearch};
    use crate::vision::{prepare_image, ImageLimits};

    pub(crate) struct ScriptedChat {
        pub(crate) reply: Result<String, AssistantError>,
        pub(crate) seen: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        fn name(&self) -> &str {
            "scripted"
        }

        fn validate(&self) -> Result<(), AssistantError> {
            Ok(())
        }

        async fn chat(&self, request: ChatRequest) -> Result<String, AssistantError> {
            self.seen.lock().expect("lock").push(request);
            self.reply.clone()
        }
    }

    pub(crate) struct EchoVision;

    #[async_trait]
    impl VisionModel for EchoVision {
        fn name(&self) -> &str {
            "echo"
        }

        async fn describe(&self, image: &PreparedImage, _prompt: &str) -> Result<String, AssistantError> {
            Ok(format!("an image of {} bytes", image.bytes().len()))
        }
    }

    pub(crate) struct NoSearch;

    #[async_trait]
    impl WebSearch for NoSearch {
        async fn search(&self, _query: &str, _num: usize) -> Result<Vec<SearchHit>, AssistantError> {
            Ok(Vec::new())
        }
    }

    pub(crate) fn orchestrator(reply: Result<&str, AssistantError>) -> (ContextOrchestrator, Arc<ScriptedChat>) {
        let chat = Arc::new(ScriptedChat {
            reply: reply.map(str::to_string),
            seen: Mutex::new(Vec::new()),
        });
        let orchestrator = ContextOrchestrator::new(
            chat.clone(),
            Arc::new(EchoVision),
            Arc::new(NoSearch),
            OrchestratorSettings::from(&AppConfig::default()),
        );
        (orchestrator, chat)
    }

    pub(crate) fn png_bytes() -> Vec<u8> {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(6, 6))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .expect("encode");
        png
    }

    #[tokio::test]
    async fn turns_are_appended_in_order() {
        let (orchestrator, chat) = orchestrator(Ok("Mitochondria make ATP."));
        let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::new());
        let mut session = Session::new("s1");

        session
            .run_turn(&orchestrator, embedder.clone(), "What do mitochondria do?", TurnFlags::default(), ResponseMode::Concise)
            .await
            .expect("first");
        session
            .run_turn(&orchestrator, embedder, "And chloroplasts?", TurnFlags::default(), ResponseMode::Concise)
            .await
            .expect("second");

        let roles: Vec<TurnRole> = session.history().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![TurnRole::User, TurnRole::Assistant, TurnRole::User, TurnRole::Assistant]
        );
        // The second call replays the first exchange.
        assert_eq!(chat.seen.lock().expect("lock")[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn failed_turn_is_recorded_with_error_text() {
        let (orchestrator, _) = orchestrator(Err(AssistantError::adapter("gemini", "HTTP 500")));
        let mut session = Session::new("s1");

        let outcome = session
            .run_turn(
                &orchestrator,
                Arc::new(KeywordEmbedder::new()),
                "Explain osmosis",
                TurnFlags::default(),
                ResponseMode::Detailed,
            )
            .await
            .expect("turn");

        assert!(outcome.reply.is_failed());
        assert_eq!(session.history().len(), 2);
        assert_eq!(
            session.history()[1].text,
            "Error getting response: gemini failed: HTTP 500"
        );
    }

    #[tokio::test]
    async fn attached_image_is_consumed_by_one_turn() {
        let (orchestrator, chat) = orchestrator(Ok("It is a square."));
        let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::new());
        let mut session = Session::new("s1");
        session.attach_image(
            prepare_image(&png_bytes(), Some("shape.png"), ImageLimits::default()).expect("image"),
        );

        let outcome = session
            .run_turn(&orchestrator, embedder.clone(), "What shape is this?", TurnFlags::default(), ResponseMode::Concise)
            .await
            .expect("turn");

        assert!(outcome.features.image_analysis);
        assert!(session.attached_image().is_none());
        assert_eq!(session.history()[0].text, "What shape is this?");
        assert!(session.history()[0].image.is_some());
        {
            let sent = &chat.seen.lock().expect("lock")[0];
            assert!(sent.messages.last().expect("user").content.starts_with("[Image Content]: "));
        }

        session
            .run_turn(&orchestrator, embedder, "Thanks", TurnFlags::default(), ResponseMode::Concise)
            .await
            .expect("turn");
        assert!(session.history()[2].image.is_none());
    }

    #[tokio::test]
    async fn empty_query_records_nothing_and_keeps_image() {
        let (orchestrator, _) = orchestrator(Ok("unused"));
        let mut session = Session::new("s1");
        session.attach_image(
            prepare_image(&png_bytes(), None, ImageLimits::default()).expect("image"),
        );

        let err = session
            .run_turn(&orchestrator, Arc::new(KeywordEmbedder::new()), "  ", TurnFlags::default(), ResponseMode::Concise)
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::Validation(_)));
        assert!(session.history().is_empty());
        assert!(session.attached_image().is_some());
    }

    #[tokio::test]
    async fn reset_documents_disables_rag_for_next_turn() {
        let (orchestrator, chat) = orchestrator(Ok("ok"));
        let embedder = Arc::new(KeywordEmbedder::new());
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bio.md");
        std::fs::write(&path, "# Cells\n\nThe cell is the unit of life.").expect("write");
        let mut session = Session::new("s1");
        session
            .ingest_file(&path, embedder.as_ref(), 1000, 200)
            .await
            .expect("ingest");
        assert_eq!(session.summary().documents, vec!["bio.md".to_string()]);

        session.reset_documents();
        let flags = TurnFlags {
            use_rag: true,
            use_web_search: false,
        };
        let outcome = session
            .run_turn(&orchestrator, embedder, "What is a cell?", flags, ResponseMode::Concise)
            .await
            .expect("turn");

        assert!(!outcome.features.rag);
        let summary = session.summary();
        assert_eq!(summary.index_state, IndexState::Absent);
        assert!(summary.documents.is_empty());
        assert_eq!(
            chat.seen.lock().expect("lock")[0].messages.last().expect("user").content,
            "What is a cell?"
        );
    }
}
