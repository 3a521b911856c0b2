use std::sync::Arc;
use std::time::Duration;

use crate::context::{ContextOrchestrator, OrchestratorSettings};
use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::core::errors::AssistantError;
use crate::core::security::{init_session_token, SessionToken};
use crate::llm::{build_chat_model, build_vision_model, resolve_provider, VisionModel};
use crate::rag::{Embedder, GoogleEmbeddings};
use crate::session::SessionManager;
use crate::tools::search::{SerperSearch, WebSearch};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Holds the loaded configuration, the session registry and the adapters that
/// do not depend on the per-turn provider choice (embeddings, vision, search).
/// The chat model is built per turn, since a turn may name its provider.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub app_config: Arc<AppConfig>,
    pub session_token: SessionToken,
    pub sessions: SessionManager,
    pub vision: Arc<dyn VisionModel>,
    pub search: Arc<dyn WebSearch>,
}

impl AppState {
    /// Loads configuration (file, secrets, environment) and wires the adapters.
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let app_config = config
            .load()
            .map_err(|e| InitializationError::Config(e.into()))?;
        let default_provider =
            resolve_provider(None, &app_config).map_err(|e| InitializationError::Llm(e.into()))?;
        tracing::info!(provider = %default_provider, "Default chat provider");

        let session_token = init_session_token(&paths.user_data_dir);
        let timeout = Duration::from_secs(app_config.llm.request_timeout_secs);
        let embedder: Arc<dyn Embedder> = Arc::new(GoogleEmbeddings::new(
            app_config.credentials.google_api_key.clone(),
            app_config.rag.embedding_model.clone(),
            &app_config.llm.gemini_base_url,
            timeout,
        ));
        let search: Arc<dyn WebSearch> = Arc::new(SerperSearch::new(
            app_config.credentials.serper_api_key.clone(),
            app_config.search.endpoint.clone(),
            timeout,
        ));
        let vision = build_vision_model(&app_config);

        Ok(Self::from_parts(
            paths,
            config,
            app_config,
            session_token,
            embedder,
            vision,
            search,
        ))
    }

    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: ConfigService,
        app_config: AppConfig,
        session_token: SessionToken,
        embedder: Arc<dyn Embedder>,
        vision: Arc<dyn VisionModel>,
        search: Arc<dyn WebSearch>,
    ) -> Arc<Self> {
        let sessions =
            SessionManager::new(embedder, paths.upload_dir.clone(), app_config.rag.clone());
        Arc::new(AppState {
            paths,
            config,
            app_config: Arc::new(app_config),
            session_token,
            sessions,
            vision,
            search,
        })
    }

    /// Orchestrator for one turn, using `provider` or the configured default.
    pub fn orchestrator(&self, provider: Option<&str>) -> Result<ContextOrchestrator, AssistantError> {
        let kind = resolve_provider(provider, &self.app_config)?;
        Ok(ContextOrchestrator::new(
            build_chat_model(kind, &self.app_config),
            self.vision.clone(),
            self.search.clone(),
            OrchestratorSettings::from(self.app_config.as_ref()),
        ))
    }
}
