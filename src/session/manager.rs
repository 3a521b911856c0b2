use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::Session;
use crate::core::config::settings::RagSettings;
use crate::core::errors::AssistantError;
use crate::rag::{DocumentKind, Embedder, IngestReport};

pub type SharedSession = Arc<Mutex<Session>>;

/// In-memory registry of live sessions.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
    embedder: Arc<dyn Embedder>,
    upload_dir: PathBuf,
    rag: RagSettings,
}

impl SessionManager {
    pub fn new(embedder: Arc<dyn Embedder>, upload_dir: PathBuf, rag: RagSettings) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            embedder,
            upload_dir,
            rag,
        }
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.rag.max_file_size_mb * 1024 * 1024
    }

    pub async fn create(&self) -> SharedSession {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::new(id.clone())));
        self.sessions.write().await.insert(id.clone(), session.clone());
        tracing::info!(session = %id, "Session created");
        session
    }

    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Removes the session and its saved uploads.
    pub async fn delete(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            self.remove_uploads(id).await;
            tracing::info!(session = %id, "Session deleted");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Saves an uploaded document under the session's own upload directory
    /// and indexes it into the session.
    ///
    /// The session lock is held from the write through indexing.
    pub async fn ingest_upload(
        &self,
        session: &SharedSession,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<IngestReport, AssistantError> {
        let mut session = session.lock().await;
        let path = self.save_upload(session.id(), file_name, bytes).await?;
        session
            .ingest_file(
                &path,
                self.embedder.as_ref(),
                self.rag.chunk_size,
                self.rag.chunk_overlap,
            )
            .await
    }

    /// Drops the session's index and deletes its saved uploads.
    pub async fn reset_documents(&self, session: &SharedSession) {
        let mut session = session.lock().await;
        session.reset_documents();
        self.remove_uploads(session.id()).await;
    }

    pub fn session_upload_dir(&self, session_id: &str) -> PathBuf {
        self.upload_dir.join(session_id)
    }

    async fn remove_uploads(&self, session_id: &str) {
        let dir = self.session_upload_dir(session_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::debug!(path = %dir.display(), "Uploads removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %dir.display(), error = %e, "Failed to remove uploads"),
        }
    }

    async fn save_upload(
        &self,
        session_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, AssistantError> {
        // Only the final path component is kept.
        let name = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AssistantError::validation("file name is required"))?;
        let dir = self.session_upload_dir(session_id);
        let path = dir.join(name);
        DocumentKind::from_path(&path)?;

        if bytes.len() as u64 > self.max_upload_bytes() {
            return Err(AssistantError::validation(format!(
                "File too large (max {}MB)",
                self.rag.max_file_size_mb
            )));
        }

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AssistantError::adapter("document_loader", e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AssistantError::adapter("document_loader", e))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Upload saved");
        Ok(path)
    }
}
