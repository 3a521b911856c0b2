//! Session-owned retrieval index.
//!
//! Lifecycle: `Absent -> Building -> Ready`, `Ready -> Building -> Ready` when
//! more documents are added, `Ready -> Absent` on reset. A failed first build
//! returns to `Absent`; a failed additional build returns to the previous
//! `Ready` index, which is never partially modified.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::embeddings::Embedder;
use super::loader::{load_document, DocumentKind};
use super::splitter::{split_segments, DocumentChunk};
use super::store::{ChunkSearchResult, InMemoryVectorIndex, StoredChunk, VectorIndex};
use crate::core::errors::AssistantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    Absent,
    Building,
    Ready,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document: String,
    pub chunks: usize,
    pub total_chunks: usize,
}

pub struct RetrievalIndex {
    state: IndexState,
    store: Option<Arc<dyn VectorIndex>>,
    documents: Vec<String>,
    chunk_count: usize,
}

impl Default for RetrievalIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrievalIndex {
    pub fn new() -> Self {
        Self {
            state: IndexState::Absent,
            store: None,
            documents: Vec::new(),
            chunk_count: 0,
        }
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == IndexState::Ready
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Load, split and index one file.
    pub async fn ingest_file(
        &mut self,
        path: &Path,
        embedder: &dyn Embedder,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<IngestReport, AssistantError> {
        // Reject unsupported types before touching the file.
        DocumentKind::from_path(path)?;
        let document = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        let owned_path = path.to_path_buf();
        let segments = tokio::task::spawn_blocking(move || load_document(&owned_path))
            .await
            .map_err(|e| AssistantError::adapter("document_loader", e))??;
        let chunks = split_segments(&segments, chunk_size, chunk_overlap)?;

        self.ingest_chunks(document, chunks, embedder).await
    }

    /// Embed and add pre-split chunks under `document`.
    pub async fn ingest_chunks(
        &mut self,
        document: String,
        chunks: Vec<DocumentChunk>,
        embedder: &dyn Embedder,
    ) -> Result<IngestReport, AssistantError> {
        let previous = self.state;
        self.state = IndexState::Building;

        match self.build(&chunks, embedder).await {
            Ok(added) => {
                self.state = IndexState::Ready;
                self.chunk_count += added;
                self.documents.push(document.clone());
                tracing::info!(
                    document = %document,
                    chunks = added,
                    total = self.chunk_count,
                    "Document indexed"
                );
                Ok(IngestReport {
                    document,
                    chunks: added,
                    total_chunks: self.chunk_count,
                })
            }
            Err(err) => {
                self.state = previous;
                tracing::warn!(document = %document, error = %err, "Document indexing failed");
                Err(err)
            }
        }
    }

    async fn build(
        &mut self,
        chunks: &[DocumentChunk],
        embedder: &dyn Embedder,
    ) -> Result<usize, AssistantError> {
        if chunks.is_empty() {
            return Err(AssistantError::validation(
                "document contains no extractable text",
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(AssistantError::adapter(
                "embeddings",
                format!("expected {} embeddings, got {}", chunks.len(), embeddings.len()),
            ));
        }

        let items: Vec<(StoredChunk, Vec<f32>)> = chunks
            .iter()
            .cloned()
            .map(StoredChunk::from_chunk)
            .zip(embeddings)
            .collect();

        // A fresh store is only kept once the first batch is in.
        let store: Arc<dyn VectorIndex> = match &self.store {
            Some(store) => store.clone(),
            None => Arc::new(InMemoryVectorIndex::new()),
        };
        store.insert_batch(items).await?;
        self.store = Some(store);
        Ok(chunks.len())
    }

    /// Drops the index and the list of loaded documents together.
    pub fn reset(&mut self) {
        self.state = IndexState::Absent;
        self.store = None;
        self.documents.clear();
        self.chunk_count = 0;
    }

    /// Query handle, available only while the index is `Ready`.
    pub fn retriever(&self, embedder: Arc<dyn Embedder>) -> Option<Retriever> {
        if !self.is_ready() {
            return None;
        }
        self.store.as_ref().map(|store| Retriever {
            store: store.clone(),
            embedder,
        })
    }
}

/// Cloneable read handle over a ready index, usable without holding the session.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ChunkSearchResult>, AssistantError> {
        let embedding = self.embedder.embed_query(text).await?;
        self.store.search(&embedding, k).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Embeds by counting a few marker words, so similarity is predictable.
    pub(crate) struct KeywordEmbedder {
        pub fail: AtomicBool,
    }

    impl KeywordEmbedder {
        pub(crate) fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
            }
        }

        pub(crate) fn vector(text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            ["cell", "atom", "war", "poem"]
                .iter()
                .map(|word| lower.matches(word).count() as f32 + 0.01)
                .collect()
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AssistantError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AssistantError::adapter("embeddings", "quota exceeded"));
            }
            Ok(texts.iter().map(|t| Self::vector(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AssistantError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AssistantError::adapter("embeddings", "quota exceeded"));
            }
            Ok(Self::vector(text))
        }
    }

    fn chunks(source: &str, texts: &[&str]) -> Vec<DocumentChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| DocumentChunk {
                text: text.to_string(),
                source: source.to_string(),
                page: None,
                chunk_index: i,
            })
            .collect()
    }

    #[tokio::test]
    async fn first_build_moves_absent_to_ready() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let mut index = RetrievalIndex::new();
        assert_eq!(index.state(), IndexState::Absent);
        assert!(index.retriever(embedder.clone()).is_none());

        let report = index
            .ingest_chunks(
                "bio.txt".to_string(),
                chunks("bio.txt", &["The cell membrane", "Cell division"]),
                embedder.as_ref(),
            )
            .await
            .expect("ingest");

        assert_eq!(report.chunks, 2);
        assert_eq!(index.state(), IndexState::Ready);
        assert_eq!(index.documents(), ["bio.txt".to_string()]);
        let hits = index
            .retriever(embedder.clone())
            .expect("ready")
            .query("what is a cell?", 1)
            .await
            .expect("query");
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn second_build_is_additive() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let mut index = RetrievalIndex::new();
        index
            .ingest_chunks("bio.txt".into(), chunks("bio.txt", &["cell walls"]), embedder.as_ref())
            .await
            .expect("first");
        index
            .ingest_chunks("chem.txt".into(), chunks("chem.txt", &["atom nuclei"]), embedder.as_ref())
            .await
            .expect("second");

        assert_eq!(index.chunk_count(), 2);
        assert_eq!(index.documents().len(), 2);
        let retriever = index.retriever(embedder.clone()).expect("ready");
        let cell = retriever.query("cell", 1).await.expect("query");
        let atom = retriever.query("atom", 1).await.expect("query");
        assert_eq!(cell[0].chunk.source, "bio.txt");
        assert_eq!(atom[0].chunk.source, "chem.txt");
    }

    #[tokio::test]
    async fn failed_first_build_returns_to_absent() {
        let embedder = KeywordEmbedder::new();
        embedder.fail.store(true, Ordering::SeqCst);
        let mut index = RetrievalIndex::new();

        let result = index
            .ingest_chunks("bio.txt".into(), chunks("bio.txt", &["cell"]), &embedder)
            .await;

        assert!(matches!(result, Err(AssistantError::Adapter { .. })));
        assert_eq!(index.state(), IndexState::Absent);
        assert!(index.documents().is_empty());
    }

    #[tokio::test]
    async fn failed_additional_build_keeps_previous_index() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let mut index = RetrievalIndex::new();
        index
            .ingest_chunks("bio.txt".into(), chunks("bio.txt", &["cell walls"]), embedder.as_ref())
            .await
            .expect("first");

        embedder.fail.store(true, Ordering::SeqCst);
        let result = index
            .ingest_chunks("chem.txt".into(), chunks("chem.txt", &["atoms"]), embedder.as_ref())
            .await;
        embedder.fail.store(false, Ordering::SeqCst);

        assert!(result.is_err());
        assert_eq!(index.state(), IndexState::Ready);
        assert_eq!(index.chunk_count(), 1);
        assert_eq!(index.documents(), ["bio.txt".to_string()]);
    }

    #[tokio::test]
    async fn reset_drops_index_and_document_names() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let mut index = RetrievalIndex::new();
        index
            .ingest_chunks("bio.txt".into(), chunks("bio.txt", &["cell"]), embedder.as_ref())
            .await
            .expect("ingest");

        index.reset();

        assert_eq!(index.state(), IndexState::Absent);
        assert!(index.documents().is_empty());
        assert_eq!(index.chunk_count(), 0);
        assert!(index.retriever(embedder).is_none());
    }

    #[tokio::test]
    async fn ingest_file_rejects_unsupported_type_without_embedding() {
        let embedder = KeywordEmbedder::new();
        embedder.fail.store(true, Ordering::SeqCst);
        let mut index = RetrievalIndex::new();

        let err = index
            .ingest_file(Path::new("/missing/deck.pptx"), &embedder, 1000, 200)
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::Validation(_)));
        assert_eq!(index.state(), IndexState::Absent);
    }

    #[tokio::test]
    async fn ingest_file_indexes_text_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Cells divide.\n\nAtoms bond.").expect("write");
        let embedder = KeywordEmbedder::new();
        let mut index = RetrievalIndex::new();

        let report = index
            .ingest_file(&path, &embedder, 20, 5)
            .await
            .expect("ingest");

        assert_eq!(report.document, "notes.txt");
        assert_eq!(report.chunks, 2);
        assert!(index.is_ready());
    }
}
