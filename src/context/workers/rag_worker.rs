//! RagWorker: retrieves the chunks nearest to the query from the session index.

use async_trait::async_trait;

use crate::context::fragment::{ContextFragment, ContextSource};
use crate::context::worker::{ContextWorker, WorkerError};
use crate::rag::Retriever;

const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

pub struct RagWorker {
    retriever: Retriever,
    /// Maximum number of chunks to retrieve.
    max_chunks: usize,
}

impl RagWorker {
    pub fn new(retriever: Retriever, max_chunks: usize) -> Self {
        Self {
            retriever,
            max_chunks,
        }
    }
}

#[async_trait]
impl ContextWorker for RagWorker {
    fn source(&self) -> ContextSource {
        ContextSource::Rag
    }

    async fn gather(&self, query: &str) -> Result<ContextFragment, WorkerError> {
        let hits = self
            .retriever
            .query(query, self.max_chunks)
            .await
            .map_err(|e| WorkerError::failed(self.name(), e))?;

        let body = hits
            .iter()
            .map(|hit| hit.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CHUNK_SEPARATOR);

        ContextFragment::new(ContextSource::Rag, body)
            .ok_or_else(|| WorkerError::skipped(self.name(), "no relevant chunks"))
    }
}
