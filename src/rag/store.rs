//! VectorIndex trait and the brute-force in-memory implementation.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use super::splitter::DocumentChunk;
use crate::core::errors::AssistantError;

const ADAPTER: &str = "vector_index";

/// A stored chunk with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk_id: String,
    pub content: String,
    pub source: String,
    pub page: Option<u32>,
    pub chunk_index: usize,
}

impl StoredChunk {
    pub fn from_chunk(chunk: DocumentChunk) -> Self {
        let chunk_id = chunk_id(&chunk.source, chunk.chunk_index, &chunk.text);
        Self {
            chunk_id,
            content: chunk.text,
            source: chunk.source,
            page: chunk.page,
            chunk_index: chunk.chunk_index,
        }
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert multiple chunks; either all are added or none.
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>)
        -> Result<(), AssistantError>;

    /// Top `limit` chunks by similarity, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, AssistantError>;
}

#[derive(Default)]
pub struct InMemoryVectorIndex {
    entries: RwLock<Vec<(StoredChunk, Vec<f32>)>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn insert_batch(
        &self,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<(), AssistantError> {
        let mut entries = self.entries.write().await;
        let expected = entries
            .first()
            .map(|(_, v)| v.len())
            .or_else(|| items.first().map(|(_, v)| v.len()));

        if let Some(dim) = expected {
            if dim == 0 {
                return Err(AssistantError::adapter(ADAPTER, "empty embedding vector"));
            }
            if let Some((chunk, vector)) = items.iter().find(|(_, v)| v.len() != dim) {
                return Err(AssistantError::adapter(
                    ADAPTER,
                    format!(
                        "embedding for {} has {} dimensions, index uses {}",
                        chunk.chunk_id,
                        vector.len(),
                        dim
                    ),
                ));
            }
        }

        entries.extend(items);
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, AssistantError> {
        let entries = self.entries.read().await;
        let mut scored: Vec<ChunkSearchResult> = entries
            .iter()
            .map(|(chunk, vector)| ChunkSearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(query_embedding, vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
}

fn chunk_id(source: &str, index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(content.as_bytes());
    hex::encode(&hasher.finalize()[..12])
}
