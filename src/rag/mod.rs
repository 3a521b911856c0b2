//! Retrieval over user-uploaded documents.
//!
//! - `loader` / `splitter`: file to text segments to overlapping chunks
//! - `embeddings`: `Embedder` trait and the Google implementation
//! - `store`: `VectorIndex` trait and the in-memory cosine index
//! - `index`: the per-session `RetrievalIndex` lifecycle and its `Retriever`

pub mod embeddings;
pub mod index;
pub mod loader;
pub mod splitter;
pub mod store;

pub use embeddings::{Embedder, GoogleEmbeddings};
pub use index::{IndexState, IngestReport, Retriever, RetrievalIndex};
pub use loader::{load_document, DocumentKind, DocumentSegment};
pub use splitter::{split_segments, DocumentChunk};
pub use store::{ChunkSearchResult, InMemoryVectorIndex, StoredChunk, VectorIndex};
