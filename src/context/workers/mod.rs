//! Worker modules, one per context source.

pub mod rag_worker;
pub mod search_worker;
pub mod vision_worker;

pub use rag_worker::RagWorker;
pub use search_worker::SearchWorker;
pub use vision_worker::{VisionWorker, VISION_PROMPT};
