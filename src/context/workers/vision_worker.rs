//! VisionWorker: describes the turn's attached image.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::fragment::{ContextFragment, ContextSource};
use crate::context::worker::{ContextWorker, WorkerError};
use crate::llm::VisionModel;
use crate::vision::PreparedImage;

pub const VISION_PROMPT: &str =
    "Describe this image in detail, focusing on any text, diagrams, or educational content.";

pub struct VisionWorker {
    model: Arc<dyn VisionModel>,
    image: Arc<PreparedImage>,
}

impl VisionWorker {
    pub fn new(model: Arc<dyn VisionModel>, image: Arc<PreparedImage>) -> Self {
        Self { model, image }
    }
}

#[async_trait]
impl ContextWorker for VisionWorker {
    fn source(&self) -> ContextSource {
        ContextSource::Vision
    }

    /// The query is not sent; the description prompt is fixed.
    async fn gather(&self, _query: &str) -> Result<ContextFragment, WorkerError> {
        let description = self
            .model
            .describe(&self.image, VISION_PROMPT)
            .await
            .map_err(|e| WorkerError::failed(self.name(), e))?;

        ContextFragment::new(ContextSource::Vision, description)
            .ok_or_else(|| WorkerError::skipped(self.name(), "empty image description"))
    }
}
