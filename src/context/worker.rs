//! ContextWorker trait and WorkerPipeline execution engine.
//!
//! Each worker wraps one context source (documents, web, vision) and yields at
//! most one fragment per turn. `WorkerPipeline` runs its workers concurrently,
//! bounds each by a timeout, and merges results in registration order.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use thiserror::Error;

use super::fragment::{ContextFragment, ContextSource};
use crate::core::errors::AssistantError;

// ---------------------------------------------------------------------------
// WorkerError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Nothing to contribute (no hits, blank output). Not a failure.
    #[error("Worker '{name}' skipped: {reason}")]
    Skipped { name: String, reason: String },

    #[error("Worker '{name}' failed: {error}")]
    Failed {
        name: String,
        #[source]
        error: AssistantError,
    },
}

impl WorkerError {
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Skipped {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(name: impl Into<String>, error: AssistantError) -> Self {
        Self::Failed {
            name: name.into(),
            error,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

// ---------------------------------------------------------------------------
// ContextWorker Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContextWorker: Send + Sync {
    fn source(&self) -> ContextSource;

    /// Name for logging / diagnostics.
    fn name(&self) -> &str {
        self.source().as_str()
    }

    /// Produce this source's fragment for `query`.
    async fn gather(&self, query: &str) -> Result<ContextFragment, WorkerError>;
}

// ---------------------------------------------------------------------------
// WorkerPipeline
// ---------------------------------------------------------------------------

/// Fragments that made it, plus one user-facing warning per failed source.
#[derive(Debug, Default)]
pub struct GatherReport {
    pub fragments: Vec<ContextFragment>,
    pub warnings: Vec<String>,
}

pub struct WorkerPipeline {
    workers: Vec<Box<dyn ContextWorker>>,
    timeout: Duration,
}

impl WorkerPipeline {
    pub fn new(timeout: Duration) -> Self {
        Self {
            workers: Vec::new(),
            timeout,
        }
    }

    /// Add a worker to the end of the pipeline.
    pub fn add_worker(mut self, worker: Box<dyn ContextWorker>) -> Self {
        self.workers.push(worker);
        self
    }

    /// Run every worker concurrently and merge in registration order.
    ///
    /// - **Skipped** workers contribute nothing and raise no warning.
    /// - **Failed** or timed-out workers are omitted and reported as warnings.
    pub async fn run(&self, query: &str) -> GatherReport {
        let timeout = self.timeout;
        let results = join_all(self.workers.iter().map(|worker| async move {
            match tokio::time::timeout(timeout, worker.gather(query)).await {
                Ok(result) => result,
                Err(_) => Err(WorkerError::failed(
                    worker.name(),
                    AssistantError::adapter(
                        worker.source().as_str(),
                        format!("timed out after {}s", timeout.as_secs_f32()),
                    ),
                )),
            }
        }))
        .await;

        let mut report = GatherReport::default();
        for (worker, result) in self.workers.iter().zip(results) {
            match result {
                Ok(fragment) => {
                    tracing::debug!("Worker '{}' produced {} bytes", worker.name(), fragment.body.len());
                    report.fragments.push(fragment);
                }
                Err(WorkerError::Skipped { reason, .. }) => {
                    tracing::debug!("Worker '{}' skipped: {}", worker.name(), reason);
                }
                Err(WorkerError::Failed { error, .. }) => {
                    let warning = format!("{}: {}", worker.source().failure_prefix(), error);
                    tracing::warn!("{}", warning);
                    report.warnings.push(warning);
                }
            }
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticWorker {
        source: ContextSource,
        delay: Duration,
        outcome: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl ContextWorker for StaticWorker {
        fn source(&self) -> ContextSource {
            self.source
        }

        async fn gather(&self, _query: &str) -> Result<ContextFragment, WorkerError> {
            tokio::time::sleep(self.delay).await;
            match self.outcome {
                Ok(body) => ContextFragment::new(self.source, body)
                    .ok_or_else(|| WorkerError::skipped(self.name(), "empty")),
                Err(message) => Err(WorkerError::failed(
                    self.name(),
                    AssistantError::adapter("fake", message),
                )),
            }
        }
    }

    fn worker(
        source: ContextSource,
        delay_ms: u64,
        outcome: Result<&'static str, &'static str>,
    ) -> Box<dyn ContextWorker> {
        Box::new(StaticWorker {
            source,
            delay: Duration::from_millis(delay_ms),
            outcome,
        })
    }

    #[tokio::test]
    async fn merge_order_follows_registration_not_completion() {
        let pipeline = WorkerPipeline::new(Duration::from_secs(5))
            .add_worker(worker(ContextSource::Rag, 80, Ok("slow docs")))
            .add_worker(worker(ContextSource::Web, 0, Ok("fast web")));

        let report = pipeline.run("q").await;

        let sources: Vec<ContextSource> = report.fragments.iter().map(|f| f.source).collect();
        assert_eq!(sources, vec![ContextSource::Rag, ContextSource::Web]);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn failures_are_isolated_and_warned() {
        let pipeline = WorkerPipeline::new(Duration::from_secs(5))
            .add_worker(worker(ContextSource::Rag, 0, Err("index offline")))
            .add_worker(worker(ContextSource::Web, 0, Ok("web body")));

        let report = pipeline.run("q").await;

        assert_eq!(report.fragments.len(), 1);
        assert_eq!(report.fragments[0].source, ContextSource::Web);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("RAG retrieval failed: "));
        assert!(report.warnings[0].contains("index offline"));
    }

    #[tokio::test]
    async fn skipped_workers_are_silent() {
        let pipeline = WorkerPipeline::new(Duration::from_secs(5))
            .add_worker(worker(ContextSource::Web, 0, Ok("   ")));

        let report = pipeline.run("q").await;

        assert!(report.fragments.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_workers_time_out_without_blocking_others() {
        let pipeline = WorkerPipeline::new(Duration::from_secs(1))
            .add_worker(worker(ContextSource::Rag, 0, Ok("docs")))
            .add_worker(worker(ContextSource::Web, 60_000, Ok("too late")));

        let report = pipeline.run("q").await;

        assert_eq!(report.fragments.len(), 1);
        assert_eq!(report.fragments[0].source, ContextSource::Rag);
        assert!(report.warnings[0].starts_with("Web search failed: "));
        assert!(report.warnings[0].contains("timed out"));
    }
}
