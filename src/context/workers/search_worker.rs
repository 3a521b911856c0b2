//! SearchWorker: performs a web search and injects the formatted results.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::fragment::{ContextFragment, ContextSource};
use crate::context::worker::{ContextWorker, WorkerError};
use crate::tools::search::{format_search_results, WebSearch};

pub struct SearchWorker {
    search: Arc<dyn WebSearch>,
    num_results: usize,
}

impl SearchWorker {
    pub fn new(search: Arc<dyn WebSearch>, num_results: usize) -> Self {
        Self {
            search,
            num_results,
        }
    }
}

#[async_trait]
impl ContextWorker for SearchWorker {
    fn source(&self) -> ContextSource {
        ContextSource::Web
    }

    async fn gather(&self, query: &str) -> Result<ContextFragment, WorkerError> {
        let hits = self
            .search
            .search(query, self.num_results)
            .await
            .map_err(|e| WorkerError::failed(self.name(), e))?;

        format_search_results(&hits)
            .and_then(|body| ContextFragment::new(ContextSource::Web, body))
            .ok_or_else(|| WorkerError::skipped(self.name(), "no search results"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::AssistantError;
    use crate::tools::search::SearchHit;

    struct CannedSearch(Vec<SearchHit>);

    #[async_trait]
    impl WebSearch for CannedSearch {
        async fn search(&self, _query: &str, num_results: usize) -> Result<Vec<SearchHit>, AssistantError> {
            Ok(self.0.iter().take(num_results).cloned().collect())
        }
    }

    #[tokio::test]
    async fn formats_hits_into_web_fragment() {
        let search = Arc::new(CannedSearch(vec![SearchHit {
            title: "Mars".to_string(),
            link: "https://nasa.gov".to_string(),
            snippet: "Rover lands".to_string(),
        }]));

        let fragment = SearchWorker::new(search, 5).gather("mars").await.expect("fragment");

        assert_eq!(fragment.label, "**Recent information from web search:**");
        assert!(fragment.body.starts_with("1. **Mars**"));
    }

    #[tokio::test]
    async fn no_hits_is_a_skip_not_a_failure() {
        let worker = SearchWorker::new(Arc::new(CannedSearch(Vec::new())), 5);
        assert!(worker.gather("mars").await.unwrap_err().is_skip());
    }
}
