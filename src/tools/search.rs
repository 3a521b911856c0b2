use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::errors::AssistantError;

const ADAPTER: &str = "web_search";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, AssistantError>;
}

/// Google results through the Serper API.
#[derive(Clone)]
pub struct SerperSearch {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl SerperSearch {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

#[async_trait]
impl WebSearch for SerperSearch {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, AssistantError> {
        if self.api_key.trim().is_empty() {
            return Err(AssistantError::adapter(
                ADAPTER,
                "Serper API key not found; set SERPER_API_KEY",
            ));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query, "num": num_results }))
            .send()
            .await
            .map_err(|e| AssistantError::adapter(ADAPTER, e))?;

        if !response.status().is_success() {
            return Err(AssistantError::adapter(
                ADAPTER,
                format!("Serper search failed: {}", response.status()),
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AssistantError::adapter(ADAPTER, e))?;
        Ok(parse_organic(&payload))
    }
}

fn parse_organic(payload: &Value) -> Vec<SearchHit> {
    let items = payload
        .get("organic")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    items
        .iter()
        .map(|item| SearchHit {
            title: item
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("No title")
                .to_string(),
            link: item
                .get("link")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            snippet: item
                .get("snippet")
                .and_then(|v| v.as_str())
                .unwrap_or("No description")
                .to_string(),
        })
        .collect()
}

/// Numbered, markdown-flavoured listing of hits; `None` when there are none.
pub fn format_search_results(hits: &[SearchHit]) -> Option<String> {
    if hits.is_empty() {
        return None;
    }
    let entries: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. **{}**\n   {}\n   Source: {}\n",
                i + 1,
                hit.title,
                hit.snippet,
                hit.link
            )
        })
        .collect();
    Some(entries.join("\n"))
}

/// Joins snippets in order while their combined length stays within `max_length`.
///
/// Library helper for callers that want plain text instead of the formatted list.
pub fn extract_search_snippets(hits: &[SearchHit], max_length: usize) -> String {
    let mut snippets = Vec::new();
    let mut current_length = 0;
    for hit in hits {
        let len = hit.snippet.chars().count();
        if current_length + len > max_length {
            break;
        }
        snippets.push(hit.snippet.as_str());
        current_length += len;
    }
    snippets.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hit(title: &str, snippet: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            link: format!("https://example.com/{}", title.to_lowercase()),
            snippet: snippet.to_string(),
        }
    }

    #[tokio::test]
    async fn serper_posts_query_and_parses_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "serper-key"))
            .and(body_json(json!({ "q": "latest mars rover", "num": 5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [
                    { "title": "Perseverance", "link": "https://nasa.gov/p", "snippet": "Rover news" },
                    { "link": "https://example.com/x" }
                ]
            })))
            .mount(&server)
            .await;

        let search = SerperSearch::new(
            "serper-key",
            format!("{}/search", server.uri()),
            Duration::from_secs(5),
        );
        let hits = search.search("latest mars rover", 5).await.expect("search");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Perseverance");
        assert_eq!(hits[1].title, "No title");
        assert_eq!(hits[1].snippet, "No description");
    }

    #[tokio::test]
    async fn serper_without_key_fails_as_adapter_error() {
        let search = SerperSearch::new("", "http://127.0.0.1:1/search", Duration::from_secs(1));
        let err = search.search("news", 5).await.unwrap_err();
        assert!(matches!(err, AssistantError::Adapter { adapter: "web_search", .. }));
    }

    #[tokio::test]
    async fn missing_organic_section_yields_no_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answerBox": {} })))
            .mount(&server)
            .await;

        let search = SerperSearch::new("k", server.uri(), Duration::from_secs(5));
        let hits = search.search("news", 5).await.expect("search");
        assert!(hits.is_empty());
        assert_eq!(format_search_results(&hits), None);
    }

    #[test]
    fn formats_numbered_entries() {
        let formatted = format_search_results(&[hit("Alpha", "first"), hit("Beta", "second")])
            .expect("non-empty");

        assert_eq!(
            formatted,
            "1. **Alpha**\n   first\n   Source: https://example.com/alpha\n\n\
             2. **Beta**\n   second\n   Source: https://example.com/beta\n"
        );
    }

    #[test]
    fn snippet_extraction_stops_at_length_budget() {
        let hits = [hit("a", "12345"), hit("b", "678"), hit("c", "9")];
        assert_eq!(extract_search_snippets(&hits, 8), "12345 678");
        assert_eq!(extract_search_snippets(&hits, 4), "");
    }
}
