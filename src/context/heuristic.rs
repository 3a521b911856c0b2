//! Keyword heuristic that switches web search on for recency-flavoured questions.

use serde::Serialize;

pub const TRIGGER_KEYWORDS: [&str; 11] = [
    "latest",
    "recent",
    "current",
    "today",
    "now",
    "news",
    "2024",
    "2025",
    "this year",
    "update",
    "new",
];

/// Case-insensitive substring match against [`TRIGGER_KEYWORDS`].
pub fn should_use_web_search(query: &str) -> bool {
    let query_lower = query.to_lowercase();
    TRIGGER_KEYWORDS
        .iter()
        .any(|keyword| query_lower.contains(keyword))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WebSearchDecision {
    pub enabled: bool,
    /// True only when the heuristic, not the caller, turned search on.
    pub auto_triggered: bool,
}

/// An explicit request wins and skips the heuristic entirely.
pub fn resolve_web_search(requested: bool, query: &str) -> WebSearchDecision {
    if requested {
        return WebSearchDecision {
            enabled: true,
            auto_triggered: false,
        };
    }
    let triggered = should_use_web_search(query);
    WebSearchDecision {
        enabled: triggered,
        auto_triggered: triggered,
    }
}
