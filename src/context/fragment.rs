use serde::Serialize;

/// Where a piece of per-turn context came from. Declaration order is merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    Rag,
    Web,
    Vision,
}

impl ContextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextSource::Rag => "rag",
            ContextSource::Web => "web",
            ContextSource::Vision => "vision",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContextSource::Rag => "**Context from uploaded documents:**",
            ContextSource::Web => "**Recent information from web search:**",
            ContextSource::Vision => "[Image Content]:",
        }
    }

    /// Prefix of the warning shown when this source fails.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            ContextSource::Rag => "RAG retrieval failed",
            ContextSource::Web => "Web search failed",
            ContextSource::Vision => "Image analysis failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextFragment {
    pub source: ContextSource,
    pub label: String,
    pub body: String,
}

impl ContextFragment {
    /// `None` for blank bodies: an empty source is never represented as a fragment.
    pub fn new(source: ContextSource, body: impl Into<String>) -> Option<Self> {
        let body = body.into();
        if body.trim().is_empty() {
            return None;
        }
        Some(Self {
            source,
            label: source.label().to_string(),
            body,
        })
    }

    pub fn render(&self) -> String {
        format!("{}\n{}", self.label, self.body)
    }
}
