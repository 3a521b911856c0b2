pub mod search;

pub use search::{extract_search_snippets, format_search_results, SearchHit, SerperSearch, WebSearch};
