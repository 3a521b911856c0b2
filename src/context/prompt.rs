//! Prompt assembly: augmented query text and the message sequence sent to the chat model.

use super::conversation::ConversationTurn;
use super::fragment::{ContextFragment, ContextSource};
use super::response_mode::ResponseModeConfig;
use crate::llm::ChatMessage;

/// Folds an image description into the working query ahead of any other context.
pub fn apply_image_description(query: &str, vision: Option<&ContextFragment>) -> String {
    match vision {
        Some(fragment) => format!(
            "{} {}\n\n[User Question]: {}",
            fragment.label, fragment.body, query
        ),
        None => query.to_string(),
    }
}

/// Renders document and web fragments above the question.
///
/// With no fragments the query is returned untouched, so a context-free turn is
/// byte-for-byte a plain chat turn.
pub fn build_augmented_query(query: &str, fragments: &[ContextFragment]) -> String {
    let mut ordered: Vec<&ContextFragment> = fragments
        .iter()
        .filter(|f| f.source != ContextSource::Vision)
        .collect();
    if ordered.is_empty() {
        return query.to_string();
    }
    ordered.sort_by_key(|f| f.source);

    let context = ordered
        .iter()
        .map(|f| f.render())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}\n\n**User Question:** {}", context, query)
}

pub fn build_messages(
    system_prompt: &str,
    mode: &ResponseModeConfig,
    history: &[ConversationTurn],
    augmented_query: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(format!(
        "{}{}",
        system_prompt, mode.instruction_suffix
    )));
    messages.extend(history.iter().map(ConversationTurn::to_message));
    messages.push(ChatMessage::user(augmented_query));
    messages
}
