//! Recursive character splitter.
//!
//! Text is cut on the coarsest separator that occurs (`"\n\n"`, then `"\n"`,
//! then `" "`, then between characters), pieces are merged back up to
//! `chunk_size` characters, and consecutive chunks share up to
//! `chunk_overlap` characters of trailing context.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::loader::DocumentSegment;
use crate::core::errors::AssistantError;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    pub source: String,
    pub page: Option<u32>,
    /// Position of the chunk within its source document.
    pub chunk_index: usize,
}

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AssistantError> {
        if chunk_size == 0 {
            return Err(AssistantError::validation("chunk_size must be positive"));
        }
        if chunk_overlap >= chunk_size {
            return Err(AssistantError::validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|piece| !piece.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joined_len = |window: &VecDeque<&str>, total: usize| {
                total + len + if window.is_empty() { 0 } else { sep_len }
            };

            if joined_len(&window, total) > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window, separator);
                while total > self.chunk_overlap
                    || (joined_len(&window, total) > self.chunk_size && total > 0)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if window.is_empty() { 0 } else { sep_len };
                }
            }

            total += len + if window.is_empty() { 0 } else { sep_len };
            window.push_back(piece);
        }

        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits loaded segments into chunks, keeping source and page metadata.
pub fn split_segments(
    segments: &[DocumentSegment],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<DocumentChunk>, AssistantError> {
    let splitter = RecursiveSplitter::new(chunk_size, chunk_overlap)?;
    let mut chunks = Vec::new();
    let mut next_index = std::collections::HashMap::<&str, usize>::new();

    for segment in segments {
        for text in splitter.split_text(&segment.text) {
            let index = next_index.entry(segment.source.as_str()).or_insert(0);
            chunks.push(DocumentChunk {
                text,
                source: segment.source.clone(),
                page: segment.page,
                chunk_index: *index,
            });
            *index += 1;
        }
    }

    Ok(chunks)
}
