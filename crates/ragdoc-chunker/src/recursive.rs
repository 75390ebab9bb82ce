//! Recursive character splitting.
//!
//! Text is split at the first separator of `ChunkConfig::separators` that
//! occurs in it. Each separator stays attached to the start of the piece that
//! follows it. Small pieces are merged greedily into chunks of at most
//! `chunk_size` characters, carrying up to `chunk_overlap` characters of tail
//! into the next chunk. Pieces that are still too long are split again with
//! the remaining, finer separators.

use async_trait::async_trait;
use ragdoc_core::{ChunkConfig, ChunkError, Chunker};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Recursive character text splitter.
pub struct RecursiveCharacterSplitter;

impl RecursiveCharacterSplitter {
    /// Create a new splitter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reject configurations that cannot produce bounded chunks.
    pub fn validate(config: &ChunkConfig) -> Result<(), ChunkError> {
        if config.chunk_size == 0 {
            return Err(ChunkError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if config.chunk_overlap > config.chunk_size {
            return Err(ChunkError::InvalidConfig(format!(
                "chunk_overlap ({}) must not exceed chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(())
    }

    /// Split text synchronously.
    pub fn split(&self, text: &str, config: &ChunkConfig) -> Result<Vec<String>, ChunkError> {
        Self::validate(config)?;
        let chunks = split_recursive(text, &config.separators, config);
        debug!(
            "Split {} chars into {} chunks",
            char_len(text),
            chunks.len()
        );
        Ok(chunks)
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Chunker for RecursiveCharacterSplitter {
    fn name(&self) -> &str {
        "recursive_character"
    }

    async fn split_text(
        &self,
        text: &str,
        config: &ChunkConfig,
    ) -> Result<Vec<String>, ChunkError> {
        self.split(text, config)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_recursive(text: &str, separators: &[String], config: &ChunkConfig) -> Vec<String> {
    // Default to the finest separator with nothing left to fall back on.
    let mut separator = separators.last().map_or("", String::as_str);
    let mut remaining: &[String] = &[];
    for (i, candidate) in separators.iter().enumerate() {
        if candidate.is_empty() {
            separator = "";
            break;
        }
        if text.contains(candidate.as_str()) {
            separator = candidate.as_str();
            remaining = &separators[i + 1..];
            break;
        }
    }

    let mut chunks = Vec::new();
    let mut small: Vec<&str> = Vec::new();

    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) < config.chunk_size {
            small.push(piece);
            continue;
        }

        if !small.is_empty() {
            chunks.extend(merge_splits(&small, config));
            small.clear();
        }

        if remaining.is_empty() {
            push_trimmed(&mut chunks, piece);
        } else {
            chunks.extend(split_recursive(piece, remaining, config));
        }
    }

    if !small.is_empty() {
        chunks.extend(merge_splits(&small, config));
    }

    chunks
}

/// Split on `separator`, leaving it at the start of the following piece.
/// An empty separator splits into characters. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push(&text[start..idx]);
        start = idx;
    }
    pieces.push(&text[start..]);
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

/// Greedily merge pieces into chunks no longer than `chunk_size`.
fn merge_splits(splits: &[&str], config: &ChunkConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    for &piece in splits {
        let len = char_len(piece);

        if total + len > config.chunk_size {
            if total > config.chunk_size {
                warn!(
                    "Created a chunk of {} chars, longer than the limit of {}",
                    total, config.chunk_size
                );
            }

            if !current.is_empty() {
                push_trimmed(&mut chunks, &current.iter().copied().collect::<String>());

                // Keep only as much tail as the overlap allows, and make room
                // for the incoming piece.
                while total > config.chunk_overlap
                    || (total + len > config.chunk_size && total > 0)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(front);
                }
            }
        }

        current.push_back(piece);
        total += len;
    }

    push_trimmed(&mut chunks, &current.iter().copied().collect::<String>());
    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
