//! Parsed documents and paragraph blocks.
//!
//! Parsers hand over literal text with paragraphs separated by a blank line
//! (`"\n\n"`). Blocks group those paragraphs into display-sized chunks and
//! keep exact byte ranges into the text so a block can be sliced back out.

use serde::{Deserialize, Serialize};

/// Words a block aims for before it is closed.
const TARGET_WORDS_PER_BLOCK: usize = 200;

/// A block is only closed early (at the last paragraph) once it has this many words.
const MIN_WORDS_PER_BLOCK: usize = 150;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Output of the parsing collaborator. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub text: String,
    pub file_name: String,
    /// Lower-cased extension including the dot, e.g. `".txt"`.
    pub file_type: String,
}

/// A run of consecutive paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractBlock {
    /// 1-based.
    pub block_number: usize,
    pub content: String,
    pub word_count: usize,
    /// Byte offset of the first paragraph in the source text.
    pub start_index: usize,
    /// Byte offset one past the last paragraph in the source text.
    pub end_index: usize,
}

/// Group the paragraphs of `text` into blocks of roughly
/// [`TARGET_WORDS_PER_BLOCK`] words. Blank paragraphs are skipped.
pub fn parse_blocks(text: &str) -> Vec<ContractBlock> {
    let paragraphs = paragraph_spans(text);
    let mut blocks = Vec::new();

    let mut pending: Option<(usize, usize)> = None;
    let mut word_count = 0;

    for (i, &(start, end)) in paragraphs.iter().enumerate() {
        pending = Some(pending.map_or((start, end), |(s, _)| (s, end)));
        word_count += text[start..end].split_whitespace().count();

        let is_last = i + 1 == paragraphs.len();
        let should_close = word_count >= TARGET_WORDS_PER_BLOCK || is_last;

        if should_close && word_count >= MIN_WORDS_PER_BLOCK {
            if let Some((s, e)) = pending.take() {
                push_block(&mut blocks, text, s, e, word_count);
            }
            word_count = 0;
        }
    }

    // Short tail that never reached the minimum.
    if let Some((s, e)) = pending {
        push_block(&mut blocks, text, s, e, word_count);
    }

    blocks
}

fn push_block(blocks: &mut Vec<ContractBlock>, text: &str, start: usize, end: usize, word_count: usize) {
    blocks.push(ContractBlock {
        block_number: blocks.len() + 1,
        content: text[start..end].to_owned(),
        word_count,
        start_index: start,
        end_index: end,
    });
}

/// Byte ranges of the non-blank paragraphs in `text`.
fn paragraph_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;

    for piece in text.split(PARAGRAPH_SEPARATOR) {
        let end = start + piece.len();
        if !piece.trim().is_empty() {
            spans.push((start, end));
        }
        start = end + PARAGRAPH_SEPARATOR.len();
    }

    spans
}

/// Find the first block whose content contains `search`, comparing with
/// collapsed whitespace and case folding.
///
/// Only for navigation. Anchoring never uses this loose comparison.
pub fn find_block_containing<'a>(blocks: &'a [ContractBlock], search: &str) -> Option<&'a ContractBlock> {
    let needle = normalize(search);
    if needle.is_empty() {
        return None;
    }
    blocks.iter().find(|block| normalize(&block.content).contains(&needle))
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
