//! Occurrence-anchored text location and replacement.
//!
//! A finding never anchors to "the text", it anchors to "the Nth occurrence
//! of the text". Everything here is exact, byte-for-byte literal matching:
//! no whitespace normalization and no case folding.
//!
//! # Layers
//!
//! 1. [`locate_occurrence`]: offset of the Nth non-overlapping occurrence
//! 2. [`replace_occurrence`]: splice a replacement over exactly that span
//! 3. [`batch::apply_batch`]: right-to-left multi-replacement used by
//!    accept-all and export
//!
//! Offsets are byte offsets into UTF-8 `str`s. Every offset returned by the
//! locator sits on a char boundary because it is the start of a match.

pub mod batch;
pub mod diff;

use tracing::{debug, warn};

/// Find the start offset of the `n`-th (0-based) non-overlapping occurrence
/// of `needle` in `haystack`, scanning left to right.
///
/// Returns `None` when `needle` is empty or fewer than `n + 1` occurrences
/// exist.
pub fn locate_occurrence(haystack: &str, needle: &str, n: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.match_indices(needle).nth(n).map(|(index, _)| index)
}

/// Count the non-overlapping occurrences of `needle` in `haystack`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Replace `len` bytes at `offset` with `replacement`.
///
/// Callers pass spans obtained from [`locate_occurrence`], so both ends are
/// char boundaries. Out-of-range spans yield `None`.
pub fn replace_span(haystack: &str, offset: usize, len: usize, replacement: &str) -> Option<String> {
    let end = offset.checked_add(len)?;
    let prefix = haystack.get(..offset)?;
    let suffix = haystack.get(end..)?;

    let mut result = String::with_capacity(prefix.len() + replacement.len() + suffix.len());
    result.push_str(prefix);
    result.push_str(replacement);
    result.push_str(suffix);
    Some(result)
}

/// Replace only the `n`-th occurrence of `needle` with `replacement`.
///
/// Returns `Some(new_text)` when the occurrence exists. When it does not the
/// caller keeps its original text: that is a warning-level condition, not a
/// failure, because a later edit may legitimately have removed the anchor.
pub fn replace_occurrence(haystack: &str, needle: &str, replacement: &str, n: usize) -> Option<String> {
    let Some(offset) = locate_occurrence(haystack, needle, n) else {
        warn!(
            occurrence = n,
            needle_len = needle.len(),
            "occurrence not found, no replacement made"
        );
        return None;
    };

    debug!(occurrence = n, offset, "replacing occurrence");
    replace_span(haystack, offset, needle.len(), replacement)
}
