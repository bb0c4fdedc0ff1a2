//! Ordered multi-replacement.
//!
//! Every edit is resolved against the *same* input text first, then the
//! resolved spans are spliced in descending offset order. Splicing right to
//! left never moves the text in front of the current span, so offsets still
//! waiting to be applied stay valid.
//!
//! Spans that overlap a span already applied to their right cannot be
//! honoured without corrupting the other edit. They are skipped and reported
//! as conflicts; identical anchors (same text, same occurrence) are the
//! common case of this.

use tracing::{debug, warn};

use super::{locate_occurrence, replace_span};

/// One occurrence-anchored replacement request.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredEdit<'a> {
    /// Stable key used for deterministic tie-breaking and logging.
    pub key: &'a str,
    pub needle: &'a str,
    pub occurrence: usize,
    pub replacement: &'a str,
}

/// Result of [`apply_batch`]. Indices refer to positions in the input slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub text: String,
    /// Applied edits, in application (right-to-left) order.
    pub applied: Vec<usize>,
    /// Edits whose anchor did not resolve in the input text.
    pub unresolved: Vec<usize>,
    /// Edits that resolved but overlap an applied edit.
    pub conflicted: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct ResolvedSpan {
    index: usize,
    offset: usize,
    len: usize,
}

/// Apply all `edits` to `text` in descending offset order.
///
/// The outcome depends only on the set of edits, never on their order in
/// the slice: ties on offset are broken by span length (longer first) and
/// then by key.
pub fn apply_batch(text: &str, edits: &[AnchoredEdit<'_>]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let mut spans: Vec<ResolvedSpan> = Vec::with_capacity(edits.len());

    for (index, edit) in edits.iter().enumerate() {
        match locate_occurrence(text, edit.needle, edit.occurrence) {
            Some(offset) => spans.push(ResolvedSpan {
                index,
                offset,
                len: edit.needle.len(),
            }),
            None => {
                warn!(
                    key = edit.key,
                    occurrence = edit.occurrence,
                    "anchor did not resolve, edit left out of batch"
                );
                outcome.unresolved.push(index);
            }
        }
    }

    spans.sort_by(|a, b| {
        b.offset
            .cmp(&a.offset)
            .then_with(|| b.len.cmp(&a.len))
            .then_with(|| edits[a.index].key.cmp(edits[b.index].key))
    });

    let mut current = text.to_owned();
    // Start of the leftmost span applied so far.
    let mut boundary = text.len();

    for span in spans {
        let edit = &edits[span.index];

        if span.offset + span.len > boundary {
            warn!(
                key = edit.key,
                offset = span.offset,
                boundary,
                "anchor overlaps an edit already applied, skipping"
            );
            outcome.conflicted.push(span.index);
            continue;
        }

        match replace_span(&current, span.offset, span.len, edit.replacement) {
            Some(next) => {
                debug!(key = edit.key, offset = span.offset, "applied edit");
                current = next;
                boundary = span.offset;
                outcome.applied.push(span.index);
            }
            None => outcome.unresolved.push(span.index),
        }
    }

    outcome.text = current;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit<'a>(key: &'a str, needle: &'a str, occurrence: usize, replacement: &'a str) -> AnchoredEdit<'a> {
        AnchoredEdit {
            key,
            needle,
            occurrence,
            replacement,
        }
    }

    #[test]
    fn test_repeated_text_replaced_independently() {
        let text = "A. Pay within 30 days. B. Pay within 30 days.";
        let edits = [
            edit("a", "Pay within 30 days", 0, "Pay within 45 days"),
            edit("b", "Pay within 30 days", 1, "Pay within 45 days"),
        ];
        let outcome = apply_batch(text, &edits);
        assert_eq!(outcome.text, "A. Pay within 45 days. B. Pay within 45 days.");
        assert_eq!(outcome.applied, vec![1, 0]);
        assert!(outcome.unresolved.is_empty());
        assert!(outcome.conflicted.is_empty());
    }

    #[test]
    fn test_length_changing_edits_keep_left_offsets() {
        let text = "one two three";
        let edits = [
            edit("x", "one", 0, "1111111"),
            edit("y", "three", 0, "3"),
            edit("z", "two", 0, ""),
        ];
        let outcome = apply_batch(text, &edits);
        assert_eq!(outcome.text, "1111111  3");
    }

    #[test]
    fn test_unresolved_edit_reported() {
        let outcome = apply_batch("abc", &[edit("a", "zzz", 0, "y"), edit("b", "abc", 1, "y")]);
        assert_eq!(outcome.text, "abc");
        assert_eq!(outcome.unresolved, vec![0, 1]);
    }

    #[test]
    fn test_same_anchor_collision_applies_one() {
        let text = "Net 30.";
        let edits = [edit("b", "Net 30", 0, "Net 45"), edit("a", "Net 30", 0, "Net 60")];
        let outcome = apply_batch(text, &edits);
        // Key "a" wins the tie.
        assert_eq!(outcome.text, "Net 60.");
        assert_eq!(outcome.applied, vec![1]);
        assert_eq!(outcome.conflicted, vec![0]);
    }

    #[test]
    fn test_overlapping_spans_longer_wins_at_same_offset() {
        let text = "The Supplier shall indemnify.";
        let edits = [
            edit("short", "The Supplier", 0, "Vendor"),
            edit("long", "The Supplier shall indemnify", 0, "Each party shall indemnify"),
        ];
        let outcome = apply_batch(text, &edits);
        assert_eq!(outcome.text, "Each party shall indemnify.");
        assert_eq!(outcome.conflicted, vec![0]);
    }

    #[test]
    fn test_adjacent_spans_both_apply() {
        let outcome = apply_batch("abcd", &[edit("1", "ab", 0, "X"), edit("2", "cd", 0, "Y")]);
        assert_eq!(outcome.text, "XY");
        assert_eq!(outcome.applied.len(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let outcome = apply_batch("unchanged", &[]);
        assert_eq!(outcome.text, "unchanged");
        assert!(outcome.applied.is_empty());
    }
}
