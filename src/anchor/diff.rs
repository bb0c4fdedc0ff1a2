//! Comparison between the pristine and the edited contract, using the
//! `similar` crate.

use similar::{Algorithm, TextDiff};

/// Generate a unified diff between the original and the current contract.
///
/// Patience keeps untouched clauses aligned, which reads better for prose
/// split into paragraphs.
pub fn unified_diff(document_name: &str, original: &str, current: &str) -> String {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Patience)
        .diff_lines(original, current);

    diff.unified_diff()
        .header(
            &format!("original/{document_name}"),
            &format!("current/{document_name}"),
        )
        .to_string()
}

/// Character-level similarity between two texts, as a percentage.
pub fn similarity_percent(original: &str, current: &str) -> f64 {
    if original.is_empty() && current.is_empty() {
        return 100.0;
    }
    let diff = TextDiff::from_chars(original, current);
    f64::from(diff.ratio()) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_diff() {
        let result = unified_diff("msa.txt", "clause\n", "clause\n");
        assert!(!result.contains("-clause"));
    }

    #[test]
    fn test_changed_clause() {
        let original = "1. Term.\n2. Pay within 30 days.\n3. Law.\n";
        let current = "1. Term.\n2. Pay within 45 days.\n3. Law.\n";
        let result = unified_diff("msa.txt", original, current);
        assert!(result.contains("-2. Pay within 30 days."));
        assert!(result.contains("+2. Pay within 45 days."));
        assert!(result.contains("original/msa.txt"));
    }

    #[test]
    fn test_similarity_bounds() {
        assert!((similarity_percent("same", "same") - 100.0).abs() < 1e-6);
        assert!((similarity_percent("", "") - 100.0).abs() < 1e-6);
        let partial = similarity_percent("Pay within 30 days", "Pay within 45 days");
        assert!(partial > 50.0 && partial < 100.0);
    }
}
