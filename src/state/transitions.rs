//! The document-mutating transitions: accept, dismiss, accept-all, undo and
//! redline edits.
//!
//! Each function takes the current state by reference and returns a new one.
//! The undo snapshot is an owned copy, so later transitions can never reach
//! back into it.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{AppState, UndoSnapshot};
use crate::anchor::{self, batch};
use crate::document::ParsedDocument;
use crate::finding::FindingStatus;

/// Which pending findings an accept-all applied, and which it could not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptAllReport {
    /// Accepted by this batch.
    pub applied: Vec<String>,
    /// Anchor no longer present in the current text; still pending.
    pub unresolved: Vec<String>,
    /// Anchor overlaps another finding applied in the same batch; still pending.
    pub conflicted: Vec<String>,
}

/// Fresh state for a newly loaded document.
pub fn set_document(document: ParsedDocument) -> AppState {
    AppState {
        original_contract: document.text.clone(),
        current_contract: document.text.clone(),
        document: Some(document),
        ..AppState::default()
    }
}

/// Accept one pending finding, replacing its anchored occurrence with `redline`.
///
/// The finding becomes `accepted` and keeps `redline` as its suggestion even
/// when the anchor no longer resolves; in that case the text is unchanged.
/// Unknown ids and findings that are not pending are no-ops.
pub fn accept_finding(state: &AppState, id: &str, redline: &str) -> AppState {
    let Some(finding) = state.finding(id) else {
        debug!(id, "accept: unknown finding");
        return state.clone();
    };
    if !finding.is_pending() {
        debug!(id, status = ?finding.status, "accept: finding is not pending");
        return state.clone();
    }

    let current_contract = anchor::replace_occurrence(
        &state.current_contract,
        &finding.original_text,
        redline,
        finding.occurrence_index,
    )
    .unwrap_or_else(|| {
        warn!(id, "accepted finding whose anchor no longer resolves, text unchanged");
        state.current_contract.clone()
    });

    let mut next = AppState {
        current_contract,
        ..state.clone()
    };
    for f in next.findings.iter_mut().filter(|f| f.id == id) {
        f.status = FindingStatus::Accepted;
        redline.clone_into(&mut f.suggested_redline);
    }
    next
}

/// Mark a pending finding dismissed. Never touches the document text.
pub fn dismiss_finding(state: &AppState, id: &str) -> AppState {
    let mut next = state.clone();
    for f in next.findings.iter_mut().filter(|f| f.id == id) {
        if f.status == FindingStatus::Accepted {
            debug!(id, "dismiss: finding already accepted");
            continue;
        }
        f.status = FindingStatus::Dismissed;
    }
    next
}

/// Accept every pending finding in one undoable batch.
pub fn accept_all(state: &AppState) -> AppState {
    accept_all_with_report(state).0
}

/// [`accept_all`], also reporting what happened to each pending finding.
///
/// Anchors are resolved against the current text and spliced right to left.
/// Findings that do not resolve or that overlap another applied finding stay
/// `pending`. The snapshot for [`undo_accept_all`] is always taken, replacing
/// any earlier one.
pub fn accept_all_with_report(state: &AppState) -> (AppState, AcceptAllReport) {
    let previous_state = UndoSnapshot {
        contract: state.current_contract.clone(),
        findings: state.findings.clone(),
    };

    let pending: Vec<_> = state.findings.iter().filter(|f| f.is_pending()).collect();
    let edits: Vec<batch::AnchoredEdit<'_>> = pending
        .iter()
        .map(|f| batch::AnchoredEdit {
            key: &f.id,
            needle: &f.original_text,
            occurrence: f.occurrence_index,
            replacement: &f.suggested_redline,
        })
        .collect();

    let outcome = batch::apply_batch(&state.current_contract, &edits);
    let ids = |indices: &[usize]| -> Vec<String> {
        indices.iter().map(|&i| pending[i].id.clone()).collect()
    };
    let report = AcceptAllReport {
        applied: ids(&outcome.applied),
        unresolved: ids(&outcome.unresolved),
        conflicted: ids(&outcome.conflicted),
    };

    info!(
        applied = report.applied.len(),
        unresolved = report.unresolved.len(),
        conflicted = report.conflicted.len(),
        "accept-all batch"
    );

    let mut next = AppState {
        current_contract: outcome.text,
        previous_state: Some(previous_state),
        ..state.clone()
    };
    for f in &mut next.findings {
        if report.applied.contains(&f.id) {
            f.status = FindingStatus::Accepted;
        }
    }

    (next, report)
}

/// Roll back the last accept-all batch. No-op without a snapshot.
pub fn undo_accept_all(state: &AppState) -> AppState {
    let Some(snapshot) = &state.previous_state else {
        debug!("undo: nothing to undo");
        return state.clone();
    };

    AppState {
        current_contract: snapshot.contract.clone(),
        findings: snapshot.findings.clone(),
        previous_state: None,
        ..state.clone()
    }
}

/// Replace the suggested redline of a pending finding.
pub fn update_finding_redline(state: &AppState, id: &str, redline: &str) -> AppState {
    let mut next = state.clone();
    for f in next.findings.iter_mut().filter(|f| f.id == id && f.is_pending()) {
        redline.clone_into(&mut f.suggested_redline);
    }
    next
}

pub fn increment_refinement_count(state: &AppState, id: &str) -> AppState {
    let mut next = state.clone();
    for f in next.findings.iter_mut().filter(|f| f.id == id) {
        f.refinement_count = f.refinement_count.saturating_add(1);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Finding;

    fn with_findings(text: &str, findings: Vec<Finding>) -> AppState {
        AppState {
            findings,
            ..set_document(ParsedDocument {
                text: text.to_owned(),
                file_name: "msa.txt".to_owned(),
                file_type: ".txt".to_owned(),
            })
        }
    }

    fn status_of(state: &AppState, id: &str) -> FindingStatus {
        state.finding(id).map(|f| f.status).expect("finding exists")
    }

    // -- Accept all --

    #[test]
    fn test_accept_all_repeated_clause() {
        let text = "A. Pay within 30 days. B. Pay within 30 days.";
        let a = Finding::new("Pay within 30 days", 0, "short", "Pay within 45 days");
        let b = Finding::new("Pay within 30 days", 1, "short", "Pay within 45 days");
        let state = with_findings(text, vec![a.clone(), b.clone()]);

        let (next, report) = accept_all_with_report(&state);
        assert_eq!(next.current_contract, "A. Pay within 45 days. B. Pay within 45 days.");
        assert_eq!(status_of(&next, &a.id), FindingStatus::Accepted);
        assert_eq!(status_of(&next, &b.id), FindingStatus::Accepted);
        assert_eq!(report.applied.len(), 2);
        assert_eq!(next.original_contract, text);
    }

    #[test]
    fn test_accept_all_keeps_unresolved_pending() {
        let text = "Net 30.";
        let good = Finding::new("Net 30", 0, "r", "Net 45");
        let gone = Finding::new("Net 30", 1, "r", "Net 60");
        let state = with_findings(text, vec![good.clone(), gone.clone()]);

        let (next, report) = accept_all_with_report(&state);
        assert_eq!(next.current_contract, "Net 45.");
        assert_eq!(status_of(&next, &gone.id), FindingStatus::Pending);
        assert_eq!(report.unresolved, vec![gone.id.clone()]);
    }

    #[test]
    fn test_accept_all_collision_flags_one() {
        let a = Finding::new("Net 30", 0, "r", "Net 45");
        let b = Finding::new("Net 30", 0, "r", "Net 60");
        let state = with_findings("Net 30.", vec![a, b]);

        let (next, report) = accept_all_with_report(&state);
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.conflicted.len(), 1);
        assert_eq!(next.pending_count(), 1);
    }

    #[test]
    fn test_accept_all_skips_dismissed_and_accepted() {
        let mut dismissed = Finding::new("alpha", 0, "r", "ALPHA");
        dismissed.status = FindingStatus::Dismissed;
        let mut accepted = Finding::new("beta", 0, "r", "BETA");
        accepted.status = FindingStatus::Accepted;
        let pending = Finding::new("gamma", 0, "r", "GAMMA");
        let state = with_findings("alpha beta gamma", vec![dismissed, accepted, pending]);

        let next = accept_all(&state);
        assert_eq!(next.current_contract, "alpha beta GAMMA");
    }

    #[test]
    fn test_accept_all_keeps_suggested_redline() {
        let f = Finding::new("Net 30", 0, "r", "Net 45");
        let state = with_findings("Net 30", vec![f.clone()]);
        let next = accept_all(&state);
        assert_eq!(next.finding(&f.id).map(|f| f.suggested_redline.as_str()), Some("Net 45"));
    }

    #[test]
    fn test_accept_all_with_nothing_pending_still_snapshots() {
        let state = with_findings("text", Vec::new());
        let next = accept_all(&state);
        assert_eq!(next.current_contract, "text");
        assert!(next.can_undo());
    }

    // -- Undo --

    #[test]
    fn test_undo_restores_exactly_once() {
        let text = "A. Pay within 30 days. B. Pay within 30 days.";
        let state = with_findings(
            text,
            vec![
                Finding::new("Pay within 30 days", 0, "r", "Pay within 45 days"),
                Finding::new("Pay within 30 days", 1, "r", "Pay within 45 days"),
            ],
        );

        let batched = accept_all(&state);
        let undone = undo_accept_all(&batched);
        assert_eq!(undone.current_contract, state.current_contract);
        assert_eq!(undone.findings, state.findings);
        assert!(undone.previous_state.is_none());

        let again = undo_accept_all(&undone);
        assert_eq!(again, undone);
    }

    #[test]
    fn test_second_accept_all_overwrites_snapshot() {
        let first = Finding::new("one", 0, "r", "1");
        let state = with_findings("one two", vec![first]);
        let after_first = accept_all(&state);

        let mut second_state = after_first.clone();
        second_state.findings.push(Finding::new("two", 0, "r", "2"));
        let after_second = accept_all(&second_state);
        assert_eq!(after_second.current_contract, "1 2");

        let undone = undo_accept_all(&after_second);
        assert_eq!(undone.current_contract, "1 two");
    }

    #[test]
    fn test_undo_discards_actions_made_after_batch() {
        let a = Finding::new("alpha", 0, "r", "ALPHA");
        let state = with_findings("alpha beta", vec![a.clone()]);
        let batched = accept_all(&state);

        let late = Finding::new("beta", 0, "r", "BETA");
        let mut with_late = batched.clone();
        with_late.findings.push(late.clone());
        let accepted_late = accept_finding(&with_late, &late.id, "BETA");
        assert_eq!(accepted_late.current_contract, "ALPHA BETA");

        let undone = undo_accept_all(&accepted_late);
        assert_eq!(undone.current_contract, "alpha beta");
        assert!(undone.finding(&late.id).is_none());
        assert_eq!(status_of(&undone, &a.id), FindingStatus::Pending);
    }

    // -- Single accept --

    #[test]
    fn test_accept_single_stores_redline() {
        let f = Finding::new("Confidentiality survives termination.", 0, "r", "unused");
        let state = with_findings("1. Confidentiality survives termination.", vec![f.clone()]);
        let next = accept_finding(&state, &f.id, "Confidentiality survives for five years.");

        assert_eq!(next.current_contract, "1. Confidentiality survives for five years.");
        let accepted = next.finding(&f.id).expect("exists");
        assert_eq!(accepted.status, FindingStatus::Accepted);
        assert_eq!(accepted.suggested_redline, "Confidentiality survives for five years.");
        assert!(!next.can_undo());
    }

    #[test]
    fn test_sequential_accepts_do_not_regress() {
        let text = "Confidentiality survives termination. Liability is unlimited.";
        let first = Finding::new("Confidentiality survives termination.", 0, "r", "x");
        let second = Finding::new("Liability is unlimited.", 0, "r", "y");
        let state = with_findings(text, vec![first.clone(), second.clone()]);

        let state = accept_finding(&state, &first.id, "Confidentiality survives three years.");
        let state = accept_finding(&state, &second.id, "Liability is capped at fees paid.");
        assert_eq!(
            state.current_contract,
            "Confidentiality survives three years. Liability is capped at fees paid."
        );
    }

    #[test]
    fn test_accept_unknown_id_is_noop() {
        let state = with_findings("text", vec![Finding::new("text", 0, "r", "TEXT")]);
        assert_eq!(accept_finding(&state, "missing", "x"), state);
    }

    #[test]
    fn test_accept_twice_is_idempotent() {
        let f = Finding::new("Net 30", 0, "r", "Net 30 (Net 30)");
        let state = with_findings("Net 30", vec![f.clone()]);
        let once = accept_finding(&state, &f.id, "Net 30 (Net 30)");
        let twice = accept_finding(&once, &f.id, "Net 30 (Net 30)");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_accept_with_lost_anchor_keeps_text() {
        let f = Finding::new("vanished", 0, "r", "x");
        let state = with_findings("text", vec![f.clone()]);
        let next = accept_finding(&state, &f.id, "x");
        assert_eq!(next.current_contract, "text");
        assert_eq!(status_of(&next, &f.id), FindingStatus::Accepted);
    }

    // -- Dismiss / edit --

    #[test]
    fn test_dismiss_keeps_text_and_finding() {
        let f = Finding::new("text", 0, "r", "TEXT");
        let state = with_findings("text", vec![f.clone()]);
        let next = dismiss_finding(&state, &f.id);
        assert_eq!(next.current_contract, state.current_contract);
        assert_eq!(next.findings.len(), 1);
        assert_eq!(status_of(&next, &f.id), FindingStatus::Dismissed);
        assert_eq!(dismiss_finding(&next, &f.id), next);
    }

    #[test]
    fn test_dismiss_accepted_is_noop() {
        let f = Finding::new("text", 0, "r", "TEXT");
        let state = accept_finding(&with_findings("text", vec![f.clone()]), &f.id, "TEXT");
        assert_eq!(dismiss_finding(&state, &f.id), state);
    }

    #[test]
    fn test_update_redline_pending_only() {
        let f = Finding::new("text", 0, "r", "TEXT");
        let state = with_findings("text", vec![f.clone()]);
        let edited = update_finding_redline(&state, &f.id, "Text.");
        assert_eq!(edited.finding(&f.id).map(|f| f.suggested_redline.as_str()), Some("Text."));
        assert_eq!(edited.current_contract, "text");

        let dismissed = dismiss_finding(&edited, &f.id);
        assert_eq!(update_finding_redline(&dismissed, &f.id, "other"), dismissed);
    }

    #[test]
    fn test_increment_refinement_count() {
        let f = Finding::new("text", 0, "r", "TEXT");
        let state = with_findings("text", vec![f.clone()]);
        let next = increment_refinement_count(&increment_refinement_count(&state, &f.id), &f.id);
        assert_eq!(next.finding(&f.id).map(|f| f.refinement_count), Some(2));
    }
}
