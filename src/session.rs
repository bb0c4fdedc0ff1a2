//! Review session: the serializing dispatcher around [`AppState`].
//!
//! A [`Session`] owns the current state and a [`StateStore`]. Actions are
//! applied one at a time through [`crate::state::reduce`] and the result is
//! persisted after every change. Collaborator calls run outside the reducer
//! and feed their results back in as ordinary actions, so a failed call
//! never leaves a half-applied state behind.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::collab::{self, Analyzer, Parser, Refiner};
use crate::error::ReviewResult;
use crate::finding::{RawFinding, anchor_findings};
use crate::state::{AcceptAllReport, Action, AppState, reduce, transitions};
use crate::store::{self, StateStore};

pub struct Session {
    state: AppState,
    store: Box<dyn StateStore + Send>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("state", &self.state).finish_non_exhaustive()
    }
}

impl Session {
    /// Start from whatever `store` holds, or from a fresh state.
    ///
    /// An analysis cannot survive a restart, so `is_analyzing` is cleared.
    pub fn restore(store: Box<dyn StateStore + Send>) -> Self {
        let state = store::load_best_effort(store.as_ref())
            .map(|state| AppState {
                is_analyzing: false,
                ..state
            })
            .unwrap_or_default();

        info!(
            findings = state.findings.len(),
            has_document = state.document.is_some(),
            "session restored"
        );
        Self { state, store }
    }

    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply one action and persist the result.
    pub fn dispatch(&mut self, action: Action) -> &AppState {
        let next = reduce(&self.state, action);
        self.commit(next)
    }

    fn commit(&mut self, next: AppState) -> &AppState {
        if next != self.state {
            self.state = next;
            store::save_best_effort(self.store.as_ref(), &self.state);
        }
        &self.state
    }

    /// Parse `path` and load it as the new document.
    pub fn load_document(&mut self, parser: &dyn Parser, path: &Path) -> ReviewResult<&AppState> {
        let document = parser.parse(path)?;
        info!(file = document.file_name, bytes = document.text.len(), "document loaded");
        Ok(self.dispatch(Action::SetDocument(document)))
    }

    /// Accept every pending finding, reporting which ones were applied.
    pub fn accept_all(&mut self) -> AcceptAllReport {
        let (next, report) = transitions::accept_all_with_report(&self.state);
        self.commit(next);
        report
    }

    /// Raise the analysis flag. Returns `false` when an analysis is already running.
    pub fn begin_analysis(&mut self) -> bool {
        if self.state.is_analyzing {
            warn!("analysis already in progress");
            return false;
        }
        self.dispatch(Action::SetAnalyzing(true));
        true
    }

    /// Anchor `raw` against the current text, replace the findings and lower
    /// the analysis flag. Returns how many findings were kept.
    pub fn complete_analysis(&mut self, raw: Vec<RawFinding>) -> usize {
        let received = raw.len();
        let findings = anchor_findings(&self.state.current_contract, raw);
        let kept = findings.len();
        if kept < received {
            warn!(received, kept, "some analyzer findings could not be anchored");
        }

        let next = AppState {
            findings,
            is_analyzing: false,
            selected_finding_id: None,
            ..self.state.clone()
        };
        self.commit(next);
        kept
    }

    /// Lower the analysis flag without touching the findings.
    pub fn abort_analysis(&mut self) {
        self.dispatch(Action::SetAnalyzing(false));
    }

    /// Run `analyzer` over the current text and return how many findings were
    /// kept, or `None` when another analysis is already running.
    ///
    /// On failure the findings are left as they were and the error is returned.
    pub fn analyze(&mut self, analyzer: &dyn Analyzer) -> ReviewResult<Option<usize>> {
        if !self.begin_analysis() {
            return Ok(None);
        }

        let instructions = collab::effective_instructions(&self.state.custom_instructions).to_owned();
        match analyzer.analyze(&self.state.current_contract, Some(&instructions)) {
            Ok(raw) => Ok(Some(self.complete_analysis(raw))),
            Err(e) => {
                if e.is_collaborator_failure() {
                    warn!(error = %e, "analysis failed");
                } else {
                    error!(error = %e, "analysis failed locally");
                }
                self.abort_analysis();
                Err(e)
            }
        }
    }

    /// Ask `refiner` for a new redline and store it on the finding.
    ///
    /// Returns `Ok(None)` for unknown or non-pending findings.
    pub fn refine(&mut self, refiner: &dyn Refiner, id: &str, instruction: &str) -> ReviewResult<Option<String>> {
        let Some(finding) = self.state.finding(id).filter(|f| f.is_pending()) else {
            debug!(id, "refine: no pending finding");
            return Ok(None);
        };

        let refined = refiner.refine(&finding.original_text, &finding.suggested_redline, instruction)?;
        Ok(Some(self.apply_refinement(id, refined)))
    }

    /// Store an externally refined redline and count the refinement.
    pub fn apply_refinement(&mut self, id: &str, redline: String) -> String {
        self.dispatch(Action::UpdateFindingRedline {
            id: id.to_owned(),
            redline: redline.clone(),
        });
        self.dispatch(Action::IncrementRefinementCount(id.to_owned()));
        redline
    }
}
