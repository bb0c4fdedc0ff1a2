//! Application state and the reducer that drives it.
//!
//! [`AppState`] is the single source of truth for a review session. Every
//! change goes through [`reduce`], a pure function from the old state and
//! one [`Action`] to a new state. Nothing here fails: unknown ids and other
//! invalid payloads leave the state as it was.

pub mod transitions;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::ParsedDocument;
use crate::finding::Finding;

pub use transitions::AcceptAllReport;

/// Which pane layout the client shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Analysis,
    Comparison,
}

/// Single-level undo snapshot taken right before an accept-all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoSnapshot {
    pub contract: String,
    pub findings: Vec<Finding>,
}

/// Everything a review session knows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    /// Text as parsed. Never changes after the document is loaded.
    pub original_contract: String,
    /// Live text. Changed only by accept, accept-all and undo.
    pub current_contract: String,
    pub document: Option<ParsedDocument>,
    pub findings: Vec<Finding>,
    pub selected_finding_id: Option<String>,
    pub is_analyzing: bool,
    pub highlighted_text: String,
    pub previous_state: Option<UndoSnapshot>,
    pub view_mode: ViewMode,
    pub custom_instructions: String,
}

impl AppState {
    pub fn finding(&self, id: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.id == id)
    }

    pub fn pending_count(&self) -> usize {
        crate::finding::pending_count(&self.findings)
    }

    pub const fn can_undo(&self) -> bool {
        self.previous_state.is_some()
    }
}

/// Every transition the reducer understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Load a new document. Discards findings, selection and undo history.
    SetDocument(ParsedDocument),
    SetFindings(Vec<Finding>),
    SetAnalyzing(bool),
    SetHighlightedText(String),
    SetSelectedFinding(Option<String>),
    AcceptFinding { id: String, redline: String },
    DismissFinding(String),
    AcceptAllFindings,
    UndoAcceptAll,
    UpdateFindingRedline { id: String, redline: String },
    IncrementRefinementCount(String),
    SetViewMode(ViewMode),
    SetCustomInstructions(String),
    ResetState,
}

impl Action {
    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetDocument(_) => "SET_DOCUMENT",
            Self::SetFindings(_) => "SET_FINDINGS",
            Self::SetAnalyzing(_) => "SET_ANALYZING",
            Self::SetHighlightedText(_) => "SET_HIGHLIGHTED_TEXT",
            Self::SetSelectedFinding(_) => "SET_SELECTED_FINDING",
            Self::AcceptFinding { .. } => "ACCEPT_FINDING",
            Self::DismissFinding(_) => "DISMISS_FINDING",
            Self::AcceptAllFindings => "ACCEPT_ALL_FINDINGS",
            Self::UndoAcceptAll => "UNDO_ACCEPT_ALL",
            Self::UpdateFindingRedline { .. } => "UPDATE_FINDING_REDLINE",
            Self::IncrementRefinementCount(_) => "INCREMENT_REFINEMENT_COUNT",
            Self::SetViewMode(_) => "SET_VIEW_MODE",
            Self::SetCustomInstructions(_) => "SET_CUSTOM_INSTRUCTIONS",
            Self::ResetState => "RESET_STATE",
        }
    }
}

/// Apply one action to `state`, producing the next state.
pub fn reduce(state: &AppState, action: Action) -> AppState {
    debug!(action = action.name(), "reducing");

    match action {
        Action::SetDocument(document) => transitions::set_document(document),
        Action::SetFindings(findings) => AppState {
            findings,
            ..state.clone()
        },
        Action::SetAnalyzing(is_analyzing) => AppState {
            is_analyzing,
            ..state.clone()
        },
        Action::SetHighlightedText(highlighted_text) => AppState {
            highlighted_text,
            ..state.clone()
        },
        Action::SetSelectedFinding(selected_finding_id) => AppState {
            selected_finding_id,
            ..state.clone()
        },
        Action::AcceptFinding { id, redline } => transitions::accept_finding(state, &id, &redline),
        Action::DismissFinding(id) => transitions::dismiss_finding(state, &id),
        Action::AcceptAllFindings => transitions::accept_all(state),
        Action::UndoAcceptAll => transitions::undo_accept_all(state),
        Action::UpdateFindingRedline { id, redline } => {
            transitions::update_finding_redline(state, &id, &redline)
        }
        Action::IncrementRefinementCount(id) => transitions::increment_refinement_count(state, &id),
        Action::SetViewMode(view_mode) => AppState {
            view_mode,
            ..state.clone()
        },
        Action::SetCustomInstructions(custom_instructions) => AppState {
            custom_instructions,
            ..state.clone()
        },
        Action::ResetState => AppState::default(),
    }
}
