//! Findings: proposed edits anchored to an occurrence of a clause.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::anchor;

/// Lifecycle status of a finding.
///
/// `Pending` moves to `Accepted` or `Dismissed`. The only way back is an
/// undo of a whole accept-all batch, which restores `Accepted` → `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    #[default]
    Pending,
    Accepted,
    Dismissed,
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Dismissed => "dismissed",
        })
    }
}

/// One proposed edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    /// Exact literal clause text, byte-for-byte as it appeared in the document.
    pub original_text: String,
    /// Which occurrence of `original_text` this finding targets (0-based).
    pub occurrence_index: usize,
    pub risk: String,
    pub suggested_redline: String,
    #[serde(default)]
    pub status: FindingStatus,
    #[serde(default)]
    pub refinement_count: u32,
}

impl Finding {
    /// Create a pending finding with a fresh id.
    pub fn new(
        original_text: impl Into<String>,
        occurrence_index: usize,
        risk: impl Into<String>,
        suggested_redline: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            original_text: original_text.into(),
            occurrence_index,
            risk: risk.into(),
            suggested_redline: suggested_redline.into(),
            status: FindingStatus::Pending,
            refinement_count: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FindingStatus::Pending
    }
}

/// A finding as returned by the analysis collaborator, before anchoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFinding {
    pub original_text: String,
    pub risk: String,
    pub suggested_redline: String,
    /// Supplied by analyzers that disambiguate repeats themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_index: Option<usize>,
}

/// Turn analyzer output into anchored, pending findings.
///
/// A raw finding without an explicit occurrence index takes the next unused
/// occurrence of its text, in the order the findings were returned. Every
/// anchor is resolved against `document_text` here; findings whose anchor
/// does not exist (empty text, text not in the document, index past the last
/// occurrence) are dropped.
pub fn anchor_findings(document_text: &str, raw: Vec<RawFinding>) -> Vec<Finding> {
    let mut claimed: HashMap<String, usize> = HashMap::new();
    let mut anchored = Vec::with_capacity(raw.len());

    for item in raw {
        let next_free = claimed.get(&item.original_text).copied().unwrap_or(0);
        let occurrence = item.occurrence_index.unwrap_or(next_free);

        if anchor::locate_occurrence(document_text, &item.original_text, occurrence).is_none() {
            warn!(
                occurrence,
                text_len = item.original_text.len(),
                "analyzer finding does not anchor into the document, dropping"
            );
            continue;
        }

        claimed.insert(item.original_text.clone(), occurrence.max(next_free) + 1);
        debug!(occurrence, "anchored finding");
        anchored.push(Finding::new(
            item.original_text,
            occurrence,
            item.risk,
            item.suggested_redline,
        ));
    }

    anchored
}

/// Number of findings still awaiting a decision.
pub fn pending_count(findings: &[Finding]) -> usize {
    findings.iter().filter(|f| f.is_pending()).count()
}
