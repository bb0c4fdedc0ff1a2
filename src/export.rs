//! Exporting the reviewed contract.
//!
//! The exported body is always the live contract text the user reviewed.
//! Accepted findings only annotate the track-changes section; they are never
//! replayed against the pristine text, since a later analysis or a lost
//! anchor would make such a replay diverge from what the user saw.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::anchor::diff;
use crate::error::ReviewResult;
use crate::finding::{Finding, FindingStatus};

/// One accepted change to carry into an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modification {
    pub original: String,
    pub replacement: String,
    #[serde(default)]
    pub occurrence_index: usize,
}

impl Modification {
    pub fn from_finding(finding: &Finding) -> Self {
        Self {
            original: finding.original_text.clone(),
            replacement: finding.suggested_redline.clone(),
            occurrence_index: finding.occurrence_index,
        }
    }
}

/// Modifications for every accepted finding, in list order.
pub fn accepted_modifications(findings: &[Finding]) -> Vec<Modification> {
    findings
        .iter()
        .filter(|f| f.status == FindingStatus::Accepted)
        .map(Modification::from_finding)
        .collect()
}

/// What to export.
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    pub document_name: &'a str,
    /// Pristine text, the left side of the track-changes diff.
    pub original_text: &'a str,
    /// Live text; becomes the exported body.
    pub reviewed_text: &'a str,
    pub modifications: &'a [Modification],
}

/// Produces an export artifact from the reviewed text and accepted changes.
pub trait Exporter {
    /// File extension of the artifact, including the dot.
    fn extension(&self) -> &'static str;

    fn export(&self, request: &ExportRequest<'_>) -> ReviewResult<Vec<u8>>;
}

/// Plain-text export, optionally followed by a track-changes section.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExporter {
    pub include_track_changes: bool,
}

const TRACK_CHANGES_HEADER: &str = "\n\n---- Track changes ----\n\n";

impl Exporter for TextExporter {
    fn extension(&self) -> &'static str {
        ".txt"
    }

    fn export(&self, request: &ExportRequest<'_>) -> ReviewResult<Vec<u8>> {
        let mut out = request.reviewed_text.to_owned();

        if self.include_track_changes {
            out.push_str(TRACK_CHANGES_HEADER);
            for m in request.modifications {
                let _ = writeln!(out, "Accepted: {:?} -> {:?}", m.original, m.replacement);
            }
            if !request.modifications.is_empty() {
                out.push('\n');
            }
            out.push_str(&diff::unified_diff(
                request.document_name,
                request.original_text,
                request.reviewed_text,
            ));
        }

        Ok(out.into_bytes())
    }
}
