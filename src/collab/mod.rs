//! Collaborator seams: document parsing, analysis and refinement.
//!
//! The review core never talks to a file format library or a language-model
//! provider directly. Callers construct a collaborator holding its own
//! configuration (credentials, model, endpoints) and pass it in, which keeps
//! the core testable with fakes.

pub mod text;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::ParsedDocument;
use crate::error::ReviewResult;
use crate::finding::RawFinding;

/// Turns an uploaded file into literal text.
///
/// Paragraphs must come back separated by a blank line (`"\n\n"`).
pub trait Parser {
    fn parse(&self, path: &Path) -> ReviewResult<ParsedDocument>;
}

/// Proposes findings for a document.
///
/// Every returned `original_text` must be a verbatim substring of
/// `document_text`. The core checks this when anchoring and drops findings
/// that do not comply.
pub trait Analyzer {
    fn analyze(&self, document_text: &str, instructions: Option<&str>) -> ReviewResult<Vec<RawFinding>>;
}

/// Rewrites a redline according to a free-text instruction.
pub trait Refiner {
    fn refine(&self, original_text: &str, current_redline: &str, instruction: &str) -> ReviewResult<String>;
}

/// Canned review stances offered as analysis instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewPreset {
    Aggressive,
    RiskAverse,
    Saas,
    Vendor,
    Customer,
    #[default]
    Balanced,
}

impl ReviewPreset {
    pub const ALL: [Self; 6] = [
        Self::Aggressive,
        Self::RiskAverse,
        Self::Saas,
        Self::Vendor,
        Self::Customer,
        Self::Balanced,
    ];

    pub const fn instructions(self) -> &'static str {
        match self {
            Self::Aggressive => {
                "Negotiate aggressively. Maximize protections for our side. Minimize obligations. \
                 Push back hard on liability, warranties, and termination rights."
            }
            Self::RiskAverse => {
                "Identify ALL potential risks. Flag ambiguities. Ensure every obligation is crystal clear. \
                 Add protective language wherever possible."
            }
            Self::Saas => {
                "Focus on SaaS-specific concerns: data ownership, uptime SLAs, security obligations, \
                 termination/transition, usage restrictions, pricing escalations."
            }
            Self::Vendor => {
                "Review from vendor perspective. Protect our IP, limit liability, ensure payment terms \
                 are favorable, clarify scope to prevent scope creep."
            }
            Self::Customer => {
                "Review from customer perspective. Ensure service levels, data rights, exit flexibility, \
                 and cost predictability. Challenge one-sided terms."
            }
            Self::Balanced => {
                "Seek fair, balanced terms. Flag genuinely problematic clauses but maintain commercial \
                 reasonableness. Focus on deal-breaking issues."
            }
        }
    }
}

/// Instructions to send with an analysis: the custom text when set, else the balanced preset.
pub fn effective_instructions(custom: &str) -> &str {
    if custom.trim().is_empty() {
        ReviewPreset::Balanced.instructions()
    } else {
        custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_have_text() {
        for preset in ReviewPreset::ALL {
            assert!(!preset.instructions().is_empty(), "{preset:?}");
        }
    }

    #[test]
    fn test_preset_wire_names() {
        let value = serde_json::to_value(ReviewPreset::RiskAverse).expect("serialize");
        assert_eq!(value, "riskAverse");
    }

    #[test]
    fn test_effective_instructions() {
        assert_eq!(effective_instructions("  "), ReviewPreset::Balanced.instructions());
        assert_eq!(effective_instructions("favor the buyer"), "favor the buyer");
    }
}
