//! Comparison and export commands.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{parse_args, validate_path};
use crate::anchor::diff::{similarity_percent, unified_diff};
use crate::export::{ExportRequest, Exporter, TextExporter, accepted_modifications};
use crate::server::{CommandDefinition, CommandResult};
use crate::session::Session;
use crate::store::atomic_write;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
    /// Destination (relative to workspace or absolute).
    pub file_path: String,
    /// Append a unified diff of all accepted changes.
    #[serde(default)]
    pub include_track_changes: bool,
}

pub fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition {
            name: "diff".to_owned(),
            description: "Unified diff and similarity between the original and the current contract."
                .to_owned(),
            input_schema: serde_json::json!({ "type": "object", "properties": {} }),
        },
        CommandDefinition {
            name: "export".to_owned(),
            description: "Write the reviewed contract exactly as it currently reads, optionally \
                followed by the accepted findings and a diff against the original."
                .to_owned(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "filePath": {
                        "type": "string",
                        "description": "Path to write"
                    },
                    "includeTrackChanges": {
                        "type": "boolean",
                        "description": "Append a track-changes section (default: false)",
                        "default": false
                    }
                },
                "required": ["filePath"]
            }),
        },
    ]
}

fn document_name(session: &Session) -> &str {
    session
        .state()
        .document
        .as_ref()
        .map_or("contract", |d| d.file_name.as_str())
}

pub fn diff(session: &Session) -> CommandResult {
    let state = session.state();
    let unified = unified_diff(
        document_name(session),
        &state.original_contract,
        &state.current_contract,
    );
    let similarity = similarity_percent(&state.original_contract, &state.current_contract);

    CommandResult::success(
        format!("{similarity:.1}% similar to the original"),
        Some(serde_json::json!({
            "diff": unified,
            "similarity": similarity,
        })),
    )
}

pub fn export(session: &Session, workspace: &Path, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: ExportParams = parse_args("export", arguments)?;

    let path = match validate_path(workspace, &params.file_path) {
        Ok(p) => p,
        Err(e) => return Ok(CommandResult::failure(e.to_string())),
    };

    let state = session.state();
    let modifications = accepted_modifications(&state.findings);
    let exporter = TextExporter {
        include_track_changes: params.include_track_changes,
    };
    let request = ExportRequest {
        document_name: document_name(session),
        original_text: &state.original_contract,
        reviewed_text: &state.current_contract,
        modifications: &modifications,
    };

    let bytes = match exporter.export(&request) {
        Ok(bytes) => bytes,
        Err(e) => return Ok(CommandResult::failure(e.to_string())),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directories for {}", path.display()))?;
    }
    atomic_write(&path, &bytes)?;

    Ok(CommandResult::success(
        format!(
            "Exported {} accepted changes to {}",
            modifications.len(),
            path.display()
        ),
        Some(serde_json::json!({
            "path": path.display().to_string(),
            "bytes": bytes.len(),
            "extension": exporter.extension(),
        })),
    ))
}
