//! Document commands: load an upload, set text directly, list blocks.

use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use super::{parse_args, validate_path};
use crate::collab::text::PlainTextParser;
use crate::document::{self, ParsedDocument};
use crate::server::{CommandDefinition, CommandResult};
use crate::session::Session;
use crate::state::Action;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadParams {
    /// Path to the upload (relative to workspace or absolute).
    pub file_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetParams {
    pub text: String,
    pub file_name: String,
    /// Defaults to the extension of `file_name`.
    #[serde(default)]
    pub file_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocksParams {
    /// Only return the block containing this text.
    #[serde(default)]
    pub search: Option<String>,
}

pub fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition {
            name: "load_document".to_owned(),
            description: "Parse a .txt/.md upload and start a new review. \
                Discards all findings and undo history."
                .to_owned(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "filePath": {
                        "type": "string",
                        "description": "Path to the document"
                    }
                },
                "required": ["filePath"]
            }),
        },
        CommandDefinition {
            name: "set_document".to_owned(),
            description: "Start a new review from already-extracted text.".to_owned(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Literal document text, paragraphs separated by a blank line" },
                    "fileName": { "type": "string" },
                    "fileType": { "type": "string", "description": "Extension including the dot (default: from fileName)" }
                },
                "required": ["text", "fileName"]
            }),
        },
        CommandDefinition {
            name: "blocks".to_owned(),
            description: "Split the current contract into ~200-word paragraph blocks.".to_owned(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "search": { "type": "string", "description": "Return only the block containing this text (loose match)" }
                }
            }),
        },
    ]
}

pub fn load(
    session: &mut Session,
    parser: &PlainTextParser,
    workspace: &Path,
    arguments: serde_json::Value,
) -> Result<CommandResult> {
    let params: LoadParams = parse_args("load_document", arguments)?;

    let path = match validate_path(workspace, &params.file_path) {
        Ok(p) => p,
        Err(e) => return Ok(CommandResult::failure(e.to_string())),
    };

    match session.load_document(parser, &path) {
        Ok(state) => Ok(CommandResult::success(
            format!(
                "Loaded {} ({} bytes)",
                path.display(),
                state.original_contract.len()
            ),
            Some(serde_json::to_value(&state.document)?),
        )),
        Err(e) => Ok(CommandResult::failure(e.to_string())),
    }
}

pub fn set(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: SetParams = parse_args("set_document", arguments)?;
    let file_type = params.file_type.unwrap_or_else(|| {
        params
            .file_name
            .rfind('.')
            .map(|i| params.file_name[i..].to_lowercase())
            .unwrap_or_default()
    });

    let state = session.dispatch(Action::SetDocument(ParsedDocument {
        text: params.text,
        file_name: params.file_name,
        file_type,
    }));

    Ok(CommandResult::success(
        format!("Document set ({} bytes)", state.original_contract.len()),
        Some(serde_json::to_value(&state.document)?),
    ))
}

pub fn blocks(session: &Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: BlocksParams = parse_args("blocks", arguments)?;
    let blocks = document::parse_blocks(&session.state().current_contract);

    match params.search {
        Some(search) => match document::find_block_containing(&blocks, &search) {
            Some(block) => Ok(CommandResult::success(
                format!("Found in block {}", block.block_number),
                Some(serde_json::to_value(block)?),
            )),
            None => Ok(CommandResult::success("No block contains that text", None)),
        },
        None => Ok(CommandResult::success(
            format!("{} blocks", blocks.len()),
            Some(serde_json::to_value(&blocks)?),
        )),
    }
}
