//! Review commands: analysis lifecycle and finding decisions.

use anyhow::Result;
use serde::Deserialize;

use super::parse_args;
use crate::ReviewError;
use crate::anchor::locate_occurrence;
use crate::collab::ReviewPreset;
use crate::finding::RawFinding;
use crate::server::{CommandDefinition, CommandResult};
use crate::session::Session;
use crate::state::{Action, ViewMode};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdParams {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptParams {
    pub id: String,
    /// Edited redline; defaults to the finding's current suggestion.
    #[serde(default)]
    pub redline: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedlineParams {
    pub id: String,
    pub redline: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams {
    pub findings: Vec<RawFinding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureParams {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectParams {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightParams {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModeParams {
    pub mode: ViewMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionsParams {
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub preset: Option<ReviewPreset>,
}

fn id_schema(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "description": description }
        },
        "required": ["id"]
    })
}

fn no_args() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

fn definition(name: &str, description: &str, input_schema: serde_json::Value) -> CommandDefinition {
    CommandDefinition {
        name: name.to_owned(),
        description: description.to_owned(),
        input_schema,
    }
}

pub fn definitions() -> Vec<CommandDefinition> {
    let redline_schema = serde_json::json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "redline": { "type": "string" }
        },
        "required": ["id", "redline"]
    });

    vec![
        definition("state", "Return the full review state.", no_args()),
        definition(
            "begin_analysis",
            "Mark an analysis as running. Fails while another analysis is running.",
            no_args(),
        ),
        definition(
            "complete_analysis",
            "Replace the findings with analyzer output. Each originalText must be verbatim document text; \
             repeats are assigned successive occurrence indices.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "findings": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "originalText": { "type": "string" },
                                "risk": { "type": "string" },
                                "suggestedRedline": { "type": "string" },
                                "occurrenceIndex": { "type": "integer", "minimum": 0 }
                            },
                            "required": ["originalText", "risk", "suggestedRedline"]
                        }
                    }
                },
                "required": ["findings"]
            }),
        ),
        definition(
            "fail_analysis",
            "Clear the running flag after a failed analysis. Findings are kept.",
            serde_json::json!({
                "type": "object",
                "properties": { "message": { "type": "string" } }
            }),
        ),
        definition(
            "accept",
            "Apply one finding's redline to its anchored occurrence.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "redline": { "type": "string", "description": "Edited redline (default: current suggestion)" }
                },
                "required": ["id"]
            }),
        ),
        definition("dismiss", "Dismiss a finding without changing the text.", id_schema("Finding id")),
        definition(
            "accept_all",
            "Apply every pending finding in one batch. Undoable once.",
            no_args(),
        ),
        definition("undo_accept_all", "Roll back the last accept-all batch.", no_args()),
        definition(
            "update_redline",
            "Edit a pending finding's suggested redline.",
            redline_schema.clone(),
        ),
        definition(
            "apply_refinement",
            "Store a refined redline for a pending finding and count the refinement.",
            redline_schema,
        ),
        definition(
            "select",
            "Select a finding (omit id to clear).",
            serde_json::json!({
                "type": "object",
                "properties": { "id": { "type": "string" } }
            }),
        ),
        definition(
            "highlight",
            "Set the highlighted text.",
            serde_json::json!({
                "type": "object",
                "properties": { "text": { "type": "string" } }
            }),
        ),
        definition(
            "set_view_mode",
            "Switch between analysis and comparison views.",
            serde_json::json!({
                "type": "object",
                "properties": { "mode": { "type": "string", "enum": ["analysis", "comparison"] } },
                "required": ["mode"]
            }),
        ),
        definition(
            "set_instructions",
            "Set custom review instructions, or pick a preset.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "instructions": { "type": "string" },
                    "preset": {
                        "type": "string",
                        "enum": ["aggressive", "riskAverse", "saas", "vendor", "customer", "balanced"]
                    }
                }
            }),
        ),
        definition("reset", "Discard the document and all review state.", no_args()),
    ]
}

pub fn state(session: &Session) -> CommandResult {
    let state = session.state();
    CommandResult::success(
        format!(
            "{} findings, {} pending{}",
            state.findings.len(),
            state.pending_count(),
            if state.can_undo() { ", undo available" } else { "" }
        ),
        serde_json::to_value(state).ok(),
    )
}

pub fn begin_analysis(session: &mut Session) -> CommandResult {
    if session.begin_analysis() {
        CommandResult::success("Analysis started", None)
    } else {
        CommandResult::failure("an analysis is already in progress")
    }
}

pub fn complete_analysis(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: AnalysisParams = parse_args("complete_analysis", arguments)?;
    let received = params.findings.len();
    let kept = session.complete_analysis(params.findings);

    Ok(CommandResult::success(
        format!("Anchored {kept} of {received} findings"),
        Some(serde_json::to_value(&session.state().findings)?),
    ))
}

pub fn fail_analysis(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: FailureParams = parse_args("fail_analysis", arguments)?;
    session.abort_analysis();
    let error = params
        .message
        .as_deref()
        .map_or_else(|| ReviewError::AnalysisFailure("no details".to_owned()), ReviewError::classify);
    Ok(CommandResult::success(format!("Analysis stopped: {error}"), None))
}

pub fn accept(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: AcceptParams = parse_args("accept", arguments)?;

    let Some(finding) = session.state().finding(&params.id) else {
        return Ok(CommandResult::success(
            format!("No finding {}; nothing changed", params.id),
            Some(serde_json::to_value(session.state())?),
        ));
    };
    if !finding.is_pending() {
        return Ok(CommandResult::success(
            format!("Finding {} is already {}; nothing changed", params.id, finding.status),
            Some(serde_json::to_value(session.state())?),
        ));
    }

    let anchored = locate_occurrence(
        &session.state().current_contract,
        &finding.original_text,
        finding.occurrence_index,
    )
    .is_some();
    let redline = params
        .redline
        .unwrap_or_else(|| finding.suggested_redline.clone());

    let state = session.dispatch(Action::AcceptFinding {
        id: params.id.clone(),
        redline,
    });
    let summary = if anchored {
        format!("Accepted {}", params.id)
    } else {
        format!("Accepted {} (anchor not found, text unchanged)", params.id)
    };

    Ok(CommandResult::success(summary, Some(serde_json::to_value(state)?)))
}

pub fn dismiss(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: IdParams = parse_args("dismiss", arguments)?;
    let summary = match session.state().finding(&params.id) {
        None => format!("No finding {}; nothing changed", params.id),
        Some(f) if f.is_pending() => format!("Dismissed {}", params.id),
        Some(f) => format!("Finding {} is already {}; nothing changed", params.id, f.status),
    };
    let state = session.dispatch(Action::DismissFinding(params.id));
    Ok(CommandResult::success(summary, Some(serde_json::to_value(state)?)))
}

pub fn accept_all(session: &mut Session) -> CommandResult {
    let report = session.accept_all();
    CommandResult::success(
        format!(
            "Applied {}, unresolved {}, conflicting {}",
            report.applied.len(),
            report.unresolved.len(),
            report.conflicted.len()
        ),
        serde_json::to_value(&report).ok(),
    )
}

pub fn undo_accept_all(session: &mut Session) -> CommandResult {
    if !session.state().can_undo() {
        return CommandResult::success("Nothing to undo", None);
    }
    let state = session.dispatch(Action::UndoAcceptAll);
    CommandResult::success("Accept-all undone", serde_json::to_value(state).ok())
}

pub fn update_redline(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: RedlineParams = parse_args("update_redline", arguments)?;
    if !session.state().finding(&params.id).is_some_and(|f| f.is_pending()) {
        return Ok(CommandResult::failure(format!("no pending finding: {}", params.id)));
    }
    session.dispatch(Action::UpdateFindingRedline {
        id: params.id.clone(),
        redline: params.redline,
    });
    Ok(CommandResult::success(
        format!("Updated redline for {}", params.id),
        Some(serde_json::to_value(session.state().finding(&params.id))?),
    ))
}

pub fn apply_refinement(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: RedlineParams = parse_args("apply_refinement", arguments)?;
    if !session.state().finding(&params.id).is_some_and(|f| f.is_pending()) {
        return Ok(CommandResult::failure(format!("no pending finding: {}", params.id)));
    }
    session.apply_refinement(&params.id, params.redline);
    Ok(CommandResult::success(
        format!("Refined {}", params.id),
        Some(serde_json::to_value(session.state().finding(&params.id))?),
    ))
}

pub fn select(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: SelectParams = parse_args("select", arguments)?;
    let summary = params
        .id
        .as_deref()
        .map_or_else(|| "Selection cleared".to_owned(), |id| format!("Selected {id}"));
    session.dispatch(Action::SetSelectedFinding(params.id));
    Ok(CommandResult::success(summary, None))
}

pub fn highlight(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: HighlightParams = parse_args("highlight", arguments)?;
    session.dispatch(Action::SetHighlightedText(params.text));
    Ok(CommandResult::success("Highlight set", None))
}

pub fn set_view_mode(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: ViewModeParams = parse_args("set_view_mode", arguments)?;
    session.dispatch(Action::SetViewMode(params.mode));
    Ok(CommandResult::success(format!("View mode: {:?}", params.mode), None))
}

pub fn set_instructions(session: &mut Session, arguments: serde_json::Value) -> Result<CommandResult> {
    let params: InstructionsParams = parse_args("set_instructions", arguments)?;
    let instructions = match (params.instructions, params.preset) {
        (Some(text), _) => text,
        (None, Some(preset)) => preset.instructions().to_owned(),
        (None, None) => String::new(),
    };
    session.dispatch(Action::SetCustomInstructions(instructions.clone()));
    Ok(CommandResult::success(
        "Instructions set",
        Some(serde_json::json!({ "customInstructions": instructions })),
    ))
}

pub fn reset(session: &mut Session) -> CommandResult {
    session.dispatch(Action::ResetState);
    CommandResult::success("State reset", None)
}
