//! Command router: registers and dispatches `commands/call` requests.
//!
//! Each command is a function taking the router's session (and, for file
//! commands, the workspace) plus JSON arguments, returning a
//! [`CommandResult`]. Review failures that the caller should see (unknown
//! finding, unsupported upload) come back as `is_error` results; only
//! malformed arguments surface as `Err`.

pub mod document;
pub mod export;
pub mod review;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::collab::text::PlainTextParser;
use crate::server::{CommandDefinition, CommandResult, ServerConfig};
use crate::session::Session;
use crate::store::{FileStore, StateStore};

/// Resolve a path argument against the workspace, refusing anything that
/// lands outside it.
///
/// Rejects null bytes, `..` escapes, and symlinks resolving outside the
/// workspace. Paths that do not exist yet (export targets) are checked via
/// their deepest existing ancestor.
pub fn validate_path(workspace: &Path, file_path: &str) -> Result<PathBuf> {
    if file_path.contains('\0') {
        bail!("path contains null byte");
    }

    let raw_path = if Path::new(file_path).is_absolute() {
        PathBuf::from(file_path)
    } else {
        workspace.join(file_path)
    };

    let canonical_workspace = workspace
        .canonicalize()
        .with_context(|| format!("workspace not accessible: {}", workspace.display()))?;

    let mut ancestor = raw_path.as_path();
    let mut missing = Vec::new();
    let canonical_path = loop {
        if ancestor.exists() {
            let mut resolved = ancestor.canonicalize()?;
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            break resolved;
        }
        match (ancestor.file_name(), ancestor.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name.to_os_string());
                ancestor = parent;
            }
            _ => bail!("cannot resolve path: {file_path}"),
        }
    };

    if !canonical_path.starts_with(&canonical_workspace) {
        bail!("path escapes workspace boundary: {file_path}");
    }

    Ok(canonical_path)
}

/// Deserialize command arguments, treating `null` as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(command: &str, arguments: serde_json::Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        serde_json::json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).with_context(|| format!("invalid {command} arguments"))
}

/// Routes commands to the session.
#[derive(Debug)]
pub struct CommandRouter {
    workspace: PathBuf,
    session: Session,
    parser: PlainTextParser,
}

impl CommandRouter {
    /// Create a router around an explicit store.
    pub fn new(workspace: PathBuf, store: Box<dyn StateStore + Send>) -> Result<Self> {
        Ok(Self {
            workspace,
            session: Session::restore(store),
            parser: PlainTextParser::new().context("failed to build upload patterns")?,
        })
    }

    /// Create a router persisting to a [`FileStore`] as configured.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let store = FileStore::new(&config.state_dir, config.storage_key.clone());
        Self::new(config.workspace.clone(), Box::new(store))
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// List all commands with their JSON Schema definitions.
    pub fn list_commands(&self) -> Vec<CommandDefinition> {
        let mut commands = document::definitions();
        commands.extend(review::definitions());
        commands.extend(export::definitions());
        commands
    }

    /// Call a command by name with the given JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments do not match the command's schema.
    pub fn call_command(&mut self, name: &str, arguments: serde_json::Value) -> Result<CommandResult> {
        debug!(command = name, "dispatching command");

        match name {
            "load_document" => document::load(&mut self.session, &self.parser, &self.workspace, arguments),
            "set_document" => document::set(&mut self.session, arguments),
            "blocks" => document::blocks(&self.session, arguments),

            "state" => Ok(review::state(&self.session)),
            "begin_analysis" => Ok(review::begin_analysis(&mut self.session)),
            "complete_analysis" => review::complete_analysis(&mut self.session, arguments),
            "fail_analysis" => review::fail_analysis(&mut self.session, arguments),
            "accept" => review::accept(&mut self.session, arguments),
            "dismiss" => review::dismiss(&mut self.session, arguments),
            "accept_all" => Ok(review::accept_all(&mut self.session)),
            "undo_accept_all" => Ok(review::undo_accept_all(&mut self.session)),
            "update_redline" => review::update_redline(&mut self.session, arguments),
            "apply_refinement" => review::apply_refinement(&mut self.session, arguments),
            "select" => review::select(&mut self.session, arguments),
            "highlight" => review::highlight(&mut self.session, arguments),
            "set_view_mode" => review::set_view_mode(&mut self.session, arguments),
            "set_instructions" => review::set_instructions(&mut self.session, arguments),
            "reset" => Ok(review::reset(&mut self.session)),

            "diff" => Ok(export::diff(&self.session)),
            "export" => export::export(&self.session, &self.workspace, arguments),

            _ => Ok(CommandResult::failure(format!("Unknown command: {name}"))),
        }
    }
}
