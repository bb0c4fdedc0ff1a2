//! Review server: stdio transport, JSON-RPC 2.0, newline-delimited.
//!
//! Reads one request per line, dispatches it to the [`CommandRouter`], and
//! writes one response per line. Requests are handled strictly in arrival
//! order, which makes this loop the serialization point for every state
//! change.
//!
//! Protocol flow:
//! 1. Client sends `initialize` → server responds with its info
//! 2. Client sends `commands/list` → server returns command definitions
//! 3. Client sends `commands/call` → server runs the command and returns result
//! 4. Client closes stdin → server exits

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::commands::CommandRouter;
use crate::store::DEFAULT_STORAGE_KEY;

/// Maximum size of a single JSON-RPC line (32 MiB). Whole contracts travel inline.
const MAX_LINE_BYTES: usize = 32 * 1024 * 1024;

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 types
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Review protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfo {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    server_info: ServerInfo,
    commands: usize,
}

/// Command definition returned by `commands/list`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct CommandsListResult {
    commands: Vec<CommandDefinition>,
}

#[derive(Debug, Deserialize)]
struct CommandCallParams {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Text item in a `commands/call` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// `commands/call` result: a human-readable summary plus structured data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub content: Vec<ContentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CommandResult {
    pub fn success(summary: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            content: vec![ContentItem {
                content_type: "text".to_owned(),
                text: summary.into(),
            }],
            data,
            is_error: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem {
                content_type: "text".to_owned(),
                text: format!("Error: {}", message.into()),
            }],
            data: None,
            is_error: true,
        }
    }

    /// The summary line.
    pub fn text(&self) -> &str {
        self.content.first().map_or("", |c| c.text.as_str())
    }
}

// ---------------------------------------------------------------------------
// Server configuration
// ---------------------------------------------------------------------------

/// Configuration for the review server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Root for document and export paths.
    pub workspace: PathBuf,
    /// Where state snapshots are kept.
    pub state_dir: PathBuf,
    /// Snapshot name within `state_dir`.
    pub storage_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            state_dir: PathBuf::from(".clause-review"),
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server main loop
// ---------------------------------------------------------------------------

/// Run the review server on stdin/stdout until stdin closes.
///
/// # Errors
///
/// Returns an error if the router cannot be built or stdio fails fatally.
pub fn run_server(config: ServerConfig) -> Result<()> {
    info!(
        workspace = %config.workspace.display(),
        state_dir = %config.state_dir.display(),
        "clause-review server starting"
    );

    let mut router = CommandRouter::from_config(&config)?;
    let stdin = std::io::stdin();
    let mut reader = std::io::BufReader::new(stdin.lock());
    let mut stdout = std::io::stdout().lock();

    serve(&mut router, &mut reader, &mut stdout)?;

    info!("clause-review server stopped");
    Ok(())
}

/// Serve requests from `reader` until EOF, writing responses to `out`.
pub fn serve(router: &mut CommandRouter, reader: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let mut line_buf = String::new();

    loop {
        line_buf.clear();
        let bytes_read = match read_line_limited(reader, &mut line_buf, MAX_LINE_BYTES) {
            Ok(n) => n,
            Err(e) if e.is::<LineTooLong>() => {
                warn!(error = %e, "oversized request dropped");
                write_response(out, &error_response(None, -32600, &e.to_string()))?;
                continue;
            }
            Err(e) => return Err(e).context("failed to read request"),
        };

        // EOF: client closed stdin, clean exit.
        if bytes_read == 0 {
            info!("input closed, shutting down");
            break;
        }

        let trimmed = line_buf.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!(bytes = trimmed.len(), "received request");

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "invalid JSON-RPC request");
                write_response(out, &error_response(None, -32700, &format!("parse error: {e}")))?;
                continue;
            }
        };

        if request.jsonrpc != "2.0" {
            warn!(version = request.jsonrpc, "invalid JSON-RPC version (expected \"2.0\")");
            let resp = error_response(
                request.id.clone(),
                -32600,
                &format!(
                    "invalid request: jsonrpc version must be \"2.0\", got \"{}\"",
                    request.jsonrpc
                ),
            );
            write_response(out, &resp)?;
            continue;
        }

        // Notifications still run (they may change state) but get no response.
        let is_notification = request.id.is_none();
        let response = dispatch(router, &request);

        if is_notification {
            debug!(method = request.method, "notification handled (no response)");
            continue;
        }

        if let Some(resp) = response {
            write_response(out, &resp)?;
        }
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate handler.
pub fn dispatch(router: &mut CommandRouter, req: &JsonRpcRequest) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => Some(handle_initialize(router, req)),
        "commands/list" => Some(success_response(
            req.id.clone(),
            &CommandsListResult {
                commands: router.list_commands(),
            },
        )),
        "commands/call" => Some(handle_commands_call(router, req)),
        "ping" => Some(success_response(req.id.clone(), &serde_json::json!({}))),
        _ => {
            warn!(method = req.method, "unknown method");
            Some(error_response(
                req.id.clone(),
                -32601,
                &format!("method not found: {}", req.method),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn handle_initialize(router: &CommandRouter, req: &JsonRpcRequest) -> JsonRpcResponse {
    let result = InitializeResult {
        server_info: ServerInfo {
            name: "clause-review".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        },
        commands: router.list_commands().len(),
    };
    success_response(req.id.clone(), &result)
}

fn handle_commands_call(router: &mut CommandRouter, req: &JsonRpcRequest) -> JsonRpcResponse {
    let params: CommandCallParams = match serde_json::from_value(req.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return error_response(
                req.id.clone(),
                -32602,
                &format!("invalid commands/call params: {e}"),
            );
        }
    };

    match router.call_command(&params.name, params.arguments) {
        Ok(result) => success_response(req.id.clone(), &result),
        Err(e) => {
            error!(command = params.name, error = %e, "command failed");
            success_response(req.id.clone(), &CommandResult::failure(format!("{e:#}")))
        }
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn success_response(id: Option<serde_json::Value>, result: &impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse {
            jsonrpc: "2.0".to_owned(),
            id,
            result: Some(v),
            error: None,
        },
        Err(e) => {
            error!(error = %e, "failed to serialize success response");
            error_response(id, -32603, &format!("internal error: failed to serialize result: {e}"))
        }
    }
}

fn error_response(id: Option<serde_json::Value>, code: i64, message: &str) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_owned(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_owned(),
            data: None,
        }),
    }
}

/// Write a JSON-RPC response as a single line.
fn write_response(out: &mut impl Write, resp: &JsonRpcResponse) -> Result<()> {
    let json = serde_json::to_string(resp).context("failed to serialize response")?;
    out.write_all(json.as_bytes()).context("failed to write response")?;
    out.write_all(b"\n").context("failed to write newline")?;
    out.flush().context("failed to flush output")?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
#[error("line exceeds maximum size ({0} bytes)")]
struct LineTooLong(usize);

/// Read a line from `reader` into `buf`, stopping at newline or `max_bytes`.
///
/// Returns the number of bytes read (0 = EOF). An oversized line is consumed
/// through its newline and reported as [`LineTooLong`], leaving the reader
/// positioned at the next request.
fn read_line_limited(reader: &mut impl BufRead, buf: &mut String, max_bytes: usize) -> Result<usize> {
    let mut raw = Vec::new();
    let mut total = 0usize;
    let mut overflow = false;

    loop {
        let available = reader.fill_buf().context("input fill_buf failed")?;
        if available.is_empty() {
            break;
        }
        let (consumed, found_newline) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        if !overflow && total + consumed > max_bytes {
            overflow = true;
            raw.clear();
        }
        if !overflow {
            raw.extend_from_slice(&available[..consumed]);
        }
        total += consumed;
        reader.consume(consumed);
        if found_newline {
            break;
        }
    }

    if overflow {
        return Err(LineTooLong(max_bytes).into());
    }

    let chunk = String::from_utf8(raw).context("non-UTF-8 request data")?;
    buf.push_str(&chunk);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_line_limited_splits_lines() {
        let mut input = std::io::Cursor::new("first\nsecond\n");
        let mut buf = String::new();
        assert_eq!(read_line_limited(&mut input, &mut buf, 64).expect("read"), 6);
        assert_eq!(buf, "first\n");
        buf.clear();
        read_line_limited(&mut input, &mut buf, 64).expect("read");
        assert_eq!(buf, "second\n");
        buf.clear();
        assert_eq!(read_line_limited(&mut input, &mut buf, 64).expect("read"), 0);
    }

    #[test]
    fn test_read_line_limited_recovers_after_overflow() {
        let mut input = std::io::Cursor::new(format!("{}\nnext\n", "x".repeat(100)));
        let mut buf = String::new();
        let err = read_line_limited(&mut input, &mut buf, 16).expect_err("too long");
        assert!(err.is::<LineTooLong>());
        read_line_limited(&mut input, &mut buf, 16).expect("read");
        assert_eq!(buf, "next\n");
    }

    #[test]
    fn test_command_result_failure_text() {
        let result = CommandResult::failure("unknown finding");
        assert!(result.is_error);
        assert_eq!(result.text(), "Error: unknown finding");
    }
}
