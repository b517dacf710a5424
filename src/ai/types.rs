use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Reasoning-oracle error with status code information.
#[derive(Debug, Clone)]
pub struct OracleError {
    /// Error message
    pub message: String,
    /// HTTP status code if available
    pub status_code: Option<u16>,
}

impl OracleError {
    pub fn new(message: impl Into<String>) -> Self {
        OracleError {
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status_code: u16) -> Self {
        OracleError {
            message: message.into(),
            status_code: Some(status_code),
        }
    }
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.status_code {
            write!(f, "[HTTP {}] {}", code, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for OracleError {}

impl From<String> for OracleError {
    fn from(s: String) -> Self {
        OracleError::new(s)
    }
}

/// Represents a tool call requested by the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// Arguments to pass to the tool as JSON
    pub arguments: Value,
}

/// Result of a tool execution fed back to the oracle on the next round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    /// ID of the tool call this responds to
    pub tool_call_id: String,
    /// Content of the tool response
    pub content: String,
    /// Whether the tool execution resulted in an error
    pub is_error: bool,
}

impl ToolResponse {
    pub fn success(tool_call_id: String, content: String) -> Self {
        ToolResponse {
            tool_call_id,
            content,
            is_error: false,
        }
    }

    pub fn error(tool_call_id: String, error: String) -> Self {
        ToolResponse {
            tool_call_id,
            content: error,
            is_error: true,
        }
    }
}

/// One round of tool calls and their responses, replayed to the oracle so
/// it can decide the next action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolHistoryEntry {
    pub tool_calls: Vec<ToolCall>,
    pub tool_responses: Vec<ToolResponse>,
}

impl ToolHistoryEntry {
    pub fn new(tool_calls: Vec<ToolCall>, tool_responses: Vec<ToolResponse>) -> Self {
        ToolHistoryEntry {
            tool_calls,
            tool_responses,
        }
    }
}

/// The oracle's decision for one routing round.
#[derive(Debug, Clone)]
pub enum OracleAction {
    /// Invoke the listed tools, in order. `preamble` is any text the oracle
    /// produced alongside the calls; it is kept as best-effort answer text
    /// if the run hits the iteration cap.
    ToolCalls {
        preamble: String,
        calls: Vec<ToolCall>,
    },
    /// No further tool calls; the text is the final user-facing answer.
    FinalAnswer(String),
}

impl OracleAction {
    pub fn is_final(&self) -> bool {
        matches!(self, OracleAction::FinalAnswer(_))
    }
}
