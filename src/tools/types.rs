use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Identity class of a tool's output, used by the normalizer to decide
/// which structured payloads to look for. Only visualization tools are
/// inspected for charts; only document-search tools for citations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Text-only answers (e.g. the plain SQL query tool).
    Query,
    /// Answers with retrieved-document citations.
    DocumentSearch,
    /// Answers with tabular data and a chart config.
    Visualization,
}

/// JSON schema for a single input property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

/// Input contract for a tool, sent verbatim to the reasoning oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, PropertySchema>,
    pub required: Vec<String>,
}

impl Default for ToolInputSchema {
    fn default() -> Self {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: vec![],
        }
    }
}

/// Immutable descriptor registered for each tool. The description doubles
/// as the natural-language selection hint the oracle uses to pick between
/// overlapping capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
    pub kind: ToolKind,
}

/// Result of one tool execution. Tool-level failures are carried as a
/// failure result, never as a panic or early exit. One misbehaving tool
/// must not abort the orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            content: content.into(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        ToolResult {
            success: false,
            content: message.clone(),
            error: Some(message),
        }
    }

    /// Failure whose content is still a structured payload (e.g. a JSON
    /// answer describing the error), so the oracle sees usable output.
    pub fn error_with_content(content: impl Into<String>, message: impl Into<String>) -> Self {
        ToolResult {
            success: false,
            content: content.into(),
            error: Some(message.into()),
        }
    }
}
