pub mod openai;
pub mod types;

pub use openai::OpenAiOracle;
pub use types::{OracleAction, OracleError, ToolCall, ToolHistoryEntry, ToolResponse};

use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// The external reasoning engine that chooses which tool(s) to call and
/// with what arguments. Injected as a strategy so the orchestrator's state
/// machine can be driven by a deterministic stub in tests.
///
/// Implementations must honor the declared tool contracts but are otherwise
/// opaque. A response the implementation cannot parse into a valid tool
/// call must degrade to `OracleAction::FinalAnswer` with the best available
/// text. Parsing trouble is never a run-fatal error.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn select_next_action(
        &self,
        messages: &[Message],
        tool_history: &[ToolHistoryEntry],
        tools: &[ToolDefinition],
    ) -> Result<OracleAction, OracleError>;
}
