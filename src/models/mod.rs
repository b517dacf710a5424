use crate::charts::ChartSpec;
use crate::sources::SourceCitation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record of a tabular query result: column name -> scalar value.
/// serde_json is built with `preserve_order`, so a Row keeps the column
/// order the producing backend emitted. Every row of one result must share
/// the same columns in the same order.
pub type Row = serde_json::Map<String, Value>;

/// A rectangular, column-homogeneous result set.
pub type TabularResult = Vec<Row>;

/// One completed conversation turn, owned by the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub session_id: String,
    pub user_message: String,
    pub assistant_message: String,
    /// Name of the visualization or document-search tool that shaped the
    /// response, if one ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,
    /// Structured payload (chart config / citations) attached to the turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Envelope returned to the caller for every orchestration run.
/// Failures never produce an empty response: `message` always carries at
/// least an explanatory string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub message: String,
    pub session_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_config: Option<ChartSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<TabularResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceCitation>>,
}

impl ResponseEnvelope {
    /// Build a failure envelope. The triggering turn is not recorded, so
    /// the session history stays uncorrupted.
    pub fn error(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        ResponseEnvelope {
            message: message.into(),
            session_id: session_id.into(),
            success: false,
            tool_used: None,
            chart_config: None,
            chart_data: None,
            sources: None,
        }
    }
}
