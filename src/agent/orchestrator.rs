//! The agent loop: routes a user message through the oracle, executes the
//! tools it selects, and synthesizes the final response envelope.

use crate::agent::normalizer::{normalize, NormalizedOutput, ToolPayload};
use crate::ai::{Message, Oracle, OracleAction, ToolHistoryEntry, ToolResponse};
use crate::charts::ChartSpec;
use crate::models::{ChatTurn, ResponseEnvelope, TabularResult};
use crate::session::SessionStore;
use crate::sources::{dedup_citation_list, SourceCitation};
use crate::tools::{ToolKind, ToolRegistry};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Inline citation markers the oracle sometimes emits, e.g. `[^report.pdf-3^]`.
static CITATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\^[^\]]+\^\]").unwrap());

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum number of oracle rounds per message.
    pub max_tool_iterations: usize,
    /// How many past turns to replay into the oracle prompt.
    pub history_window: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            max_tool_iterations: 5,
            history_window: 20,
        }
    }
}

/// One executed tool call, kept in order for response synthesis.
struct ToolInvocationRecord {
    tool_name: String,
    kind: ToolKind,
    arguments: Value,
    output: NormalizedOutput,
}

pub struct Orchestrator {
    oracle: Arc<dyn Oracle>,
    registry: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    config: AgentConfig,
}

impl Orchestrator {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        registry: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
        config: AgentConfig,
    ) -> Self {
        Orchestrator {
            oracle,
            registry,
            sessions,
            config,
        }
    }

    /// Handle one user message and produce the response envelope.
    ///
    /// A missing session id starts a new session. The session stays locked
    /// for the whole run, so concurrent messages on the same session are
    /// answered one at a time.
    pub async fn handle_message(&self, text: &str, session_id: Option<&str>) -> ResponseEnvelope {
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        log::info!("[AGENT] Handling message for session {}", session_id);

        let mut session = self.sessions.acquire(&session_id).await;

        let mut messages = vec![Message::system(self.build_system_prompt())];
        for turn in session.recent_turns(self.config.history_window) {
            messages.push(Message::user(&turn.user_message));
            messages.push(Message::assistant(&turn.assistant_message));
        }
        messages.push(Message::user(text));

        let tools = self.registry.get_tool_definitions();
        let mut tool_history: Vec<ToolHistoryEntry> = Vec::new();
        let mut records: Vec<ToolInvocationRecord> = Vec::new();
        let mut last_preamble = String::new();
        let mut final_answer: Option<String> = None;

        for round in 1..=self.config.max_tool_iterations {
            log::info!("[AGENT] Round {} starting", round);

            let action = match self
                .oracle
                .select_next_action(&messages, &tool_history, &tools)
                .await
            {
                Ok(action) => action,
                Err(e) => {
                    log::error!("[AGENT] Oracle error: {}", e);
                    return ResponseEnvelope::error(
                        &session_id,
                        format!("Error: {}", e.message),
                    );
                }
            };

            match action {
                OracleAction::FinalAnswer(answer) => {
                    final_answer = Some(answer);
                    break;
                }
                OracleAction::ToolCalls { preamble, calls } => {
                    if !preamble.trim().is_empty() {
                        last_preamble = preamble;
                    }

                    let mut responses = Vec::with_capacity(calls.len());
                    for call in &calls {
                        log::info!(
                            "[AGENT] Executing tool '{}' with args: {}",
                            call.name,
                            call.arguments
                        );
                        let result = self
                            .registry
                            .execute(&call.name, call.arguments.clone())
                            .await;
                        log::info!(
                            "[AGENT] Tool '{}' finished (success: {})",
                            call.name,
                            result.success
                        );

                        // Unknown tools have no kind; their failure text
                        // still flows back to the oracle below.
                        if let Some(kind) = self.registry.kind_of(&call.name) {
                            records.push(ToolInvocationRecord {
                                tool_name: call.name.clone(),
                                kind,
                                arguments: call.arguments.clone(),
                                output: normalize(kind, &result.content),
                            });
                        }

                        responses.push(if result.success {
                            ToolResponse::success(call.id.clone(), result.content)
                        } else {
                            ToolResponse::error(call.id.clone(), result.content)
                        });
                    }
                    tool_history.push(ToolHistoryEntry::new(calls, responses));
                }
            }
        }

        // Ran out of rounds: answer with what we have rather than failing.
        let answer = final_answer.unwrap_or_else(|| {
            log::warn!(
                "[AGENT] Hit round cap ({}) without a final answer, synthesizing",
                self.config.max_tool_iterations
            );
            if !last_preamble.is_empty() {
                last_preamble
            } else if let Some(record) = records.last() {
                record.output.answer.clone()
            } else {
                "I was unable to complete the request in the allotted steps.".to_string()
            }
        });

        let answer = CITATION_MARKER.replace_all(&answer, "").trim().to_string();

        let envelope = self.synthesize(&session_id, answer, &records);

        session.push_turn(ChatTurn {
            session_id: session_id.clone(),
            user_message: text.to_string(),
            assistant_message: envelope.message.clone(),
            tool_used: envelope.tool_used.clone(),
            payload: turn_payload(&envelope),
            created_at: Utc::now(),
        });

        envelope
    }

    /// Fold executed tool outputs into the envelope. When a tool ran more
    /// than once, the latest chart and the latest citation list win.
    fn synthesize(
        &self,
        session_id: &str,
        answer: String,
        records: &[ToolInvocationRecord],
    ) -> ResponseEnvelope {
        let mut chart: Option<(ChartSpec, TabularResult)> = None;
        let mut citations: Option<Vec<SourceCitation>> = None;
        let mut tool_used: Option<String> = None;

        for record in records {
            log::debug!(
                "[AGENT] Synthesizing from '{}' (args: {})",
                record.tool_name,
                record.arguments
            );
            match &record.output.payload {
                ToolPayload::Visualization { chart: c, data } => {
                    chart = Some((c.clone(), data.clone()));
                }
                ToolPayload::Document { citations: list } => {
                    citations = Some(list.clone());
                }
                ToolPayload::Text => {}
            }
            // Only enrichment tools claim the attribution slot.
            match record.kind {
                ToolKind::Visualization | ToolKind::DocumentSearch => {
                    tool_used = Some(record.tool_name.clone());
                }
                ToolKind::Query => {}
            }
        }

        let (chart_config, chart_data) = match chart {
            Some((spec, data)) => (Some(spec), Some(data)),
            None => (None, None),
        };

        ResponseEnvelope {
            message: answer,
            session_id: session_id.to_string(),
            success: true,
            tool_used,
            chart_config,
            chart_data,
            sources: citations.map(dedup_citation_list),
        }
    }

    fn build_system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are a data analyst assistant for a retail sales dataset. You answer \
             questions about sales data and uploaded documents, using tools when they help.\n\n",
        );

        prompt.push_str("## TOOL SELECTION\n\n");
        prompt.push_str(
            "- Plain questions about sales numbers: use sql_database_query.\n\
             - Requests for charts, graphs, or plots: use query_and_visualize.\n\
             - Questions about uploaded documents or files: use document_search.\n\
             - Greetings and general conversation: answer directly without tools.\n\n",
        );

        prompt.push_str(
            "Base every factual claim on tool output. If a tool reports an error, \
             tell the user what went wrong instead of guessing.\n",
        );

        prompt
    }
}

fn turn_payload(envelope: &ResponseEnvelope) -> Option<Value> {
    if envelope.chart_config.is_none() && envelope.sources.is_none() {
        return None;
    }
    Some(json!({
        "chart_config": envelope.chart_config,
        "chart_data": envelope.chart_data,
        "sources": envelope.sources,
    }))
}
