//! OpenAI-compatible function-calling client for tool selection.
//!
//! This is the production implementation of the [`Oracle`] trait: it sends
//! the conversation plus the registered tool contracts to a chat-completions
//! endpoint and maps the response into an [`OracleAction`]. A response that
//! cannot be parsed into valid tool calls degrades to a final text answer
//! instead of failing the run.

use crate::ai::types::{OracleAction, OracleError, ToolCall, ToolHistoryEntry};
use crate::ai::{Message, Oracle};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub struct OpenAiOracle {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<RawToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAiMessage {
    fn text(role: &str, content: String) -> Self {
        OpenAiMessage {
            role: role.to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    call_type: String,
    function: RawFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFunctionCall {
    name: String,
    /// Arguments arrive as a JSON-encoded string, not an object.
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<RawToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiApiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiError {
    message: String,
}

impl OpenAiOracle {
    pub fn new(api_key: &str, endpoint: Option<&str>, model: Option<&str>) -> Result<Self, String> {
        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| format!("Invalid API key format: {}", e))?;
        auth_headers.insert(header::AUTHORIZATION, auth_value);

        Ok(Self {
            client: Client::new(),
            auth_headers,
            endpoint: endpoint
                .unwrap_or("https://api.openai.com/v1/chat/completions")
                .to_string(),
            model: model.unwrap_or("gpt-4o-mini").to_string(),
        })
    }

    fn build_messages(
        messages: &[Message],
        tool_history: &[ToolHistoryEntry],
    ) -> Vec<OpenAiMessage> {
        let mut api_messages: Vec<OpenAiMessage> = messages
            .iter()
            .map(|m| OpenAiMessage::text(m.role.as_str(), m.content.clone()))
            .collect();

        // Replay prior rounds: assistant tool_calls followed by one `tool`
        // message per response, so the oracle sees its own observations.
        for entry in tool_history {
            let raw_calls: Vec<RawToolCall> = entry
                .tool_calls
                .iter()
                .map(|tc| RawToolCall {
                    id: tc.id.clone(),
                    call_type: "function".to_string(),
                    function: RawFunctionCall {
                        name: tc.name.clone(),
                        arguments: tc.arguments.to_string(),
                    },
                })
                .collect();

            api_messages.push(OpenAiMessage {
                role: "assistant".to_string(),
                content: None,
                tool_calls: Some(raw_calls),
                tool_call_id: None,
            });

            for response in &entry.tool_responses {
                api_messages.push(OpenAiMessage {
                    role: "tool".to_string(),
                    content: Some(response.content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(response.tool_call_id.clone()),
                });
            }
        }

        api_messages
    }

    fn build_tools(tools: &[ToolDefinition]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|t| OpenAiTool {
                tool_type: "function".to_string(),
                function: OpenAiFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: serde_json::to_value(&t.input_schema).unwrap_or_default(),
                },
            })
            .collect()
    }

    /// Map a completion message to an action. Any malformed tool-call
    /// arguments degrade the whole response to a plain-text final answer
    /// rather than a run failure.
    fn parse_action(message: ChoiceMessage) -> OracleAction {
        let content = message.content.unwrap_or_default();
        let raw_calls = message.tool_calls.unwrap_or_default();

        if raw_calls.is_empty() {
            return OracleAction::FinalAnswer(content);
        }

        let mut calls = Vec::with_capacity(raw_calls.len());
        for raw in raw_calls {
            let arguments: Value = match serde_json::from_str(&raw.function.arguments) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!(
                        "[ORACLE] Malformed arguments for tool call '{}' ({}), degrading to text answer",
                        raw.function.name,
                        e
                    );
                    return OracleAction::FinalAnswer(content);
                }
            };
            let id = if raw.id.is_empty() {
                format!("call_{}", uuid::Uuid::new_v4())
            } else {
                raw.id
            };
            calls.push(ToolCall {
                id,
                name: raw.function.name,
                arguments,
            });
        }

        OracleAction::ToolCalls {
            preamble: content,
            calls,
        }
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn select_next_action(
        &self,
        messages: &[Message],
        tool_history: &[ToolHistoryEntry],
        tools: &[ToolDefinition],
    ) -> Result<OracleAction, OracleError> {
        let api_tools = Self::build_tools(tools);
        let has_tools = !api_tools.is_empty();

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: Self::build_messages(messages, tool_history),
            temperature: 0.7,
            tools: if has_tools { Some(api_tools) } else { None },
            tool_choice: if has_tools {
                Some("auto".to_string())
            } else {
                None
            },
        };

        log::debug!(
            "Sending tool request to chat-completions endpoint: {}",
            serde_json::to_string(&request).unwrap_or_default()
        );

        // Retry configuration for transient errors
        const MAX_RETRIES: u32 = 3;
        const BASE_DELAY_MS: u64 = 2000;

        let mut last_error: Option<OracleError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay_ms = BASE_DELAY_MS * (1 << (attempt - 1));
                log::warn!(
                    "[ORACLE] Retry attempt {}/{} after {}ms delay",
                    attempt,
                    MAX_RETRIES,
                    delay_ms
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let request_result = self
                .client
                .post(&self.endpoint)
                .headers(self.auth_headers.clone())
                .json(&request)
                .send()
                .await;

            let response = match request_result {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(OracleError::new(format!("Oracle request failed: {}", e)));
                    if attempt < MAX_RETRIES {
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();
            let status_code = status.as_u16();

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                let is_retryable = matches!(status_code, 429 | 502 | 503 | 504);

                if is_retryable && attempt < MAX_RETRIES {
                    log::warn!(
                        "[ORACLE] Received retryable status {} (attempt {}), will retry",
                        status,
                        attempt + 1
                    );
                    last_error = Some(OracleError::with_status(error_text, status_code));
                    continue;
                }

                let message =
                    if let Ok(err) = serde_json::from_str::<OpenAiErrorResponse>(&error_text) {
                        format!("Oracle API error: {}", err.error.message)
                    } else {
                        format!("Oracle API returned status {}: {}", status, error_text)
                    };
                return Err(OracleError::with_status(message, status_code));
            }

            let mut data: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| OracleError::new(format!("Failed to parse oracle response: {}", e)))?;

            if data.choices.is_empty() {
                return Err(OracleError::new("Oracle returned no choices"));
            }

            return Ok(Self::parse_action(data.choices.remove(0).message));
        }

        Err(last_error.unwrap_or_else(|| OracleError::new("Max retries exceeded")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::ToolResponse;
    use serde_json::json;

    #[test]
    fn test_parse_action_final_answer() {
        let message = ChoiceMessage {
            content: Some("Total sales were 322,967.".to_string()),
            tool_calls: None,
        };
        match OpenAiOracle::parse_action(message) {
            OracleAction::FinalAnswer(text) => assert!(text.contains("322,967")),
            other => panic!("expected final answer, got {:?}", other.is_final()),
        }
    }

    #[test]
    fn test_parse_action_tool_calls() {
        let message = ChoiceMessage {
            content: Some(String::new()),
            tool_calls: Some(vec![RawToolCall {
                id: "call_1".to_string(),
                call_type: "function".to_string(),
                function: RawFunctionCall {
                    name: "sql_database_query".to_string(),
                    arguments: r#"{"question":"total sales by branch"}"#.to_string(),
                },
            }]),
        };
        match OpenAiOracle::parse_action(message) {
            OracleAction::ToolCalls { calls, .. } => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "sql_database_query");
                assert_eq!(calls[0].arguments["question"], "total sales by branch");
            }
            OracleAction::FinalAnswer(_) => panic!("expected tool calls"),
        }
    }

    #[test]
    fn test_malformed_arguments_degrade_to_text() {
        let message = ChoiceMessage {
            content: Some("best effort text".to_string()),
            tool_calls: Some(vec![RawToolCall {
                id: "call_1".to_string(),
                call_type: "function".to_string(),
                function: RawFunctionCall {
                    name: "sql_database_query".to_string(),
                    arguments: "{not valid json".to_string(),
                },
            }]),
        };
        match OpenAiOracle::parse_action(message) {
            OracleAction::FinalAnswer(text) => assert_eq!(text, "best effort text"),
            OracleAction::ToolCalls { .. } => panic!("malformed call must degrade to text"),
        }
    }

    #[test]
    fn test_build_messages_replays_tool_history() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let history = vec![ToolHistoryEntry::new(
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "document_search".to_string(),
                arguments: json!({"question": "refund policy"}),
            }],
            vec![ToolResponse::success(
                "call_1".to_string(),
                r#"{"answer":"30 days"}"#.to_string(),
            )],
        )];

        let api_messages = OpenAiOracle::build_messages(&messages, &history);
        // system + user + assistant(tool_calls) + tool
        assert_eq!(api_messages.len(), 4);
        assert_eq!(api_messages[2].role, "assistant");
        assert!(api_messages[2].tool_calls.is_some());
        assert_eq!(api_messages[3].role, "tool");
        assert_eq!(api_messages[3].tool_call_id.as_deref(), Some("call_1"));
    }
}
