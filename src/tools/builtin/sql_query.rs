//! Text-only sales-data query tool.
//!
//! Wraps the external natural-language-to-SQL capability behind the
//! [`SalesQueryBackend`] trait; the tool itself never touches a database.

use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolDefinition, ToolInputSchema, ToolKind, ToolResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// External relational query capability: accepts a natural-language
/// question and returns a free-text answer.
#[async_trait]
pub trait SalesQueryBackend: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String, String>;
}

pub struct SqlQueryTool {
    backend: Arc<dyn SalesQueryBackend>,
    definition: ToolDefinition,
}

impl SqlQueryTool {
    pub fn new(backend: Arc<dyn SalesQueryBackend>) -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "question".to_string(),
            PropertySchema {
                schema_type: "string".to_string(),
                description: "Natural language question about the sales data".to_string(),
                default: None,
                enum_values: None,
            },
        );

        SqlQueryTool {
            backend,
            definition: ToolDefinition {
                name: "sql_database_query".to_string(),
                description: "Use this tool to answer questions about sales data with a text \
                              answer only (no chart). The database contains a 'sales' table with \
                              columns: date, branch, customer_type, gender, product_line, \
                              unit_price, quantity, payment, rating, total. Examples: 'What are \
                              total sales?', 'How many transactions?', 'List top 5 products'. \
                              If the user wants a chart or visualization, use \
                              query_and_visualize instead."
                    .to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["question".to_string()],
                },
                kind: ToolKind::Query,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SqlQueryParams {
    question: String,
}

#[async_trait]
impl Tool for SqlQueryTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let params: SqlQueryParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        log::info!("[SQL] Received query: {}", params.question);

        match self.backend.answer(&params.question).await {
            Ok(answer) => {
                log::debug!("[SQL] Answer: {:.200}", answer);
                let output = json!({
                    "answer": answer,
                    "tool": "sql_agent",
                    "success": true,
                });
                ToolResult::success(output.to_string())
            }
            Err(e) => {
                log::error!("[SQL] Backend error: {}", e);
                let output = json!({
                    "answer": format!("I encountered an error while querying the database: {}", e),
                    "tool": "sql_agent",
                    "success": false,
                    "error": e,
                });
                ToolResult::error_with_content(output.to_string(), e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubBackend {
        reply: Result<String, String>,
    }

    #[async_trait]
    impl SalesQueryBackend for StubBackend {
        async fn answer(&self, _question: &str) -> Result<String, String> {
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn test_successful_query_wraps_answer() {
        let tool = SqlQueryTool::new(Arc::new(StubBackend {
            reply: Ok("Total sales: 322,967".to_string()),
        }));
        let result = tool
            .execute(json!({"question": "what are total sales?"}))
            .await;
        assert!(result.success);

        let output: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(output["answer"], "Total sales: 322,967");
        assert_eq!(output["success"], true);
    }

    #[tokio::test]
    async fn test_backend_failure_is_failure_payload_not_panic() {
        let tool = SqlQueryTool::new(Arc::new(StubBackend {
            reply: Err("connection refused".to_string()),
        }));
        let result = tool.execute(json!({"question": "anything"})).await;
        assert!(!result.success);

        // Content is still a structured payload the oracle can read.
        let output: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(output["success"], false);
        assert!(output["answer"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_missing_question_is_invalid_params() {
        let tool = SqlQueryTool::new(Arc::new(StubBackend {
            reply: Ok(String::new()),
        }));
        let result = tool.execute(json!({})).await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid parameters"));
    }
}
