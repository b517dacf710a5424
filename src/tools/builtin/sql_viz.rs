//! Combined query-and-visualize tool: runs a tabular query through the
//! external backend and attaches an inferred (or user-overridden) chart
//! config to the answer.

use crate::charts::{chart_spec_for, ChartKind};
use crate::models::Row;
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolDefinition, ToolInputSchema, ToolKind, ToolResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Answer from the external tabular query capability: a text answer plus
/// the rectangular result set it was derived from.
#[derive(Debug, Clone)]
pub struct TabularAnswer {
    pub answer: String,
    pub rows: Vec<Row>,
}

/// External capability that turns a natural-language question into a
/// tabular result (NL-to-SQL translation and execution are out of scope).
#[async_trait]
pub trait TabularQueryBackend: Send + Sync {
    async fn run(&self, question: &str) -> Result<TabularAnswer, String>;
}

pub struct QueryAndVisualizeTool {
    backend: Arc<dyn TabularQueryBackend>,
    definition: ToolDefinition,
}

impl QueryAndVisualizeTool {
    pub fn new(backend: Arc<dyn TabularQueryBackend>) -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "question".to_string(),
            PropertySchema {
                schema_type: "string".to_string(),
                description: "Natural language question about sales data to query and visualize"
                    .to_string(),
                default: None,
                enum_values: None,
            },
        );
        properties.insert(
            "chart_type".to_string(),
            PropertySchema {
                schema_type: "string".to_string(),
                description: "Type of chart to create; 'auto' picks the best fit".to_string(),
                default: Some(Value::String("auto".to_string())),
                enum_values: Some(
                    ["auto", "bar", "line", "pie", "scatter"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
            },
        );

        QueryAndVisualizeTool {
            backend,
            definition: ToolDefinition {
                name: "query_and_visualize".to_string(),
                description: "Use this tool to query sales data AND create a visualization in \
                              one step. Use it when the user wants charts, graphs, or plots \
                              (keywords: visualize, show, chart, graph, plot, display). Examples: \
                              'Visualize sales by branch', 'Show me a chart of top products', \
                              'Plot revenue over time'."
                    .to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["question".to_string()],
                },
                kind: ToolKind::Visualization,
            },
        }
    }
}

fn default_chart_type() -> String {
    "auto".to_string()
}

#[derive(Debug, Deserialize)]
struct QueryAndVisualizeParams {
    question: String,
    #[serde(default = "default_chart_type")]
    chart_type: String,
}

#[async_trait]
impl Tool for QueryAndVisualizeTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let params: QueryAndVisualizeParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        log::info!(
            "[SQL+VIZ] Received query: {} (chart_type: {})",
            params.question,
            params.chart_type
        );

        let result = match self.backend.run(&params.question).await {
            Ok(r) => r,
            Err(e) => {
                log::error!("[SQL+VIZ] Backend error: {}", e);
                let output = json!({
                    "success": false,
                    "answer": format!(
                        "I encountered an error while processing your request: {}", e
                    ),
                    "data": [],
                    "chart_config": null,
                    "error": e,
                });
                return ToolResult::error_with_content(output.to_string(), e);
            }
        };

        log::info!("[SQL+VIZ] Query returned {} rows", result.rows.len());

        // The chart-inference engine must never see an empty result.
        if result.rows.is_empty() {
            let output = json!({
                "success": false,
                "answer": "No data found for your query.",
                "data": [],
                "chart_config": null,
            });
            return ToolResult::success(output.to_string());
        }

        // "auto" (or anything unrecognized) means infer from the data.
        let override_kind = ChartKind::parse(&params.chart_type);
        let chart_config = chart_spec_for(&result.rows, override_kind);
        log::info!("[SQL+VIZ] Built {} chart config", chart_config.kind);

        let output = json!({
            "success": true,
            "answer": result.answer,
            "data": result.rows,
            "chart_config": chart_config,
            "tool": "sql_viz_tool",
        });
        ToolResult::success(output.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartKind;

    struct StubBackend {
        reply: Result<TabularAnswer, String>,
    }

    #[async_trait]
    impl TabularQueryBackend for StubBackend {
        async fn run(&self, _question: &str) -> Result<TabularAnswer, String> {
            self.reply.clone()
        }
    }

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[tokio::test]
    async fn test_auto_chart_type_is_inferred() {
        let tool = QueryAndVisualizeTool::new(Arc::new(StubBackend {
            reply: Ok(TabularAnswer {
                answer: "Branch B leads with 200.".to_string(),
                rows: rows(vec![
                    json!({"branch": "A", "total": 100}),
                    json!({"branch": "B", "total": 200}),
                ]),
            }),
        }));

        let result = tool
            .execute(json!({"question": "sales by branch", "chart_type": "auto"}))
            .await;
        assert!(result.success);

        let output: Value = serde_json::from_str(&result.content).unwrap();
        // Two columns, one numeric, two rows: pie.
        assert_eq!(output["chart_config"]["type"], "pie");
        assert_eq!(output["chart_config"]["x_axis"], "branch");
        assert_eq!(output["chart_config"]["y_axis"], "total");
        assert_eq!(output["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_explicit_chart_type_wins() {
        let tool = QueryAndVisualizeTool::new(Arc::new(StubBackend {
            reply: Ok(TabularAnswer {
                answer: "ok".to_string(),
                rows: rows(vec![
                    json!({"branch": "A", "total": 100}),
                    json!({"branch": "B", "total": 200}),
                ]),
            }),
        }));

        let result = tool
            .execute(json!({"question": "sales by branch", "chart_type": "bar"}))
            .await;
        let output: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(output["chart_config"]["type"], "bar");
        assert_eq!(ChartKind::parse("bar"), Some(ChartKind::Bar));
    }

    #[tokio::test]
    async fn test_empty_result_has_no_chart() {
        let tool = QueryAndVisualizeTool::new(Arc::new(StubBackend {
            reply: Ok(TabularAnswer {
                answer: "unused".to_string(),
                rows: vec![],
            }),
        }));

        let result = tool.execute(json!({"question": "sales in 1870"})).await;
        let output: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(output["success"], false);
        assert_eq!(output["answer"], "No data found for your query.");
        assert!(output["chart_config"].is_null());
    }

    #[tokio::test]
    async fn test_chart_type_defaults_to_auto() {
        let tool = QueryAndVisualizeTool::new(Arc::new(StubBackend {
            reply: Ok(TabularAnswer {
                answer: "ok".to_string(),
                rows: rows(vec![
                    json!({"date": "2024-01-01", "total": 1.0}),
                    json!({"date": "2024-01-02", "total": 2.0}),
                ]),
            }),
        }));

        let result = tool.execute(json!({"question": "revenue over time"})).await;
        let output: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(output["chart_config"]["type"], "line");
    }
}
