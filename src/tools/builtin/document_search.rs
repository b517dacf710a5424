//! Document question-answering tool over an external vector index.

use crate::sources::{dedup_snippets, RetrievedSnippet};
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolDefinition, ToolInputSchema, ToolKind, ToolResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Answer from the external document-search capability: free text plus the
/// raw retrieved snippets supporting it (possibly with duplicates).
#[derive(Debug, Clone)]
pub struct DocumentAnswer {
    pub answer: String,
    pub snippets: Vec<RetrievedSnippet>,
}

/// External retrieval capability (embedding + nearest-neighbor search are
/// out of scope and live behind this trait).
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    async fn search(&self, question: &str) -> Result<DocumentAnswer, String>;
}

pub struct DocumentSearchTool {
    index: Arc<dyn DocumentIndex>,
    definition: ToolDefinition,
}

impl DocumentSearchTool {
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "question".to_string(),
            PropertySchema {
                schema_type: "string".to_string(),
                description: "A clear question about the uploaded document content".to_string(),
                default: None,
                enum_values: None,
            },
        );

        DocumentSearchTool {
            index,
            definition: ToolDefinition {
                name: "document_search".to_string(),
                description: "Use this tool to answer questions about uploaded documents. It \
                              searches the document knowledge base and provides answers with \
                              source citations. Use it when the user asks about content in \
                              uploaded documents, their knowledge base, or references \
                              'documents', 'files', or 'uploaded content'."
                    .to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["question".to_string()],
                },
                kind: ToolKind::DocumentSearch,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentSearchParams {
    question: String,
}

#[async_trait]
impl Tool for DocumentSearchTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let params: DocumentSearchParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        log::info!("[RAG] Received query: {}", params.question);

        match self.index.search(&params.question).await {
            Ok(result) => {
                let citations = dedup_snippets(&result.snippets);
                log::info!(
                    "[RAG] {} snippets retrieved, {} after dedup",
                    result.snippets.len(),
                    citations.len()
                );
                let output = json!({
                    "answer": result.answer,
                    "sources": citations,
                    "tool": "rag_tool",
                    "success": true,
                });
                ToolResult::success(output.to_string())
            }
            Err(e) => {
                log::error!("[RAG] Index error: {}", e);
                let output = json!({
                    "answer": format!("Error querying documents: {}", e),
                    "sources": [],
                    "tool": "rag_tool",
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

    struct StubIndex {
        answer: DocumentAnswer,
    }

    #[async_trait]
    impl DocumentIndex for StubIndex {
        async fn search(&self, _question: &str) -> Result<DocumentAnswer, String> {
            Ok(self.answer.clone())
        }
    }

    fn snippet(content: &str, source: &str, chunk: u32) -> RetrievedSnippet {
        RetrievedSnippet {
            content: content.to_string(),
            source: source.to_string(),
            chunk,
        }
    }

    #[tokio::test]
    async fn test_output_contains_deduplicated_sources() {
        let tool = DocumentSearchTool::new(Arc::new(StubIndex {
            answer: DocumentAnswer {
                answer: "Refunds are accepted within 30 days.".to_string(),
                snippets: vec![
                    snippet("Refund policy: ...", "report.pdf", 3),
                    snippet("Refund policy again", "report.pdf", 3),
                    snippet("Shipping terms", "report.pdf", 4),
                ],
            },
        }));

        let result = tool.execute(json!({"question": "refund policy?"})).await;
        assert!(result.success);

        let output: Value = serde_json::from_str(&result.content).unwrap();
        let sources = output["sources"].as_array().unwrap();
        assert_eq!(sources.len(), 2);
        // First occurrence of (report.pdf, 3) wins.
        assert_eq!(sources[0]["content"], "Refund policy: ...");
        assert_eq!(sources[0]["chunk"], 3);
    }
}
