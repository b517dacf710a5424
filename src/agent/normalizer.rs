//! Normalizes raw tool output into one typed shape the orchestrator can
//! synthesize from.
//!
//! Each tool kind has its own JSON contract. Decoding is per kind and
//! explicit: a chart-shaped blob in a plain query tool's output stays text,
//! because only the visualization kind is allowed to carry chart payloads.
//! Anything that fails to decode degrades to text with the raw output as the
//! answer, never to an error.

use crate::charts::ChartSpec;
use crate::models::TabularResult;
use crate::sources::SourceCitation;
use crate::tools::types::ToolKind;
use serde::Deserialize;

/// What a tool contributed beyond its text answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    /// Plain text, nothing to attach.
    Text,
    /// Document citations backing the answer.
    Document { citations: Vec<SourceCitation> },
    /// A chart config plus the rows it renders.
    Visualization {
        chart: ChartSpec,
        data: TabularResult,
    },
}

#[derive(Debug, Clone)]
pub struct NormalizedOutput {
    pub answer: String,
    pub payload: ToolPayload,
}

impl NormalizedOutput {
    fn text(answer: impl Into<String>) -> Self {
        NormalizedOutput {
            answer: answer.into(),
            payload: ToolPayload::Text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryOutput {
    answer: String,
}

#[derive(Debug, Deserialize)]
struct DocumentOutput {
    answer: String,
    #[serde(default)]
    sources: Vec<SourceCitation>,
}

#[derive(Debug, Deserialize)]
struct VisualizationOutput {
    answer: String,
    #[serde(default)]
    data: TabularResult,
    #[serde(default)]
    chart_config: Option<ChartSpec>,
}

/// Decode one tool's raw output according to its kind.
pub fn normalize(kind: ToolKind, raw: &str) -> NormalizedOutput {
    match kind {
        ToolKind::Query => match serde_json::from_str::<QueryOutput>(raw) {
            Ok(out) => NormalizedOutput::text(out.answer),
            Err(e) => degrade(kind, raw, e),
        },
        ToolKind::DocumentSearch => match serde_json::from_str::<DocumentOutput>(raw) {
            Ok(out) => {
                let payload = if out.sources.is_empty() {
                    ToolPayload::Text
                } else {
                    ToolPayload::Document {
                        citations: out.sources,
                    }
                };
                NormalizedOutput {
                    answer: out.answer,
                    payload,
                }
            }
            Err(e) => degrade(kind, raw, e),
        },
        ToolKind::Visualization => match serde_json::from_str::<VisualizationOutput>(raw) {
            Ok(out) => {
                // An empty result set or a missing config means there is
                // nothing to render.
                let payload = match out.chart_config {
                    Some(chart) if !out.data.is_empty() => ToolPayload::Visualization {
                        chart,
                        data: out.data,
                    },
                    _ => ToolPayload::Text,
                };
                NormalizedOutput {
                    answer: out.answer,
                    payload,
                }
            }
            Err(e) => degrade(kind, raw, e),
        },
    }
}

fn degrade(kind: ToolKind, raw: &str, err: serde_json::Error) -> NormalizedOutput {
    log::warn!(
        "[NORMALIZER] Output of {:?} tool did not match its contract ({}), passing through as text",
        kind,
        err
    );
    NormalizedOutput::text(raw)
}
