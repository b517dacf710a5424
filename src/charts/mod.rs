//! Chart-type inference over tabular query results.
//!
//! Pure functions: the same input always yields the same chart kind. The
//! caller is responsible for never asking for a chart over an empty result
//! (the visualization tool short-circuits that case before getting here).

use crate::models::Row;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Scatter,
}

impl ChartKind {
    /// Parse a user/tool-supplied chart type. `"auto"` (and anything
    /// unrecognized) yields None, meaning "infer from the data".
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().trim() {
            "bar" => Some(ChartKind::Bar),
            "line" => Some(ChartKind::Line),
            "pie" => Some(ChartKind::Pie),
            "scatter" => Some(ChartKind::Scatter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Chart configuration handed to the rendering frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub x_axis: String,
    pub y_axis: String,
    pub title: String,
}

/// Maximum row count for which a two-column categorical/numeric result is
/// rendered as a pie instead of a bar chart.
const PIE_MAX_ROWS: usize = 10;

fn is_numeric(value: &Value) -> bool {
    value.is_number()
}

/// Date/datetime-like detection for JSON scalar values. Only strings
/// qualify; the accepted formats cover what the query backends emit.
fn is_temporal(value: &Value) -> bool {
    let Some(s) = value.as_str() else {
        return false;
    };
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || NaiveDate::parse_from_str(s, "%Y/%m/%d").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || DateTime::parse_from_rfc3339(s).is_ok()
}

/// A column qualifies only if every row has the column and every value
/// matches the predicate. Mixed-type columns qualify as neither.
fn column_matches(rows: &[Row], column: &str, pred: fn(&Value) -> bool) -> bool {
    rows.iter().all(|row| row.get(column).is_some_and(pred))
}

fn column_names(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

/// Auto-detect the best chart kind for a result set.
///
/// Priority order:
/// 1. a temporal column plus a numeric column -> line (time series)
/// 2. exactly two columns, exactly one numeric -> pie (<= 10 rows) or bar
/// 3. two or more numeric columns -> scatter
/// 4. anything else -> bar
pub fn detect_chart_kind(rows: &[Row]) -> ChartKind {
    let columns = column_names(rows);

    let numeric: Vec<&String> = columns
        .iter()
        .filter(|c| column_matches(rows, c, is_numeric))
        .collect();
    let temporal: Vec<&String> = columns
        .iter()
        .filter(|c| column_matches(rows, c, is_temporal))
        .collect();

    if !temporal.is_empty() && !numeric.is_empty() {
        ChartKind::Line
    } else if columns.len() == 2 && numeric.len() == 1 {
        if rows.len() <= PIE_MAX_ROWS {
            ChartKind::Pie
        } else {
            ChartKind::Bar
        }
    } else if numeric.len() >= 2 {
        ChartKind::Scatter
    } else {
        ChartKind::Bar
    }
}

/// Build the chart spec for a result set. `kind` overrides inference when
/// the user asked for a specific chart type.
pub fn chart_spec_for(rows: &[Row], kind: Option<ChartKind>) -> ChartSpec {
    let columns = column_names(rows);
    let x_axis = columns.first().cloned().unwrap_or_else(|| "x".to_string());
    // Degenerate single-column case: y falls back to the x column.
    let y_axis = columns.get(1).cloned().unwrap_or_else(|| x_axis.clone());

    let kind = kind.unwrap_or_else(|| detect_chart_kind(rows));

    ChartSpec {
        kind,
        title: format!("{} by {}", title_case(&y_axis), title_case(&x_axis)),
        x_axis,
        y_axis,
    }
}

/// `total_sales` -> `Total Sales`, matching the frontend's title convention.
fn title_case(name: &str) -> String {
    name.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
