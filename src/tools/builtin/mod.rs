pub mod document_search;
pub mod sql_query;
pub mod sql_viz;

pub use document_search::{DocumentAnswer, DocumentIndex, DocumentSearchTool};
pub use sql_query::{SalesQueryBackend, SqlQueryTool};
pub use sql_viz::{QueryAndVisualizeTool, TabularAnswer, TabularQueryBackend};
