pub mod builtin;
pub mod registry;
pub mod types;

pub use registry::{Tool, ToolRegistry};
pub use types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolKind, ToolResult};
