//! Orchestration and response-synthesis layer for a data-chat assistant.
//!
//! A user message comes in with an optional session id; the orchestrator
//! replays recent history, lets a reasoning oracle pick tools (SQL query,
//! document search, query-and-visualize), normalizes what the tools return,
//! and folds everything into one response envelope with the answer text,
//! an optional chart config plus data, and deduplicated source citations.
//!
//! The heavy capabilities (NL-to-SQL, vector retrieval, the oracle itself)
//! live behind traits; this crate owns routing, session memory, chart-type
//! inference, and synthesis.

pub mod agent;
pub mod ai;
pub mod charts;
pub mod config;
pub mod models;
pub mod session;
pub mod sources;
pub mod tools;

pub use agent::{AgentConfig, Orchestrator};
pub use ai::{Oracle, OracleAction, OracleError, OpenAiOracle};
pub use charts::{ChartKind, ChartSpec};
pub use config::Config;
pub use models::{ChatTurn, ResponseEnvelope, Row, TabularResult};
pub use session::SessionStore;
pub use sources::{RetrievedSnippet, SourceCitation};
pub use tools::{Tool, ToolRegistry};
