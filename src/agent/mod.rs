pub mod normalizer;
pub mod orchestrator;


pub use normalizer::{normalize, NormalizedOutput, ToolPayload};
pub use orchestrator::{AgentConfig, Orchestrator};
