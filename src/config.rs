use crate::agent::AgentConfig;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
    pub max_tool_iterations: usize,
    pub history_window: usize,
    pub session_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set"),
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            openai_model: env::var("OPENAI_MODEL").ok(),
            max_tool_iterations: env::var("MAX_TOOL_ITERATIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("MAX_TOOL_ITERATIONS must be a valid number"),
            history_window: env::var("HISTORY_WINDOW")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .expect("HISTORY_WINDOW must be a valid number"),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .expect("SESSION_TTL_SECS must be a valid number"),
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            max_tool_iterations: self.max_tool_iterations,
            history_window: self.history_window,
        }
    }
}
