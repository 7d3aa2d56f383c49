//! Generative model access
//!
//! Used for query expansion and by the `ask` command. Only one backend
//! exists (Gemini REST); it is constructed when its API key is present.

mod gemini;

pub use gemini::*;

use crate::config::LlmConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A prior turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub history: Vec<Message>,
    /// Final user message
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.temperature = Some(temperature);
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Trait for generative text models
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Create the configured generative model, or `None` without credentials
pub fn create_generative_model(config: &LlmConfig) -> Result<Option<Arc<dyn GenerativeModel>>> {
    let Some(api_key) = config.api_key() else {
        debug!(env = %config.api_key_env, "No generative model API key set");
        return Ok(None);
    };
    let client = GeminiClient::new(config, api_key)?;
    Ok(Some(Arc::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_yields_none() {
        let config = LlmConfig {
            api_key_env: "LEXRAG_TEST_UNSET_LLM_KEY".to_string(),
            ..Default::default()
        };
        assert!(create_generative_model(&config).unwrap().is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("What is Section 420?")
            .with_system_instruction("Be precise.")
            .with_history(vec![Message::user("hi"), Message::assistant("hello")])
            .with_sampling(0.2, 256);

        assert_eq!(request.prompt, "What is Section 420?");
        assert_eq!(request.system_instruction.as_deref(), Some("Be precise."));
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[1].role, Role::Assistant);
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_output_tokens, Some(256));
    }
}
