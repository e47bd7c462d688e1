use async_trait::async_trait;

use super::ChatClient;
use crate::llm::{ GenerationParams, LlmConfig, LlmError, LlmType };
use crate::models::chat::ChatMessage;

/// Canned backend for smoke-testing a deployment without a model.
#[derive(Debug, Default)]
pub struct EchoChatClient;

impl EchoChatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.llm_type != LlmType::Echo {
            return Err(LlmError::InvalidConfig("Invalid config type for EchoChatClient".into()));
        }
        Ok(Self)
    }
}

#[async_trait]
impl ChatClient for EchoChatClient {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        _params: &GenerationParams
    ) -> Result<String, LlmError> {
        Ok(format!("Hello! You sent {} messages. This is a test response.", messages.len()))
    }

    fn get_model(&self) -> String {
        "echo".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }

    fn get_llm_type(&self) -> LlmType {
        LlmType::Echo
    }
}
