pub mod echo;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{ GenerationParams, LlmConfig, LlmError, LlmType };
use self::echo::EchoChatClient;
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use crate::config::prompt::PromptConfig;
use crate::models::chat::ChatMessage;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Generates the assistant's next turn for the conversation.
    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams
    ) -> Result<String, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
    fn get_llm_type(&self) -> LlmType;
}

pub fn new_client(
    config: &LlmConfig,
    prompts: Arc<PromptConfig>
) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config, prompts)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Echo => {
            let specific_client = EchoChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}

pub(crate) fn http_client(
    timeout: Duration,
    api_key: Option<&str>
) -> Result<reqwest::Client, LlmError> {
    use reqwest::header::{ HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e|
            LlmError::InvalidConfig(format!("Invalid API key format: {}", e))
        )?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(reqwest::Client::builder().default_headers(headers).timeout(timeout).build()?)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_picks_backend() {
        let prompts = Arc::new(PromptConfig::default());
        for llm_type in [LlmType::Ollama, LlmType::OpenAI, LlmType::Echo] {
            let config = LlmConfig { llm_type, ..LlmConfig::default() };
            let client = new_client(&config, prompts.clone()).unwrap();
            assert_eq!(client.get_llm_type(), llm_type);
        }
    }

    #[test]
    fn rejects_bad_api_key() {
        let err = http_client(Duration::from_secs(1), Some("bad\nkey")).unwrap_err();
        assert!(matches!(err, LlmError::InvalidConfig(_)));
    }
}
