use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Args;
use crate::config::prompt;
use crate::error::ChatError;
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::llm::{ GenerationParams, LlmConfig, LlmType };
use crate::models::chat::{ ChatRequest, ChatResponse };

/// Reply sent in place of a failed generation when the apology fallback is on.
pub const APOLOGY_REPLY: &str =
    "I apologize, but I'm experiencing some technical difficulties right now.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    pub default_max_tokens: u32,
    pub cap: Option<u32>,
}

impl TokenPolicy {
    pub fn resolve(&self, requested: Option<u32>) -> u32 {
        let tokens = requested.unwrap_or(self.default_max_tokens);
        match self.cap {
            Some(cap) => tokens.min(cap),
            None => tokens,
        }
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self { default_max_tokens: 5000, cap: None }
    }
}

#[derive(Clone)]
pub struct ChatAgent {
    chat_client: Arc<dyn ChatClient>,
    token_policy: TokenPolicy,
    apology_on_error: bool,
}

impl ChatAgent {
    pub fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let prompt_config = prompt::load_prompts_or_default(args.prompts_path.as_deref())?;

        let chat_llm_type: LlmType = args.chat_llm_type.parse()?;
        let chat_api_key = if !args.chat_api_key.is_empty() {
            Some(args.chat_api_key.clone())
        } else {
            None
        };
        let chat_config = LlmConfig {
            llm_type: chat_llm_type,
            base_url: args.chat_base_url.clone(),
            api_key: chat_api_key,
            completion_model: args.chat_model.clone(),
            timeout: Duration::from_secs(args.request_timeout_secs),
        };
        let chat_client = new_chat_client(&chat_config, prompt_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}",
            chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("none")
        );

        let token_policy = TokenPolicy {
            default_max_tokens: args.default_max_tokens,
            cap: args.max_tokens_cap,
        };

        Ok(Self::with_client(chat_client, token_policy, args.apology_on_error))
    }

    pub fn with_client(
        chat_client: Arc<dyn ChatClient>,
        token_policy: TokenPolicy,
        apology_on_error: bool
    ) -> Self {
        Self { chat_client, token_policy, apology_on_error }
    }

    pub fn model(&self) -> String {
        self.chat_client.get_model()
    }

    pub fn llm_type(&self) -> LlmType {
        self.chat_client.get_llm_type()
    }

    pub async fn process_request(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        if request.messages.is_empty() {
            return Err(ChatError::EmptyMessages);
        }

        let params = GenerationParams::with_max_tokens(self.token_policy.resolve(request.max_tokens));
        info!(
            "Generating reply for {} message(s), max_tokens={}, stream={}",
            request.messages.len(),
            params.max_tokens,
            request.stream
        );

        let content = match self.chat_client.generate(&request.messages, &params).await {
            Ok(text) => text,
            Err(e) if self.apology_on_error => {
                warn!("Generation failed, sending apology: {}", e);
                APOLOGY_REPLY.to_string()
            }
            Err(e) => {
                return Err(e.into());
            }
        };

        Ok(ChatResponse::from_text(content, request.stream, &self.model()))
    }
}
