use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ http_client, ChatClient };
use crate::llm::{ GenerationParams, LlmConfig, LlmError, LlmType };
use crate::models::chat::{ ChatMessage, Role };

/// Chat-completions backend for OpenAI-compatible servers (vLLM, TGI,
/// OpenRouter). The server applies the model's own chat template.
pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    send_repetition_penalty: bool,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(model: Option<String>, base_url: Option<String>, http: HttpClient) -> Self {
        let chat_model = model.unwrap_or_else(|| "Qwen/Qwen2.5-7B-Instruct".to_string());
        let api_url = base_url.unwrap_or_else(|| "http://localhost:8000".to_string());
        // api.openai.com rejects sampling parameters it does not know.
        let send_repetition_penalty = !api_url.contains("api.openai.com");

        Self {
            http,
            model: chat_model,
            base_url: api_url,
            send_repetition_penalty,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.llm_type != LlmType::OpenAI {
            return Err(LlmError::InvalidConfig("Invalid config type for OpenAIChatClient".into()));
        }
        let http = http_client(config.timeout, config.api_key.as_deref())?;

        Ok(Self::new(config.completion_model.clone(), config.base_url.clone(), http))
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        params: &GenerationParams
    ) -> OpenAIChatRequest<'a> {
        OpenAIChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .filter(|m| m.role != Role::Other)
                .collect(),
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            repetition_penalty: self.send_repetition_penalty.then_some(params.repetition_penalty),
            stream: false,
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams
    ) -> Result<String, LlmError> {
        let req = self.build_request(messages, params);

        let resp = self.http
            .post(self.completions_url())
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<OpenAIResponse>().await?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or(LlmError::EmptyResponse)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }

    fn get_llm_type(&self) -> LlmType {
        LlmType::OpenAI
    }
}
