use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;

use super::{ http_client, ChatClient };
use crate::config::prompt::PromptConfig;
use crate::llm::{ GenerationParams, LlmConfig, LlmError, LlmType };
use crate::models::chat::ChatMessage;

/// Completion-style backend: the conversation is flattened into a single
/// persona + transcript prompt and sent to `/api/generate`.
#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
    prompts: Arc<PromptConfig>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    raw: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

impl OllamaClient {
    pub fn new(
        base_url: Option<String>,
        completion_model: Option<String>,
        prompts: Arc<PromptConfig>,
        http: HttpClient
    ) -> Self {
        let model = completion_model.unwrap_or_else(|| "llama3.2:3b".to_string());
        let url = base_url.unwrap_or_else(|| "http://localhost:11434".into());

        Self {
            http,
            base_url: url,
            completion_model: model,
            prompts,
        }
    }

    pub fn from_config(config: &LlmConfig, prompts: Arc<PromptConfig>) -> Result<Self, LlmError> {
        if config.llm_type != LlmType::Ollama {
            return Err(LlmError::InvalidConfig("Invalid config type for OllamaClient".into()));
        }
        let http = http_client(config.timeout, config.api_key.as_deref())?;

        Ok(Self::new(config.base_url.clone(), config.completion_model.clone(), prompts, http))
    }

    pub fn prompt_for(&self, messages: &[ChatMessage]) -> String {
        self.prompts.assemble(messages)
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let req = GenerateRequest {
            model: &self.completion_model,
            prompt: self.prompt_for(messages),
            stream: false,
            raw: true,
            options: GenerateOptions {
                temperature: params.temperature,
                top_p: params.top_p,
                repeat_penalty: params.repetition_penalty,
                num_predict: params.max_tokens,
            },
        };
        debug!("Ollama prompt:\n{}", req.prompt);

        let data = self.http
            .post(&url)
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<GenerateResponse>().await?;

        Ok(self.prompts.clean_completion(&data.response))
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }

    fn get_llm_type(&self) -> LlmType {
        LlmType::Ollama
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompt::EMPTY_COMPLETION_REPLY;
    use crate::llm::chat::test_support::spawn_upstream;
    use crate::models::chat::Role;
    use axum::{ http::StatusCode, routing::post, Json, Router };
    use serde_json::{ json, Value };
    use std::sync::Mutex;

    fn client_at(base_url: String) -> OllamaClient {
        let config = LlmConfig {
            llm_type: LlmType::Ollama,
            base_url: Some(base_url),
            ..LlmConfig::default()
        };
        OllamaClient::from_config(&config, Arc::new(PromptConfig::default())).unwrap()
    }

    fn replying(text: &'static str) -> Router {
        Router::new().route(
            "/api/generate",
            post(move || async move { Json(json!({ "response": text })) })
        )
    }

    fn conversation() -> Vec<ChatMessage> {
        vec![ChatMessage::new(Role::System, "A merchant."), ChatMessage::new(Role::User, "Hi")]
    }

    #[tokio::test]
    async fn generate_sends_prompt_and_cuts_spill_over() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let recorder = seen.clone();
        let app = Router::new().route(
            "/api/generate",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(body);
                    Json(json!({ "response": " Ahoy, friend!\nHuman: what do you sell?" }))
                }
            })
        );
        let client = client_at(spawn_upstream(app).await);

        let reply = client
            .generate(&conversation(), &GenerationParams::with_max_tokens(150)).await
            .unwrap();
        assert_eq!(reply, "Ahoy, friend!");

        let body = seen.lock().unwrap().take().unwrap();
        assert_eq!(body["prompt"], "[Character: A merchant.]\n\nHuman: Hi\nAssistant:");
        assert_eq!(body["model"], "llama3.2:3b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 150);
    }

    #[tokio::test]
    async fn generate_empty_output_becomes_nudge() {
        let client = client_at(spawn_upstream(replying("  \n")).await);
        let reply = client.generate(&conversation(), &GenerationParams::default()).await.unwrap();
        assert_eq!(reply, EMPTY_COMPLETION_REPLY);

        let client = client_at(spawn_upstream(replying("[Character: A merchant.]")).await);
        let reply = client.generate(&conversation(), &GenerationParams::default()).await.unwrap();
        assert_eq!(reply, EMPTY_COMPLETION_REPLY);
    }

    #[tokio::test]
    async fn generate_upstream_failure_is_http_error() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "out of memory") })
        );
        let client = client_at(spawn_upstream(app).await);
        let err = client.generate(&conversation(), &GenerationParams::default()).await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }

    #[test]
    fn defaults_and_prompt() {
        let config = LlmConfig { llm_type: LlmType::Ollama, ..LlmConfig::default() };
        let client = OllamaClient::from_config(&config, Arc::new(PromptConfig::default())).unwrap();
        assert_eq!(client.get_model(), "llama3.2:3b");
        assert_eq!(client.get_base_url().as_deref(), Some("http://localhost:11434"));

        let prompt = client.prompt_for(
            &[ChatMessage::new(Role::System, "A merchant."), ChatMessage::new(Role::User, "Hi")]
        );
        assert_eq!(prompt, "[Character: A merchant.]\n\nHuman: Hi\nAssistant:");
    }

    #[test]
    fn rejects_other_backend_config() {
        let config = LlmConfig { llm_type: LlmType::Echo, ..LlmConfig::default() };
        assert!(OllamaClient::from_config(&config, Arc::new(PromptConfig::default())).is_err());
    }

    #[test]
    fn request_shape() {
        let req = GenerateRequest {
            model: "m",
            prompt: "Assistant:".into(),
            stream: false,
            raw: true,
            options: GenerateOptions {
                temperature: 0.5,
                top_p: 0.25,
                repeat_penalty: 1.5,
                num_predict: 150,
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["raw"], true);
        assert_eq!(value["options"]["num_predict"], 150);
        assert_eq!(value["options"]["repeat_penalty"], 1.5);
    }
}
