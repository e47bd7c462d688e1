use chrono::Utc;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// Body of `POST /chat`. Extra fields such as `model` are accepted and ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<AssistantMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
    pub finish_reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub total_tokens: usize,
}

/// Chat-completion envelope in the shape OpenRouter clients expect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl ChatResponse {
    /// Wraps generated text into a single `stop` choice. With `stream` set the
    /// whole text is delivered as one `delta`.
    pub fn from_text(content: String, stream: bool, model: &str) -> Self {
        let usage = Usage { total_tokens: count_words(&content) };
        let (object, message, delta) = if stream {
            ("chat.completion.chunk", None, Some(Delta { content }))
        } else {
            (
                "chat.completion",
                Some(AssistantMessage { role: Role::Assistant, content }),
                None,
            )
        };

        Self {
            id: format!("chatcmpl-{}", Uuid::new_v4()),
            object: object.to_string(),
            created: Utc::now().timestamp(),
            model: model.to_string(),
            choices: vec![Choice {
                index: 0,
                message,
                delta,
                finish_reason: "stop".to_string(),
            }],
            usage,
        }
    }

    pub fn content(&self) -> Option<&str> {
        let choice = self.choices.first()?;
        choice.message
            .as_ref()
            .map(|m| m.content.as_str())
            .or_else(|| choice.delta.as_ref().map(|d| d.content.as_str()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Whitespace word count, used as an approximate token count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
