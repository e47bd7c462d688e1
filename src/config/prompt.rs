use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::sync::Arc;
use log::info;

use crate::models::chat::{ ChatMessage, Role };

/// Returned by prompt-based backends when the cleaned completion is empty.
pub const EMPTY_COMPLETION_REPLY: &str = "I understand. Please tell me more!";

#[derive(Debug)]
pub enum PromptError {
    MissingPlaceholder(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::MissingPlaceholder(key) =>
                write!(f, "Persona template must contain the '{}' placeholder", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// Labels used to render a conversation as a plain-text prompt.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    /// Wraps the persona text; must contain `{persona}`.
    pub persona_template: String,
    pub user_label: String,
    pub assistant_label: String,
    /// Markers after which a completion is considered to have left its turn.
    pub stop_markers: Vec<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona_template: "[Character: {persona}]\n\n".to_string(),
            user_label: "Human".to_string(),
            assistant_label: "Assistant".to_string(),
            stop_markers: vec!["Human:".to_string(), "[Character:".to_string()],
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if !self.persona_template.contains("{persona}") {
            return Err(PromptError::MissingPlaceholder("{persona}".to_string()));
        }
        Ok(())
    }

    /// Renders the conversation for a completion-style model.
    ///
    /// The first system message becomes the persona prefix, user and
    /// assistant turns follow in order, and the prompt ends with the
    /// assistant cue so the model continues as the character.
    pub fn assemble(&self, messages: &[ChatMessage]) -> String {
        let persona = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str());

        let mut prompt = match persona {
            Some(p) => self.persona_template.replace("{persona}", p),
            None => String::new(),
        };

        for msg in messages {
            let label = match msg.role {
                Role::User => &self.user_label,
                Role::Assistant => &self.assistant_label,
                Role::System | Role::Other => continue,
            };
            prompt.push_str(&format!("{}: {}\n", label, msg.content));
        }

        prompt.push_str(&self.assistant_label);
        prompt.push(':');
        prompt
    }

    /// Cuts a raw completion at the first stop marker and trims it.
    pub fn clean_completion(&self, raw: &str) -> String {
        let mut text = raw;
        for marker in &self.stop_markers {
            if let Some(pos) = text.find(marker.as_str()) {
                text = &text[..pos];
            }
        }
        let cleaned = text.trim();
        if cleaned.is_empty() {
            EMPTY_COMPLETION_REPLY.to_string()
        } else {
            cleaned.to_string()
        }
    }
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    info!("Loaded prompt labels from {}", path);
    Ok(Arc::new(config))
}

pub fn load_prompts_or_default(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) => load_prompts(p),
        None => Ok(Arc::new(PromptConfig::default())),
    }
}
