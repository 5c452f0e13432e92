use cctp_core::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// The text generation collaborator: a prompt goes in, text or an error comes out.
pub trait Llm {
    fn chat(&self, model: &str, messages: &[ChatMessage], temperature: f32) -> Result<String, AppError>;

    fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String, AppError> {
        self.chat(model, &[ChatMessage::user(prompt)], temperature)
    }
}

pub mod openai_llm;
