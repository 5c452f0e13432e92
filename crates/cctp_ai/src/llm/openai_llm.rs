use cctp_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, Llm};
use crate::openai::OpenAiClient;

#[derive(Debug, Clone)]
pub struct OpenAiLlm {
    client: OpenAiClient,
}

impl OpenAiLlm {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Llm for OpenAiLlm {
    fn chat(&self, model: &str, messages: &[ChatMessage], temperature: f32) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.client.base_url());
        let req = ChatRequest {
            model,
            messages,
            temperature,
        };

        let resp = ureq::post(&url)
            .set("Authorization", &self.client.authorization())
            .timeout(self.client.timeout())
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("AI_GENERATION_FAILED", "Failed to encode chat request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: ChatResponse = r.into_json().map_err(|e| {
                    AppError::new("AI_GENERATION_FAILED", "Failed to decode chat response")
                        .with_details(e.to_string())
                })?;
                let text = v
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default();
                if text.trim().is_empty() {
                    return Err(AppError::new("AI_GENERATION_FAILED", "Chat response was empty"));
                }
                tracing::debug!(model, chars = text.len(), "chat completion received");
                Ok(text.trim().to_string())
            }
            Ok(r) => Err(
                AppError::new("AI_GENERATION_FAILED", "Chat request failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(ureq::Error::Status(code, r)) => {
                let body = r.into_string().unwrap_or_default();
                Err(AppError::new("AI_GENERATION_FAILED", "Chat request was rejected")
                    .with_details(format!("status={code}; body={}", truncate(&body, 300)))
                    .with_retryable(code == 429 || code >= 500))
            }
            Err(e) => Err(
                AppError::new("AI_GENERATION_FAILED", "Failed to call chat endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
