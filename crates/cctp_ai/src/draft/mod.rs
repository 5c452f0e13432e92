use cctp_core::domain::Excerpt;
use cctp_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::guardrails::{clean_generated_text, enforce_non_empty};
use crate::knowledge::RawKnowledge;
use crate::llm::{ChatMessage, Llm};
use crate::retrieve::{find_examples_in_raw, format_examples_for_prompt, ExampleLimits};

mod prompts;
pub mod system_prompt;

pub use prompts::DEFAULT_SYSTEM_PROMPT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftAction {
    Generate,
    Correct,
    Lengthen,
    Shorten,
}

impl DraftAction {
    fn rewrite_instruction(self) -> Option<&'static str> {
        match self {
            DraftAction::Generate => None,
            DraftAction::Correct => Some(
                "Correct the spelling, grammar and phrasing of the following text. Keep the technical meaning, the open items and the citations unchanged.",
            ),
            DraftAction::Lengthen => Some(
                "Develop the following text in more technical detail, at least twice as long, using precise technical terms. Keep the open items and the citations.",
            ),
            DraftAction::Shorten => Some(
                "Make the following text more concise, keep only the essential technical information, at most half as long. Keep the open items.",
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDraftRequest {
    pub group_name: String,
    pub section_title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub current_text: String,
    #[serde(default)]
    pub context_summary: String,
    #[serde(default)]
    pub custom_instruction: Option<String>,
    pub action: DraftAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSettings {
    pub generation_model: String,
    pub modification_model: String,
    pub temperature: f32,
    pub limits: ExampleLimits,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            generation_model: "gpt-4-1106-preview".to_string(),
            modification_model: "gpt-3.5-turbo-0125".to_string(),
            temperature: 0.3,
            limits: ExampleLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftResponse {
    pub text: String,
    pub model: String,
    pub examples: Vec<Excerpt>,
}

/// Draft or rewrite one section body.
///
/// `generate` retrieves examples for the section title and sends the full generation prompt;
/// the rewrite actions send `current_text` with the matching instruction. Output is cleaned
/// before it is returned.
pub fn draft_section_with_llm(
    llm: &dyn Llm,
    knowledge: Option<&RawKnowledge>,
    system_prompt: &str,
    settings: &DraftSettings,
    req: SectionDraftRequest,
) -> Result<DraftResponse, AppError> {
    if req.group_name.trim().is_empty() || req.section_title.trim().is_empty() {
        return Err(AppError::new(
            "AI_DRAFT_INVALID",
            "Group name and section title are required",
        ));
    }

    let (prompt, model, examples) = match req.action.rewrite_instruction() {
        None => {
            let examples = knowledge
                .map(|raw| find_examples_in_raw(&req.section_title, raw, settings.limits))
                .unwrap_or_default();
            let prompt = prompts::generation_prompt(
                system_prompt,
                req.custom_instruction.as_deref(),
                &req.group_name,
                &req.section_title,
                &req.notes,
                &req.context_summary,
                &format_examples_for_prompt(&examples),
            );
            (prompt, settings.generation_model.as_str(), examples)
        }
        Some(instruction) => {
            if req.current_text.trim().is_empty() {
                return Err(AppError::new(
                    "AI_DRAFT_INVALID",
                    "There is no text to modify",
                )
                .with_details(format!("action={:?}", req.action)));
            }
            let prompt = prompts::modification_prompt(
                instruction,
                &req.group_name,
                &req.section_title,
                &req.current_text,
            );
            (prompt, settings.modification_model.as_str(), Vec::new())
        }
    };

    tracing::info!(
        group = %req.group_name,
        section = %req.section_title,
        action = ?req.action,
        model,
        examples = examples.len(),
        "drafting section"
    );
    let raw = llm.generate(model, &prompt, settings.temperature)?;
    let text = clean_generated_text(&raw);
    enforce_non_empty(&text)?;

    Ok(DraftResponse {
        text,
        model: model.to_string(),
        examples,
    })
}

/// Fold a user request into `base_prompt` as a fifth instruction.
///
/// When the generator fails or answers with nothing, the request is appended as is.
pub fn improve_system_prompt(
    llm: &dyn Llm,
    model: &str,
    temperature: f32,
    base_prompt: &str,
    request: &str,
) -> Result<String, AppError> {
    if request.trim().is_empty() {
        return Err(AppError::new(
            "AI_PROMPT_EMPTY",
            "The improvement request is empty",
        ));
    }
    let messages = [
        ChatMessage::system(prompts::IMPROVE_SYSTEM_MESSAGE),
        ChatMessage::user(prompts::improve_prompt_request(base_prompt, request)),
    ];
    match llm.chat(model, &messages, temperature) {
        Ok(improved) if !improved.trim().is_empty() => Ok(improved.trim().to_string()),
        Ok(_) => {
            tracing::warn!("prompt improvement returned nothing; appending the request");
            Ok(prompts::appended_instruction(base_prompt, request))
        }
        Err(e) => {
            tracing::warn!(err = %e, "prompt improvement failed; appending the request");
            Ok(prompts::appended_instruction(base_prompt, request))
        }
    }
}
