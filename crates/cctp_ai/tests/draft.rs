use std::cell::RefCell;

use cctp_ai::draft::system_prompt::SystemPromptStore;
use cctp_ai::draft::{
    draft_section_with_llm, improve_system_prompt, DraftAction, DraftSettings, SectionDraftRequest,
    DEFAULT_SYSTEM_PROMPT,
};
use cctp_ai::knowledge::RawKnowledge;
use cctp_ai::llm::{ChatMessage, Llm};
use cctp_core::error::AppError;
use pretty_assertions::assert_eq;

struct MockLlm {
    out: Result<String, AppError>,
    calls: RefCell<Vec<(String, Vec<ChatMessage>)>>,
}

impl MockLlm {
    fn answering(out: &str) -> Self {
        Self {
            out: Ok(out.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            out: Err(AppError::new("AI_GENERATION_FAILED", "mock failure")),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> String {
        let calls = self.calls.borrow();
        let (_, messages) = calls.last().expect("one call");
        messages.last().expect("one message").content.clone()
    }

    fn last_model(&self) -> String {
        self.calls.borrow().last().expect("one call").0.clone()
    }
}

impl Llm for MockLlm {
    fn chat(&self, model: &str, messages: &[ChatMessage], _temperature: f32) -> Result<String, AppError> {
        self.calls
            .borrow_mut()
            .push((model.to_string(), messages.to_vec()));
        self.out.clone()
    }
}

fn request(action: DraftAction) -> SectionDraftRequest {
    SectionDraftRequest {
        group_name: "Menuiseries intérieures".to_string(),
        section_title: "Portes".to_string(),
        notes: "Portes isoplanes, huisserie métallique".to_string(),
        current_text: String::new(),
        context_summary: "Portes, Plinthes".to_string(),
        custom_instruction: None,
        action,
    }
}

fn knowledge() -> RawKnowledge {
    RawKnowledge::Json(
        r#"{"lot05.pdf": [{"group_name": "Lot 05", "sections": [{"title": "Portes de distribution", "content": "Portes à âme pleine."}]}]}"#
            .to_string(),
    )
}

#[test]
fn generate_uses_examples_and_generation_model() {
    let llm = MockLlm::answering("**PORTES**\n---\nPortes isoplanes [À PRÉCISER : finition].\n");
    let settings = DraftSettings::default();
    let mut req = request(DraftAction::Generate);
    req.custom_instruction = Some("Mention fire doors.".to_string());

    let out = draft_section_with_llm(&llm, Some(&knowledge()), DEFAULT_SYSTEM_PROMPT, &settings, req)
        .expect("draft");

    assert_eq!(out.text, "Portes isoplanes [À PRÉCISER : finition].");
    assert_eq!(out.model, "gpt-4-1106-preview");
    assert_eq!(llm.last_model(), "gpt-4-1106-preview");
    assert_eq!(out.examples.len(), 1);

    let prompt = llm.last_prompt();
    assert!(prompt.starts_with("You are an expert writer of CCTP"));
    assert!(prompt.contains("SPECIFIC INSTRUCTION FOR THIS SECTION: Mention fire doors."));
    assert!(prompt.contains("**Section to write**: \"Portes\""));
    assert!(prompt.contains("Portes isoplanes, huisserie métallique"));
    assert!(prompt.contains("**Example 1** (source: lot05.pdf -> Portes de distribution):\nPortes à âme pleine."));
}

#[test]
fn generate_without_knowledge_says_so() {
    let llm = MockLlm::answering("Texte.");
    draft_section_with_llm(&llm, None, "Custom prompt.", &DraftSettings::default(), request(DraftAction::Generate))
        .expect("draft");
    let prompt = llm.last_prompt();
    assert!(prompt.starts_with("Custom prompt."));
    assert!(prompt.contains("No examples available."));
}

#[test]
fn rewrite_actions_use_modification_model_and_current_text() {
    let llm = MockLlm::answering("Texte raccourci.");
    let mut req = request(DraftAction::Shorten);
    req.current_text = "Un texte bien trop long.".to_string();

    let out = draft_section_with_llm(&llm, Some(&knowledge()), DEFAULT_SYSTEM_PROMPT, &DraftSettings::default(), req)
        .expect("draft");

    assert_eq!(out.model, "gpt-3.5-turbo-0125");
    assert!(out.examples.is_empty());
    let prompt = llm.last_prompt();
    assert!(prompt.contains("ORIGINAL TEXT:\n---\nUn texte bien trop long.\n---"));
    assert!(prompt.contains("more concise"));
}

#[test]
fn invalid_requests_are_rejected_before_calling_the_generator() {
    let llm = MockLlm::answering("unused");
    let mut req = request(DraftAction::Generate);
    req.section_title = "  ".to_string();
    let err = draft_section_with_llm(&llm, None, DEFAULT_SYSTEM_PROMPT, &DraftSettings::default(), req)
        .expect_err("blank title");
    assert_eq!(err.code, "AI_DRAFT_INVALID");

    let err = draft_section_with_llm(
        &llm,
        None,
        DEFAULT_SYSTEM_PROMPT,
        &DraftSettings::default(),
        request(DraftAction::Correct),
    )
    .expect_err("nothing to correct");
    assert_eq!(err.code, "AI_DRAFT_INVALID");
    assert!(llm.calls.borrow().is_empty());
}

#[test]
fn output_that_cleans_to_nothing_is_an_error() {
    let llm = MockLlm::answering("---\n# Portes\n\n**TITRE**\n");
    let err = draft_section_with_llm(&llm, None, DEFAULT_SYSTEM_PROMPT, &DraftSettings::default(), request(DraftAction::Generate))
        .expect_err("empty output");
    assert_eq!(err.code, "AI_OUTPUT_EMPTY");
}

#[test]
fn generator_errors_propagate() {
    let llm = MockLlm::failing();
    let err = draft_section_with_llm(&llm, None, DEFAULT_SYSTEM_PROMPT, &DraftSettings::default(), request(DraftAction::Generate))
        .expect_err("failure");
    assert_eq!(err.code, "AI_GENERATION_FAILED");
}

#[test]
fn prompt_improvement_returns_generator_answer() {
    let llm = MockLlm::answering("  Improved prompt.\n");
    let out = improve_system_prompt(&llm, "gpt-4-1106-preview", 0.3, DEFAULT_SYSTEM_PROMPT, "Use metric units")
        .expect("improve");
    assert_eq!(out, "Improved prompt.");
    assert!(llm.last_prompt().contains("\"Use metric units\""));
}

#[test]
fn prompt_improvement_falls_back_to_appending() {
    let llm = MockLlm::failing();
    let out = improve_system_prompt(&llm, "m", 0.3, "Base prompt.", " Use metric units ").expect("fallback");
    assert_eq!(out, "Base prompt.\n\n5.  **Additional instruction**: Use metric units");

    let err = improve_system_prompt(&llm, "m", 0.3, "Base prompt.", " ").expect_err("blank request");
    assert_eq!(err.code, "AI_PROMPT_EMPTY");
}

#[test]
fn system_prompt_store_defaults_and_rejects_blank() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SystemPromptStore::open(dir.path());
    assert_eq!(store.load().expect("load"), DEFAULT_SYSTEM_PROMPT);
    assert!(!store.is_custom().expect("is_custom"));

    store.save("  My prompt.\n").expect("save");
    assert_eq!(store.load().expect("load"), "My prompt.");
    assert!(store.is_custom().expect("is_custom"));

    assert_eq!(store.save("   ").expect_err("blank").code, "AI_PROMPT_EMPTY");
    assert_eq!(store.load().expect("load"), "My prompt.");

    std::fs::write(store.path(), "\n \n").expect("blank file");
    assert_eq!(store.load().expect("load"), DEFAULT_SYSTEM_PROMPT);

    store.reset().expect("reset");
    store.reset().expect("reset twice");
    assert!(!store.path().exists());
}
