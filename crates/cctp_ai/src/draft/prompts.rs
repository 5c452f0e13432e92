pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert writer of CCTP technical specifications for construction projects (detailed design stage). Your task is to write a precise technical description for one specific section, based on the notes (context) you are given.

MANDATORY INSTRUCTIONS:
1.  **Design-stage level of detail**: precision is essential. Avoid generalities. Be technical and factual, and above all adapt the level of detail to the complexity of the section (e.g. 'Location' = brief, 'Performance' = very detailed). Be precise but short.
2.  **Open items**: when information essential at this stage is missing (values, references, technical choices...), insert a clear open item instead of guessing, e.g. `[À PRÉCISER : type de vitrage]`, `[À VALIDER : résistance au feu EI60]`. Open items must be precise, clear and relevant.
3.  **Use of the provided examples (recommended)**: you are given excerpts from existing CCTP documents. Reuse or draw on one or more of them when relevant, to enrich or better phrase technical content. This is not mandatory, and do not use more than 1 or 2 per section. When you reuse or draw on an excerpt, cite it as `(see example CCTP file_name.pdf -> original_section_name)` where original_section_name is the exact section name in the source document.
4.  **Formatting**: answer DIRECTLY with the section text. Do NOT include a title, numbering or the group name. To refer to another section of the same document, write `{{REF:group name|section title}}`.";

pub fn generation_prompt(
    system_prompt: &str,
    custom_instruction: Option<&str>,
    group_name: &str,
    section_title: &str,
    notes: &str,
    context_summary: &str,
    examples_block: &str,
) -> String {
    let mut instruction = system_prompt.trim().to_string();
    if let Some(custom) = custom_instruction.map(str::trim).filter(|c| !c.is_empty()) {
        instruction.push_str(&format!("\n\nSPECIFIC INSTRUCTION FOR THIS SECTION: {custom}"));
    }
    let notes = if notes.trim().is_empty() {
        "No notes provided."
    } else {
        notes.trim()
    };
    let context = if context_summary.trim().is_empty() {
        "None."
    } else {
        context_summary.trim()
    };
    format!(
        r#"{instruction}

---

**Group to describe**: "{group_name}"
**Section to write**: "{section_title}"

**User notes for this section**:
```
{notes}
```

**Context (structure of the other sections of the group)**:
{context}

**Relevant examples (excerpts from existing CCTP documents)**:
{examples_block}
"#
    )
}

pub fn modification_prompt(instruction: &str, group_name: &str, section_title: &str, current_text: &str) -> String {
    format!(
        r#"MISSION: You are an expert assistant for writing CCTP documents. Modify an existing text according to the instruction.

INSTRUCTION: {instruction}

GROUP: "{group_name}"
SECTION: "{section_title}"

ORIGINAL TEXT:
---
{current_text}
---

Your answer must contain ONLY the modified text, without title or introduction."#
    )
}

pub const IMPROVE_SYSTEM_MESSAGE: &str = "You are an expert in writing prompts for AI models. You turn a user request into a clear instruction added to an existing prompt.";

pub fn improve_prompt_request(base_prompt: &str, request: &str) -> String {
    format!(
        r#"Here is the base prompt used to generate CCTP texts:
---
{base_prompt}
---

The user wants to add this change or constraint:
"{request}"

Your task: turn this request into a clear and precise instruction appended at the end of the prompt, as a new numbered instruction (5.) that fits naturally with the 4 existing instructions.

The instruction must:
- Be clear and actionable
- Be phrased as a directive for the AI
- Match the style of the existing prompt
- Be numbered "5."

Answer only with the complete prompt including the new instruction."#
    )
}

/// Used when the generator could not rewrite the prompt itself.
pub fn appended_instruction(base_prompt: &str, request: &str) -> String {
    format!("{}\n\n5.  **Additional instruction**: {}", base_prompt.trim_end(), request.trim())
}
