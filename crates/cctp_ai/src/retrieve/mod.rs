//! Example matcher: title-based lookup of knowledge base sections to show the generator.
//!
//! Matching is case-insensitive equality or containment in either direction, in stored
//! order, with no ranking. Results are bounded by count and by a total character budget;
//! the excerpt that crosses the budget is truncated with `...` when enough room remains,
//! otherwise collection stops.

use cctp_core::domain::{Excerpt, KnowledgeBase};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::knowledge::{RawKnowledge, SOURCE_DOCUMENT_PREFIX};

/// Below this many remaining characters a crossing excerpt is dropped instead of truncated.
pub const MIN_TRUNCATED_CHARS: usize = 100;
pub const TRUNCATION_MARKER: &str = "...";

const LEGACY_DOCUMENT_PREFIX: &str = "--- EXTRAIT DU DOCUMENT : ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleLimits {
    pub max_count: usize,
    pub max_total_chars: usize,
}

impl Default for ExampleLimits {
    fn default() -> Self {
        Self {
            max_count: 3,
            max_total_chars: 4000,
        }
    }
}

/// Find excerpts for `target_title` in a loaded knowledge base.
pub fn find_examples(target_title: &str, kb: &KnowledgeBase, limits: ExampleLimits) -> Vec<Excerpt> {
    let candidates = kb.documents.iter().flat_map(|(source, groups)| {
        groups
            .iter()
            .flat_map(|g| g.sections.iter())
            .map(move |s| (source.as_str(), s.title.as_str(), s.content.as_str()))
    });
    collect_bounded(target_title, candidates, limits)
}

/// Find excerpts in the persisted artifact without trusting its shape.
///
/// Documents are visited in the order they appear in the artifact. Invalid JSON is read as
/// the plain-text companion format. Valid JSON that does not look
/// like a knowledge base contributes whatever parts do conform, possibly nothing.
pub fn find_examples_in_raw(target_title: &str, raw: &RawKnowledge, limits: ExampleLimits) -> Vec<Excerpt> {
    match raw {
        RawKnowledge::Json(s) => match serde_json::from_str::<Value>(s) {
            Ok(value) => find_examples_in_value(target_title, &value, limits),
            Err(e) => {
                tracing::warn!(err = %e, "knowledge base is not valid JSON; reading it as text");
                find_examples_in_text(target_title, s, limits)
            }
        },
        RawKnowledge::Text(s) => find_examples_in_text(target_title, s, limits),
    }
}

fn find_examples_in_value(target_title: &str, value: &Value, limits: ExampleLimits) -> Vec<Excerpt> {
    let Some(documents) = value.as_object() else {
        tracing::warn!("knowledge base root is not an object; no examples");
        return Vec::new();
    };
    let mut candidates: Vec<(&str, &str, &str)> = Vec::new();
    for (source, groups) in documents {
        let Some(groups) = groups.as_array() else {
            tracing::warn!(source = %source, "knowledge base entry is not a list; skipped");
            continue;
        };
        for group in groups {
            let Some(sections) = group.get("sections").and_then(Value::as_array) else {
                continue;
            };
            for section in sections {
                let title = string_field(section, &["title", "titre"]);
                let content = string_field(section, &["content", "contenu"]);
                if let (Some(title), Some(content)) = (title, content) {
                    candidates.push((source.as_str(), title, content));
                }
            }
        }
    }
    collect_bounded(target_title, candidates, limits)
}

fn string_field<'v>(value: &'v Value, keys: &[&str]) -> Option<&'v str> {
    keys.iter().find_map(|k| value.get(*k).and_then(Value::as_str))
}

/// Plain-text format: `--- SOURCE DOCUMENT: <name> ---` blocks. A section is a line equal to
/// the target title (optionally prefixed by a numeric heading or `###`), and its content runs
/// until a blank line or the next numbered or `###` heading.
fn find_examples_in_text(target_title: &str, text: &str, limits: ExampleLimits) -> Vec<Excerpt> {
    let target = target_title.trim();
    if target.is_empty() {
        return Vec::new();
    }
    let mut found: Vec<(String, String)> = Vec::new();
    for (source, body) in split_documents(text) {
        let lines: Vec<&str> = body.lines().collect();
        let mut i = 0;
        while i < lines.len() {
            if eq_ignore_case(strip_heading_prefix(lines[i]), target) {
                let content: Vec<&str> = lines[i + 1..]
                    .iter()
                    .take_while(|l| !l.trim().is_empty() && !is_text_heading(l))
                    .map(|l| l.trim())
                    .collect();
                i += 1 + content.len();
                if !content.is_empty() {
                    found.push((source.to_string(), content.join("\n")));
                }
                continue;
            }
            i += 1;
        }
    }
    let candidates = found
        .iter()
        .map(|(source, content)| (source.as_str(), target, content.as_str()));
    collect_bounded(target_title, candidates, limits)
}

fn split_documents(text: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    for prefix in [SOURCE_DOCUMENT_PREFIX, LEGACY_DOCUMENT_PREFIX] {
        for chunk in text.split(prefix).skip(1) {
            let (first, rest) = chunk.split_once('\n').unwrap_or((chunk, ""));
            let name = first.trim().trim_end_matches("---").trim();
            out.push((name, rest));
        }
    }
    out
}

fn strip_heading_prefix(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("###") {
        return rest.trim();
    }
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) if is_heading_number(head) => rest.trim(),
        _ => line,
    }
}

fn is_text_heading(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("###")
        || line
            .split_once(char::is_whitespace)
            .is_some_and(|(head, _)| is_heading_number(head))
}

fn is_heading_number(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// True when the titles are equal or one contains the other, ignoring case. Empty titles
/// never match.
pub fn titles_match(target_title: &str, candidate_title: &str) -> bool {
    let target = target_title.trim().to_lowercase();
    let candidate = candidate_title.trim().to_lowercase();
    if target.is_empty() || candidate.is_empty() {
        return false;
    }
    target == candidate || candidate.contains(&target) || target.contains(&candidate)
}

fn collect_bounded<'a, I>(target_title: &str, candidates: I, limits: ExampleLimits) -> Vec<Excerpt>
where
    I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
{
    let mut out = Vec::new();
    let mut total = 0usize;
    for (source, title, content) in candidates {
        if out.len() >= limits.max_count {
            break;
        }
        let content = content.trim();
        if content.is_empty() || !titles_match(target_title, title) {
            continue;
        }
        let len = content.chars().count();
        let mut text = content.to_string();
        if total + len > limits.max_total_chars {
            let remaining = limits.max_total_chars.saturating_sub(total);
            if remaining <= MIN_TRUNCATED_CHARS {
                break;
            }
            let keep = remaining - TRUNCATION_MARKER.chars().count();
            text = content.chars().take(keep).collect();
            text.push_str(TRUNCATION_MARKER);
            out.push(excerpt(target_title, title, source, text));
            break;
        }
        total += len;
        out.push(excerpt(target_title, title, source, text));
    }
    tracing::debug!(target_title, found = out.len(), "examples collected");
    out
}

fn excerpt(target_title: &str, original_title: &str, source: &str, text: String) -> Excerpt {
    Excerpt {
        title: target_title.to_string(),
        original_title: original_title.trim().to_string(),
        source: source.to_string(),
        text,
    }
}

/// Prompt block listing the excerpts, or a fixed line when there are none.
pub fn format_examples_for_prompt(examples: &[Excerpt]) -> String {
    if examples.is_empty() {
        return "No examples available.".to_string();
    }
    examples
        .iter()
        .enumerate()
        .map(|(i, ex)| {
            format!(
                "**Example {}** (source: {} -> {}):\n{}",
                i + 1,
                ex.source,
                ex.original_title,
                ex.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn total_chars(examples: &[Excerpt]) -> usize {
    examples.iter().map(|e| e.text.chars().count()).sum()
}
