//! Heuristic structure parser: raw extracted page text to an ordered list of sections.
//!
//! Numbered headings ("2", "2.1", "2.1.3" followed by a title) open sections. A heading only
//! counts when the next non-blank line before any other heading is content; otherwise it is
//! treated as noise (table of contents lines, running headers) and dropped along with its line.
//! Without any accepted heading the text is split into paragraphs, and as a last resort the
//! whole text becomes one section.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::Section;

/// Paragraph fallback keeps at most this many sections.
pub const MAX_FALLBACK_PARAGRAPHS: usize = 20;
/// A first line shorter than this (in characters) can serve as a paragraph title.
pub const MAX_TITLE_LINE_CHARS: usize = 150;
/// Words kept when a title has to be synthesized from the paragraph text.
pub const SYNTHESIZED_TITLE_WORDS: usize = 8;
/// Title of the catch-all section.
pub const PLACEHOLDER_TITLE: &str = "Document";

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)*)\s+(.+)$").expect("valid numbered heading regex")
});

/// A numbered heading candidate: numeric prefix and title remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingCandidate<'a> {
    pub number: &'a str,
    pub title: &'a str,
}

/// Match a (trimmed) line against the numbered heading pattern.
pub fn heading_candidate(line: &str) -> Option<HeadingCandidate<'_>> {
    let caps = HEADING_RE.captures(line)?;
    let number = caps.get(1)?.as_str();
    let title = caps.get(2)?.as_str().trim();
    if title.is_empty() {
        return None;
    }
    Some(HeadingCandidate { number, title })
}

/// Parse raw document text into sections. Never fails: non-blank input yields at least one
/// section, blank input yields none.
pub fn parse_document_structure(raw_text: &str) -> Vec<Section> {
    let lines: Vec<&str> = raw_text.lines().map(str::trim).collect();

    let mut sections = parse_numbered_headings(&lines);
    if sections.is_empty() {
        sections = parse_paragraphs(&lines);
        if !sections.is_empty() {
            tracing::debug!(count = sections.len(), "no numbered headings; used paragraph fallback");
        }
    }
    if sections.is_empty() && !raw_text.trim().is_empty() {
        tracing::debug!("no paragraphs found; emitting catch-all section");
        sections.push(Section::new(PLACEHOLDER_TITLE, raw_text.trim()));
    }
    sections
}

fn parse_numbered_headings(lines: &[&str]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current_title: Option<&str> = None;
    let mut current_content: Vec<&str> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if let Some(candidate) = heading_candidate(line) {
            if has_content_after(lines, i) {
                flush(&mut sections, current_title, &mut current_content);
                current_title = Some(candidate.title);
            }
            // Rejected headings are dropped, not folded into the previous section.
            continue;
        }
        if current_title.is_some() && !line.is_empty() {
            current_content.push(line);
        }
    }
    flush(&mut sections, current_title, &mut current_content);
    sections
}

/// Look ahead from a heading at `index`: true when the first non-blank line after it is
/// not itself a heading candidate.
fn has_content_after(lines: &[&str], index: usize) -> bool {
    lines[index + 1..]
        .iter()
        .find(|l| !l.is_empty())
        .is_some_and(|next| heading_candidate(next).is_none())
}

fn flush(sections: &mut Vec<Section>, title: Option<&str>, content: &mut Vec<&str>) {
    if let Some(title) = title {
        let text = content.join("\n");
        let text = text.trim();
        if !text.is_empty() {
            sections.push(Section::new(title, text));
        }
    }
    content.clear();
}

fn parse_paragraphs(lines: &[&str]) -> Vec<Section> {
    let mut sections = Vec::new();
    for paragraph in lines
        .split(|l| l.is_empty())
        .filter(|p| !p.is_empty())
        .take(MAX_FALLBACK_PARAGRAPHS)
    {
        let first_line = paragraph[0];
        if first_line.chars().count() < MAX_TITLE_LINE_CHARS && paragraph.len() > 1 {
            sections.push(Section::new(first_line, paragraph[1..].join("\n")));
        } else {
            sections.push(Section::new(
                synthesize_title(first_line),
                paragraph.join("\n"),
            ));
        }
    }
    sections
}

fn synthesize_title(first_line: &str) -> String {
    let words: Vec<&str> = first_line.split_whitespace().collect();
    let mut title = words
        .iter()
        .take(SYNTHESIZED_TITLE_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > SYNTHESIZED_TITLE_WORDS {
        title.push_str("...");
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_candidate_splits_number_and_title() {
        let c = heading_candidate("2.1.3 Modules vitrés").expect("candidate");
        assert_eq!(c.number, "2.1.3");
        assert_eq!(c.title, "Modules vitrés");
        assert!(heading_candidate("Plain sentence").is_none());
        assert!(heading_candidate("2.1").is_none());
    }

    #[test]
    fn synthesized_title_adds_ellipsis_only_when_truncated() {
        assert_eq!(synthesize_title("short line"), "short line");
        assert_eq!(
            synthesize_title("one two three four five six seven eight nine"),
            "one two three four five six seven eight..."
        );
    }
}
