//! Split generated text into a clean body plus the markers it carried.
//!
//! Processing runs the rules of [`EXTRACTION_GRAMMAR`] in order over normalized text:
//! open items and citations are always removed but only reported when the caller asks for
//! markers, cross-references are always resolved, reported and removed. The whole pass is
//! repeated until the body stops changing, so a removal that splices a new marker together
//! is handled in the same call and re-extracting the body is a no-op.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::ChapterMap;
use crate::markers::{Capture, MarkerKind, MarkerRule, EXTRACTION_GRAMMAR};
use crate::xref::resolve;

/// Element tags only: `<` or `</` directly followed by a letter. A bare `<` used as a
/// comparison (`< 30 °C`) is text.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").expect("valid tag regex"));

const ENTITIES: [(&str, &str); 6] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&nbsp;", " "),
    ("&amp;", "&"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotatedText {
    pub main_body: String,
    pub open_items: Vec<String>,
    pub citations: Vec<String>,
    /// Display forms, resolved or `(reference not found: ...)`.
    pub cross_refs: Vec<String>,
}

impl AnnotatedText {
    pub fn markers(&self, kind: MarkerKind) -> &[String] {
        match kind {
            MarkerKind::OpenItem => &self.open_items,
            MarkerKind::Citation => &self.citations,
            MarkerKind::CrossReference => &self.cross_refs,
        }
    }

    fn markers_mut(&mut self, kind: MarkerKind) -> &mut Vec<String> {
        match kind {
            MarkerKind::OpenItem => &mut self.open_items,
            MarkerKind::Citation => &mut self.citations,
            MarkerKind::CrossReference => &mut self.cross_refs,
        }
    }

    pub fn has_notes(&self) -> bool {
        !self.open_items.is_empty() || !self.citations.is_empty() || !self.cross_refs.is_empty()
    }
}

/// Extract the main body and marker collections from a generated text blob.
///
/// Never fails. Partial or malformed marker syntax simply stays in the body.
pub fn extract(text: &str, chapter_map: &ChapterMap, include_markers: bool) -> AnnotatedText {
    let mut out = AnnotatedText::default();
    let mut body = normalize_text(text);
    loop {
        let mut next = body.clone();
        for rule in EXTRACTION_GRAMMAR.iter() {
            next = apply_rule(rule, &next, chapter_map, include_markers, &mut out);
        }
        let next = normalize_text(&next);
        if next == body {
            break;
        }
        body = next;
    }
    out.main_body = body;
    out
}

fn apply_rule(
    rule: &MarkerRule,
    body: &str,
    chapter_map: &ChapterMap,
    include_markers: bool,
    out: &mut AnnotatedText,
) -> String {
    let re = rule.pattern();
    if rule.collects(include_markers) {
        for caps in re.captures_iter(body) {
            let item = match rule.capture {
                Capture::Verbatim => caps[0].to_string(),
                Capture::Resolved => {
                    let group = caps.get(1).map_or("", |m| m.as_str());
                    let section = caps.get(2).map_or("", |m| m.as_str());
                    resolve(group, section, chapter_map)
                }
            };
            push_unique(out.markers_mut(rule.kind), item);
        }
    }
    re.replace_all(body, "").into_owned()
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Remove the given marker kinds from `text` without collecting them, keeping line structure.
pub fn strip_markers(text: &str, kinds: &[MarkerKind]) -> String {
    let mut current = text.to_string();
    loop {
        let mut next = current.clone();
        for kind in kinds {
            next = kind.pattern().replace_all(&next, "").into_owned();
        }
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Strip markup tags, decode basic entities and collapse whitespace, keeping paragraph
/// breaks as `\n\n`. Repeats until stable.
pub fn normalize_text(text: &str) -> String {
    let mut current = collapse_whitespace(&strip_markup(text));
    loop {
        let next = collapse_whitespace(&strip_markup(&current));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Remove element tags, then decode the basic HTML entities, until stable. Encoded
/// comparisons such as `&lt; 30 °C et &gt; 5 °C` survive as text; only a decoded span that
/// itself has the shape of a tag is removed on the next round. Line structure is left alone.
pub fn strip_markup(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let mut next = TAG_RE.replace_all(&current, "").into_owned();
        for (entity, plain) in ENTITIES {
            if next.contains(entity) {
                next = next.replace(entity, plain);
            }
        }
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Collapse whitespace runs: a run holding a blank line becomes `\n\n`, any other run one
/// space. Leading and trailing whitespace is dropped.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;
    let mut in_run = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            in_run = true;
            if ch == '\n' {
                newlines += 1;
            }
            continue;
        }
        if in_run {
            out.push_str(if newlines >= 2 { "\n\n" } else { " " });
            in_run = false;
            newlines = 0;
        }
        out.push(ch);
    }
    out
}
