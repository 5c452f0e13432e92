//! Export of a drafted outline to PDF and DOCX.
//!
//! Both formats are driven by [`render_document`]: it walks the outline, prepares each
//! section body and pushes headings, paragraphs and styled runs into a [`DocumentBackend`].
//! Backends only decide how a span, a break or a heading looks and where pages end.

pub mod docx;
pub mod pdf;
mod runs;

use serde::{Deserialize, Serialize};

pub use runs::{emit_runs, segment, Palette, Rgb, Run, RunStyle, SpanSink, StyleClass};

use crate::annotate::{extract, strip_markers, strip_markup};
use crate::domain::{ChapterMap, GeneratedTexts, Outline};
use crate::error::AppError;
use crate::markers::MarkerKind;
use crate::xref::resolve_tokens_in_place;

pub const OPEN_ITEMS_LABEL: &str = "To complete";
pub const CITATIONS_LABEL: &str = "Examples";
pub const CROSS_REFS_LABEL: &str = "Cross-references";

/// Where markers end up in the exported body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPlacement {
    /// Styled in place inside the body text.
    #[default]
    Inline,
    /// Removed from the body and listed after it.
    Appendix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub include_markers: bool,
    pub placement: MarkerPlacement,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_markers: true,
            placement: MarkerPlacement::Inline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

/// A document target: a span sink that also knows about block structure.
pub trait DocumentBackend: SpanSink {
    /// `ordinal` is 1-based over the full outline.
    fn group_heading(&mut self, ordinal: usize, name: &str);
    /// `number` comes from the chapter map and may be empty.
    fn section_heading(&mut self, number: &str, title: &str);
    fn begin_paragraph(&mut self);
    fn end_paragraph(&mut self);
    fn list_heading(&mut self, label: &str);
}

/// A span as it was handed to a backend, before any layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedSpan {
    pub class: StyleClass,
    pub text: String,
}

/// Render to the requested format.
pub fn render(
    format: ExportFormat,
    outline: &Outline,
    texts: &GeneratedTexts,
    chapter_map: &ChapterMap,
    options: &ExportOptions,
) -> Result<Vec<u8>, AppError> {
    match format {
        ExportFormat::Pdf => pdf::render_pdf(outline, texts, chapter_map, options),
        ExportFormat::Docx => docx::render_docx(outline, texts, chapter_map, options),
    }
}

/// Walk the outline and drive the backend.
///
/// Groups without any non-blank text are skipped, as are sections without text. The group
/// ordinal is still its position in the full outline.
pub fn render_document<B: DocumentBackend + ?Sized>(
    outline: &Outline,
    texts: &GeneratedTexts,
    chapter_map: &ChapterMap,
    options: &ExportOptions,
    backend: &mut B,
) {
    for (index, group) in outline.groups.iter().enumerate() {
        let Some(group_texts) = texts.get(&group.name) else {
            tracing::debug!(group = %group.name, "no texts for group; skipped");
            continue;
        };
        let sections: Vec<(&str, &str)> = group
            .sections
            .iter()
            .filter_map(|s| {
                group_texts
                    .get(&s.title)
                    .map(|t| (s.title.as_str(), t.as_str()))
            })
            .filter(|(_, text)| !text.trim().is_empty())
            .collect();
        if sections.is_empty() {
            tracing::debug!(group = %group.name, "group has no drafted sections; skipped");
            continue;
        }

        backend.group_heading(index + 1, &group.name);
        for (title, text) in sections {
            backend.section_heading(chapter_map.number_for(&group.name, title), title);
            match options.placement {
                MarkerPlacement::Inline => {
                    let body = prepare_body(text, chapter_map, options.include_markers);
                    emit_paragraphs(&body, backend);
                }
                MarkerPlacement::Appendix => {
                    let annotated = extract(&drop_outline_markup(text), chapter_map, options.include_markers);
                    emit_paragraphs(&annotated.main_body, backend);
                    emit_list(OPEN_ITEMS_LABEL, &annotated.open_items, backend);
                    emit_list(CITATIONS_LABEL, &annotated.citations, backend);
                    emit_list(CROSS_REFS_LABEL, &annotated.cross_refs, backend);
                }
            }
        }
    }
}

/// Body text as it goes into an inline export: markdown heading lines dropped, bullets
/// normalized, markup stripped, markers removed unless requested, cross-references resolved.
/// Single line breaks survive; blank-line runs become one paragraph break.
pub fn prepare_body(text: &str, chapter_map: &ChapterMap, include_markers: bool) -> String {
    let mut body = strip_markup(&drop_outline_markup(text));
    if !include_markers {
        body = strip_markers(&body, &[MarkerKind::OpenItem, MarkerKind::Citation]);
    }
    let body = resolve_tokens_in_place(&body, chapter_map);
    tidy_lines(&body)
}

fn drop_outline_markup(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("###"))
        .map(|line| line.replace('•', "-"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn tidy_lines(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && out.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

fn emit_paragraphs<B: DocumentBackend + ?Sized>(body: &str, backend: &mut B) {
    for paragraph in body.split("\n\n").filter(|p| !p.trim().is_empty()) {
        backend.begin_paragraph();
        emit_runs(paragraph, backend);
        backend.end_paragraph();
    }
}

fn emit_list<B: DocumentBackend + ?Sized>(label: &str, items: &[String], backend: &mut B) {
    if items.is_empty() {
        return;
    }
    backend.list_heading(label);
    for item in items {
        backend.begin_paragraph();
        backend.normal("- ");
        emit_runs(item, backend);
        backend.end_paragraph();
    }
}
