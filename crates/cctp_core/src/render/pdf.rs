//! PDF backend: A4 pages laid out in millimetres, serialized as a small PDF 1.4 file using
//! the standard Helvetica fonts with WinAnsi encoding.

use std::io::Write;

use encoding_rs::WINDOWS_1252;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::{render_document, DocumentBackend, EmittedSpan, ExportOptions, Palette, Rgb, SpanSink, StyleClass};
use crate::domain::{ChapterMap, GeneratedTexts, Outline};
use crate::error::AppError;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const BODY_INDENT_MM: f32 = 20.0;
const AUTO_BREAK_MM: f32 = PAGE_HEIGHT_MM - 20.0;
/// A group heading starting below this line goes to a new page.
const GROUP_BREAK_MM: f32 = 230.0;
/// Same for section headings.
const SECTION_BREAK_MM: f32 = 250.0;

const BODY_SIZE: f32 = 9.0;
const BODY_LINE_MM: f32 = 5.0;
const GROUP_SIZE: f32 = 12.0;
const HEADER_SIZE: f32 = 9.0;
const FOOTER_SIZE: f32 = 8.0;
const HEADER_TEXT: &str = "General description of works";
const HEADER_COLOR: Rgb = Rgb(180, 180, 180);
const BLACK: Rgb = Rgb(0, 0, 0);

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Render the outline to PDF bytes.
pub fn render_pdf(
    outline: &Outline,
    texts: &GeneratedTexts,
    chapter_map: &ChapterMap,
    options: &ExportOptions,
) -> Result<Vec<u8>, AppError> {
    let mut builder = PdfBuilder::new(Palette::default());
    render_document(outline, texts, chapter_map, options, &mut builder);
    builder.to_bytes()
}

#[derive(Debug, Clone, PartialEq)]
struct TextSpan {
    text: String,
    bold: bool,
    size: f32,
    color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
struct TextLine {
    x: f32,
    /// Baseline, millimetres from the top edge.
    baseline: f32,
    spans: Vec<TextSpan>,
}

#[derive(Debug, Clone, PartialEq)]
struct Rule {
    x1: f32,
    x2: f32,
    y: f32,
    color: Rgb,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Page {
    lines: Vec<TextLine>,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text(StyleClass, String),
    Break,
}

/// In-memory PDF document. Also usable directly as a [`DocumentBackend`].
#[derive(Debug)]
pub struct PdfBuilder {
    palette: Palette,
    pages: Vec<Page>,
    y: f32,
    paragraph: Vec<Piece>,
    trace: Vec<EmittedSpan>,
}

impl PdfBuilder {
    pub fn new(palette: Palette) -> Self {
        let mut builder = Self {
            palette,
            pages: Vec::new(),
            y: 0.0,
            paragraph: Vec::new(),
            trace: Vec::new(),
        };
        builder.new_page();
        builder
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Spans in the order they were received, with their style class.
    pub fn emitted_spans(&self) -> &[EmittedSpan] {
        &self.trace
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        // Header cell (8 mm) plus a 3 mm gap.
        self.y = MARGIN_MM + 8.0 + 3.0;
    }

    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.new_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > AUTO_BREAK_MM {
            self.new_page();
        }
    }

    fn push_cell(&mut self, x: f32, height: f32, span: TextSpan) {
        self.ensure_room(height);
        let baseline = self.y + height / 2.0 + span.size * 0.35 / PT_PER_MM;
        let line = TextLine {
            x,
            baseline,
            spans: vec![span],
        };
        self.page().lines.push(line);
        self.y += height;
    }

    fn push_text(&mut self, class: StyleClass, text: &str) {
        self.trace.push(EmittedSpan {
            class,
            text: text.to_string(),
        });
        self.paragraph.push(Piece::Text(class, text.to_string()));
    }

    fn flush_paragraph(&mut self) {
        let pieces = std::mem::take(&mut self.paragraph);
        let max_width = PAGE_WIDTH_MM - MARGIN_MM - BODY_INDENT_MM;
        for line in wrap_pieces(&pieces, &self.palette, max_width) {
            self.ensure_room(BODY_LINE_MM);
            let baseline = self.y + BODY_LINE_MM / 2.0 + BODY_SIZE * 0.35 / PT_PER_MM;
            self.page().lines.push(TextLine {
                x: BODY_INDENT_MM,
                baseline,
                spans: line,
            });
            self.y += BODY_LINE_MM;
        }
    }

    /// Serialize all pages, adding the running header and the `Page n/N` footer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AppError> {
        let total = self.pages.len();
        let mut out: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = Vec::new();

        write_raw(&mut out, b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n")?;

        // 1: catalog, 2: pages, 3: regular font, 4: bold font, then page/content pairs.
        let page_ids: Vec<usize> = (0..total).map(|i| 5 + i * 2).collect();
        let kids = page_ids
            .iter()
            .map(|id| format!("{id} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");

        begin_object(&mut out, &mut offsets, 1)?;
        write_raw(&mut out, b"<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;
        begin_object(&mut out, &mut offsets, 2)?;
        write_raw(
            &mut out,
            format!("<< /Type /Pages /Kids [{kids}] /Count {total} >>\nendobj\n").as_bytes(),
        )?;
        for (id, base) in [(3, "Helvetica"), (4, "Helvetica-Bold")] {
            begin_object(&mut out, &mut offsets, id)?;
            write_raw(
                &mut out,
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>\nendobj\n"
                )
                .as_bytes(),
            )?;
        }

        let width_pt = PAGE_WIDTH_MM * PT_PER_MM;
        let height_pt = PAGE_HEIGHT_MM * PT_PER_MM;
        for (index, page) in self.pages.iter().enumerate() {
            let page_id = page_ids[index];
            let content_id = page_id + 1;
            begin_object(&mut out, &mut offsets, page_id)?;
            write_raw(
                &mut out,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width_pt:.2} {height_pt:.2}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_id} 0 R >>\nendobj\n"
                )
                .as_bytes(),
            )?;

            let content = page_content(page, index + 1, total);
            let compressed = deflate(&content)?;
            begin_object(&mut out, &mut offsets, content_id)?;
            write_raw(
                &mut out,
                format!("<< /Length {} /Filter /FlateDecode >>\nstream\n", compressed.len()).as_bytes(),
            )?;
            write_raw(&mut out, &compressed)?;
            write_raw(&mut out, b"\nendstream\nendobj\n")?;
        }

        let xref_at = out.len();
        let count = offsets.len() + 1;
        let mut xref = format!("xref\n0 {count}\n0000000000 65535 f \n");
        for offset in &offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {count} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n"
        ));
        write_raw(&mut out, xref.as_bytes())?;
        Ok(out)
    }
}

impl SpanSink for PdfBuilder {
    fn normal(&mut self, text: &str) {
        self.push_text(StyleClass::Normal, text);
    }

    fn open_item(&mut self, text: &str) {
        self.push_text(StyleClass::OpenItem, text);
    }

    fn citation(&mut self, text: &str) {
        self.push_text(StyleClass::Citation, text);
    }

    fn resolved_reference(&mut self, text: &str) {
        self.push_text(StyleClass::ResolvedReference, text);
    }

    fn line_break(&mut self) {
        self.paragraph.push(Piece::Break);
    }
}

impl DocumentBackend for PdfBuilder {
    fn group_heading(&mut self, ordinal: usize, name: &str) {
        if self.y > GROUP_BREAK_MM {
            self.new_page();
        }
        self.push_cell(
            MARGIN_MM,
            10.0,
            TextSpan {
                text: format!("{ordinal}. {name}"),
                bold: true,
                size: GROUP_SIZE,
                color: BLACK,
            },
        );
        self.y += 2.0;
    }

    fn section_heading(&mut self, number: &str, title: &str) {
        if self.y > SECTION_BREAK_MM {
            self.new_page();
        }
        let color = self.palette.style(StyleClass::Normal).color;
        let text = format!("{number} {title}").trim().to_string();
        self.push_cell(
            MARGIN_MM,
            8.0,
            TextSpan {
                text,
                bold: true,
                size: BODY_SIZE,
                color,
            },
        );
        let y = self.y;
        self.page().rules.push(Rule {
            x1: MARGIN_MM,
            x2: PAGE_WIDTH_MM - MARGIN_MM,
            y,
            color,
        });
        self.y += 1.0;
    }

    fn begin_paragraph(&mut self) {
        self.paragraph.clear();
    }

    fn end_paragraph(&mut self) {
        self.flush_paragraph();
        self.y += 3.0;
    }

    fn list_heading(&mut self, label: &str) {
        let color = self.palette.style(StyleClass::Normal).color;
        self.push_cell(
            BODY_INDENT_MM,
            6.0,
            TextSpan {
                text: format!("{label}:"),
                bold: true,
                size: BODY_SIZE,
                color,
            },
        );
    }
}

/// Greedy word wrap of styled pieces into lines no wider than `max_width` millimetres.
/// A single word wider than the line is placed alone and allowed to overflow.
fn wrap_pieces(pieces: &[Piece], palette: &Palette, max_width: f32) -> Vec<Vec<TextSpan>> {
    let mut lines: Vec<Vec<TextSpan>> = Vec::new();
    let mut line: Vec<TextSpan> = Vec::new();
    let mut width = 0.0f32;
    let mut pending_space = false;

    for piece in pieces {
        let (class, text) = match piece {
            Piece::Break => {
                lines.push(std::mem::take(&mut line));
                width = 0.0;
                pending_space = false;
                continue;
            }
            Piece::Text(class, text) => (*class, text),
        };
        let style = palette.style(class);
        for word in split_keep_spaces(text) {
            if word.trim().is_empty() {
                pending_space = !line.is_empty();
                continue;
            }
            let word_width = text_width(word, style.bold, BODY_SIZE);
            let space_width = if pending_space {
                text_width(" ", style.bold, BODY_SIZE)
            } else {
                0.0
            };
            if !line.is_empty() && width + space_width + word_width > max_width {
                lines.push(std::mem::take(&mut line));
                width = 0.0;
                pending_space = false;
            }
            let chunk = if pending_space && !line.is_empty() {
                width += space_width;
                format!(" {word}")
            } else {
                word.to_string()
            };
            width += word_width;
            pending_space = false;
            match line.last_mut() {
                Some(last) if last.bold == style.bold && last.color == style.color => {
                    last.text.push_str(&chunk)
                }
                _ => line.push(TextSpan {
                    text: chunk,
                    bold: style.bold,
                    size: BODY_SIZE,
                    color: style.color,
                }),
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn split_keep_spaces(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (i, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        if in_space.is_some_and(|s| s != is_space) {
            parts.push(&text[start..i]);
            start = i;
        }
        in_space = Some(is_space);
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

fn page_content(page: &Page, number: usize, total: usize) -> Vec<u8> {
    let mut ops: Vec<u8> = Vec::new();

    let header = TextLine {
        x: MARGIN_MM,
        baseline: MARGIN_MM + 4.0 + HEADER_SIZE * 0.35 / PT_PER_MM,
        spans: vec![TextSpan {
            text: HEADER_TEXT.to_string(),
            bold: true,
            size: HEADER_SIZE,
            color: HEADER_COLOR,
        }],
    };
    let footer_text = format!("Page {number}/{total}");
    let footer_width = text_width(&footer_text, false, FOOTER_SIZE);
    let footer = TextLine {
        x: (PAGE_WIDTH_MM - footer_width) / 2.0,
        baseline: PAGE_HEIGHT_MM - MARGIN_MM + 4.0 + FOOTER_SIZE * 0.35 / PT_PER_MM,
        spans: vec![TextSpan {
            text: footer_text,
            bold: false,
            size: FOOTER_SIZE,
            color: Palette::default().style(StyleClass::Normal).color,
        }],
    };

    for line in std::iter::once(&header).chain(page.lines.iter()).chain(std::iter::once(&footer)) {
        write_line(&mut ops, line);
    }
    for rule in &page.rules {
        let y = (PAGE_HEIGHT_MM - rule.y) * PT_PER_MM;
        ops.extend_from_slice(
            format!(
                "{} RG 0.2 w {:.2} {y:.2} m {:.2} {y:.2} l S\n",
                color_ops(rule.color),
                rule.x1 * PT_PER_MM,
                rule.x2 * PT_PER_MM
            )
            .as_bytes(),
        );
    }
    ops
}

fn write_line(ops: &mut Vec<u8>, line: &TextLine) {
    if line.spans.is_empty() {
        return;
    }
    let x = line.x * PT_PER_MM;
    let y = (PAGE_HEIGHT_MM - line.baseline) * PT_PER_MM;
    ops.extend_from_slice(format!("BT {x:.2} {y:.2} Td\n").as_bytes());
    for span in &line.spans {
        let font = if span.bold { "F2" } else { "F1" };
        ops.extend_from_slice(
            format!("/{font} {} Tf {} rg (", span.size, color_ops(span.color)).as_bytes(),
        );
        ops.extend_from_slice(&pdf_string(&span.text));
        ops.extend_from_slice(b") Tj\n");
    }
    ops.extend_from_slice(b"ET\n");
}

fn color_ops(color: Rgb) -> String {
    format!(
        "{:.3} {:.3} {:.3}",
        f32::from(color.0) / 255.0,
        f32::from(color.1) / 255.0,
        f32::from(color.2) / 255.0
    )
}

/// Encode to WinAnsi and escape for a literal string. Unmappable characters become `?`.
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let (bytes, _, had_errors) = WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
        if had_errors {
            out.push(b'?');
            continue;
        }
        for &b in bytes.iter() {
            if matches!(b, b'(' | b')' | b'\\') {
                out.push(b'\\');
            }
            out.push(b);
        }
    }
    out
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(pdf_io_error)?;
    encoder.finish().map_err(pdf_io_error)
}

fn begin_object(out: &mut Vec<u8>, offsets: &mut Vec<usize>, id: usize) -> Result<(), AppError> {
    offsets.push(out.len());
    debug_assert_eq!(offsets.len(), id);
    write_raw(out, format!("{id} 0 obj\n").as_bytes())
}

fn write_raw(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), AppError> {
    out.write_all(bytes).map_err(pdf_io_error)
}

fn pdf_io_error(e: std::io::Error) -> AppError {
    AppError::new("EXPORT_PDF_FAILED", "Failed to write PDF document").with_details(e.to_string())
}

/// Approximate rendered width in millimetres using the Helvetica metrics.
fn text_width(text: &str, bold: bool, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, bold)).sum();
    units as f32 * size / 1000.0 / PT_PER_MM
}

fn glyph_width(c: char, bold: bool) -> u32 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    match c {
        ' '..='~' => u32::from(table[c as usize - 32]),
        _ => 556,
    }
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];
