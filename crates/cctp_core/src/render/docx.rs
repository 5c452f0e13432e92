//! Rich-text backend: a minimal WordprocessingML package written with `zip`.

use std::io::{self, Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{render_document, DocumentBackend, EmittedSpan, ExportOptions, Palette, SpanSink, StyleClass};
use crate::domain::{ChapterMap, GeneratedTexts, Outline};
use crate::error::AppError;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:pPr><w:spacing w:after="120"/></w:pPr>
    <w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="26"/></w:rPr>
  </w:style>
</w:styles>"#;

/// Render the outline to DOCX bytes.
pub fn render_docx(
    outline: &Outline,
    texts: &GeneratedTexts,
    chapter_map: &ChapterMap,
    options: &ExportOptions,
) -> Result<Vec<u8>, AppError> {
    let mut builder = DocxBuilder::new(Palette::default());
    render_document(outline, texts, chapter_map, options, &mut builder);
    builder.to_bytes()
}

/// In-memory `word/document.xml` body plus the span trace.
#[derive(Debug)]
pub struct DocxBuilder {
    palette: Palette,
    body: String,
    paragraph: Option<String>,
    trace: Vec<EmittedSpan>,
}

impl DocxBuilder {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            body: String::new(),
            paragraph: None,
            trace: Vec::new(),
        }
    }

    pub fn emitted_spans(&self) -> &[EmittedSpan] {
        &self.trace
    }

    pub fn document_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
             <w:pgMar w:top=\"850\" w:right=\"850\" w:bottom=\"850\" w:left=\"850\" w:header=\"425\" w:footer=\"425\" w:gutter=\"0\"/>\
             </w:sectPr></w:body></w:document>",
            self.body
        )
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AppError> {
        let document = self.document_xml();
        write_package(&document).map_err(|e| {
            AppError::new("EXPORT_DOCX_FAILED", "Failed to write DOCX package").with_details(e.to_string())
        })
    }

    fn push_run(&mut self, class: StyleClass, text: &str) {
        self.trace.push(EmittedSpan {
            class,
            text: text.to_string(),
        });
        let style = self.palette.style(class);
        let bold = if style.bold { "<w:b/>" } else { "" };
        let run = format!(
            "<w:r><w:rPr>{bold}<w:color w:val=\"{}\"/></w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r>",
            style.color.hex(),
            escape(text)
        );
        self.paragraph.get_or_insert_with(String::new).push_str(&run);
    }

    fn heading(&mut self, style_id: &str, text: &str) {
        self.body.push_str(&format!(
            "<w:p><w:pPr><w:pStyle w:val=\"{style_id}\"/></w:pPr><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
            escape(text)
        ));
    }
}

impl SpanSink for DocxBuilder {
    fn normal(&mut self, text: &str) {
        self.push_run(StyleClass::Normal, text);
    }

    fn open_item(&mut self, text: &str) {
        self.push_run(StyleClass::OpenItem, text);
    }

    fn citation(&mut self, text: &str) {
        self.push_run(StyleClass::Citation, text);
    }

    fn resolved_reference(&mut self, text: &str) {
        self.push_run(StyleClass::ResolvedReference, text);
    }

    fn line_break(&mut self) {
        self.paragraph
            .get_or_insert_with(String::new)
            .push_str("<w:r><w:br/></w:r>");
    }
}

impl DocumentBackend for DocxBuilder {
    fn group_heading(&mut self, ordinal: usize, name: &str) {
        self.heading("Heading1", &format!("{ordinal}. {name}"));
    }

    fn section_heading(&mut self, number: &str, title: &str) {
        self.heading("Heading2", format!("{number} {title}").trim());
    }

    fn begin_paragraph(&mut self) {
        self.paragraph = Some(String::new());
    }

    fn end_paragraph(&mut self) {
        let runs = self.paragraph.take().unwrap_or_default();
        self.body.push_str(&format!("<w:p>{runs}</w:p>"));
    }

    fn list_heading(&mut self, label: &str) {
        self.body.push_str(&format!(
            "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">{}:</w:t></w:r></w:p>",
            escape(label)
        ));
    }
}

fn write_package(document_xml: &str) -> io::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &str); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", PACKAGE_RELS_XML),
        ("word/document.xml", document_xml),
        ("word/styles.xml", STYLES_XML),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML),
    ];
    for (name, content) in parts {
        zip.start_file(name, deflated).map_err(io_error)?;
        zip.write_all(content.as_bytes())?;
    }
    let cursor = zip.finish().map_err(io_error)?;
    Ok(cursor.into_inner())
}

fn io_error(e: zip::result::ZipError) -> io::Error {
    io::Error::other(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_carry_palette_styles_and_escaped_text() {
        let mut builder = DocxBuilder::new(Palette::default());
        builder.begin_paragraph();
        builder.normal("a < b ");
        builder.open_item("[À VALIDER]");
        builder.end_paragraph();
        let xml = builder.document_xml();
        assert!(xml.contains("a &lt; b "));
        assert!(xml.contains("<w:b/><w:color w:val=\"DC3545\"/>"));
        assert!(xml.contains("<w:color w:val=\"696C6F\"/>"));
    }

    #[test]
    fn headings_use_outline_styles() {
        let mut builder = DocxBuilder::new(Palette::default());
        builder.group_heading(2, "Menuiseries");
        builder.section_heading("", "Portes");
        let xml = builder.document_xml();
        assert!(xml.contains("<w:pStyle w:val=\"Heading1\"/></w:pPr><w:r><w:t xml:space=\"preserve\">2. Menuiseries</w:t>"));
        assert!(xml.contains("<w:t xml:space=\"preserve\">Portes</w:t>"));
    }
}
