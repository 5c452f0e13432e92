use std::fs;
use std::path::{Path, PathBuf};

use cctp_ai::knowledge::{join_pages, read_document_text, PlainTextPages};
use cctp_core::annotate::extract;
use cctp_core::domain::{ChapterMap, GeneratedTexts, Outline};
use cctp_core::outline::{build_chapter_map, section_library};
use cctp_core::render::{render, ExportFormat, ExportOptions, MarkerPlacement};
use cctp_core::structure::parse_document_structure;
use clap::{Args, ValueEnum};
use color_eyre::eyre::WrapErr;
use serde::Serialize;
use time::{Date, OffsetDateTime};

use super::{print_json, read_input, read_json};
use crate::config::Config;

/// Document text from a file or from stdin (`-`), pages separated by form feeds.
fn load_document_text(file: &str) -> color_eyre::Result<String> {
    if file == "-" {
        let text = read_input(file)?;
        return Ok(join_pages(&PlainTextPages::split_pages(&text)));
    }
    Ok(read_document_text(&PlainTextPages, Path::new(file))?)
}

pub fn run_parse(file: &str) -> color_eyre::Result<()> {
    let text = load_document_text(file)?;
    let sections = parse_document_structure(&text);
    tracing::info!(file, sections = sections.len(), "document parsed");
    print_json(&sections)
}

pub fn run_library(outline_paths: &[String]) -> color_eyre::Result<()> {
    let outlines = outline_paths
        .iter()
        .map(|p| read_json::<Outline>(p))
        .collect::<color_eyre::Result<Vec<_>>>()?;
    print_json(&section_library(&outlines))
}

/// Chapter map from an explicit file, else numbered from the outline, else empty.
fn load_chapter_map(chapter_map: Option<&str>, outline: Option<&Outline>) -> color_eyre::Result<ChapterMap> {
    match (chapter_map, outline) {
        (Some(path), _) => read_json(path),
        (None, Some(outline)) => Ok(build_chapter_map(outline)),
        (None, None) => Ok(ChapterMap::default()),
    }
}

#[derive(Args)]
pub struct ExtractCommand {
    /// Section text file, or `-` for stdin
    file: String,

    /// Outline JSON used to number cross-reference targets
    #[arg(long)]
    outline: Option<String>,

    /// Explicit chapter map JSON (takes precedence over --outline)
    #[arg(long)]
    chapter_map: Option<String>,

    /// Drop open items and citations instead of collecting them
    #[arg(long)]
    no_markers: bool,
}

impl ExtractCommand {
    pub fn run(self) -> color_eyre::Result<()> {
        let text = read_input(&self.file)?;
        let outline = self.outline.as_deref().map(read_json::<Outline>).transpose()?;
        let chapter_map = load_chapter_map(self.chapter_map.as_deref(), outline.as_ref())?;
        print_json(&extract(&text, &chapter_map, !self.no_markers))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Docx,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Docx => ExportFormat::Docx,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PlacementArg {
    Inline,
    Appendix,
}

impl From<PlacementArg> for MarkerPlacement {
    fn from(value: PlacementArg) -> Self {
        match value {
            PlacementArg::Inline => MarkerPlacement::Inline,
            PlacementArg::Appendix => MarkerPlacement::Appendix,
        }
    }
}

#[derive(Args)]
pub struct ExportCommand {
    /// Outline JSON: ordered groups with ordered sections
    #[arg(long)]
    outline: String,

    /// Generated texts JSON, keyed by group name then section title
    #[arg(long)]
    texts: String,

    /// Explicit chapter map JSON; numbered from the outline when absent
    #[arg(long)]
    chapter_map: Option<String>,

    #[arg(long, value_enum, default_value = "pdf")]
    format: FormatArg,

    #[arg(long, value_enum, default_value = "inline")]
    placement: PlacementArg,

    /// Leave open items and citations out of the export
    #[arg(long)]
    no_markers: bool,

    /// Output path; defaults to `<data_dir>/exports/CCTP_<YYYYMMDD>.<ext>`
    #[arg(long, short)]
    out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ExportResult {
    path: String,
    bytes: usize,
}

impl ExportCommand {
    pub fn run(self, config: &Config) -> color_eyre::Result<()> {
        let outline: Outline = read_json(&self.outline)?;
        let texts: GeneratedTexts = read_json(&self.texts)?;
        let chapter_map = load_chapter_map(self.chapter_map.as_deref(), Some(&outline))?;
        let format = ExportFormat::from(self.format);
        let options = ExportOptions {
            include_markers: !self.no_markers,
            placement: self.placement.into(),
        };

        let bytes = render(format, &outline, &texts, &chapter_map, &options)?;

        let path = match self.out {
            Some(path) => path,
            None => config
                .exports_dir()
                .join(export_file_name(format, OffsetDateTime::now_utc().date())),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, &bytes).wrap_err_with(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "document exported");

        print_json(&ExportResult {
            path: path.display().to_string(),
            bytes: bytes.len(),
        })
    }
}

/// Suggested export name: `CCTP_<YYYYMMDD>.<ext>`.
pub fn export_file_name(format: ExportFormat, date: Date) -> String {
    format!(
        "CCTP_{:04}{:02}{:02}.{}",
        date.year(),
        u8::from(date.month()),
        date.day(),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn export_names_carry_date_and_extension() {
        let date = Date::from_calendar_date(2026, Month::March, 7).expect("valid date");
        assert_eq!(export_file_name(ExportFormat::Pdf, date), "CCTP_20260307.pdf");
        assert_eq!(export_file_name(ExportFormat::Docx, date), "CCTP_20260307.docx");
    }

    #[test]
    fn document_text_is_read_page_by_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lot.txt");
        fs::write(&path, "1 Objet\nTexte\u{c}2 Suite\nFin").expect("write");
        let text = load_document_text(path.to_str().expect("utf-8 path")).expect("read");
        assert_eq!(text, "1 Objet\nTexte\n2 Suite\nFin\n");
        let sections = parse_document_structure(&text);
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn chapter_map_defaults_to_outline_numbering() {
        let outline: Outline = serde_json::from_str(
            r#"[{"name": "Gros oeuvre", "sections": [{"title": "Fondations"}, {"title": "Murs"}]}]"#,
        )
        .expect("outline");
        let map = load_chapter_map(None, Some(&outline)).expect("map");
        assert_eq!(map.number_for("Gros oeuvre", "Murs"), "1.2");
        assert!(load_chapter_map(None, None).expect("empty").is_empty());
    }
}
