use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use cctp_core::domain::{KnowledgeBase, SectionGroup};
use cctp_core::error::AppError;
use cctp_core::structure::parse_document_structure;
use serde::{Deserialize, Serialize};

use super::store::{KnowledgeStatus, KnowledgeStore};

/// Text extraction collaborator: one string per page of a source document.
pub trait PageTextExtractor {
    /// Extension (without dot) of the files this extractor reads, matched case-insensitively.
    fn file_extension(&self) -> &str;
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, AppError>;
}

/// Reads text already extracted from PDFs, with pages separated by form feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextPages;

impl PageTextExtractor for PlainTextPages {
    fn file_extension(&self) -> &str {
        "txt"
    }

    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, AppError> {
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::new("INGEST_EXTRACT_FAILED", "Failed to read source document")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Ok(PlainTextPages::split_pages(&text))
    }
}

impl PlainTextPages {
    /// Split `pdftotext`-style output on form feeds.
    pub fn split_pages(text: &str) -> Vec<String> {
        text.split('\u{c}').map(str::to_string).collect()
    }
}

/// Snapshot of the ingestion job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestionStatus {
    pub running: bool,
    pub progress: u32,
    pub max_files: u32,
    pub current_file: Option<String>,
    pub error: Option<String>,
}

/// Single-writer state of the ingestion job. Readers only ever see copies.
#[derive(Debug, Default)]
pub struct IngestionJob {
    state: Mutex<IngestionStatus>,
}

impl IngestionJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> IngestionStatus {
        self.lock().clone()
    }

    /// Claim the job for a run over `max_files` documents. Fails while another run holds it.
    pub fn start(&self, max_files: u32) -> Result<IngestionGuard<'_>, AppError> {
        let mut state = self.lock();
        if state.running {
            return Err(AppError::new(
                "INGEST_ALREADY_RUNNING",
                "An analysis of the knowledge base is already running",
            )
            .with_details(format!("progress={}/{}", state.progress, state.max_files)));
        }
        *state = IngestionStatus {
            running: true,
            progress: 0,
            max_files,
            current_file: None,
            error: None,
        };
        Ok(IngestionGuard {
            job: self,
            finished: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, IngestionStatus> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive handle on a running job. Dropping it without [`IngestionGuard::finish`] marks
/// the run as interrupted.
#[derive(Debug)]
pub struct IngestionGuard<'a> {
    job: &'a IngestionJob,
    finished: bool,
}

impl IngestionGuard<'_> {
    pub fn begin_file(&self, name: &str) {
        self.job.lock().current_file = Some(name.to_string());
    }

    pub fn complete_file(&self) {
        let mut state = self.job.lock();
        state.progress = (state.progress + 1).min(state.max_files);
    }

    pub fn fail(mut self, err: &AppError) {
        let mut state = self.job.lock();
        state.running = false;
        state.current_file = None;
        state.error = Some(err.to_string());
        self.finished = true;
    }

    pub fn finish(mut self) {
        let mut state = self.job.lock();
        state.running = false;
        state.current_file = None;
        self.finished = true;
    }
}

impl Drop for IngestionGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.job.lock();
        state.running = false;
        state.current_file = None;
        if state.error.is_none() {
            state.error = Some("analysis interrupted".to_string());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestSummary {
    pub documents: u32,
    pub sections: u32,
    /// Documents that could not be read or had no text.
    pub skipped: Vec<String>,
    pub status: KnowledgeStatus,
}

/// Rebuild the knowledge base from every matching document in `dir`.
///
/// Documents are processed one at a time in name order. The previous base stays in place
/// until the run has produced a complete replacement.
pub fn ingest_directory(
    store: &KnowledgeStore,
    job: &IngestionJob,
    extractor: &dyn PageTextExtractor,
    dir: &Path,
) -> Result<IngestSummary, AppError> {
    let files = list_source_documents(dir, extractor.file_extension())?;
    if files.is_empty() {
        return Err(AppError::new(
            "INGEST_NO_DOCUMENTS",
            "No source documents found in directory",
        )
        .with_details(format!("path={}; extension={}", dir.display(), extractor.file_extension())));
    }

    let guard = job.start(files.len() as u32)?;
    tracing::info!(files = files.len(), dir = %dir.display(), "knowledge base analysis started");

    let mut kb = KnowledgeBase::new();
    let mut skipped = Vec::new();
    for path in &files {
        let name = file_name(path);
        guard.begin_file(&name);
        match read_document_text(extractor, path) {
            Ok(text) => {
                if text.trim().is_empty() {
                    tracing::warn!(file = %name, "source document has no text; skipped");
                    skipped.push(name.clone());
                } else {
                    let sections = parse_document_structure(&text);
                    tracing::debug!(file = %name, sections = sections.len(), "source document parsed");
                    kb.insert(
                        name.clone(),
                        vec![SectionGroup {
                            group_name: group_name_for(path),
                            sections,
                        }],
                    );
                }
            }
            Err(e) => {
                tracing::warn!(file = %name, err = %e, "source document could not be read; skipped");
                skipped.push(name.clone());
            }
        }
        guard.complete_file();
    }

    if kb.is_empty() {
        let err = AppError::new("INGEST_NO_CONTENT", "No source document produced any text")
            .with_details(format!("path={}; skipped={}", dir.display(), skipped.len()));
        guard.fail(&err);
        return Err(err);
    }

    let status = match store.replace(&kb) {
        Ok(status) => status,
        Err(e) => {
            guard.fail(&e);
            return Err(e);
        }
    };
    guard.finish();
    tracing::info!(
        documents = kb.document_count(),
        skipped = skipped.len(),
        "knowledge base analysis finished"
    );

    Ok(IngestSummary {
        documents: kb.document_count() as u32,
        sections: kb.section_count() as u32,
        skipped,
        status,
    })
}

/// Full text of one source document: its pages in order, each followed by a line break.
pub fn read_document_text(extractor: &dyn PageTextExtractor, path: &Path) -> Result<String, AppError> {
    Ok(join_pages(&extractor.extract_pages(path)?))
}

pub fn join_pages(pages: &[String]) -> String {
    pages.iter().map(|p| format!("{p}\n")).collect()
}

/// Group name derived from a file name: the stem with `_` as spaces, title-cased.
pub fn group_name_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().replace('_', " "))
        .unwrap_or_default();
    title_case(&stem)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

fn list_source_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, AppError> {
    if !dir.is_dir() {
        return Err(AppError::new(
            "INGEST_DIR_INVALID",
            "Source directory does not exist or is not a directory",
        )
        .with_details(format!("path={}", dir.display())));
    }
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::new("INGEST_DIR_INVALID", "Failed to list source directory")
            .with_details(format!("path={}; err={}", dir.display(), e))
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
