use std::fs;
use std::path::{Path, PathBuf};

use cctp_core::domain::KnowledgeBase;
use cctp_core::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const KB_JSON_FILE: &str = "knowledge_base.json";
pub const KB_TEXT_FILE: &str = "knowledge_base.txt";
/// Opening line of each document block in the plain-text companion file.
pub const SOURCE_DOCUMENT_PREFIX: &str = "--- SOURCE DOCUMENT: ";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeStatus {
    pub present: bool,
    pub analysed_at: Option<String>,
    pub document_count: u32,
    pub section_count: u32,
    pub sha256: Option<String>,
}

/// The persisted artifact as read from disk, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKnowledge {
    /// Contents of `knowledge_base.json`. Not guaranteed to be valid JSON.
    Json(String),
    /// Contents of the plain-text companion, used when no JSON artifact exists.
    Text(String),
}

#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    root: PathBuf,
}

impl KnowledgeStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn json_path(&self) -> PathBuf {
        self.root.join(KB_JSON_FILE)
    }

    pub fn text_path(&self) -> PathBuf {
        self.root.join(KB_TEXT_FILE)
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root.as_path()).map_err(|e| {
            AppError::new("KB_STORE_FAILED", "Failed to create knowledge base directory")
                .with_details(format!("path={}; err={}", self.root.display(), e))
        })
    }

    /// Replace the whole knowledge base. Both artifacts are staged next to their final
    /// paths and only renamed into place once both were written.
    pub fn replace(&self, kb: &KnowledgeBase) -> Result<KnowledgeStatus, AppError> {
        self.ensure_dirs()?;
        let json = serde_json::to_string_pretty(kb).map_err(|e| {
            AppError::new("KB_STORE_FAILED", "Failed to encode knowledge base").with_details(e.to_string())
        })?;
        let text = render_text_companion(kb);

        let json_path = self.json_path();
        let text_path = self.text_path();
        let json_tmp = json_path.with_extension("json.tmp");
        let text_tmp = text_path.with_extension("txt.tmp");
        write_file(&json_tmp, json.as_bytes())?;
        write_file(&text_tmp, text.as_bytes())?;
        rename_file(&json_tmp, &json_path)?;
        rename_file(&text_tmp, &text_path)?;

        tracing::info!(
            documents = kb.document_count(),
            sections = kb.section_count(),
            path = %json_path.display(),
            "knowledge base replaced"
        );
        self.status()
    }

    /// Load the typed knowledge base, or `None` when it was never built.
    pub fn load(&self) -> Result<Option<KnowledgeBase>, AppError> {
        let path = self.json_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("KB_STORE_FAILED", "Failed to read knowledge base")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let kb = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("KB_CORRUPT", "Failed to decode knowledge base")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Ok(Some(kb))
    }

    /// Read whichever artifact exists, JSON first, without interpreting it.
    pub fn load_raw(&self) -> Result<Option<RawKnowledge>, AppError> {
        let json_path = self.json_path();
        if json_path.exists() {
            return read_string(&json_path).map(|s| Some(RawKnowledge::Json(s)));
        }
        let text_path = self.text_path();
        if text_path.exists() {
            return read_string(&text_path).map(|s| Some(RawKnowledge::Text(s)));
        }
        Ok(None)
    }

    pub fn status(&self) -> Result<KnowledgeStatus, AppError> {
        let path = self.json_path();
        if !path.exists() {
            return Ok(KnowledgeStatus {
                present: false,
                analysed_at: None,
                document_count: 0,
                section_count: 0,
                sha256: None,
            });
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("KB_STORE_FAILED", "Failed to read knowledge base")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let sha256 = hex::encode(Sha256::digest(&bytes));
        let analysed_at = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| OffsetDateTime::from(t).format(&Rfc3339).ok());

        let (document_count, section_count) = match serde_json::from_slice::<KnowledgeBase>(&bytes) {
            Ok(kb) => (kb.document_count() as u32, kb.section_count() as u32),
            Err(e) => {
                tracing::warn!(path = %path.display(), err = %e, "knowledge base does not match the expected shape");
                (0, 0)
            }
        };

        Ok(KnowledgeStatus {
            present: true,
            analysed_at,
            document_count,
            section_count,
            sha256: Some(sha256),
        })
    }
}

/// Plain-text rendition: one block per document, each section as title line, content and
/// a blank line.
pub(crate) fn render_text_companion(kb: &KnowledgeBase) -> String {
    let mut out = String::new();
    for (document, groups) in kb.documents.iter() {
        out.push_str(&format!("{SOURCE_DOCUMENT_PREFIX}{document} ---\n"));
        for section in groups.iter().flat_map(|g| g.sections.iter()) {
            out.push_str(&format!("{}\n{}\n\n", section.title, section.content));
        }
    }
    out
}

fn read_string(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|e| {
        AppError::new("KB_STORE_FAILED", "Failed to read knowledge base")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    fs::write(path, bytes).map_err(|e| {
        AppError::new("KB_STORE_FAILED", "Failed to write knowledge base")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

fn rename_file(tmp: &Path, dest: &Path) -> Result<(), AppError> {
    fs::rename(tmp, dest).map_err(|e| {
        AppError::new("KB_STORE_FAILED", "Failed to finalize knowledge base write")
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), dest.display(), e))
    })
}
