//! The stored system instruction, `system_prompt.txt` under the data directory.

use std::fs;
use std::path::{Path, PathBuf};

use cctp_core::error::AppError;

use super::prompts::DEFAULT_SYSTEM_PROMPT;

pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.txt";

#[derive(Debug, Clone)]
pub struct SystemPromptStore {
    path: PathBuf,
}

impl SystemPromptStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SYSTEM_PROMPT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The custom prompt when one is stored and non-blank, else the built-in default.
    pub fn load(&self) -> Result<String, AppError> {
        match self.load_custom()? {
            Some(custom) => Ok(custom),
            None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    pub fn is_custom(&self) -> Result<bool, AppError> {
        Ok(self.load_custom()?.is_some())
    }

    fn load_custom(&self) -> Result<Option<String>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path).map_err(|e| {
            AppError::new("AI_PROMPT_READ_FAILED", "Failed to read system prompt")
                .with_details(format!("path={}; err={}", self.path.display(), e))
        })?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }

    pub fn save(&self, prompt: &str) -> Result<(), AppError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::new(
                "AI_PROMPT_EMPTY",
                "The system prompt cannot be empty",
            ));
        }
        let write_err = |path: &Path, e: std::io::Error| {
            AppError::new("AI_PROMPT_WRITE_FAILED", "Failed to save system prompt")
                .with_details(format!("path={}; err={}", path.display(), e))
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
        }
        let tmp = self.path.with_extension("txt.tmp");
        fs::write(&tmp, prompt).map_err(|e| write_err(tmp.as_path(), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| write_err(self.path.as_path(), e))?;
        tracing::info!(path = %self.path.display(), "system prompt saved");
        Ok(())
    }

    /// Drop the custom prompt so the default applies again.
    pub fn reset(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::new("AI_PROMPT_WRITE_FAILED", "Failed to reset system prompt")
                .with_details(format!("path={}; err={}", self.path.display(), e))),
        }
    }
}
