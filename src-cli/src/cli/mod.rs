//! Command-line surface. Every subcommand maps onto one library operation and prints JSON
//! to stdout; logs go to stderr.
//!
//! Subcommands:
//! - `parse`, `extract`, `export`, `library`: document pipeline
//! - `ingest`, `kb-status`, `examples`: knowledge base
//! - `generate`, `prompt`, `doctor`: text generation

mod document;
mod draft;
mod knowledge;

use std::fs;
use std::io::Read;
use std::path::Path;

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;

pub use document::{ExportCommand, ExtractCommand};
pub use draft::{GenerateCommand, PromptCommand};

/// cctp - CCTP drafting assistant
#[derive(Parser)]
#[command(name = "cctp")]
#[command(about = "Draft, annotate and export CCTP construction specifications")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Split a plain-text document (form feeds between pages) into sections
    Parse {
        /// Text file, or `-` for stdin
        file: String,
    },

    /// Rebuild the knowledge base from a directory of extracted documents
    Ingest {
        /// Directory holding `.txt` extractions
        dir: String,
    },

    /// Show knowledge base presence, counts and checksum
    KbStatus,

    /// List knowledge base excerpts matching a section title
    Examples {
        title: String,

        #[arg(long)]
        max_count: Option<usize>,

        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Separate a section text into body, open items, citations and cross-references
    Extract(ExtractCommand),

    /// Draft or rewrite one section with the text generator
    Generate(GenerateCommand),

    /// Export an outline and its texts to PDF or DOCX
    Export(ExportCommand),

    /// Show, replace or improve the system prompt
    Prompt {
        #[command(subcommand)]
        command: PromptCommand,
    },

    /// Check that the text generation service is reachable with the configured key
    Doctor,

    /// Sorted unique section titles across project outlines
    Library {
        /// Outline JSON files
        #[arg(required = true)]
        outlines: Vec<String>,
    },
}

impl App {
    pub fn run(self, config: &Config) -> color_eyre::Result<()> {
        match self.command {
            Command::Parse { file } => document::run_parse(&file),
            Command::Ingest { dir } => knowledge::run_ingest(config, Path::new(&dir)),
            Command::KbStatus => knowledge::run_status(config),
            Command::Examples {
                title,
                max_count,
                max_chars,
            } => knowledge::run_examples(config, &title, max_count, max_chars),
            Command::Extract(cmd) => cmd.run(),
            Command::Generate(cmd) => cmd.run(config),
            Command::Export(cmd) => cmd.run(config),
            Command::Prompt { command } => command.run(config),
            Command::Doctor => draft::run_doctor(config),
            Command::Library { outlines } => document::run_library(&outlines),
        }
    }
}

/// Read a text input; `-` means stdin.
fn read_input(path: &str) -> color_eyre::Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .wrap_err("failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).wrap_err_with(|| format!("failed to read {path}"))
}

fn read_json<T: DeserializeOwned>(path: &str) -> color_eyre::Result<T> {
    let text = read_input(path)?;
    serde_json::from_str(&text).wrap_err_with(|| format!("{path} is not valid JSON for this input"))
}

fn print_json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    let out = serde_json::to_string_pretty(value).wrap_err("failed to encode output")?;
    println!("{out}");
    Ok(())
}
