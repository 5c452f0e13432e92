use std::path::Path;

use cctp_ai::knowledge::{ingest_directory, IngestionJob, KnowledgeStore, PlainTextPages};
use cctp_ai::retrieve::{find_examples_in_raw, ExampleLimits};

use super::print_json;
use crate::config::Config;

pub fn knowledge_store(config: &Config) -> KnowledgeStore {
    KnowledgeStore::open(config.knowledge_dir())
}

pub fn run_ingest(config: &Config, dir: &Path) -> color_eyre::Result<()> {
    let store = knowledge_store(config);
    let job = IngestionJob::new();
    let summary = ingest_directory(&store, &job, &PlainTextPages, dir)?;
    for name in &summary.skipped {
        tracing::warn!(file = %name, "not included in the knowledge base");
    }
    print_json(&summary)
}

pub fn run_status(config: &Config) -> color_eyre::Result<()> {
    print_json(&knowledge_store(config).status()?)
}

pub fn run_examples(
    config: &Config,
    title: &str,
    max_count: Option<usize>,
    max_chars: Option<usize>,
) -> color_eyre::Result<()> {
    let limits = ExampleLimits {
        max_count: max_count.unwrap_or(config.examples.max_count),
        max_total_chars: max_chars.unwrap_or(config.examples.max_total_chars),
    };
    let examples = match knowledge_store(config).load_raw()? {
        Some(raw) => find_examples_in_raw(title, &raw, limits),
        None => {
            tracing::info!("no knowledge base yet; run `cctp ingest` first");
            Vec::new()
        }
    };
    print_json(&examples)
}
