//! On-disk knowledge base: the structured corpus built by ingestion and read by the
//! example matcher.

mod ingest;
mod store;

pub use ingest::{
    group_name_for, ingest_directory, join_pages, read_document_text, IngestSummary, IngestionGuard, IngestionJob, IngestionStatus,
    PageTextExtractor, PlainTextPages,
};
pub use store::{KnowledgeStatus, KnowledgeStore, RawKnowledge, KB_JSON_FILE, KB_TEXT_FILE, SOURCE_DOCUMENT_PREFIX};
