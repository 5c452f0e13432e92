use std::fs;
use std::path::Path;

use cctp_ai::knowledge::{
    ingest_directory, IngestionJob, KnowledgeStore, PageTextExtractor, PlainTextPages, RawKnowledge,
    KB_JSON_FILE, KB_TEXT_FILE,
};
use cctp_core::error::AppError;
use pretty_assertions::assert_eq;

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).expect("write source document");
}

#[test]
fn ingest_builds_base_and_companion() {
    let sources = tempfile::tempdir().expect("sources");
    let data = tempfile::tempdir().expect("data");
    write(
        sources.path(),
        "lot_05_menuiseries.txt",
        "1 Portes\nPortes isoplanes.\u{c}2 Fenêtres\nMenuiseries PVC.\n",
    );
    write(sources.path(), "notes.md", "ignored");

    let store = KnowledgeStore::open(data.path().join("knowledge_base"));
    let job = IngestionJob::new();
    let summary = ingest_directory(&store, &job, &PlainTextPages, sources.path()).expect("ingest");

    assert_eq!(summary.documents, 1);
    assert_eq!(summary.sections, 2);
    assert!(summary.skipped.is_empty());
    assert!(summary.status.present);
    assert_eq!(summary.status.section_count, 2);
    assert_eq!(summary.status.sha256.as_deref().map(str::len), Some(64));

    let kb = store.load().expect("load").expect("present");
    let groups = &kb.documents["lot_05_menuiseries.txt"];
    assert_eq!(groups[0].group_name, "Lot 05 Menuiseries");
    assert_eq!(groups[0].sections[1].title, "Fenêtres");

    let companion = fs::read_to_string(store.root().join(KB_TEXT_FILE)).expect("companion");
    assert_eq!(
        companion,
        "--- SOURCE DOCUMENT: lot_05_menuiseries.txt ---\nPortes\nPortes isoplanes.\n\nFenêtres\nMenuiseries PVC.\n\n"
    );

    let snap = job.snapshot();
    assert!(!snap.running);
    assert_eq!((snap.progress, snap.max_files), (1, 1));
    assert_eq!(snap.error, None);
}

#[test]
fn blank_documents_are_skipped() {
    let sources = tempfile::tempdir().expect("sources");
    let data = tempfile::tempdir().expect("data");
    write(sources.path(), "a.txt", "  \n\u{c}\n");
    write(sources.path(), "b.txt", "Généralités\nTexte courant.\n");

    let store = KnowledgeStore::open(data.path().to_path_buf());
    let summary = ingest_directory(&store, &IngestionJob::new(), &PlainTextPages, sources.path())
        .expect("ingest");
    assert_eq!(summary.skipped, vec!["a.txt".to_string()]);
    assert_eq!(summary.documents, 1);
}

#[test]
fn directory_errors_are_reported() {
    let data = tempfile::tempdir().expect("data");
    let store = KnowledgeStore::open(data.path().to_path_buf());
    let job = IngestionJob::new();

    let missing = ingest_directory(&store, &job, &PlainTextPages, &data.path().join("nope"))
        .expect_err("missing dir");
    assert_eq!(missing.code, "INGEST_DIR_INVALID");

    let empty = tempfile::tempdir().expect("empty");
    let none = ingest_directory(&store, &job, &PlainTextPages, empty.path()).expect_err("no documents");
    assert_eq!(none.code, "INGEST_NO_DOCUMENTS");
    assert!(!store.status().expect("status").present);
}

struct FailingPages;

impl PageTextExtractor for FailingPages {
    fn file_extension(&self) -> &str {
        "pdf"
    }

    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, AppError> {
        Err(AppError::new("INGEST_EXTRACT_FAILED", "unreadable").with_details(path.display().to_string()))
    }
}

#[test]
fn failed_run_keeps_previous_base() {
    let sources = tempfile::tempdir().expect("sources");
    let data = tempfile::tempdir().expect("data");
    write(sources.path(), "a.txt", "1 Portes\nBois.\n");
    write(sources.path(), "a.pdf", "%PDF");

    let store = KnowledgeStore::open(data.path().to_path_buf());
    let job = IngestionJob::new();
    let first = ingest_directory(&store, &job, &PlainTextPages, sources.path()).expect("first run");

    let err = ingest_directory(&store, &job, &FailingPages, sources.path()).expect_err("second run");
    assert_eq!(err.code, "INGEST_NO_CONTENT");
    assert!(job.snapshot().error.is_some());
    assert_eq!(store.status().expect("status").sha256, first.status.sha256);
}

#[test]
fn raw_load_prefers_json_then_text() {
    let data = tempfile::tempdir().expect("data");
    let store = KnowledgeStore::open(data.path().to_path_buf());
    assert_eq!(store.load_raw().expect("raw"), None);

    fs::write(store.root().join(KB_TEXT_FILE), "--- SOURCE DOCUMENT: a ---\n").expect("text");
    assert!(matches!(store.load_raw().expect("raw"), Some(RawKnowledge::Text(_))));

    fs::write(store.root().join(KB_JSON_FILE), "{not json").expect("json");
    assert!(matches!(store.load_raw().expect("raw"), Some(RawKnowledge::Json(_))));
    assert_eq!(store.load().expect_err("corrupt").code, "KB_CORRUPT");

    let status = store.status().expect("status");
    assert!(status.present);
    assert_eq!(status.document_count, 0);
}
