use cctp_core::domain::Section;
use cctp_core::structure::{parse_document_structure, MAX_FALLBACK_PARAGRAPHS};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn numbered_headings_split_sections_and_drop_numbers() {
    let raw = "1 Généralités\nLe présent lot concerne les menuiseries.\n\n  Suite du texte.\n2.1 Fondations\nSemelles filantes.\n";
    assert_eq!(
        parse_document_structure(raw),
        vec![
            Section::new("Généralités", "Le présent lot concerne les menuiseries.\nSuite du texte."),
            Section::new("Fondations", "Semelles filantes."),
        ]
    );
}

#[test]
fn heading_followed_by_heading_is_discarded() {
    let raw = "2.1 Title\n2.2 Next\nBody line";
    assert_eq!(parse_document_structure(raw), vec![Section::new("Next", "Body line")]);
}

#[test]
fn table_of_contents_lines_do_not_become_sections() {
    let raw = "1 Intro\n2 Walls\n\n1 Intro\nText one\n2 Walls\nText two\n";
    let sections = parse_document_structure(raw);
    let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Intro", "Walls"]);
    assert_eq!(sections[0].content, "Text one");
}

#[test]
fn trailing_heading_without_content_is_dropped() {
    let raw = "1 Intro\nText\n2 Annexes\n";
    assert_eq!(parse_document_structure(raw), vec![Section::new("Intro", "Text")]);
}

#[test]
fn paragraph_fallback_uses_short_first_line_as_title() {
    let raw = "Titre court\nLigne de contenu\n\nUn paragraphe d'une seule ligne sans titre qui continue encore un peu";
    assert_eq!(
        parse_document_structure(raw),
        vec![
            Section::new("Titre court", "Ligne de contenu"),
            Section::new(
                "Un paragraphe d'une seule ligne sans titre qui...",
                "Un paragraphe d'une seule ligne sans titre qui continue encore un peu"
            ),
        ]
    );
}

#[test]
fn paragraph_fallback_synthesizes_title_for_long_first_line() {
    let long_line = "mot ".repeat(60);
    let raw = format!("{long_line}\nsuite");
    let sections = parse_document_structure(&raw);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, "mot mot mot mot mot mot mot mot...");
    assert!(sections[0].content.ends_with("suite"));
}

#[test]
fn paragraph_fallback_is_capped() {
    let raw = (0..30)
        .map(|i| format!("Paragraphe {i}\ncontenu {i}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    let sections = parse_document_structure(&raw);
    assert_eq!(sections.len(), MAX_FALLBACK_PARAGRAPHS);
    assert_eq!(sections[19].title, "Paragraphe 19");
}

#[test]
fn blank_input_yields_no_sections() {
    assert!(parse_document_structure("").is_empty());
    assert!(parse_document_structure(" \n\t\n").is_empty());
}

proptest! {
    #[test]
    fn prop_non_blank_text_without_headings_yields_sections(raw in "[a-zA-Zéè ,.;\n]{1,300}") {
        prop_assume!(!raw.trim().is_empty());
        let sections = parse_document_structure(&raw);
        prop_assert!(!sections.is_empty());
        for section in &sections {
            prop_assert!(!section.content.trim().is_empty());
        }
    }
}
