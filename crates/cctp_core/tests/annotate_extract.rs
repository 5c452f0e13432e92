use cctp_core::annotate::{extract, normalize_text};
use cctp_core::domain::{ChapterEntry, ChapterMap};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn chapter_map() -> ChapterMap {
    ChapterMap::new(vec![ChapterEntry::new("A", "Intro", "1.1")])
}

#[test]
fn markers_are_collected_and_removed_when_requested() {
    let out = extract(
        "Body [À PRÉCISER: X] more (see example CCTP doc.pdf -> Orig)",
        &chapter_map(),
        true,
    );
    assert_eq!(out.main_body, "Body more");
    assert_eq!(out.open_items, vec!["[À PRÉCISER: X]".to_string()]);
    assert_eq!(out.citations, vec!["(see example CCTP doc.pdf -> Orig)".to_string()]);
    assert!(out.cross_refs.is_empty());
    assert!(!out.main_body.contains('['));
    assert!(!out.main_body.contains('('));
}

#[test]
fn markers_are_removed_but_not_reported_without_request() {
    let out = extract(
        "Body [À VALIDER: EI30] more (see example CCTP doc.pdf) {{REF:A|Intro}}",
        &chapter_map(),
        false,
    );
    assert_eq!(out.main_body, "Body more");
    assert!(out.open_items.is_empty());
    assert!(out.citations.is_empty());
    assert_eq!(out.cross_refs, vec!["(see section 1.1 Intro)".to_string()]);
}

#[test]
fn cross_references_are_resolved_and_deduplicated() {
    let out = extract(
        "Voir {{REF:A|Intro}} et {{REF:A|Missing}}. Voir {{REF:A|Intro}}.",
        &chapter_map(),
        true,
    );
    assert_eq!(
        out.cross_refs,
        vec![
            "(see section 1.1 Intro)".to_string(),
            "(reference not found: A|Missing)".to_string(),
        ]
    );
    assert_eq!(out.main_body, "Voir et . Voir .");
}

#[test]
fn repeated_open_items_are_reported_once() {
    let out = extract(
        "[COMPLÉTER: hauteur] puis [COMPLÉTER: hauteur] et [RÉFÉRENCE À INDIQUER]",
        &ChapterMap::default(),
        true,
    );
    assert_eq!(
        out.open_items,
        vec!["[COMPLÉTER: hauteur]".to_string(), "[RÉFÉRENCE À INDIQUER]".to_string()]
    );
    assert_eq!(out.main_body, "puis et");
}

#[test]
fn partial_marker_syntax_stays_in_body() {
    let text = "Reste [À PRÉCISER sans fin et {{REF:A|Intro";
    let out = extract(text, &chapter_map(), true);
    assert_eq!(out.main_body, text);
    assert!(!out.has_notes());
}

#[test]
fn removal_that_splices_a_new_marker_is_handled_in_one_call() {
    let out = extract("[À [À VALIDER: x]VALIDER: y]", &ChapterMap::default(), true);
    assert_eq!(out.main_body, "");
    assert_eq!(
        out.open_items,
        vec!["[À VALIDER: x]".to_string(), "[À VALIDER: y]".to_string()]
    );
}

#[test]
fn markup_and_entities_are_normalized_with_paragraph_breaks_kept() {
    assert_eq!(
        normalize_text("<p>Texte&nbsp;avec &amp; entité</p>\n \n<p>Second\nligne</p>"),
        "Texte avec & entité\n\nSecond ligne"
    );
}

#[test]
fn encoded_comparisons_survive_extraction() {
    let out = extract(
        "Température &lt; 30 °C et &gt; 5 °C en service. [À VALIDER: seuil]",
        &ChapterMap::default(),
        true,
    );
    assert_eq!(out.main_body, "Température < 30 °C et > 5 °C en service.");
    assert_eq!(out.open_items, vec!["[À VALIDER: seuil]".to_string()]);
    let again = extract(&out.main_body, &ChapterMap::default(), true);
    assert_eq!(again.main_body, out.main_body);
}

#[test]
fn paragraph_breaks_survive_in_the_extracted_body() {
    let out = extract(
        "Premier paragraphe [COMPLÉTER: cote].\n\n\n  Second   paragraphe.",
        &ChapterMap::default(),
        true,
    );
    assert_eq!(out.main_body, "Premier paragraphe .\n\nSecond paragraphe.");
}

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Zé]{1,8}",
        Just(" ".to_string()),
        Just("\n".to_string()),
        Just("\n\n".to_string()),
        Just("[À PRÉCISER: ".to_string()),
        Just("[À VALIDER".to_string()),
        Just("]".to_string()),
        Just("(see example CCTP a.pdf -> B)".to_string()),
        Just("(see example ".to_string()),
        Just(")".to_string()),
        Just("{{REF:A|Intro}}".to_string()),
        Just("{{REF:".to_string()),
        Just("|".to_string()),
        Just("}}".to_string()),
        Just("<b>".to_string()),
        Just("<".to_string()),
        Just(">".to_string()),
        Just("&amp;".to_string()),
        Just("&lt;".to_string()),
        Just("&gt;".to_string()),
        Just(" 30 °C ".to_string()),
        Just("&".to_string()),
        Just("lt;".to_string()),
    ]
}

proptest! {
    #[test]
    fn prop_reextracting_the_body_is_a_no_op(
        parts in prop::collection::vec(fragment(), 0..24),
        include_markers in any::<bool>(),
    ) {
        let text = parts.concat();
        let map = chapter_map();
        let first = extract(&text, &map, include_markers);
        let second = extract(&first.main_body, &map, include_markers);
        prop_assert_eq!(&second.main_body, &first.main_body);
        prop_assert!(!second.has_notes());
    }
}
