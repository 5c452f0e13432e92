//! Inline marker grammar for generated section text.
//!
//! Three marker kinds can appear inside generator output:
//! - open items: `[À PRÉCISER: ...]`, `[À VALIDER: ...]`, `[COMPLÉTER ...]`,
//!   `[RÉFÉRENCE À INDIQUER ...]`
//! - citations: `(see example <document> -> <original section>)`
//! - cross-reference tokens: `{{REF:<group>|<section>}}`
//!
//! Cross-reference tokens are resolved into one of two display forms before rendering,
//! and the rendering segmenter recognises those display forms as a fourth span kind.
//!
//! [`EXTRACTION_GRAMMAR`] lists the rules in the order they must run. Each removal changes
//! what later rules can see, so the order is part of the contract.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keyword prefixes that turn a bracketed span into an open item.
pub const OPEN_ITEM_KEYWORDS: [&str; 4] = [
    "À PRÉCISER",
    "À VALIDER",
    "COMPLÉTER",
    "RÉFÉRENCE À INDIQUER",
];

const OPEN_ITEM_PATTERN: &str = r"\[(?:À PRÉCISER|À VALIDER|COMPLÉTER|RÉFÉRENCE À INDIQUER).*?\]";
const CITATION_PATTERN: &str = r"\(see example .*?(?:\s*->\s*.*?)?\)";
const CROSS_REF_PATTERN: &str = r"\{\{REF:(.*?)\|(.*?)\}\}";
/// Display forms may wrap a title that carries its own parentheses, one level deep.
const RESOLVED_REF_PATTERN: &str =
    r"\((?:see section |reference not found: )(?:[^()\n]|\([^()\n]*\))*\)";

static OPEN_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(OPEN_ITEM_PATTERN).expect("valid open item regex"));

static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CITATION_PATTERN).expect("valid citation regex"));

static CROSS_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CROSS_REF_PATTERN).expect("valid cross reference regex"));

static RESOLVED_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(RESOLVED_REF_PATTERN).expect("valid resolved reference regex"));

/// Alternation used by the renderers. Group names map one-to-one onto style classes.
static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?P<open>{OPEN_ITEM_PATTERN})|(?P<cite>{CITATION_PATTERN})|(?P<xref>{RESOLVED_REF_PATTERN})"
    ))
    .expect("valid segment regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    OpenItem,
    Citation,
    CrossReference,
}

impl MarkerKind {
    pub fn pattern(self) -> &'static Regex {
        match self {
            MarkerKind::OpenItem => &OPEN_ITEM_RE,
            MarkerKind::Citation => &CITATION_RE,
            MarkerKind::CrossReference => &CROSS_REF_RE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::OpenItem => "open_item",
            MarkerKind::Citation => "citation",
            MarkerKind::CrossReference => "cross_reference",
        }
    }
}

/// When a matched marker is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Only when the caller asked for markers.
    WhenRequested,
    /// Regardless of the caller's request.
    Always,
}

/// What gets reported for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// The matched text itself.
    Verbatim,
    /// The display form produced by resolving the token against the chapter map.
    Resolved,
}

/// One step of the extraction grammar. Matches are always removed from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRule {
    pub kind: MarkerKind,
    pub collection: Collection,
    pub capture: Capture,
}

impl MarkerRule {
    pub fn pattern(&self) -> &'static Regex {
        self.kind.pattern()
    }

    pub fn collects(&self, include_markers: bool) -> bool {
        match self.collection {
            Collection::WhenRequested => include_markers,
            Collection::Always => true,
        }
    }
}

pub const EXTRACTION_GRAMMAR: [MarkerRule; 3] = [
    MarkerRule {
        kind: MarkerKind::OpenItem,
        collection: Collection::WhenRequested,
        capture: Capture::Verbatim,
    },
    MarkerRule {
        kind: MarkerKind::Citation,
        collection: Collection::WhenRequested,
        capture: Capture::Verbatim,
    },
    MarkerRule {
        kind: MarkerKind::CrossReference,
        collection: Collection::Always,
        capture: Capture::Resolved,
    },
];

/// Build a cross-reference token as the generator is asked to write it.
pub fn cross_reference_token(group_name: &str, section_title: &str) -> String {
    format!("{{{{REF:{group_name}|{section_title}}}}}")
}

/// Display form of a resolved cross-reference.
pub fn resolved_reference(number: &str, section_title: &str) -> String {
    format!("(see section {number} {section_title})")
}

/// Display form of a cross-reference that could not be bound. Stable and greppable.
pub fn unresolved_reference(group_name: &str, section_title: &str) -> String {
    format!("(reference not found: {group_name}|{section_title})")
}

pub(crate) fn cross_reference_regex() -> &'static Regex {
    &CROSS_REF_RE
}

pub(crate) fn resolved_reference_regex() -> &'static Regex {
    &RESOLVED_REF_RE
}

pub(crate) fn segment_regex() -> &'static Regex {
    &SEGMENT_RE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_item_requires_keyword_prefix() {
        assert!(MarkerKind::OpenItem.pattern().is_match("[À PRÉCISER: type de vitrage]"));
        assert!(MarkerKind::OpenItem.pattern().is_match("[RÉFÉRENCE À INDIQUER]"));
        assert!(!MarkerKind::OpenItem.pattern().is_match("[note: something]"));
        assert!(!MarkerKind::OpenItem.pattern().is_match("[À PRÉCISER unterminated"));
    }

    #[test]
    fn citation_matches_with_and_without_arrow() {
        let re = MarkerKind::Citation.pattern();
        assert!(re.is_match("(see example CCTP doc.pdf -> Menuiseries)"));
        assert!(re.is_match("(see example CCTP doc.pdf)"));
        assert!(!re.is_match("(see also doc.pdf)"));
    }

    #[test]
    fn cross_reference_token_round_trips_through_pattern() {
        let token = cross_reference_token("Lot 01", "Généralités");
        assert_eq!(token, "{{REF:Lot 01|Généralités}}");
        let caps = cross_reference_regex().captures(&token).expect("token matches");
        assert_eq!(&caps[1], "Lot 01");
        assert_eq!(&caps[2], "Généralités");
    }

    #[test]
    fn display_forms_are_recognised_as_resolved_references() {
        assert!(resolved_reference_regex().is_match(&resolved_reference("1.1", "Intro")));
        assert!(resolved_reference_regex().is_match(&unresolved_reference("A", "Missing")));
    }

    #[test]
    fn display_forms_keep_parentheses_inside_titles() {
        let text = "voir (see section 1.2 Murs (extérieurs)) puis (see section 1.3 Toiture).";
        let found: Vec<&str> = resolved_reference_regex()
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();
        assert_eq!(
            found,
            vec!["(see section 1.2 Murs (extérieurs))", "(see section 1.3 Toiture)"]
        );
        let missing = unresolved_reference("Lot (A)", "Murs");
        assert_eq!(resolved_reference_regex().find(&missing).map(|m| m.as_str()), Some(missing.as_str()));
    }

    #[test]
    fn grammar_order_is_open_items_then_citations_then_references() {
        let kinds: Vec<MarkerKind> = EXTRACTION_GRAMMAR.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![MarkerKind::OpenItem, MarkerKind::Citation, MarkerKind::CrossReference]
        );
        assert!(!EXTRACTION_GRAMMAR[0].collects(false));
        assert!(!EXTRACTION_GRAMMAR[1].collects(false));
        assert!(EXTRACTION_GRAMMAR[2].collects(false));
    }
}
