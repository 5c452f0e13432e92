use std::borrow::Cow;

use regex::Captures;

use crate::domain::ChapterMap;
use crate::markers::{cross_reference_regex, resolved_reference, unresolved_reference};

/// Resolve a cross-reference against the chapter map.
///
/// Exact, case-sensitive match on (group, section); the first entry wins. A miss yields the
/// `(reference not found: group|section)` form instead of an error so that stale references
/// stay visible in the output.
pub fn resolve(group_name: &str, section_title: &str, chapter_map: &ChapterMap) -> String {
    match chapter_map.lookup(group_name, section_title) {
        Some(entry) => resolved_reference(&entry.number, section_title),
        None => {
            tracing::debug!(group_name, section_title, "cross reference not found");
            unresolved_reference(group_name, section_title)
        }
    }
}

/// Replace every `{{REF:group|section}}` token in `text` with its display form.
pub fn resolve_tokens_in_place<'t>(text: &'t str, chapter_map: &ChapterMap) -> Cow<'t, str> {
    cross_reference_regex().replace_all(text, |caps: &Captures<'_>| {
        resolve(&caps[1], &caps[2], chapter_map)
    })
}

/// True for the display form produced by a failed resolution.
pub fn is_unresolved(display: &str) -> bool {
    display.starts_with("(reference not found: ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChapterEntry;

    fn map() -> ChapterMap {
        ChapterMap::new(vec![
            ChapterEntry::new("A", "Intro", "1.1"),
            ChapterEntry::new("A", "Intro", "9.9"),
            ChapterEntry::new("B", "Walls", "2.1"),
        ])
    }

    #[test]
    fn first_match_wins_on_duplicates() {
        assert_eq!(resolve("A", "Intro", &map()), "(see section 1.1 Intro)");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let out = resolve("a", "intro", &map());
        assert_eq!(out, "(reference not found: a|intro)");
        assert!(is_unresolved(&out));
    }

    #[test]
    fn tokens_are_replaced_in_place() {
        let out = resolve_tokens_in_place("See {{REF:B|Walls}} and {{REF:B|Roof}}.", &map());
        assert_eq!(
            out,
            "See (see section 2.1 Walls) and (reference not found: B|Roof)."
        );
    }

    #[test]
    fn text_without_tokens_is_borrowed() {
        let out = resolve_tokens_in_place("plain text", &map());
        assert!(matches!(out, Cow::Borrowed(_)));
    }
}
