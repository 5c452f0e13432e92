use std::collections::BTreeSet;

use crate::domain::{ChapterEntry, ChapterMap, Outline};

/// Number every section of the outline as `<group>.<section>`, both 1-based, in outline order.
///
/// Numbering covers the full outline, including sections that end up without text, so
/// references stay stable while a document is being drafted.
pub fn build_chapter_map(outline: &Outline) -> ChapterMap {
    let mut entries = Vec::new();
    for (g, group) in outline.groups.iter().enumerate() {
        for (s, section) in group.sections.iter().enumerate() {
            entries.push(ChapterEntry::new(
                group.name.clone(),
                section.title.clone(),
                format!("{}.{}", g + 1, s + 1),
            ));
        }
    }
    ChapterMap::new(entries)
}

/// Sorted, deduplicated, non-blank section titles across a set of outlines.
pub fn section_library<'a, I>(outlines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Outline>,
{
    let titles: BTreeSet<String> = outlines
        .into_iter()
        .flat_map(|o| o.groups.iter())
        .flat_map(|g| g.sections.iter())
        .map(|s| s.title.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    titles.into_iter().collect()
}
