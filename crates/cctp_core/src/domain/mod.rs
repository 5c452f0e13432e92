use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A titled unit of content, as produced by the structure parser or stored in a project.
///
/// Notes:
/// - `content` is never empty for a section kept by the parser.
/// - The legacy field names `titre` / `contenu` are accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    #[serde(alias = "titre")]
    pub title: String,
    #[serde(alias = "contenu")]
    pub content: String,
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// A logical group (typology) of sections inside one knowledge base document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionGroup {
    #[serde(alias = "nom_typo")]
    pub group_name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Structured corpus of previously parsed source documents, keyed by document name.
///
/// Documents iterate in name order, which is also the persisted order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct KnowledgeBase {
    pub documents: BTreeMap<String, Vec<SectionGroup>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: impl Into<String>, groups: Vec<SectionGroup>) {
        self.documents.insert(document.into(), groups);
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn section_count(&self) -> usize {
        self.documents
            .values()
            .flat_map(|groups| groups.iter())
            .map(|g| g.sections.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// A candidate passage returned by the example matcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Excerpt {
    /// The target title the excerpt was requested for.
    pub title: String,
    /// The section title as written in the source document.
    pub original_title: String,
    /// Source document name.
    pub source: String,
    pub text: String,
}

/// One row of the render-time numbering table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterEntry {
    #[serde(alias = "nom_typo")]
    pub group_name: String,
    #[serde(alias = "titre_section")]
    pub section_title: String,
    pub number: String,
}

impl ChapterEntry {
    pub fn new(
        group_name: impl Into<String>,
        section_title: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        Self {
            group_name: group_name.into(),
            section_title: section_title.into(),
            number: number.into(),
        }
    }
}

/// Ordered numbering table binding (group, section) pairs to display numbers.
///
/// Uniqueness of pairs is the caller's job; lookups return the first match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChapterMap {
    pub entries: Vec<ChapterEntry>,
}

impl ChapterMap {
    pub fn new(entries: Vec<ChapterEntry>) -> Self {
        Self { entries }
    }

    /// Exact, case-sensitive lookup. First match wins.
    pub fn lookup(&self, group_name: &str, section_title: &str) -> Option<&ChapterEntry> {
        self.entries
            .iter()
            .find(|e| e.group_name == group_name && e.section_title == section_title)
    }

    /// Display number for a section, or an empty string when unnumbered.
    pub fn number_for(&self, group_name: &str, section_title: &str) -> &str {
        self.lookup(group_name, section_title)
            .map(|e| e.number.as_str())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A section slot in a project outline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutlineSection {
    #[serde(alias = "titre")]
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A top-level group (typology) of a project outline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutlineGroup {
    #[serde(alias = "nomTypologie")]
    pub name: String,
    #[serde(default)]
    pub sections: Vec<OutlineSection>,
}

/// A project document outline: ordered groups of ordered sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Outline {
    pub groups: Vec<OutlineGroup>,
}

/// Generated section texts, keyed by group name then section title.
pub type GeneratedTexts = BTreeMap<String, BTreeMap<String, String>>;
