use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::markers::segment_regex;

/// Style class attached to every run of rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleClass {
    Normal,
    OpenItem,
    Citation,
    ResolvedReference,
}

/// A maximal span of text sharing one style class. Never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<'a> {
    pub class: StyleClass,
    pub text: &'a str,
}

/// Split text into styled runs, in order. Concatenating the run texts gives back `text`.
///
/// Cross-reference tokens must already be resolved; only their display forms are styled.
pub fn segment(text: &str) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut last = 0;
    for caps in segment_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            runs.push(Run {
                class: StyleClass::Normal,
                text: &text[last..whole.start()],
            });
        }
        let class = if caps.name("open").is_some() {
            StyleClass::OpenItem
        } else if caps.name("cite").is_some() {
            StyleClass::Citation
        } else {
            StyleClass::ResolvedReference
        };
        runs.push(Run {
            class,
            text: whole.as_str(),
        });
        last = whole.end();
    }
    if last < text.len() {
        runs.push(Run {
            class: StyleClass::Normal,
            text: &text[last..],
        });
    }
    runs
}

/// Output capability of a renderer: one method per styled span kind.
///
/// Span text never contains a line break; breaks arrive through [`SpanSink::line_break`].
pub trait SpanSink {
    fn normal(&mut self, text: &str);
    fn open_item(&mut self, text: &str);
    fn citation(&mut self, text: &str);
    fn resolved_reference(&mut self, text: &str);
    fn line_break(&mut self);
}

/// Segment `text` and push each run into the sink, turning `\n` into line breaks.
pub fn emit_runs<S: SpanSink + ?Sized>(text: &str, sink: &mut S) {
    for run in segment(text) {
        for (i, piece) in run.text.split('\n').enumerate() {
            if i > 0 {
                sink.line_break();
            }
            if piece.is_empty() {
                continue;
            }
            match run.class {
                StyleClass::Normal => sink.normal(piece),
                StyleClass::OpenItem => sink.open_item(piece),
                StyleClass::Citation => sink.citation(piece),
                StyleClass::ResolvedReference => sink.resolved_reference(piece),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyle {
    pub bold: bool,
    pub color: Rgb,
}

/// Style table shared by both backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    normal: RunStyle,
    styles: BTreeMap<StyleClass, RunStyle>,
}

impl Palette {
    pub fn new(normal: RunStyle) -> Self {
        Self {
            normal,
            styles: BTreeMap::new(),
        }
    }

    pub fn with_style(mut self, class: StyleClass, style: RunStyle) -> Self {
        self.styles.insert(class, style);
        self
    }

    /// Style for a class; a class without an entry renders as normal text.
    pub fn style(&self, class: StyleClass) -> RunStyle {
        self.styles.get(&class).copied().unwrap_or(self.normal)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::new(RunStyle {
            bold: false,
            color: Rgb(105, 108, 111),
        })
        .with_style(
            StyleClass::OpenItem,
            RunStyle {
                bold: true,
                color: Rgb(220, 53, 69),
            },
        )
        .with_style(
            StyleClass::Citation,
            RunStyle {
                bold: false,
                color: Rgb(40, 167, 69),
            },
        )
        .with_style(
            StyleClass::ResolvedReference,
            RunStyle {
                bold: false,
                color: Rgb(0, 123, 255),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_covers_text_and_tags_each_marker() {
        let text = "Pose [À VALIDER: EI30] selon (see example CCTP a.pdf -> B) et (see section 1.2 Murs).";
        let runs = segment(text);
        let classes: Vec<StyleClass> = runs.iter().map(|r| r.class).collect();
        assert_eq!(
            classes,
            vec![
                StyleClass::Normal,
                StyleClass::OpenItem,
                StyleClass::Normal,
                StyleClass::Citation,
                StyleClass::Normal,
                StyleClass::ResolvedReference,
                StyleClass::Normal,
            ]
        );
        let joined: String = runs.iter().map(|r| r.text).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn parenthesized_title_stays_inside_the_reference_run() {
        let runs = segment("Voir (see section 1.2 Murs (extérieurs)).");
        assert_eq!(
            runs,
            vec![
                Run {
                    class: StyleClass::Normal,
                    text: "Voir ",
                },
                Run {
                    class: StyleClass::ResolvedReference,
                    text: "(see section 1.2 Murs (extérieurs))",
                },
                Run {
                    class: StyleClass::Normal,
                    text: ".",
                },
            ]
        );
    }

    #[test]
    fn empty_text_has_no_runs() {
        assert!(segment("").is_empty());
    }

    #[test]
    fn missing_palette_entry_falls_back_to_normal() {
        let normal = RunStyle {
            bold: false,
            color: Rgb(0, 0, 0),
        };
        let palette = Palette::new(normal);
        assert_eq!(palette.style(StyleClass::Citation), normal);
        assert_eq!(Rgb(220, 53, 69).hex(), "DC3545");
    }
}
