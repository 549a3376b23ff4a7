//! Splits normalized help text into named sections.

use super::vocabulary::{HeaderKind, Vocabulary};

/// What a section lists, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Commands,
    Options,
    Arguments,
    Other,
}

impl SectionKind {
    /// Classifies a lowercase section name.
    pub fn from_name(name: &str) -> Self {
        if name.contains("command") || name.contains("subgroup") {
            Self::Commands
        } else if name == "optional arguments" {
            Self::Options
        } else if matches!(name, "arguments" | "args") || name.ends_with(" arguments") {
            Self::Arguments
        } else if name.contains("option") || name.contains("flag") {
            Self::Options
        } else {
            Self::Other
        }
    }
}

impl From<HeaderKind> for SectionKind {
    fn from(kind: HeaderKind) -> Self {
        match kind {
            HeaderKind::Commands => Self::Commands,
            HeaderKind::Options => Self::Options,
            HeaderKind::Arguments => Self::Arguments,
        }
    }
}

/// A header and the lines that follow it up to the next header.
#[derive(Debug, Clone)]
pub struct Section {
    /// Lowercase header text without the trailing colon
    pub name: String,
    pub kind: SectionKind,
    /// Body lines, untrimmed, blank lines included
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SectionSplit {
    pub sections: Vec<Section>,
    /// At least one header matched the command-section vocabulary.
    pub has_command_header: bool,
}

impl SectionSplit {
    pub fn of_kind(&self, kind: SectionKind) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |section| section.kind == kind)
    }
}

/// Walks the lines once, opening a section at every header.
///
/// Headers are either vocabulary matches (any indentation, colon optional) or
/// short unindented `Something:` lines, which are kept as named sections so
/// that example and environment blocks stop the preceding listing.
pub fn split_sections(lines: &[&str], vocabulary: &Vocabulary) -> SectionSplit {
    let mut split = SectionSplit::default();
    let mut current: Option<Section> = None;

    for line in lines {
        let trimmed = line.trim();
        let header = if trimmed.is_empty() {
            None
        } else if let Some(kind) = vocabulary.header_kind(trimmed) {
            if kind == HeaderKind::Commands {
                split.has_command_header = true;
            }
            Some((header_name(trimmed), SectionKind::from(kind)))
        } else if is_unlisted_header(line) {
            let name = header_name(trimmed);
            let kind = SectionKind::from_name(&name);
            Some((name, kind))
        } else {
            None
        };

        match header {
            Some((name, kind)) => {
                if let Some(done) = current.take() {
                    split.sections.push(done);
                }
                current = Some(Section {
                    name,
                    kind,
                    lines: Vec::new(),
                });
            }
            None => {
                if let Some(section) = current.as_mut() {
                    section.lines.push((*line).to_string());
                }
            }
        }
    }

    if let Some(done) = current {
        split.sections.push(done);
    }
    split
}

fn header_name(trimmed: &str) -> String {
    trimmed.trim_end_matches(':').trim().to_ascii_lowercase()
}

fn is_unlisted_header(line: &str) -> bool {
    let starts_unindented = line.chars().next().is_some_and(|ch| !ch.is_whitespace());
    let trimmed = line.trim();
    starts_unindented
        && trimmed.ends_with(':')
        && trimmed.len() <= 40
        && !trimmed.starts_with('-')
        && !trimmed.contains("  ")
        && !trimmed.contains('\t')
}
