//! Word lists that drive section detection and subcommand-name filtering.
//!
//! The lists are plain data. [`Vocabulary::standard`] returns the built-in
//! tables; callers that target an unusual CLI family can build their own
//! [`Vocabulary`] and hand it to
//! [`HelpParser::with_vocabulary`](super::HelpParser::with_vocabulary).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Headers that open a subcommand listing.
const COMMAND_HEADERS: &[&str] = &[
    "commands",
    "subcommands",
    "sub-commands",
    "subgroups",
    "available commands",
    "all commands",
    "core commands",
    "management commands",
    "additional commands",
    "alias commands",
    "group commands",
    "basic commands",
    "other commands",
    "common commands",
    "advanced commands",
    "deploy commands",
    "settings commands",
    "cluster management commands",
    "troubleshooting and debugging commands",
    "github actions commands",
];

/// Headers that open a flag listing.
const OPTION_HEADERS: &[&str] = &[
    "options",
    "flags",
    "global options",
    "global flags",
    "general options",
    "inherited flags",
    "global arguments",
    "optional arguments",
];

/// Headers that open a positional argument listing.
const ARGUMENT_HEADERS: &[&str] = &["arguments", "args", "positional arguments"];

/// Lines that are never a command description.
const GENERIC_HEADERS: &[&str] = &[
    "usage",
    "name",
    "synopsis",
    "description",
    "options",
    "flags",
    "arguments",
    "commands",
    "subcommands",
    "subgroups",
    "available commands",
    "global options",
    "global flags",
    "examples",
    "example",
    "help",
    "group",
    "command",
];

/// Words that look like subcommand names in prose or documentation rows but
/// are never commands.
const INVALID_COMMAND_NAMES: &[&str] = &[
    "the", "an", "and", "or", "but", "of", "to", "in", "on", "at", "for", "with", "by", "from",
    "as", "is", "are", "was", "be", "been", "if", "then", "else", "when", "where", "which",
    "this", "that", "these", "those", "it", "its", "you", "your", "we", "our", "they", "their",
    "use", "using", "usage", "example", "examples", "note", "notes", "see", "also", "default",
    "defaults", "deprecated", "experimental", "preview", "required", "optional", "options",
    "flags", "arguments", "args", "commands", "subcommands", "subgroups", "description",
    "synopsis", "global", "each", "any", "not", "only", "may", "can", "will", "must", "should",
];

static STANDARD: LazyLock<Vocabulary> = LazyLock::new(Vocabulary::default);

static COMMAND_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9_-]*$").expect("static regex must compile"));

/// Kind of header recognized by the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Commands,
    Options,
    Arguments,
}

/// Section-header and name-filter word lists.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub command_headers: Vec<String>,
    pub option_headers: Vec<String>,
    pub argument_headers: Vec<String>,
    pub generic_headers: Vec<String>,
    /// Compared case-insensitively; stored lowercase.
    pub invalid_names: HashSet<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            command_headers: to_owned_list(COMMAND_HEADERS),
            option_headers: to_owned_list(OPTION_HEADERS),
            argument_headers: to_owned_list(ARGUMENT_HEADERS),
            generic_headers: to_owned_list(GENERIC_HEADERS),
            invalid_names: INVALID_COMMAND_NAMES
                .iter()
                .map(|word| word.to_string())
                .collect(),
        }
    }
}

impl Vocabulary {
    /// Shared instance built from the built-in tables.
    pub fn standard() -> &'static Vocabulary {
        &STANDARD
    }

    /// Classifies a trimmed line as a known section header.
    ///
    /// Matching is case-insensitive, tolerates a trailing colon, and ignores a
    /// trailing parenthetical such as `Basic Commands (Beginner):`.
    pub fn header_kind(&self, trimmed: &str) -> Option<HeaderKind> {
        let key = header_key(trimmed)?;
        if contains(&self.command_headers, &key) {
            Some(HeaderKind::Commands)
        } else if contains(&self.option_headers, &key) {
            Some(HeaderKind::Options)
        } else if contains(&self.argument_headers, &key) {
            Some(HeaderKind::Arguments)
        } else {
            None
        }
    }

    /// Returns `true` for lines like `Usage:` or `EXAMPLES` that never carry a
    /// description.
    pub fn is_generic_header(&self, trimmed: &str) -> bool {
        header_key(trimmed).is_some_and(|key| contains(&self.generic_headers, &key))
    }

    /// Validates a subcommand name candidate.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_tools_discovery::parser::Vocabulary;
    ///
    /// let vocab = Vocabulary::standard();
    /// assert!(vocab.is_valid_command_name("deploy"));
    /// assert!(vocab.is_valid_command_name("list-items"));
    /// assert!(!vocab.is_valid_command_name("the"));
    /// assert!(!vocab.is_valid_command_name("Usage"));
    /// ```
    pub fn is_valid_command_name(&self, name: &str) -> bool {
        let len = name.chars().count();
        if !(2..=50).contains(&len) || name.chars().any(char::is_whitespace) {
            return false;
        }
        if !COMMAND_NAME_RE.is_match(name) {
            return false;
        }
        !self.invalid_names.contains(&name.to_ascii_lowercase())
    }
}

fn header_key(trimmed: &str) -> Option<String> {
    let mut key = trimmed.trim().trim_end_matches(':').trim_end();
    if let Some(idx) = key.find('(')
        && key.ends_with(')')
    {
        key = key[..idx].trim_end();
    }
    if key.is_empty() || key.len() > 64 {
        return None;
    }
    Some(key.to_ascii_lowercase())
}

fn contains(list: &[String], key: &str) -> bool {
    list.iter().any(|entry| entry.eq_ignore_ascii_case(key))
}

fn to_owned_list(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| word.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_kind_matches_case_insensitively() {
        let vocab = Vocabulary::standard();

        assert_eq!(vocab.header_kind("Commands:"), Some(HeaderKind::Commands));
        assert_eq!(vocab.header_kind("CORE COMMANDS"), Some(HeaderKind::Commands));
        assert_eq!(vocab.header_kind("Available Commands:"), Some(HeaderKind::Commands));
        assert_eq!(vocab.header_kind("Subgroups:"), Some(HeaderKind::Commands));
        assert_eq!(
            vocab.header_kind("Basic Commands (Beginner):"),
            Some(HeaderKind::Commands)
        );
        assert_eq!(vocab.header_kind("Options:"), Some(HeaderKind::Options));
        assert_eq!(vocab.header_kind("Global Flags:"), Some(HeaderKind::Options));
        assert_eq!(vocab.header_kind("Arguments:"), Some(HeaderKind::Arguments));
        assert_eq!(vocab.header_kind("Examples:"), None);
        assert_eq!(vocab.header_kind("  start  Start it"), None);
    }

    #[test]
    fn test_name_validation() {
        let vocab = Vocabulary::standard();

        assert!(!vocab.is_valid_command_name("the"));
        assert!(!vocab.is_valid_command_name("usage"));
        assert!(!vocab.is_valid_command_name("THE"));
        assert!(vocab.is_valid_command_name("deploy"));
        assert!(vocab.is_valid_command_name("list-items"));
        assert!(vocab.is_valid_command_name("get_all"));
        assert!(!vocab.is_valid_command_name("x"));
        assert!(!vocab.is_valid_command_name("Deploy"));
        assert!(!vocab.is_valid_command_name("start,"));
        assert!(!vocab.is_valid_command_name(&"a".repeat(51)));
    }

    #[test]
    fn test_custom_vocabulary_can_extend_deny_list() {
        let mut vocab = Vocabulary::default();
        vocab.invalid_names.insert("deploy".to_string());

        assert!(!vocab.is_valid_command_name("deploy"));
        assert!(Vocabulary::standard().is_valid_command_name("deploy"));
    }

    #[test]
    fn test_generic_header_detection() {
        let vocab = Vocabulary::standard();

        assert!(vocab.is_generic_header("Usage:"));
        assert!(vocab.is_generic_header("EXAMPLES"));
        assert!(!vocab.is_generic_header("A simple command"));
    }
}
