//! Heuristic help-text parser.
//!
//! Turns the free-form output of `<command> --help` into a [`CommandNode`]:
//! a description, the flags listed under options/flags headers, positional
//! arguments listed under an arguments header, and subcommand stubs listed
//! under command headers. Subcommand stubs carry only a name and a
//! description; the discovery engine fills them in by parsing their own help.
//!
//! There is no grammar for help output, so every stage is best-effort. The
//! parser never fails: the worst outcome is a node with just a name.

mod normalize;
mod options;
mod sections;
mod vocabulary;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;

use command_tools_core::{CommandNode, PositionalArg};
use regex::Regex;
use tracing::{debug, warn};

pub use normalize::normalize_help_output;
pub use options::{parse_option_lines, parse_option_row};
pub use sections::{Section, SectionKind, SectionSplit, split_sections};
pub use vocabulary::{HeaderKind, Vocabulary};

/// Regex patterns for parsing help output.
static PATTERNS: LazyLock<HelpPatterns> = LazyLock::new(HelpPatterns::new);

struct HelpPatterns {
    // "  deploy    Deploy the app" / "  create : Create a VM." / "  build, b  Compile"
    subcommand_entry: Regex,
    // "  <FILE>  Input file" / "  [PATH]...  Paths"
    argument_entry: Regex,
    column_break: Regex,
    multi_ws: Regex,
    // Leaf-command shapes
    usage_flags_block: Regex,
    single_command_usage: Regex,
}

impl HelpPatterns {
    fn new() -> Self {
        Self {
            subcommand_entry: Regex::new(r"^(\s+)([a-z][^\s:,]*)(?:,\s*[a-z][^\s:,]*)*(:?)\s+(\S.*)$")
                .expect("static regex must compile"),
            argument_entry: Regex::new(r"^\s*([<\[])([^\s<>\[\]]+)[>\]](?:\.\.\.)?\s+(\S.*)$")
                .expect("static regex must compile"),
            column_break: Regex::new(r"\t+| {2,}").expect("static regex must compile"),
            multi_ws: Regex::new(r"\s+").expect("static regex must compile"),
            usage_flags_block: Regex::new(r"(?ims)^\s*usage:.*^\s*flags:\s*$")
                .expect("static regex must compile"),
            single_command_usage: Regex::new(
                r"(?im)^\s*usage:\s+\S+(?:\s+[a-z][\w-]*)*\s+\[(?:options|option|flags)\](?:\s+[^\n]*)?$",
            )
            .expect("static regex must compile"),
        }
    }
}

/// Parser for CLI help output.
pub struct HelpParser<'v> {
    command: String,
    raw_output: String,
    vocabulary: &'v Vocabulary,
    warnings: Vec<String>,
}

impl HelpParser<'static> {
    /// Creates a new parser for the given command and help output, using the
    /// built-in vocabulary.
    pub fn new(command: &str, help_output: &str) -> Self {
        Self::with_vocabulary(command, help_output, Vocabulary::standard())
    }
}

impl<'v> HelpParser<'v> {
    /// Creates a parser that uses a caller-supplied vocabulary.
    pub fn with_vocabulary(command: &str, help_output: &str, vocabulary: &'v Vocabulary) -> Self {
        Self {
            command: command.to_string(),
            raw_output: help_output.to_string(),
            vocabulary,
            warnings: Vec::new(),
        }
    }

    /// Parses the help output into a command node.
    pub fn parse(&mut self) -> CommandNode {
        let mut node = CommandNode::new(&self.command);
        if self.raw_output.trim().is_empty() {
            self.warnings.push("Empty help output".to_string());
            return node;
        }

        let normalized = normalize_help_output(&self.raw_output);
        let lines: Vec<&str> = normalized.lines().collect();

        node.description = self.extract_description(&lines);

        let split = split_sections(&lines, self.vocabulary);

        // az lists its flags under "Arguments", so flag rows count in both.
        for section in &split.sections {
            if matches!(section.kind, SectionKind::Options | SectionKind::Arguments) {
                node.options.extend(parse_option_lines(&section.lines));
            }
        }
        node.options = options::dedupe_options(node.options);

        for section in split.of_kind(SectionKind::Arguments) {
            node.arguments.extend(self.parse_arguments(&section.lines));
        }

        if !split.has_command_header && Self::looks_like_terminal_command(&normalized) {
            debug!(command = %self.command, "Help text looks like a leaf command; skipping subcommand scan");
            return node;
        }

        for section in split.of_kind(SectionKind::Commands) {
            node.subcommands
                .extend(self.parse_subcommand_entries(&section.lines));
        }

        debug!(
            command = %self.command,
            subcommands = node.subcommands.len(),
            options = node.options.len(),
            arguments = node.arguments.len(),
            "Parsed help text"
        );
        node
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// First line that is not blank, a generic header, the bare command name,
    /// or a usage/options/commands line.
    fn extract_description(&self, lines: &[&str]) -> String {
        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == self.command {
                continue;
            }
            if self.vocabulary.is_generic_header(trimmed)
                || self.vocabulary.header_kind(trimmed).is_some()
            {
                continue;
            }
            let lower = trimmed.to_ascii_lowercase();
            if lower.starts_with("usage:")
                || lower.starts_with("options:")
                || lower.starts_with("commands:")
            {
                continue;
            }
            return sanitize_description_text(trimmed).unwrap_or_default();
        }
        String::new()
    }

    /// Extracts subcommand stubs from one command-like section body.
    fn parse_subcommand_entries(&mut self, lines: &[String]) -> Vec<CommandNode> {
        let mut entries = Vec::new();
        let mut rejected = 0usize;
        let mut cursor = 0;

        while cursor < lines.len() {
            let line = &lines[cursor];
            cursor += 1;

            let Some(caps) = PATTERNS.subcommand_entry.captures(line) else {
                continue;
            };
            let name = &caps[2];
            if !self.vocabulary.is_valid_command_name(name) {
                rejected += 1;
                continue;
            }

            // A line shaped like an entry is never a continuation, whatever
            // its indentation; name validation decides whether it is kept.
            let (extra, consumed) = collect_continuation(&lines[cursor..], |next| {
                !PATTERNS.subcommand_entry.is_match(next)
            });
            cursor += consumed;

            let mut description = caps[4].trim().to_string();
            if !extra.is_empty() {
                description = format!("{description} {extra}");
            }
            let description = description.trim_start_matches(':').trim();
            let description = sanitize_description_text(description).unwrap_or_default();

            entries.push(CommandNode::new(name).with_description(&description));
        }

        if rejected > 0 {
            self.warnings.push(format!(
                "Rejected {rejected} subcommand candidate(s) for '{}'",
                self.command
            ));
        }
        entries
    }

    fn parse_arguments(&self, lines: &[String]) -> Vec<PositionalArg> {
        let mut args = Vec::new();
        let mut cursor = 0;

        while cursor < lines.len() {
            let line = &lines[cursor];
            cursor += 1;

            let Some(caps) = PATTERNS.argument_entry.captures(line) else {
                continue;
            };
            let indent = indentation(line);
            let (extra, consumed) = collect_continuation(&lines[cursor..], |next| {
                !PATTERNS.argument_entry.is_match(next) && indentation(next) > indent
            });
            cursor += consumed;

            let mut description = caps[3].trim().to_string();
            if !extra.is_empty() {
                description = format!("{description} {extra}");
            }

            let mut arg = if &caps[1] == "<" {
                PositionalArg::required(&caps[2])
            } else {
                PositionalArg::optional(&caps[2])
            };
            arg.description = sanitize_description_text(&description).unwrap_or_default();
            args.push(arg);
        }

        args
    }

    /// A `Usage:`..`Flags:` block or a `Usage: cmd [options] ...` line that
    /// names no command placeholder.
    fn looks_like_terminal_command(text: &str) -> bool {
        if PATTERNS.usage_flags_block.is_match(text) {
            return true;
        }
        PATTERNS
            .single_command_usage
            .find(text)
            .is_some_and(|m| !m.as_str().to_ascii_lowercase().contains("command"))
    }
}

/// Parses help text into a [`CommandNode`], never panicking.
///
/// Any panic inside the heuristics is caught and replaced by an empty node
/// carrying `command` as its name, so that callers walking a tree can keep
/// going with the siblings.
///
/// # Examples
///
/// ```
/// use command_tools_discovery::parser::parse_help_text;
///
/// let help = "\
/// Usage: mycmd
/// A simple command
///
/// Commands:
///   start  Start it
///   stop   Stop it
///
/// Options:
///   -h, --help  Show help
/// ";
///
/// let node = parse_help_text("mycmd", help);
/// assert_eq!(node.description, "A simple command");
/// assert_eq!(node.subcommand_names(), vec!["start", "stop"]);
/// assert_eq!(node.options[0].name, "--help");
/// ```
pub fn parse_help_text(command: &str, help_text: &str) -> CommandNode {
    parse_help_text_with(command, help_text, Vocabulary::standard())
}

/// Same as [`parse_help_text`] with a caller-supplied vocabulary.
pub fn parse_help_text_with(command: &str, help_text: &str, vocabulary: &Vocabulary) -> CommandNode {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut parser = HelpParser::with_vocabulary(command, help_text, vocabulary);
        let node = parser.parse();
        for warning in parser.warnings() {
            debug!(command, warning = %warning, "Parser warning");
        }
        node
    }));

    match result {
        Ok(node) => node,
        Err(_) => {
            warn!(command, "Help parser panicked; falling back to an empty node");
            CommandNode::new(command)
        }
    }
}

/// Splits a row into its definition and description columns.
pub(crate) fn split_two_columns(line: &str) -> Option<(&str, &str)> {
    let m = PATTERNS.column_break.find(line)?;
    let left = line[..m.start()].trim();
    let right = line[m.end()..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left, right))
}

/// Collapses internal whitespace; `None` for blank input.
pub(crate) fn sanitize_description_text(raw: &str) -> Option<String> {
    let cleaned = PATTERNS.multi_ws.replace_all(raw.trim(), " ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.into_owned())
    }
}

pub(crate) fn indentation(line: &str) -> usize {
    line.chars().take_while(|ch| ch.is_whitespace()).count()
}

/// Gathers the indented, non-blank lines that continue the previous entry.
///
/// Stops at the first blank or unindented line, or the first line `accept`
/// rejects. Returns the space-joined text and the number of lines consumed.
pub(crate) fn collect_continuation<F>(lines: &[String], accept: F) -> (String, usize)
where
    F: Fn(&str) -> bool,
{
    let mut parts = Vec::new();
    for line in lines {
        if line.trim().is_empty() || indentation(line) == 0 || !accept(line) {
            break;
        }
        parts.push(line.trim());
    }
    (parts.join(" "), parts.len())
}
