//! Help-text normalization utilities.

use regex::Regex;
use std::sync::LazyLock;

/// Strips terminal formatting and control bytes and unifies line endings.
///
/// Trailing whitespace is trimmed per line; indentation is preserved because
/// the entry scanners depend on it.
pub fn normalize_help_output(raw: &str) -> String {
    static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07]*\x07").expect("static regex must compile")
    });
    static OVERSTRIKE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r".\x08").expect("static regex must compile"));

    let stripped = ANSI_RE.replace_all(raw, "");
    let mut cleaned = stripped.into_owned();
    while OVERSTRIKE_RE.is_match(&cleaned) {
        cleaned = OVERSTRIKE_RE.replace_all(&cleaned, "").into_owned();
    }
    let replaced = cleaned.replace("\r\n", "\n").replace('\r', "\n");

    replaced
        .lines()
        .map(|line| {
            line.chars()
                .filter(|ch| *ch == '\t' || !ch.is_control())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
