//! Flag row parsing for options/flags sections.

use std::sync::LazyLock;

use command_tools_core::OptionSpec;
use regex::Regex;

use super::{collect_continuation, indentation, sanitize_description_text, split_two_columns};

struct FlagPatterns {
    // -v, --verbose  OR  -v/--verbose
    short_then_long: Regex,
    // --resource-group -g
    long_then_short: Regex,
    long: Regex,
    // -chdir (single-dash long options)
    single_dash_word: Regex,
    short: Regex,
    // =VALUE, <value>, [value], ALLCAPS, or a cobra type word right after the flag
    value_hint: Regex,
}

static PATTERNS: LazyLock<FlagPatterns> = LazyLock::new(|| FlagPatterns {
    short_then_long: Regex::new(
        r"^(-[a-zA-Z0-9?@])(?:\s*,\s*|\s*/\s*|\s+)(--(?:\[no-\])?[a-zA-Z][-a-zA-Z0-9._]*)",
    )
    .expect("static regex must compile"),
    long_then_short: Regex::new(
        r"^(--(?:\[no-\])?[a-zA-Z][-a-zA-Z0-9._]*)(?:\s*,\s*|\s+)(-[a-zA-Z0-9])(?:[\s,=\[<]|$)",
    )
    .expect("static regex must compile"),
    long: Regex::new(r"^(--(?:\[no-\])?[a-zA-Z][-a-zA-Z0-9._]*)").expect("static regex must compile"),
    single_dash_word: Regex::new(r"^(-[a-zA-Z][a-zA-Z0-9-]{1,})(?:[\s,=<\[]|$)")
        .expect("static regex must compile"),
    short: Regex::new(r"^(-[a-zA-Z0-9?@])(?:[\s,=<\[]|$)").expect("static regex must compile"),
    value_hint: Regex::new(
        r"^(?:=\s*([A-Za-z_][\w.-]*)|\s*[=]?[<\[]([A-Za-z_][\w.-]*)(?:\.\.\.)?[>\]]|\s+([A-Z][A-Z0-9_-]*)(?:\s|,|$)|\s+(string|strings|stringArray|stringToString|int|int32|int64|uint|uint32|uint64|float32|float64|duration|list|bytes)(?:\s|$))",
    )
    .expect("static regex must compile"),
});

/// Parses the body lines of one options section.
///
/// Each row that starts with `-` yields one option. Indented lines below a
/// row that do not start a new flag extend its description.
pub fn parse_option_lines(lines: &[String]) -> Vec<OptionSpec> {
    let mut options = Vec::new();
    let mut cursor = 0;

    while cursor < lines.len() {
        let line = &lines[cursor];
        cursor += 1;

        let Some(mut option) = parse_option_row(line) else {
            continue;
        };

        let indent = indentation(line);
        let (extra, consumed) = collect_continuation(&lines[cursor..], |next| {
            let trimmed = next.trim_start();
            !trimmed.starts_with('-') || indentation(next) > indent + 4
        });
        cursor += consumed;
        if !extra.is_empty() {
            if option.description.is_empty() {
                option.description = extra;
            } else {
                option.description = format!("{} {}", option.description, extra);
            }
        }

        options.push(option);
    }

    options
}

/// Parses one flag row such as `  -o, --output <FILE>  Write output to FILE`.
pub fn parse_option_row(line: &str) -> Option<OptionSpec> {
    let trimmed = line.trim();
    if !trimmed.starts_with('-') || trimmed == "-" || trimmed == "--" {
        return None;
    }

    let (definition, description) = split_definition(trimmed);

    let (long, short, rest) = if let Some(caps) = PATTERNS.short_then_long.captures(definition) {
        let end = caps.get(0).map_or(0, |m| m.end());
        (Some(caps[2].to_string()), Some(caps[1].to_string()), &definition[end..])
    } else if let Some(caps) = PATTERNS.long_then_short.captures(definition) {
        let end = caps.get(2).map_or(0, |m| m.end());
        (Some(caps[1].to_string()), Some(caps[2].to_string()), &definition[end..])
    } else if let Some(caps) = PATTERNS.long.captures(definition) {
        let end = caps.get(0).map_or(0, |m| m.end());
        (Some(caps[1].to_string()), None, &definition[end..])
    } else if let Some(caps) = PATTERNS.single_dash_word.captures(definition) {
        let end = caps.get(1).map_or(0, |m| m.end());
        (None, Some(caps[1].to_string()), &definition[end..])
    } else if let Some(caps) = PATTERNS.short.captures(definition) {
        let end = caps.get(1).map_or(0, |m| m.end());
        (None, Some(caps[1].to_string()), &definition[end..])
    } else {
        return None;
    };

    let long = long.map(|flag| normalize_flag_token(&flag));
    let short = short.map(|flag| normalize_flag_token(&flag));

    let value_name = PATTERNS.value_hint.captures(rest).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string())
    });
    let value_name = value_name.filter(|name| !name.eq_ignore_ascii_case("required"));

    let mut option = match (long, short) {
        (Some(long), short) => OptionSpec {
            name: long,
            short_name: short,
            description: String::new(),
            value_required: false,
            value_name: None,
        },
        (None, Some(short)) => OptionSpec::flag(&short),
        (None, None) => return None,
    };

    if let Some(value_name) = value_name {
        option.value_required = true;
        option.value_name = Some(value_name);
    }
    if let Some(desc) = description.and_then(sanitize_description_text) {
        option.description = desc;
    }

    Some(option)
}

/// Drops later options whose canonical name was already seen.
pub fn dedupe_options(options: Vec<OptionSpec>) -> Vec<OptionSpec> {
    let mut seen = std::collections::HashSet::new();
    options
        .into_iter()
        .filter(|option| seen.insert(option.name.clone()))
        .collect()
}

fn split_definition(trimmed: &str) -> (&str, Option<&str>) {
    // az-style rows: "--name -n [Required] : Name of the VM."
    if let Some(idx) = trimmed.find(" : ") {
        let (left, right) = trimmed.split_at(idx);
        return (left.trim_end(), Some(right[3..].trim()));
    }
    match split_two_columns(trimmed) {
        Some((left, right)) => (left, Some(right)),
        None => (trimmed, None),
    }
}

fn normalize_flag_token(raw: &str) -> String {
    let token = raw.trim().trim_end_matches([',', ';', '.']);
    match token.strip_prefix("--[no-]") {
        Some(rest) => format!("--{rest}"),
        None => token.to_string(),
    }
}
