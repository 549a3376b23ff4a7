//! Turns a tool call back into a concrete argument list.
//!
//! The output is what follows the base command on the command line: the
//! subcommand path, then flags in parameter order, then positional values.

use serde_json::{Map, Value};

use crate::naming::{is_all_uppercase, to_kebab_case};

/// Parameter key whose value replaces the whole argument list.
pub const RAW_ARGS_KEY: &str = "__args";

/// Decides whether a parameter is passed as a bare positional value.
///
/// Only consulted for non-boolean values of multi-character keys.
pub trait PositionalPolicy: Send + Sync {
    fn is_positional(&self, key: &str) -> bool;
}

/// Treats plain single-word keys as positionals.
///
/// A key is positional when it has no boolean-ish prefix (`is`, `has`,
/// `with`, `no`, `enable`, `disable`), no underscore, a single-word kebab
/// form, more than one character, and is not all upper-case. So `name`
/// becomes a bare value while `resourceGroup` stays `--resource-group`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyShapeHeuristic;

const BOOLEAN_PREFIXES: &[&str] = &["is", "has", "with", "no", "enable", "disable"];

impl PositionalPolicy for KeyShapeHeuristic {
    fn is_positional(&self, key: &str) -> bool {
        let lower = key.to_ascii_lowercase();
        if BOOLEAN_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
            return false;
        }
        key.chars().count() > 1
            && !key.contains('_')
            && !to_kebab_case(key).contains('-')
            && !is_all_uppercase(key)
    }
}

/// Every parameter becomes a flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverPositional;

impl PositionalPolicy for NeverPositional {
    fn is_positional(&self, _key: &str) -> bool {
        false
    }
}

/// Reconstructs arguments using the default [`KeyShapeHeuristic`].
///
/// # Examples
///
/// ```
/// use command_tools_discovery::reconstruct;
/// use serde_json::json;
///
/// let params = json!({"name": "x", "resourceGroup": "rg1", "generateSshKeys": true});
/// let args = reconstruct("az", "vm-create", params.as_object().unwrap());
///
/// assert_eq!(
///     args,
///     vec!["vm", "create", "--resource-group", "rg1", "--generate-ssh-keys", "x"]
/// );
/// ```
pub fn reconstruct(base_command: &str, tool_name: &str, params: &Map<String, Value>) -> Vec<String> {
    reconstruct_with(base_command, tool_name, params, &KeyShapeHeuristic)
}

/// Reconstructs arguments, deriving the subcommand path from the tool name.
///
/// The base command prefix is implicit and dropped; the rest of the name is
/// split on `-`. Subcommands whose own names contain hyphens cannot be told
/// apart this way; use [`reconstruct_with_path`] when the exact path is known.
pub fn reconstruct_with(
    base_command: &str,
    tool_name: &str,
    params: &Map<String, Value>,
    policy: &dyn PositionalPolicy,
) -> Vec<String> {
    let path: Vec<String> = if tool_name == base_command {
        Vec::new()
    } else if let Some(rest) = tool_name
        .strip_prefix(base_command)
        .and_then(|rest| rest.strip_prefix('-'))
    {
        split_tool_name(rest)
    } else {
        split_tool_name(tool_name)
    };

    reconstruct_with_path(&path, params, policy)
}

/// Reconstructs arguments after an explicit subcommand path.
pub fn reconstruct_with_path(
    path: &[String],
    params: &Map<String, Value>,
    policy: &dyn PositionalPolicy,
) -> Vec<String> {
    if let Some(raw) = params.get(RAW_ARGS_KEY) {
        return raw_tokens(raw);
    }

    let mut args: Vec<String> = path.to_vec();
    let mut positionals = Vec::new();

    for (key, value) in params {
        if key.is_empty() {
            continue;
        }
        let short = key.chars().count() == 1;
        match value {
            Value::Null => {}
            Value::Bool(true) => args.push(flag_for(key)),
            Value::Bool(false) => {}
            _ if !short && policy.is_positional(key) => match value {
                Value::Array(items) => positionals.extend(items.iter().filter_map(stringify)),
                other => positionals.extend(stringify(other)),
            },
            Value::Array(items) => {
                let flag = flag_for(key);
                for item in items.iter().filter_map(stringify) {
                    args.push(flag.clone());
                    args.push(item);
                }
            }
            other => {
                if let Some(text) = stringify(other) {
                    args.push(flag_for(key));
                    args.push(text);
                }
            }
        }
    }

    args.extend(positionals);
    args
}

fn split_tool_name(name: &str) -> Vec<String> {
    name.split('-')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn flag_for(key: &str) -> String {
    if key.chars().count() == 1 {
        format!("-{key}")
    } else {
        format!("--{}", to_kebab_case(key))
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

fn raw_tokens(raw: &Value) -> Vec<String> {
    match raw {
        Value::Array(items) => items.iter().filter_map(stringify).collect(),
        other => stringify(other).into_iter().collect(),
    }
}
