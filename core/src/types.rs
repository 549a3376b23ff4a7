//! Command tree and tool descriptor definitions.
//!
//! This module defines the data model shared by the parser, the discovery
//! engine and the tool synthesizer. The types are designed for serialization
//! with [`serde`]; the JSON field names use camelCase so that cached trees and
//! tool catalogs read naturally to tool-serving clients.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A flag accepted by a command.
///
/// `name` holds the canonical form: the long flag when the help text shows
/// one (e.g. `--verbose`), otherwise the short flag.
///
/// # Examples
///
/// ```
/// use command_tools_core::OptionSpec;
///
/// let verbose = OptionSpec::flag("--verbose")
///     .with_short("-v")
///     .with_description("Enable verbose output");
/// assert_eq!(verbose.name, "--verbose");
/// assert_eq!(verbose.short_name.as_deref(), Some("-v"));
/// assert!(!verbose.value_required);
///
/// let output = OptionSpec::with_value("--output", "FILE");
/// assert!(output.value_required);
/// assert_eq!(output.value_name.as_deref(), Some("FILE"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    /// Canonical flag (e.g. "--message")
    pub name: String,
    /// Short form (e.g. "-m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// Description from help text
    #[serde(default)]
    pub description: String,
    /// Whether the flag takes a value
    #[serde(default)]
    pub value_required: bool,
    /// Value placeholder shown in the help text (e.g. "FILE")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,
}

impl OptionSpec {
    /// Creates a boolean flag (no value).
    pub fn flag(name: &str) -> Self {
        Self {
            name: name.to_string(),
            short_name: None,
            description: String::new(),
            value_required: false,
            value_name: None,
        }
    }

    /// Creates a flag that takes a value.
    pub fn with_value(name: &str, value_name: &str) -> Self {
        Self {
            value_required: true,
            value_name: Some(value_name.to_string()),
            ..Self::flag(name)
        }
    }

    /// Adds a short form.
    pub fn with_short(mut self, short: &str) -> Self {
        self.short_name = Some(short.to_string());
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Checks if this option matches a given flag string (short or long form).
    pub fn matches(&self, flag: &str) -> bool {
        self.name == flag || self.short_name.as_deref() == Some(flag)
    }
}

/// A positional argument.
///
/// # Examples
///
/// ```
/// use command_tools_core::PositionalArg;
///
/// let file = PositionalArg::required("file").with_description("Input file");
/// assert!(file.required);
///
/// let pattern = PositionalArg::optional("pattern");
/// assert!(!pattern.required);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionalArg {
    /// Name of the argument (e.g. "file")
    pub name: String,
    /// Description from help text
    #[serde(default)]
    pub description: String,
    /// `<x>` in the help text is required, `[x]` is optional
    #[serde(default)]
    pub required: bool,
}

impl PositionalArg {
    /// Creates a required positional argument.
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            required: true,
        }
    }

    /// Creates an optional positional argument.
    pub fn optional(name: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }
}

/// One node of a discovered command tree.
///
/// A node starts life as a stub produced from its parent's command listing
/// (name and description only) and is filled in once its own help text has
/// been parsed.
///
/// Sibling order is the order in which entries appeared in the parent's help
/// text. Sibling names are not required to be unique.
///
/// # Examples
///
/// ```
/// use command_tools_core::{CommandNode, OptionSpec, PositionalArg};
///
/// let node = CommandNode::new("git")
///     .with_description("The stupid content tracker")
///     .with_option(OptionSpec::flag("--version"))
///     .with_subcommand(
///         CommandNode::new("clone").with_argument(PositionalArg::required("repository")),
///     );
///
/// assert_eq!(node.subcommand_names(), vec!["clone"]);
/// assert!(node.find_subcommand("clone").is_some());
/// assert_eq!(node.node_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandNode {
    /// Token used to reach this node from its parent
    pub name: String,
    /// Short description (possibly empty)
    #[serde(default)]
    pub description: String,
    /// Nested subcommands, in first-seen order
    #[serde(default)]
    pub subcommands: Vec<CommandNode>,
    /// Flags accepted by this node
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    /// Positional arguments accepted by this node
    #[serde(default)]
    pub arguments: Vec<PositionalArg>,
}

impl CommandNode {
    /// Creates an empty node with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Adds a nested subcommand.
    pub fn with_subcommand(mut self, sub: CommandNode) -> Self {
        self.subcommands.push(sub);
        self
    }

    /// Adds an option.
    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a positional argument.
    pub fn with_argument(mut self, arg: PositionalArg) -> Self {
        self.arguments.push(arg);
        self
    }

    /// Finds the first subcommand with the given name.
    pub fn find_subcommand(&self, name: &str) -> Option<&CommandNode> {
        self.subcommands.iter().find(|s| s.name == name)
    }

    /// Finds an option by short or long form.
    pub fn find_option(&self, flag: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.matches(flag))
    }

    /// Gets all immediate subcommand names, in order.
    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|s| s.name.as_str()).collect()
    }

    /// Counts this node and every descendant.
    pub fn node_count(&self) -> usize {
        1 + self
            .subcommands
            .iter()
            .map(CommandNode::node_count)
            .sum::<usize>()
    }

    /// Returns the length of the longest path from this node to a leaf.
    ///
    /// A node without subcommands has depth 0.
    pub fn max_depth(&self) -> usize {
        self.subcommands
            .iter()
            .map(|s| s.max_depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Returns `true` when the node carries nothing beyond its name.
    pub fn is_empty(&self) -> bool {
        self.description.is_empty()
            && self.subcommands.is_empty()
            && self.options.is_empty()
            && self.arguments.is_empty()
    }
}

/// JSON type of a tool input property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// Value-taking flags and positional arguments.
    String,
    /// Flags without a value.
    Boolean,
}

/// One property of a tool input schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default)]
    pub description: String,
}

impl PropertySchema {
    pub fn new(property_type: PropertyType, description: impl Into<String>) -> Self {
        Self {
            property_type,
            description: description.into(),
        }
    }
}

/// Object-shaped input schema for a tool.
///
/// Serializes as a JSON-Schema object: `{"type": "object", "properties":
/// {...}, "required": [...]}`. Property order is insertion order.
///
/// # Examples
///
/// ```
/// use command_tools_core::{InputSchema, PropertySchema, PropertyType};
///
/// let mut schema = InputSchema::default();
/// assert!(schema.insert("file", PropertySchema::new(PropertyType::String, "Input")));
/// assert!(!schema.insert("file", PropertySchema::new(PropertyType::Boolean, "dup")));
/// schema.require("file");
///
/// let json = serde_json::to_value(&schema).unwrap();
/// assert_eq!(json["type"], "object");
/// assert_eq!(json["properties"]["file"]["type"], "string");
/// assert_eq!(json["required"][0], "file");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: IndexMap::new(),
            required: Vec::new(),
        }
    }
}

impl InputSchema {
    /// Inserts a property unless one with the same name already exists.
    ///
    /// Returns `false` when the name was already taken.
    pub fn insert(&mut self, name: &str, property: PropertySchema) -> bool {
        if self.properties.contains_key(name) {
            return false;
        }
        self.properties.insert(name.to_string(), property);
        true
    }

    /// Marks a property as required (once).
    pub fn require(&mut self, name: &str) {
        if !self.required.iter().any(|existing| existing == name) {
            self.required.push(name.to_string());
        }
    }
}

/// An externally callable tool derived from one command path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Hyphen-joined command path, or the base command name for the root tool
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
    /// Exact subcommand tokens between the base command and the flags
    #[serde(skip)]
    pub command_path: Vec<String>,
}

/// Persisted snapshot of a discovered command tree.
///
/// # Examples
///
/// ```
/// use command_tools_core::{CommandCache, CommandNode};
///
/// let cache = CommandCache::new("az", 1_700_000_000_000, CommandNode::new("az"));
/// let raw = serde_json::to_string(&cache).unwrap();
/// let back: CommandCache = serde_json::from_str(&raw).unwrap();
/// assert_eq!(back, cache);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCache {
    pub command: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub data: CommandNode,
}

impl CommandCache {
    pub fn new(command: &str, timestamp: i64, data: CommandNode) -> Self {
        Self {
            command: command.to_string(),
            timestamp,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_spec_serializes_camel_case() {
        let option = OptionSpec::with_value("--output", "FILE").with_short("-o");
        let json = serde_json::to_value(&option).unwrap();

        assert_eq!(json["shortName"], "-o");
        assert_eq!(json["valueRequired"], true);
        assert_eq!(json["valueName"], "FILE");
    }

    #[test]
    fn test_command_node_depth_and_count() {
        let tree = CommandNode::new("root").with_subcommand(
            CommandNode::new("sub").with_subcommand(CommandNode::new("leaf")),
        );

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.max_depth(), 2);
        assert_eq!(CommandNode::new("x").max_depth(), 0);
    }

    #[test]
    fn test_command_node_tolerates_missing_collections() {
        let node: CommandNode = serde_json::from_str(r#"{"name":"deploy"}"#).unwrap();
        assert_eq!(node.name, "deploy");
        assert!(node.is_empty());
    }

    #[test]
    fn test_command_cache_requires_data() {
        let parsed = serde_json::from_str::<CommandCache>(r#"{"command":"az","timestamp":1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_tool_descriptor_skips_command_path() {
        let tool = ToolDescriptor {
            name: "vm-create".to_string(),
            description: "Create a VM".to_string(),
            input_schema: InputSchema::default(),
            command_path: vec!["vm".to_string(), "create".to_string()],
        };
        let json = serde_json::to_value(&tool).unwrap();

        assert!(json.get("commandPath").is_none());
        assert_eq!(json["inputSchema"]["type"], "object");
    }
}
