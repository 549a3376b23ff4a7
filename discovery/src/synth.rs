//! Flattens a command tree into a list of callable tools.

use std::collections::HashSet;

use command_tools_core::{
    CommandNode, InputSchema, OptionSpec, PositionalArg, PropertySchema, PropertyType,
    ToolDescriptor,
};
use tracing::debug;

use crate::naming::to_camel_case;

/// Deepest command path that still yields a tool.
pub const MAX_TOOL_PATH_SEGMENTS: usize = 10;

/// Synthesizes one tool per distinguishable command path.
///
/// Pre-order traversal: the root becomes a tool named `base_command`, every
/// other node becomes a tool named by hyphen-joining its path (with
/// `base_command` segments filtered out). Tool names are unique; when two
/// paths flatten to the same name the first one wins and the later one is
/// dropped.
///
/// # Examples
///
/// ```
/// use command_tools_core::{CommandNode, OptionSpec};
/// use command_tools_discovery::synthesize;
///
/// let tree = CommandNode::new("root")
///     .with_option(OptionSpec::flag("--help").with_short("-h"))
///     .with_subcommand(CommandNode::new("sub").with_subcommand(CommandNode::new("leaf")));
///
/// let tools = synthesize(&tree, "root");
/// let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
/// assert_eq!(names, vec!["root", "sub", "sub-leaf"]);
/// assert!(tools[0].input_schema.properties.contains_key("help"));
/// assert!(tools[0].input_schema.properties.contains_key("h"));
/// ```
pub fn synthesize(root: &CommandNode, base_command: &str) -> Vec<ToolDescriptor> {
    let mut synth = Synthesizer {
        base_command,
        tools: Vec::new(),
        seen: HashSet::new(),
    };

    synth.register(base_command.to_string(), root, Vec::new());
    for child in &root.subcommands {
        synth.walk(child, vec![child.name.clone()]);
    }

    debug!(command = base_command, tools = synth.tools.len(), "Synthesized tools");
    synth.tools
}

struct Synthesizer<'a> {
    base_command: &'a str,
    tools: Vec<ToolDescriptor>,
    seen: HashSet<String>,
}

impl Synthesizer<'_> {
    fn walk(&mut self, node: &CommandNode, path: Vec<String>) {
        if path.len() > MAX_TOOL_PATH_SEGMENTS {
            debug!(path = ?path, "Command path too deep; not synthesizing further");
            return;
        }

        let name = path
            .iter()
            .filter(|segment| segment.as_str() != self.base_command)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("-");
        if !name.is_empty() {
            self.register(name, node, path.clone());
        }

        for child in &node.subcommands {
            let mut child_path = path.clone();
            child_path.push(child.name.clone());
            self.walk(child, child_path);
        }
    }

    fn register(&mut self, name: String, node: &CommandNode, command_path: Vec<String>) {
        if !self.seen.insert(name.clone()) {
            debug!(tool = %name, "Duplicate tool name; keeping the first registration");
            return;
        }

        let description = if node.description.is_empty() {
            if command_path.is_empty() {
                format!("Run '{}'", self.base_command)
            } else {
                format!("Run '{} {}'", self.base_command, command_path.join(" "))
            }
        } else {
            node.description.clone()
        };

        self.tools.push(ToolDescriptor {
            name,
            description,
            input_schema: build_schema(node),
            command_path,
        });
    }
}

/// Builds the input schema from a node's own options and arguments.
pub fn build_schema(node: &CommandNode) -> InputSchema {
    let mut schema = InputSchema::default();

    for option in &node.options {
        add_option(&mut schema, option);
    }
    for arg in &node.arguments {
        add_argument(&mut schema, arg);
    }

    schema
}

fn add_option(schema: &mut InputSchema, option: &OptionSpec) {
    let property_type = if option.value_required {
        PropertyType::String
    } else {
        PropertyType::Boolean
    };

    let mut description = option.description.clone();
    if let Some(value_name) = &option.value_name {
        if description.is_empty() {
            description = format!("(value: {value_name})");
        } else {
            description = format!("{description} (value: {value_name})");
        }
    }

    let property = to_camel_case(&option.name);
    if property.is_empty() {
        return;
    }
    schema.insert(&property, PropertySchema::new(property_type, description));

    if let Some(short) = &option.short_name {
        let alias = short.trim_start_matches('-');
        if !alias.is_empty() {
            schema.insert(
                alias,
                PropertySchema::new(property_type, format!("Alias for {}", option.name)),
            );
        }
    }
}

fn add_argument(schema: &mut InputSchema, arg: &PositionalArg) {
    let property = to_camel_case(&arg.name);
    if property.is_empty() {
        return;
    }
    let description = if arg.description.is_empty() {
        format!("Positional argument {}", arg.name)
    } else {
        arg.description.clone()
    };

    if schema.insert(&property, PropertySchema::new(PropertyType::String, description))
        && arg.required
    {
        schema.require(&property);
    }
}
