//! Help-driven command discovery and tool synthesis.
//!
//! This crate turns an arbitrary command-line program into a catalog of
//! callable tools. It runs `<command> --help` recursively, parses the
//! free-form help text into a [`CommandNode`] tree, flattens the tree into
//! [`ToolDescriptor`]s with JSON-Schema-shaped inputs, and maps tool calls
//! back into argument lists.
//!
//! # Main entry points
//!
//! - [`parse_help_text`] parses captured help text without running anything.
//! - [`DiscoveryEngine::discover`] builds a tree by running help commands.
//! - [`synthesize`] flattens a tree into tools.
//! - [`reconstruct`] turns a tool name and parameters into arguments.
//! - [`ToolCatalog`] ties the pieces to a [`CommandRunner`].
//!
//! # Example
//!
//! ```
//! use command_tools_discovery::{parse_help_text, synthesize};
//!
//! let help = "\
//! Usage: mycli <COMMAND>
//!
//! Commands:
//!   build  Build the project
//!   clean  Remove build output
//!
//! Options:
//!   -v, --verbose          Enable verbose output
//!   -o, --output <PATH>    Output directory
//! ";
//!
//! let tree = parse_help_text("mycli", help);
//! assert_eq!(tree.subcommand_names(), vec!["build", "clean"]);
//!
//! let tools = synthesize(&tree, "mycli");
//! let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
//! assert_eq!(names, vec!["mycli", "build", "clean"]);
//! assert!(tools[0].input_schema.properties.contains_key("output"));
//! ```
//!
//! [`CommandNode`]: command_tools_core::CommandNode
//! [`ToolDescriptor`]: command_tools_core::ToolDescriptor

pub mod cache;
pub mod catalog;
pub mod config;
pub mod discover;
pub mod error;
pub mod naming;
pub mod parser;
pub mod reconstruct;
pub mod runner;
pub mod synth;

pub use catalog::{EXECUTE_TOOL_NAME, ToolCatalog, format_output};
pub use config::DiscoveryConfig;
pub use discover::DiscoveryEngine;
pub use error::{CacheError, ConfigError, ServeError};
pub use parser::{HelpParser, Vocabulary, parse_help_text, parse_help_text_with};
pub use reconstruct::{
    KeyShapeHeuristic, NeverPositional, PositionalPolicy, RAW_ARGS_KEY, reconstruct,
    reconstruct_with, reconstruct_with_path,
};
pub use runner::{CommandRunner, ProcessRunner, RunOutput};
pub use synth::synthesize;
