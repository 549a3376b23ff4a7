//! Core types for help-derived tool catalogs.
//!
//! This crate defines the data model shared by the discovery crate and its
//! consumers:
//!
//! - [`CommandNode`]: one command or subcommand with its options, positional
//!   arguments and nested subcommands.
//! - [`OptionSpec`]: a flag with long/short forms and an optional value.
//! - [`PositionalArg`]: a required or optional positional argument.
//! - [`ToolDescriptor`]: an invocable tool with an [`InputSchema`].
//! - [`CommandCache`]: a persisted snapshot of a discovered tree.
//!
//! # Example
//!
//! ```
//! use command_tools_core::*;
//!
//! let tree = CommandNode::new("mycli")
//!     .with_option(OptionSpec::flag("--verbose").with_short("-v"))
//!     .with_subcommand(
//!         CommandNode::new("run")
//!             .with_description("Run a script")
//!             .with_argument(PositionalArg::required("script")),
//!     );
//!
//! assert_eq!(tree.find_subcommand("run").unwrap().arguments.len(), 1);
//! assert!(tree.find_option("-v").is_some());
//! ```

mod types;

pub use types::*;
