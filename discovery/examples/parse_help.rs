//! Offline help parsing example.
//!
//! Parses pre-captured help output into a command tree, flattens it into
//! tools, and rebuilds the argument list for one tool call, all without
//! executing anything.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-tools-discovery --example parse_help
//! ```

use command_tools_discovery::{parse_help_text, reconstruct, synthesize};
use serde_json::json;

fn main() {
    // Clap-style help
    let help_text = r#"
Usage: mycli [OPTIONS] <COMMAND>

A fictional CLI tool for demonstration

Commands:
  init     Initialize a new project
  build    Build the project
  deploy   Deploy to production
  help     Print this message or the help of the given subcommand(s)

Options:
  -v, --verbose          Enable verbose output
  -q, --quiet            Suppress all output
  -c, --config <FILE>    Path to config file [default: config.toml]
      --no-color         Disable colored output
  -j, --jobs <N>         Number of parallel jobs [default: 4]
  -h, --help             Print help
  -V, --version          Print version
"#;

    let tree = parse_help_text("mycli", help_text);

    println!("Command: {}", tree.name);
    println!("Description: {}", tree.description);

    println!("\nSubcommands ({}):", tree.subcommands.len());
    for sub in &tree.subcommands {
        println!("  {:<10} {}", sub.name, sub.description);
    }

    println!("\nOptions ({}):", tree.options.len());
    for opt in &tree.options {
        let short = opt.short_name.as_deref().unwrap_or("  ");
        let value = opt.value_name.as_deref().map(|v| format!(" <{v}>")).unwrap_or_default();
        println!("  {short} {}{value}", opt.name);
    }

    let tools = synthesize(&tree, "mycli");
    println!("\nTools ({}):", tools.len());
    for tool in &tools {
        let props: Vec<&str> = tool.input_schema.properties.keys().map(String::as_str).collect();
        println!("  {:<10} [{}]", tool.name, props.join(", "));
    }

    let params = json!({"verbose": true, "jobs": 8});
    let args = reconstruct("mycli", "build", params.as_object().expect("object literal"));
    println!("\nmycli {}", args.join(" "));
}
