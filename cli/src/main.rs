use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use command_tools_core::CommandNode;
use command_tools_discovery::cache::{self, load_snapshot, save_snapshot, snapshot_path};
use command_tools_discovery::{
    DiscoveryConfig, DiscoveryEngine, EXECUTE_TOOL_NAME, ProcessRunner, ToolCatalog,
    parse_help_text, synthesize,
};
use serde_json::{Value, json};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "command-tools")]
#[command(about = "Discover a command's help tree and call it as tools")]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Snapshot directory (default: $XDG_CACHE_HOME/command-tools).
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run help commands recursively and print the command tree.
    Discover(DiscoverArgs),
    /// Discover at the pre-build depth and save the snapshot.
    Prebuild(PrebuildArgs),
    /// Print the tool list for a command, discovering it if needed.
    Tools(ToolsArgs),
    /// Parse help text from a file without executing commands.
    ParseFile(ParseFileArgs),
    /// Parse help text from stdin without executing commands.
    ParseStdin(ParseStdinArgs),
    /// Invoke one tool with JSON parameters.
    Call(CallArgs),
    /// Run a free-form command line through the execute tool.
    Exec(ExecArgs),
}

#[derive(Debug, Args)]
struct DiscoverArgs {
    /// Base command to discover (e.g. kubectl).
    command: String,
    /// Maximum recursion depth (default: config max_depth).
    #[arg(long)]
    depth: Option<usize>,
    /// Write the tree JSON to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PrebuildArgs {
    /// Base command to discover.
    command: String,
    /// Maximum recursion depth (default: config prebuild_depth).
    #[arg(long)]
    depth: Option<usize>,
}

#[derive(Debug, Args)]
struct ToolsArgs {
    /// Base command whose tools to list.
    command: String,
    /// Ignore any saved snapshot and discover again.
    #[arg(long)]
    refresh: bool,
}

#[derive(Debug, Args)]
struct ParseFileArgs {
    /// Command name for the help text being parsed.
    #[arg(long)]
    command: String,
    /// Path to file containing help text.
    #[arg(long)]
    input: PathBuf,
    /// Print the synthesized tools instead of the tree.
    #[arg(long)]
    tools: bool,
}

#[derive(Debug, Args)]
struct ParseStdinArgs {
    /// Command name for the help text being parsed.
    #[arg(long)]
    command: String,
    /// Print the synthesized tools instead of the tree.
    #[arg(long)]
    tools: bool,
}

#[derive(Debug, Args)]
struct CallArgs {
    /// Base command.
    command: String,
    /// Tool name as listed by `tools`.
    tool: String,
    /// Tool parameters as a JSON object.
    #[arg(long, default_value = "{}")]
    params: String,
    /// Print the argument list instead of running it.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct ExecArgs {
    /// Base command.
    command: String,
    /// Command line, with or without the base command in front.
    #[arg(allow_hyphen_values = true)]
    command_line: String,
}

/// Resolved global settings shared by every sub-command.
struct Context {
    config: DiscoveryConfig,
    cache_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = load_context(&cli).and_then(|ctx| match cli.command {
        Command::Discover(args) => run_discover(&ctx, args),
        Command::Prebuild(args) => run_prebuild(&ctx, args),
        Command::Tools(args) => run_tools(&ctx, args),
        Command::ParseFile(args) => run_parse_file(args),
        Command::ParseStdin(args) => run_parse_stdin(args),
        Command::Call(args) => run_call(&ctx, args),
        Command::Exec(args) => run_exec(&ctx, args),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_context(cli: &Cli) -> Result<Context, String> {
    let config = match &cli.config {
        Some(path) => DiscoveryConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => DiscoveryConfig::default(),
    };
    let cache_dir = cli.cache_dir.clone().unwrap_or_else(cache::default_dir);
    Ok(Context { config, cache_dir })
}

fn engine(ctx: &Context) -> DiscoveryEngine {
    DiscoveryEngine::new(Arc::new(ProcessRunner), ctx.config.clone())
}

// ---------------------------------------------------------------------------
// discovery commands
// ---------------------------------------------------------------------------

fn run_discover(ctx: &Context, args: DiscoverArgs) -> Result<(), String> {
    let depth = args.depth.unwrap_or(ctx.config.max_depth);
    let tree = engine(ctx).discover(&args.command, depth);
    let raw = to_pretty_json(&tree)?;

    match args.output {
        Some(path) => {
            write_file(&path, &raw)?;
            println!(
                "Wrote {} node(s) for '{}' to '{}'.",
                tree.node_count(),
                args.command,
                path.display()
            );
        }
        None => println!("{raw}"),
    }
    Ok(())
}

fn run_prebuild(ctx: &Context, args: PrebuildArgs) -> Result<(), String> {
    let depth = args.depth.unwrap_or(ctx.config.prebuild_depth);
    let tree = engine(ctx).discover(&args.command, depth);
    let path = snapshot_path(&ctx.cache_dir, &args.command);
    save_snapshot(&args.command, &tree, &path)
        .map_err(|err| format!("Failed to save snapshot '{}': {err}", path.display()))?;

    println!(
        "Saved {} node(s) for '{}' to '{}'.",
        tree.node_count(),
        args.command,
        path.display()
    );
    Ok(())
}

fn run_tools(ctx: &Context, args: ToolsArgs) -> Result<(), String> {
    let tree = load_or_discover(ctx, &args.command, args.refresh);
    let catalog = catalog(ctx, &args.command, &tree);
    println!("{}", to_pretty_json(catalog.tools())?);
    Ok(())
}

/// Returns the saved tree for `command`, discovering and saving it on a miss.
fn load_or_discover(ctx: &Context, command: &str, refresh: bool) -> CommandNode {
    let path = snapshot_path(&ctx.cache_dir, command);
    if !refresh && let Some(snapshot) = load_snapshot(&path) {
        return snapshot.data;
    }

    let tree = engine(ctx).discover_default(command);
    if let Err(err) = save_snapshot(command, &tree, &path) {
        warn!(command, path = %path.display(), error = %err, "Failed to save snapshot");
    }
    tree
}

fn catalog(ctx: &Context, command: &str, tree: &CommandNode) -> ToolCatalog {
    ToolCatalog::new(
        command,
        tree,
        Arc::new(ProcessRunner),
        ctx.config.call_timeout(),
    )
}

// ---------------------------------------------------------------------------
// offline parsing
// ---------------------------------------------------------------------------

fn run_parse_file(args: ParseFileArgs) -> Result<(), String> {
    let help_text = fs::read_to_string(&args.input)
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;
    print_parsed(&args.command, &help_text, args.tools)
}

fn run_parse_stdin(args: ParseStdinArgs) -> Result<(), String> {
    let mut help_text = String::new();
    std::io::stdin()
        .read_to_string(&mut help_text)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;
    print_parsed(&args.command, &help_text, args.tools)
}

fn print_parsed(command: &str, help_text: &str, tools: bool) -> Result<(), String> {
    let tree = parse_help_text(command, help_text);
    let raw = if tools {
        to_pretty_json(&synthesize(&tree, command))?
    } else {
        to_pretty_json(&tree)?
    };
    println!("{raw}");
    Ok(())
}

// ---------------------------------------------------------------------------
// tool calls
// ---------------------------------------------------------------------------

fn run_call(ctx: &Context, args: CallArgs) -> Result<(), String> {
    let params: Value = serde_json::from_str(&args.params)
        .map_err(|err| format!("Invalid --params JSON: {err}"))?;
    let tree = load_or_discover(ctx, &args.command, false);
    let catalog = catalog(ctx, &args.command, &tree);

    if args.dry_run {
        let argv = catalog
            .arguments_for(&args.tool, &params)
            .map_err(|err| err.to_string())?;
        println!("{}", to_pretty_json(&argv)?);
        return Ok(());
    }

    let text = catalog
        .call(&args.tool, &params)
        .map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}

fn run_exec(ctx: &Context, args: ExecArgs) -> Result<(), String> {
    // The execute tool needs no tree; an empty root keeps it from being shadowed.
    let root = CommandNode::new(&args.command);
    let catalog = catalog(ctx, &args.command, &root);
    let text = catalog
        .call(EXECUTE_TOOL_NAME, &json!({ "command": args.command_line }))
        .map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("Failed to serialize output: {err}"))
}

fn write_file(path: &Path, raw: &str) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create output directory '{}': {err}",
                parent.display()
            )
        })?;
    }
    fs::write(path, raw).map_err(|err| format!("Failed to write '{}': {err}", path.display()))
}
