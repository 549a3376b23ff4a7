use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use command_tools_core::CommandNode;
use command_tools_discovery::{CommandRunner, DiscoveryConfig, DiscoveryEngine, RunOutput};

/// Answers help requests from a table keyed by the space-joined subcommand
/// path ("" for the root). Unknown paths fail like an unknown subcommand.
struct ScriptedRunner {
    help: HashMap<String, RunOutput>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    fn new() -> Self {
        Self {
            help: HashMap::new(),
            delays: HashMap::new(),
            default_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_help(mut self, path: &str, text: String) -> Self {
        self.help.insert(path.to_string(), RunOutput::new(&text, "", 0));
        self
    }

    fn with_output(mut self, path: &str, output: RunOutput) -> Self {
        self.help.insert(path.to_string(), output);
        self
    }

    fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    fn calls_for(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|args| path_key(args) == path)
            .count()
    }

    fn all_calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, _command: &str, args: &[String], _timeout: Duration) -> RunOutput {
        self.calls.lock().unwrap().push(args.to_vec());
        let key = path_key(args);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(&key).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.help
            .get(&key)
            .cloned()
            .unwrap_or_else(|| RunOutput::new("", &format!("unknown command '{key}'"), 1))
    }
}

/// Path without the trailing help flag.
fn path_key(args: &[String]) -> String {
    let end = args.len().saturating_sub(1);
    args[..end].join(" ")
}

fn listing(description: &str, children: &[&str]) -> String {
    let mut text = format!("{description}\n\n");
    if !children.is_empty() {
        text.push_str("Commands:\n");
        for child in children {
            text.push_str(&format!("  {child}    The {child} command\n"));
        }
        text.push('\n');
    }
    text.push_str("Options:\n  -h, --help    Show help\n");
    text
}

fn engine(runner: Arc<ScriptedRunner>, batch_size: usize) -> DiscoveryEngine {
    let config = DiscoveryConfig {
        batch_size,
        ..DiscoveryConfig::default()
    };
    DiscoveryEngine::new(runner, config)
}

fn three_level_runner() -> ScriptedRunner {
    ScriptedRunner::new()
        .with_help("", listing("Tool root", &["alpha", "beta"]))
        .with_help("alpha", listing("Alpha things", &["one", "two"]))
        .with_help("beta", listing("Beta things", &[]))
        .with_help("alpha one", listing("First", &["deep"]))
        .with_help("alpha two", listing("Second", &[]))
        .with_help("alpha one deep", listing("Deepest", &["deeper"]))
}

fn max_path_len(node: &CommandNode) -> usize {
    node.max_depth()
}

#[test]
fn test_discover_builds_merged_tree() {
    let runner = Arc::new(three_level_runner());
    let tree = engine(Arc::clone(&runner), 4).discover("tool", 2);

    assert_eq!(tree.name, "tool");
    assert_eq!(tree.description, "Tool root");
    assert_eq!(tree.subcommand_names(), vec!["alpha", "beta"]);

    let alpha = tree.find_subcommand("alpha").unwrap();
    // The parent's listing wins over the child's own description
    assert_eq!(alpha.description, "The alpha command");
    assert_eq!(alpha.subcommand_names(), vec!["one", "two"]);
    assert!(alpha.find_option("--help").is_some());

    let one = alpha.find_subcommand("one").unwrap();
    assert!(one.find_option("--help").is_some());
    assert!(one.subcommands.is_empty());
}

#[test]
fn test_depth_bound() {
    for max_depth in 0..=3 {
        let runner = Arc::new(three_level_runner());
        let tree = engine(Arc::clone(&runner), 4).discover("tool", max_depth);

        assert!(
            max_path_len(&tree) <= max_depth,
            "max_depth {max_depth} produced depth {}",
            max_path_len(&tree)
        );
    }

    let runner = Arc::new(three_level_runner());
    let tree = engine(Arc::clone(&runner), 4).discover("tool", 3);
    assert_eq!(max_path_len(&tree), 3);
    assert_eq!(runner.calls_for("alpha one deep deeper"), 0);
}

#[test]
fn test_depth_zero_keeps_root_options_only() {
    let runner = Arc::new(three_level_runner());
    let tree = engine(Arc::clone(&runner), 4).discover("tool", 0);

    assert!(tree.subcommands.is_empty());
    assert!(tree.find_option("--help").is_some());
    assert_eq!(runner.all_calls().len(), 1);
}

#[test]
fn test_discovery_is_idempotent() {
    let first = engine(Arc::new(three_level_runner()), 3).discover("tool", 3);
    let second = engine(Arc::new(three_level_runner()), 3).discover("tool", 3);
    assert_eq!(first, second);

    let engine = engine(Arc::new(three_level_runner()), 1);
    assert_eq!(engine.discover("tool", 3), engine.discover("tool", 3));
}

#[test]
fn test_concurrency_cap_holds_across_levels() {
    let children: Vec<String> = (0..12).map(|i| format!("child{i:02}")).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();

    let mut runner = ScriptedRunner::new()
        .with_help("", listing("Wide tool", &child_refs))
        .with_default_delay(Duration::from_millis(20));
    for child in &children {
        runner = runner.with_help(child, listing("Child", &["leafa", "leafb", "leafc"]));
    }
    let runner = Arc::new(runner);

    let batch_size = 4;
    let tree = engine(Arc::clone(&runner), batch_size).discover("wide", 2);

    assert_eq!(tree.subcommands.len(), 12);
    assert!(tree.subcommands.iter().all(|child| child.subcommands.len() == 3));
    let peak = runner.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= batch_size, "peak {peak} exceeded batch size {batch_size}");
    assert!(peak >= 1);
}

#[test]
fn test_failures_stay_local() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .with_help("", listing("Root", &["good", "slow", "broken"]))
            .with_help("good", listing("Good", &["inner"]))
            .with_output("slow", RunOutput::new("", "timed out after 10ms", -2))
            .with_output("broken", RunOutput::new("", "segfault", 139)),
    );
    let tree = engine(Arc::clone(&runner), 2).discover("tool", 2);

    assert_eq!(tree.subcommand_names(), vec!["good", "slow", "broken"]);
    assert_eq!(tree.subcommands[0].subcommand_names(), vec!["inner"]);

    let slow = &tree.subcommands[1];
    assert_eq!(slow.description, "The slow command");
    assert!(slow.options.is_empty() && slow.subcommands.is_empty());

    let broken = &tree.subcommands[2];
    assert!(broken.options.is_empty() && broken.subcommands.is_empty());
}

#[test]
fn test_sibling_order_is_parse_order_not_completion_order() {
    let names = ["zeta", "alpha", "mid", "beta", "omega"];
    let mut runner = ScriptedRunner::new().with_help("", listing("Root", &names));
    for (index, name) in names.iter().enumerate() {
        runner = runner
            .with_help(name, listing(name, &[]))
            .with_delay(name, Duration::from_millis(10 * (names.len() - index) as u64));
    }
    let tree = engine(Arc::new(runner), 5).discover("tool", 1);

    assert_eq!(tree.subcommand_names(), names.to_vec());
}

#[test]
fn test_skip_list_children_are_listed_but_not_run() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .with_help("", listing("Root", &["serve", "help", "completion", "version"]))
            .with_help("serve", listing("Serve", &[])),
    );
    let tree = engine(Arc::clone(&runner), 4).discover("tool", 1);

    assert_eq!(
        tree.subcommand_names(),
        vec!["serve", "help", "completion", "version"]
    );
    assert_eq!(runner.calls_for("help"), 0);
    assert_eq!(runner.calls_for("completion"), 0);
    assert_eq!(runner.calls_for("version"), 0);
    assert_eq!(runner.calls_for("serve"), 1);
}

#[test]
fn test_duplicate_paths_are_acquired_once() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .with_help("", listing("Root", &["sync", "sync", "other"]))
            .with_help("sync", listing("Sync", &[])),
    );
    let tree = engine(Arc::clone(&runner), 4).discover("tool", 1);

    assert_eq!(tree.subcommand_names(), vec!["sync", "sync", "other"]);
    assert_eq!(runner.calls_for("sync"), 1);
}

#[test]
fn test_self_listing_child_does_not_recurse() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .with_help("", listing("Root", &["loop"]))
            .with_help("loop", listing("Loop", &["loop", "inner"])),
    );
    let tree = engine(Arc::clone(&runner), 2).discover("tool", 3);

    assert!(tree.subcommands[0].subcommands.is_empty());
    assert_eq!(runner.calls_for("loop loop"), 0);
}

#[test]
fn test_parent_help_echo_is_ignored() {
    let siblings = ["install", "remove", "update", "search"];
    let parent = listing("Package tool", &siblings);
    let mut runner = ScriptedRunner::new().with_help("", parent.clone());
    for name in siblings {
        runner = runner.with_help(name, parent.clone());
    }
    let runner = Arc::new(runner);
    let tree = engine(Arc::clone(&runner), 4).discover("apt", 2);

    for child in &tree.subcommands {
        assert!(child.subcommands.is_empty(), "{} kept echoed children", child.name);
    }
    assert_eq!(runner.calls_for("install install"), 0);
}

#[test]
fn test_help_flag_and_stderr_help() {
    let runner = Arc::new(
        ScriptedRunner::new().with_output("", RunOutput::new("", &listing("Root", &["serve"]), 0)),
    );
    let config = DiscoveryConfig {
        help_flag: "-h".to_string(),
        ..DiscoveryConfig::default()
    };
    let tree = DiscoveryEngine::new(runner.clone(), config).discover("tool", 0);

    // Help printed to stderr with a clean exit still counts.
    assert!(tree.find_option("--help").is_some());
    assert_eq!(runner.all_calls(), vec![vec!["-h".to_string()]]);

    let usage_on_stderr = format!("Usage: tool [command]\n\n{}", listing("Root", &["serve"]));
    let runner = Arc::new(
        ScriptedRunner::new().with_output("", RunOutput::new("", &usage_on_stderr, 2)),
    );
    let tree = engine(runner, 2).discover("tool", 1);
    assert_eq!(tree, CommandNode::new("tool"));
}

#[test]
fn test_rejected_subcommand_with_usage_on_stdout_becomes_empty() {
    let rejection = "error: unrecognized subcommand 'bogus'\n\nOptions:\n  -x, --xtra  Extra\n";
    let runner = Arc::new(
        ScriptedRunner::new()
            .with_help("", listing("Root", &["bogus", "real"]))
            .with_output("bogus", RunOutput::new(rejection, "", 1))
            .with_help("real", listing("Real", &[])),
    );
    let tree = engine(runner, 2).discover("tool", 1);

    let bogus = tree.find_subcommand("bogus").unwrap();
    assert_eq!(bogus.description, "The bogus command");
    assert!(bogus.options.is_empty());
    assert!(bogus.subcommands.is_empty());
    assert!(tree.find_subcommand("real").unwrap().find_option("--help").is_some());
}

#[test]
fn test_configured_depths() {
    let config = DiscoveryConfig {
        max_depth: 1,
        prebuild_depth: 3,
        ..DiscoveryConfig::default()
    };
    let shallow = DiscoveryEngine::new(Arc::new(three_level_runner()), config.clone())
        .discover_default("tool");
    let deep = DiscoveryEngine::new(Arc::new(three_level_runner()), config).prebuild("tool");

    assert_eq!(max_path_len(&shallow), 1);
    assert_eq!(max_path_len(&deep), 3);
}
