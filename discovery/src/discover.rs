//! Recursive help discovery.
//!
//! Starting from a base command, acquires `<command> [path...] --help`,
//! parses it, and expands the listed subcommands level by level until the
//! depth limit. Every acquisition goes through a [`CommandRunner`] on a
//! dedicated rayon pool whose size is the batch size, so no more than
//! `batch_size` help processes ever run at once.
//!
//! Failures stay local: a node whose help cannot be acquired or parsed
//! becomes an empty node and its siblings carry on.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use command_tools_core::CommandNode;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::parser::{Vocabulary, parse_help_text_with};
use crate::runner::{CommandRunner, RunOutput};

/// Subcommands listed in the tree but never expanded.
const SKIPPED_SUBCOMMANDS: &[&str] = &["help", "version", "completion", "completions"];

/// Minimum number of sibling names a child's listing must repeat to be
/// treated as an echo of the parent help.
const PARENT_ECHO_SIBLING_OVERLAP: usize = 3;

/// Builds command trees by running help commands.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use command_tools_discovery::{DiscoveryConfig, DiscoveryEngine, ProcessRunner};
///
/// let engine = DiscoveryEngine::new(Arc::new(ProcessRunner), DiscoveryConfig::default());
/// let tree = engine.discover("git", 1);
/// println!("{} subcommands", tree.subcommands.len());
/// ```
pub struct DiscoveryEngine {
    runner: Arc<dyn CommandRunner>,
    config: DiscoveryConfig,
    vocabulary: Vocabulary,
}

impl DiscoveryEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, config: DiscoveryConfig) -> Self {
        Self {
            runner,
            config,
            vocabulary: Vocabulary::default(),
        }
    }

    /// Replaces the vocabulary used to parse every node.
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Discovers the command tree of `base_command` down to `max_depth`.
    ///
    /// The root is depth 0. Nodes at `max_depth` keep their own description,
    /// options, and arguments but list no subcommands.
    pub fn discover(&self, base_command: &str, max_depth: usize) -> CommandNode {
        let batch_size = self.config.batch_size.max(1);
        let run = DiscoveryRun {
            engine: self,
            base_command,
            max_depth,
            batch_size,
            memo: Mutex::new(HashMap::new()),
            discovered: AtomicUsize::new(0),
        };

        debug!(command = base_command, max_depth, batch_size, "Starting discovery");

        let root = match rayon::ThreadPoolBuilder::new()
            .num_threads(batch_size)
            .thread_name(|index| format!("discovery-{index}"))
            .build()
        {
            Ok(pool) => pool.install(|| run.expand(&[], 0, None)),
            Err(e) => {
                warn!(error = %e, "Failed to build discovery thread pool; using the global pool");
                run.expand(&[], 0, None)
            }
        };

        info!(
            command = base_command,
            nodes = run.discovered.load(Ordering::Relaxed),
            "Discovery finished"
        );
        root
    }

    /// Discovers at the configured interactive depth.
    pub fn discover_default(&self, base_command: &str) -> CommandNode {
        self.discover(base_command, self.config.max_depth)
    }

    /// Discovers at the configured pre-build depth.
    pub fn prebuild(&self, base_command: &str) -> CommandNode {
        self.discover(base_command, self.config.prebuild_depth)
    }

    fn acquire_help(&self, base_command: &str, path: &[String]) -> Option<String> {
        let mut args = path.to_vec();
        args.push(self.config.help_flag.clone());

        let output = self
            .runner
            .run(base_command, &args, self.config.help_timeout());
        let text = acquired_help_text(&output);
        if text.is_none() {
            debug!(
                command = base_command,
                ?path,
                exit_code = output.exit_code,
                "No usable help output"
            );
        }
        text
    }
}

/// State for one `discover` call.
struct DiscoveryRun<'a> {
    engine: &'a DiscoveryEngine,
    base_command: &'a str,
    max_depth: usize,
    batch_size: usize,
    /// Keyed by the space-joined command path
    memo: Mutex<HashMap<String, CommandNode>>,
    discovered: AtomicUsize,
}

impl DiscoveryRun<'_> {
    /// `siblings` holds the lowercase names listed next to this node by its
    /// parent; `None` for the root.
    fn expand(
        &self,
        path: &[String],
        depth: usize,
        siblings: Option<&HashSet<String>>,
    ) -> CommandNode {
        let key = self.memo_key(path);
        let name = path.last().map_or(self.base_command, String::as_str);

        {
            let mut memo = self.lock_memo();
            if let Some(existing) = memo.get(&key) {
                debug!(path = %key, "Already discovered; reusing");
                return existing.clone();
            }
            memo.insert(key.clone(), CommandNode::new(name));
        }

        let mut node = match self.engine.acquire_help(self.base_command, path) {
            Some(text) => parse_help_text_with(name, &text, &self.engine.vocabulary),
            None => CommandNode::new(name),
        };
        self.record_progress(&key);

        if let Some(siblings) = siblings {
            if is_parent_help_echo(name, &node, siblings) {
                debug!(path = %key, "Subcommand help echoes the parent help; ignoring it");
                node = CommandNode::new(name);
            } else if node.find_subcommand(name).is_some() {
                debug!(path = %key, "Subcommand lists itself; dropping nested subcommands");
                node.subcommands.clear();
            }
        }

        if depth >= self.max_depth {
            node.subcommands.clear();
        } else if !node.subcommands.is_empty() {
            node.subcommands = self.expand_children(path, depth, &node.subcommands);
        }

        self.lock_memo().insert(key, node.clone());
        node
    }

    /// Expands stubs batch by batch; each batch is joined before the next.
    fn expand_children(
        &self,
        path: &[String],
        depth: usize,
        stubs: &[CommandNode],
    ) -> Vec<CommandNode> {
        let siblings: HashSet<String> = stubs
            .iter()
            .map(|stub| stub.name.to_ascii_lowercase())
            .collect();

        let mut merged = Vec::with_capacity(stubs.len());
        for batch in stubs.chunks(self.batch_size) {
            let results: Vec<CommandNode> = batch
                .par_iter()
                .map(|stub| self.expand_child(path, depth + 1, stub, &siblings))
                .collect();
            merged.extend(results);
        }
        merged
    }

    fn expand_child(
        &self,
        parent_path: &[String],
        depth: usize,
        stub: &CommandNode,
        siblings: &HashSet<String>,
    ) -> CommandNode {
        if SKIPPED_SUBCOMMANDS.contains(&stub.name.as_str()) {
            return stub.clone();
        }

        let mut path = parent_path.to_vec();
        path.push(stub.name.clone());
        let child = self.expand(&path, depth, Some(siblings));
        merge_child(stub, child)
    }

    fn record_progress(&self, key: &str) {
        let count = self.discovered.fetch_add(1, Ordering::Relaxed) + 1;
        let interval = self.engine.config.progress_interval;
        if interval > 0 && count % interval == 0 {
            info!(command = self.base_command, discovered = count, last = key, "Discovery progress");
        }
    }

    fn memo_key(&self, path: &[String]) -> String {
        if path.is_empty() {
            self.base_command.to_string()
        } else {
            format!("{} {}", self.base_command, path.join(" "))
        }
    }

    fn lock_memo(&self) -> MutexGuard<'_, HashMap<String, CommandNode>> {
        // A poisoned map still holds valid nodes.
        self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Combines a stub from the parent listing with the child's own expansion.
///
/// The child's subcommands, options, and arguments replace the stub's. The
/// stub keeps its name and its description unless that was empty.
pub fn merge_child(stub: &CommandNode, child: CommandNode) -> CommandNode {
    let description = if stub.description.is_empty() {
        child.description
    } else {
        stub.description.clone()
    };
    CommandNode {
        name: stub.name.clone(),
        description,
        subcommands: child.subcommands,
        options: child.options,
        arguments: child.arguments,
    }
}

/// Picks the help text out of a run.
///
/// Only a clean exit counts: any non-zero code (including spawn failures and
/// timeouts) yields `None`, since a rejected `<cmd> bogus --help` usually
/// prints an error followed by the parent's usage. stdout wins when it has
/// content, then stderr; blank output yields `None`.
pub fn acquired_help_text(output: &RunOutput) -> Option<String> {
    if !output.succeeded() {
        return None;
    }
    [&output.stdout, &output.stderr]
        .into_iter()
        .find(|text| !text.trim().is_empty())
        .cloned()
}

/// Detects CLIs that print the parent's help for `<parent> <child> --help`.
fn is_parent_help_echo(name: &str, child: &CommandNode, siblings: &HashSet<String>) -> bool {
    if child.subcommands.len() < 2 {
        return false;
    }
    let listed: HashSet<String> = child
        .subcommands
        .iter()
        .map(|sub| sub.name.to_ascii_lowercase())
        .collect();
    if !listed.contains(&name.to_ascii_lowercase()) {
        return false;
    }
    listed.intersection(siblings).count() >= PARENT_ECHO_SIBLING_OVERLAP
}

#[cfg(test)]
mod tests {
    use super::*;
    use command_tools_core::OptionSpec;

    #[test]
    fn test_acquired_help_text_rules() {
        assert_eq!(
            acquired_help_text(&RunOutput::new("Usage: x", "warn", 0)).as_deref(),
            Some("Usage: x")
        );
        assert_eq!(
            acquired_help_text(&RunOutput::new("  \n", "help text", 0)).as_deref(),
            Some("help text")
        );
        assert!(acquired_help_text(&RunOutput::new("", "", 0)).is_none());
        assert!(acquired_help_text(&RunOutput::new("partial", "timed out after 5ms", -2)).is_none());
        assert!(acquired_help_text(&RunOutput::new("", "failed to spawn 'x'", -1)).is_none());
    }

    #[test]
    fn test_non_zero_exit_is_not_help() {
        let rejected = RunOutput::new(
            "error: unrecognized subcommand\n\nOptions:\n  -x, --xtra  Extra",
            "",
            1,
        );
        assert!(acquired_help_text(&rejected).is_none());
        assert!(acquired_help_text(&RunOutput::new("", "Usage: tool [flags]", 2)).is_none());
    }

    #[test]
    fn test_merge_prefers_parent_description() {
        let stub = CommandNode::new("vm").with_description("Manage VMs");
        let child = CommandNode::new("vm")
            .with_description("Manage Linux or Windows virtual machines.")
            .with_option(OptionSpec::flag("--help"))
            .with_subcommand(CommandNode::new("create"));

        let merged = merge_child(&stub, child);
        assert_eq!(merged.description, "Manage VMs");
        assert_eq!(merged.subcommand_names(), vec!["create"]);
        assert_eq!(merged.options.len(), 1);
    }

    #[test]
    fn test_merge_fills_empty_description() {
        let stub = CommandNode::new("vm");
        let child = CommandNode::new("vm").with_description("From child");

        assert_eq!(merge_child(&stub, child).description, "From child");
    }

    #[test]
    fn test_parent_echo_detection() {
        let siblings: HashSet<String> = ["install", "remove", "update", "search"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let echo = CommandNode::new("install")
            .with_subcommand(CommandNode::new("install"))
            .with_subcommand(CommandNode::new("remove"))
            .with_subcommand(CommandNode::new("update"));
        let genuine = CommandNode::new("install")
            .with_subcommand(CommandNode::new("local"))
            .with_subcommand(CommandNode::new("global"));

        assert!(is_parent_help_echo("install", &echo, &siblings));
        assert!(!is_parent_help_echo("install", &genuine, &siblings));
    }
}
