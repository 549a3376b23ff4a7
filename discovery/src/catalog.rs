//! Callable tool catalog for one base command.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use command_tools_core::{
    CommandNode, InputSchema, PropertySchema, PropertyType, ToolDescriptor,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ServeError;
use crate::reconstruct::{KeyShapeHeuristic, PositionalPolicy, RAW_ARGS_KEY, reconstruct_with_path};
use crate::runner::{CommandRunner, RunOutput};
use crate::synth::synthesize;

/// Name of the free-form fallback tool.
pub const EXECUTE_TOOL_NAME: &str = "execute";

/// Parameter of the fallback tool holding the command line.
pub const EXECUTE_COMMAND_PARAM: &str = "command";

/// Synthesized tools plus the fallback `execute` tool, bound to a runner.
pub struct ToolCatalog {
    base_command: String,
    tools: Vec<ToolDescriptor>,
    by_name: HashMap<String, usize>,
    execute_index: Option<usize>,
    runner: Arc<dyn CommandRunner>,
    policy: Box<dyn PositionalPolicy>,
    call_timeout: Duration,
}

impl ToolCatalog {
    /// Builds the catalog from a discovered tree.
    pub fn new(
        base_command: &str,
        root: &CommandNode,
        runner: Arc<dyn CommandRunner>,
        call_timeout: Duration,
    ) -> Self {
        let mut tools = synthesize(root, base_command);
        let mut by_name: HashMap<String, usize> = tools
            .iter()
            .enumerate()
            .map(|(index, tool)| (tool.name.clone(), index))
            .collect();

        let execute_index = if by_name.contains_key(EXECUTE_TOOL_NAME) {
            debug!(command = base_command, "A subcommand already uses the execute tool name");
            None
        } else {
            tools.push(execute_tool(base_command));
            by_name.insert(EXECUTE_TOOL_NAME.to_string(), tools.len() - 1);
            Some(tools.len() - 1)
        };

        Self {
            base_command: base_command.to_string(),
            tools,
            by_name,
            execute_index,
            runner,
            policy: Box::new(KeyShapeHeuristic),
            call_timeout,
        }
    }

    /// Replaces the positional policy used for reconstruction.
    pub fn with_policy(mut self, policy: impl PositionalPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn base_command(&self) -> &str {
        &self.base_command
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&ToolDescriptor> {
        self.by_name.get(name).map(|&index| &self.tools[index])
    }

    /// Computes the argument list a call would run, without running it.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::UnknownTool`] for an unregistered name and
    /// [`ServeError::InvalidParams`] when `params` is not an object or the
    /// `execute` command string is missing or cannot be lexed.
    pub fn arguments_for(&self, name: &str, params: &Value) -> Result<Vec<String>, ServeError> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| ServeError::UnknownTool(name.to_string()))?;
        let params = params_object(params)?;

        if Some(index) == self.execute_index {
            let tokens = self.lex_command(&params)?;
            let mut raw = Map::new();
            raw.insert(
                RAW_ARGS_KEY.to_string(),
                Value::Array(tokens.into_iter().map(Value::String).collect()),
            );
            return Ok(reconstruct_with_path(&[], &raw, self.policy.as_ref()));
        }

        let tool = &self.tools[index];
        Ok(reconstruct_with_path(&tool.command_path, &params, self.policy.as_ref()))
    }

    /// Runs a tool and returns its formatted output.
    ///
    /// A non-zero exit of the wrapped program is reported in the text, not
    /// as an error.
    pub fn call(&self, name: &str, params: &Value) -> Result<String, ServeError> {
        let args = self.arguments_for(name, params)?;
        debug!(command = %self.base_command, tool = name, ?args, "Calling tool");
        let output = self.runner.run(&self.base_command, &args, self.call_timeout);
        Ok(format_output(&output))
    }

    fn lex_command(&self, params: &Map<String, Value>) -> Result<Vec<String>, ServeError> {
        let line = params
            .get(EXECUTE_COMMAND_PARAM)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ServeError::InvalidParams(format!("'{EXECUTE_COMMAND_PARAM}' must be a string"))
            })?;
        let mut tokens = shell_words::split(line)
            .map_err(|e| ServeError::InvalidParams(format!("cannot parse command: {e}")))?;
        // "az vm list" and "vm list" mean the same thing.
        if tokens.first().is_some_and(|first| first == &self.base_command) {
            tokens.remove(0);
        }
        Ok(tokens)
    }
}

/// Renders a run as tool output text.
///
/// stdout, then an `Errors:` block when stderr has content, then an
/// `Exit code:` line when the exit code is non-zero.
///
/// # Examples
///
/// ```
/// use command_tools_discovery::{RunOutput, format_output};
///
/// let text = format_output(&RunOutput::new("partial", "boom", 2));
/// assert_eq!(text, "partial\n\nErrors:\nboom\n\nExit code: 2");
/// ```
pub fn format_output(output: &RunOutput) -> String {
    let mut text = output.stdout.clone();
    if !output.stderr.trim().is_empty() {
        text.push_str("\n\nErrors:\n");
        text.push_str(&output.stderr);
    }
    if output.exit_code != 0 {
        text.push_str(&format!("\n\nExit code: {}", output.exit_code));
    }
    text
}

fn params_object(params: &Value) -> Result<Map<String, Value>, ServeError> {
    match params {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(ServeError::InvalidParams(format!(
            "parameters must be a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn execute_tool(base_command: &str) -> ToolDescriptor {
    let mut schema = InputSchema::default();
    schema.insert(
        EXECUTE_COMMAND_PARAM,
        PropertySchema::new(
            PropertyType::String,
            format!("Arguments for '{base_command}', with shell-style quoting"),
        ),
    );
    schema.require(EXECUTE_COMMAND_PARAM);

    ToolDescriptor {
        name: EXECUTE_TOOL_NAME.to_string(),
        description: format!("Run '{base_command}' with an arbitrary argument string"),
        input_schema: schema,
        command_path: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use command_tools_core::OptionSpec;
    use serde_json::json;

    /// Records every call and answers with a fixed output.
    struct RecordingRunner {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        reply: RunOutput,
    }

    impl RecordingRunner {
        fn new(reply: RunOutput) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &str, args: &[String], _timeout: Duration) -> RunOutput {
            self.calls
                .lock()
                .unwrap()
                .push((command.to_string(), args.to_vec()));
            self.reply.clone()
        }
    }

    fn az_tree() -> CommandNode {
        CommandNode::new("az").with_subcommand(
            CommandNode::new("vm")
                .with_description("Manage VMs")
                .with_subcommand(
                    CommandNode::new("create")
                        .with_option(OptionSpec::with_value("--name", "NAME").with_short("-n"))
                        .with_option(OptionSpec::with_value("--resource-group", "GROUP").with_short("-g")),
                )
                .with_subcommand(CommandNode::new("list-sizes")),
        )
    }

    fn catalog(runner: Arc<RecordingRunner>) -> ToolCatalog {
        ToolCatalog::new("az", &az_tree(), runner, Duration::from_secs(5))
    }

    #[test]
    fn test_catalog_lists_tools_and_execute() {
        let catalog = catalog(RecordingRunner::new(RunOutput::default()));
        let names: Vec<&str> = catalog.tools().iter().map(|t| t.name.as_str()).collect();

        assert_eq!(names, vec!["az", "vm", "vm-create", "vm-list-sizes", "execute"]);
        assert_eq!(
            catalog.find("execute").unwrap().input_schema.required,
            vec!["command"]
        );
    }

    #[test]
    fn test_call_runs_reconstructed_arguments() {
        let runner = RecordingRunner::new(RunOutput::new("created", "", 0));
        let catalog = catalog(Arc::clone(&runner));

        let text = catalog
            .call("vm-create", &json!({"resourceGroup": "rg1", "n": "web"}))
            .unwrap();

        assert_eq!(text, "created");
        assert_eq!(
            runner.calls(),
            vec![(
                "az".to_string(),
                vec!["vm", "create", "--resource-group", "rg1", "-n", "web"]
                    .into_iter()
                    .map(String::from)
                    .collect()
            )]
        );
    }

    #[test]
    fn test_hyphenated_subcommand_uses_exact_path() {
        let catalog = catalog(RecordingRunner::new(RunOutput::default()));
        let args = catalog.arguments_for("vm-list-sizes", &Value::Null).unwrap();
        assert_eq!(args, vec!["vm", "list-sizes"]);
    }

    #[test]
    fn test_execute_lexes_shell_quoting() {
        let catalog = catalog(RecordingRunner::new(RunOutput::default()));

        let args = catalog
            .arguments_for("execute", &json!({"command": "az vm list --query \"[].name\" -o 'table'"}))
            .unwrap();
        assert_eq!(args, vec!["vm", "list", "--query", "[].name", "-o", "table"]);
    }

    #[test]
    fn test_protocol_errors() {
        let catalog = catalog(RecordingRunner::new(RunOutput::default()));

        assert_eq!(
            catalog.call("nope", &Value::Null),
            Err(ServeError::UnknownTool("nope".to_string()))
        );
        assert!(matches!(
            catalog.call("vm", &json!([1, 2])),
            Err(ServeError::InvalidParams(_))
        ));
        assert!(matches!(
            catalog.call("execute", &json!({})),
            Err(ServeError::InvalidParams(_))
        ));
        assert!(matches!(
            catalog.call("execute", &json!({"command": "vm list \"unterminated"})),
            Err(ServeError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_program_failure_is_normal_output() {
        let runner = RecordingRunner::new(RunOutput::new("", "ERROR: not logged in", 1));
        let catalog = catalog(runner);

        let text = catalog.call("vm", &Value::Null).unwrap();
        assert_eq!(text, "\n\nErrors:\nERROR: not logged in\n\nExit code: 1");
    }

    #[test]
    fn test_format_output_variants() {
        assert_eq!(format_output(&RunOutput::new("ok\n", "", 0)), "ok\n");
        assert_eq!(
            format_output(&RunOutput::new("ok", "  \n", 0)),
            "ok"
        );
        assert_eq!(
            format_output(&RunOutput::new("", "", -2)),
            "\n\nExit code: -2"
        );
    }

    #[test]
    fn test_subcommand_named_execute_keeps_its_tool() {
        let tree = CommandNode::new("tool")
            .with_subcommand(CommandNode::new("execute").with_description("Run a job"));
        let catalog = ToolCatalog::new(
            "tool",
            &tree,
            RecordingRunner::new(RunOutput::default()),
            Duration::from_secs(1),
        );

        assert_eq!(catalog.tools().len(), 2);
        let args = catalog.arguments_for("execute", &json!({"force": true})).unwrap();
        assert_eq!(args, vec!["execute", "--force"]);
    }
}
