//! Role-scoped tool surfaces over the sandbox
//!
//! A model sees tools as name + JSON schema. Every call returns text; failures
//! are reported to the model as `"Error..."` strings rather than aborting the
//! invocation.

use crate::sandbox::ToolSandbox;
use scribe_core::{ProgressSink, ScribeError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Longest OBSERVATION message emitted for a tool result
const OBSERVATION_LIMIT: usize = 200;

/// Tool advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Text handed back to the model for one tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// The tools available to one invocation
pub trait Toolbox: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;

    fn call(&self, name: &str, input: &Value) -> ToolOutput;
}

/// Empty toolbox, for roles that only transform text
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTools;

impl Toolbox for NoTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    fn call(&self, name: &str, _input: &Value) -> ToolOutput {
        ToolOutput::error(format!("Error: tool '{}' is not available.", name))
    }
}

/// Tools backed by the sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ListFiles,
    ReadFile,
    WriteFile,
    Remember,
    Recall,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::ListFiles,
        ToolKind::ReadFile,
        ToolKind::WriteFile,
        ToolKind::Remember,
        ToolKind::Recall,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::ListFiles => "list_files",
            ToolKind::ReadFile => "read_file",
            ToolKind::WriteFile => "write_file",
            ToolKind::Remember => "remember",
            ToolKind::Recall => "recall",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn definition(&self) -> ToolDefinition {
        let (description, input_schema) = match self {
            ToolKind::ListFiles => (
                "List the project's source files, one relative path per line.",
                json!({ "type": "object", "properties": {} }),
            ),
            ToolKind::ReadFile => (
                "Read the full content of a project file. The path must be relative, as returned by list_files.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": { "type": "string", "description": "Relative path of the file to read" }
                    },
                    "required": ["file_path"]
                }),
            ),
            ToolKind::WriteFile => (
                "Write or overwrite a project file. The path must be relative. Existing content is replaced.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": { "type": "string", "description": "Relative path of the file to write" },
                        "content": { "type": "string", "description": "New file content" }
                    },
                    "required": ["file_path", "content"]
                }),
            ),
            ToolKind::Remember => (
                "Save documentation or analysis to long-term memory. 'source_file' is the file it came from.",
                json!({
                    "type": "object",
                    "properties": {
                        "content": { "type": "string", "description": "Text to remember" },
                        "source_file": { "type": "string", "description": "File the content describes" }
                    },
                    "required": ["content", "source_file"]
                }),
            ),
            ToolKind::Recall => (
                "Search long-term memory for information related to a topic or file. Use this before documenting a file.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "What to look for" }
                    },
                    "required": ["query"]
                }),
            ),
        };

        ToolDefinition {
            name: self.name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Sandbox view restricted to the tools one role may use
pub struct RoleTools<'a> {
    sandbox: &'a ToolSandbox,
    progress: &'a ProgressSink,
    allowed: Vec<ToolKind>,
}

impl<'a> RoleTools<'a> {
    pub fn new(sandbox: &'a ToolSandbox, progress: &'a ProgressSink, allowed: Vec<ToolKind>) -> Self {
        Self {
            sandbox,
            progress,
            allowed,
        }
    }

    /// `read_file`, `remember`, `recall`
    pub fn writer(sandbox: &'a ToolSandbox, progress: &'a ProgressSink) -> Self {
        Self::new(
            sandbox,
            progress,
            vec![ToolKind::ReadFile, ToolKind::Remember, ToolKind::Recall],
        )
    }

    /// `read_file` only
    pub fn reviewer(sandbox: &'a ToolSandbox, progress: &'a ProgressSink) -> Self {
        Self::new(sandbox, progress, vec![ToolKind::ReadFile])
    }

    pub fn all(sandbox: &'a ToolSandbox, progress: &'a ProgressSink) -> Self {
        Self::new(sandbox, progress, ToolKind::ALL.to_vec())
    }

    pub fn allowed(&self) -> &[ToolKind] {
        &self.allowed
    }

    fn dispatch(&self, kind: ToolKind, input: &Value) -> ToolOutput {
        match kind {
            ToolKind::ListFiles => match self.sandbox.list(self.sandbox.extension()) {
                Ok(files) => ToolOutput::ok(
                    files
                        .iter()
                        .map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                Err(e) => ToolOutput::error(format!("Error listing files: {}", e)),
            },
            ToolKind::ReadFile => {
                let path = match str_arg(input, "file_path") {
                    Ok(path) => path,
                    Err(out) => return out,
                };
                match self.sandbox.read(path) {
                    Ok(content) => ToolOutput::ok(content),
                    Err(ScribeError::NotFound(_)) => ToolOutput::error(format!(
                        "Error: File not found at '{}'. Please verify the path with list_files.",
                        path
                    )),
                    Err(e) => ToolOutput::error(format!("Error reading file: {}", e)),
                }
            }
            ToolKind::WriteFile => {
                let (path, content) = match (str_arg(input, "file_path"), str_arg(input, "content")) {
                    (Ok(path), Ok(content)) => (path, content),
                    (Err(out), _) | (_, Err(out)) => return out,
                };
                match self.sandbox.write(path, content) {
                    Ok(_) => ToolOutput::ok(format!("Successfully wrote content to {}.", path)),
                    Err(e) => ToolOutput::error(format!("Error writing to file: {}", e)),
                }
            }
            ToolKind::Remember => {
                let (content, source) = match (str_arg(input, "content"), str_arg(input, "source_file")) {
                    (Ok(content), Ok(source)) => (content, source),
                    (Err(out), _) | (_, Err(out)) => return out,
                };
                match self.sandbox.remember(content, source) {
                    Ok(_) => ToolOutput::ok(format!(
                        "Successfully saved content from {} to memory.",
                        source
                    )),
                    Err(e) => ToolOutput::error(format!("Error saving to memory: {}", e)),
                }
            }
            ToolKind::Recall => {
                let query = match str_arg(input, "query") {
                    Ok(query) => query,
                    Err(out) => return out,
                };
                match self.sandbox.recall(query) {
                    Ok(text) => ToolOutput::ok(text),
                    Err(e) => ToolOutput::error(format!("Error searching memory: {}", e)),
                }
            }
        }
    }
}

impl Toolbox for RoleTools<'_> {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.allowed.iter().map(|kind| kind.definition()).collect()
    }

    fn call(&self, name: &str, input: &Value) -> ToolOutput {
        let output = match ToolKind::from_name(name) {
            Some(kind) if self.allowed.contains(&kind) => self.dispatch(kind, input),
            _ => ToolOutput::error(format!(
                "Error: tool '{}' is not available to this role.",
                name
            )),
        };

        self.progress
            .observation(format!("{} -> {}", name, truncate(&output.content, OBSERVATION_LIMIT)));
        output
    }
}

fn str_arg<'v>(input: &'v Value, key: &str) -> Result<&'v str, ToolOutput> {
    input
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolOutput::error(format!("Error: missing string argument '{}'.", key)))
}

/// At most `limit` chars, with an ellipsis when cut
pub(crate) fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
