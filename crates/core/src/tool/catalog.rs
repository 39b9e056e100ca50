use std::collections::HashSet;

use serde_json::{Map, Value};
use spotlight_model::ModelTool;

use super::{DEFAULT_SERVER_NAME, ToolInfo};

// Schema keywords the chat API refuses in function declarations.
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &["$schema", "additionalProperties"];

/// The set of tools currently offered to the model.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    tools: Vec<ToolInfo>,
}

impl Catalog {
    /// Creates a catalog from the tools listed by the host.
    #[inline]
    pub fn new(tools: Vec<ToolInfo>) -> Self {
        Self { tools }
    }

    /// Returns the tools in listing order.
    #[inline]
    pub fn tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    /// Returns `true` if no tool is available.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the server that owns the named tool.
    ///
    /// Falls back to [`DEFAULT_SERVER_NAME`] when the tool is unknown or
    /// doesn't declare an owner.
    pub fn owner_of(&self, tool_name: &str) -> &str {
        self.tools
            .iter()
            .find(|tool| tool.name == tool_name)
            .and_then(|tool| tool.server_name.as_deref())
            .unwrap_or(DEFAULT_SERVER_NAME)
    }

    /// Reshapes the tools into function declarations for the model.
    ///
    /// Tools with a duplicated name are declared once, the first listed
    /// one wins.
    pub fn declarations(&self) -> Vec<ModelTool> {
        let span = debug_span!("tool catalog");
        let _enter = span.enter();

        let mut seen = HashSet::with_capacity(self.tools.len());
        let mut declarations = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            if !seen.insert(tool.name.as_str()) {
                warn!("duplicated tool: {}", tool.name);
                continue;
            }
            declarations.push(ModelTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: sanitize_schema(&tool.input_schema),
            });
        }
        declarations
    }
}

fn sanitize_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let sanitized: Map<String, Value> = map
                .iter()
                .filter(|(key, _)| {
                    !UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str())
                })
                .map(|(key, value)| (key.clone(), sanitize_schema(value)))
                .collect();
            Value::Object(sanitized)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(sanitize_schema).collect())
        }
        other => other.clone(),
    }
}
