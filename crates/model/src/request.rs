use std::fmt::{self, Debug, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FunctionCall, HistoryItem};

/// A request to be sent to the model provider.
#[derive(Clone, Default, PartialEq)]
pub struct ModelRequest {
    /// The new user input of this turn.
    pub query: String,
    /// The conversation so far, not including `query`.
    pub history: Vec<HistoryItem>,
    /// Tools that are available to the model.
    pub tools: Vec<ModelTool>,
    /// A credential supplied by the caller.
    ///
    /// Providers should prefer it over any credential they were configured
    /// with.
    pub api_key: Option<String>,
}

impl Debug for ModelRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRequest")
            .field("query", &self.query)
            .field("history", &self.history)
            .field("tools", &self.tools)
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .finish()
    }
}

/// Describes a tool that can be used by the model, in the shape of a
/// function declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// This is typically an (OpenAPI flavored) [JSON schema](https://json-schema.org/).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
}

/// A complete reply from the model.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelReply {
    /// The model answered with plain text.
    Text(String),
    /// The model wants some functions to be called first.
    FunctionCalls(Vec<FunctionCall>),
}
