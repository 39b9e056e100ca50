//! Wire types of the model proxy endpoint.

use serde::{Deserialize, Serialize};
use spotlight_model::{FunctionCall, HistoryItem, ModelReply, ModelTool};

/// A group of function declarations, in the shape the chat API expects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDeclarations {
    /// The declared functions.
    #[serde(default)]
    pub function_declarations: Vec<ModelTool>,
}

/// The body of `POST /api/agent`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    /// The user input. Requests without it are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Tools available to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDeclarations>>,
    /// The conversation so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryItem>>,
    /// A credential that overrides the server's own.
    #[serde(
        rename = "apiKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<String>,
}

/// A successful reply of `POST /api/agent`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgentResponse {
    /// The model answered with text.
    #[serde(rename = "text")]
    Text {
        /// The answer.
        response: String,
    },
    /// The model wants some functions to be called.
    #[serde(rename = "tool_call")]
    ToolCall {
        /// The requested calls.
        tool_calls: Vec<FunctionCall>,
    },
}

impl From<ModelReply> for AgentResponse {
    fn from(reply: ModelReply) -> Self {
        match reply {
            ModelReply::Text(response) => AgentResponse::Text { response },
            ModelReply::FunctionCalls(tool_calls) => {
                AgentResponse::ToolCall { tool_calls }
            }
        }
    }
}

impl From<AgentResponse> for ModelReply {
    fn from(resp: AgentResponse) -> Self {
        match resp {
            AgentResponse::Text { response } => ModelReply::Text(response),
            AgentResponse::ToolCall { tool_calls } => {
                ModelReply::FunctionCalls(tool_calls)
            }
        }
    }
}

/// The body of a failed `POST /api/agent`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A short, user-presentable message.
    pub error: String,
}

impl ErrorBody {
    /// Creates an error body.
    #[inline]
    pub fn new<S: Into<String>>(error: S) -> Self {
        Self {
            error: error.into(),
        }
    }
}
