use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The author of a history item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Input typed by the user.
    User,
    /// Output produced by the model.
    Model,
    /// Results of function calls requested by the model.
    Function,
}

/// One turn of the conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Who produced this turn.
    pub role: Role,
    /// The ordered parts of this turn.
    pub parts: Vec<Part>,
}

impl HistoryItem {
    /// Creates a user turn with a single text part.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Creates a model turn with a single text part.
    #[inline]
    pub fn model_text<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Creates a model turn that requests the given function calls.
    pub fn function_calls(calls: impl IntoIterator<Item = FunctionCall>) -> Self {
        Self {
            role: Role::Model,
            parts: calls.into_iter().map(Part::FunctionCall).collect(),
        }
    }

    /// Creates a function turn carrying the given responses.
    pub fn function_responses(
        responses: impl IntoIterator<Item = FunctionResponse>,
    ) -> Self {
        Self {
            role: Role::Function,
            parts: responses.into_iter().map(Part::FunctionResponse).collect(),
        }
    }
}

/// A part of a history item.
///
/// Serialized as a single-key object, e.g. `{"text": "..."}` or
/// `{"functionCall": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    /// Literal text.
    Text(String),
    /// A function call requested by the model.
    FunctionCall(FunctionCall),
    /// The response of a function call.
    FunctionResponse(FunctionResponse),
}

/// Describes a function call request from the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The name of the tool to call.
    pub name: String,
    /// The arguments to pass to the tool, usually a JSON object.
    #[serde(default)]
    pub args: Value,
}

/// The payload returned for a function call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// The name of the tool that was called.
    pub name: String,
    /// The result payload, always a JSON object.
    pub response: Value,
}
