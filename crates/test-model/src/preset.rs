use serde::{Deserialize, Serialize};
use spotlight_model::{ErrorKind, FunctionCall, ModelReply};

/// The preset reply for one request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    /// Reply with plain text.
    #[serde(rename = "text")]
    Text(String),
    /// Reply with function calls.
    #[serde(rename = "function_calls")]
    FunctionCalls(Vec<FunctionCall>),
    /// Fail the request with an error of the given kind.
    #[serde(rename = "failure")]
    Failure(ErrorKind),
}

impl PresetReply {
    /// Creates a text reply.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text(text.into())
    }

    /// Creates a reply with function calls.
    #[inline]
    pub fn function_calls(calls: impl Into<Vec<FunctionCall>>) -> Self {
        Self::FunctionCalls(calls.into())
    }

    pub(crate) fn into_result(self) -> Result<ModelReply, ErrorKind> {
        match self {
            PresetReply::Text(text) => Ok(ModelReply::Text(text)),
            PresetReply::FunctionCalls(calls) => {
                Ok(ModelReply::FunctionCalls(calls))
            }
            PresetReply::Failure(kind) => Err(kind),
        }
    }
}
