use serde::{Deserialize, Serialize};
use spotlight_model::{
    ErrorKind, FunctionCall, HistoryItem, ModelReply, ModelRequest, ModelTool,
};

use crate::Error;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

// Parts from the server may carry extra keys (e.g. `thoughtSignature`), so
// they can't be decoded as the single-key `Part` enum.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePart {
    pub text: Option<String>,
    pub function_call: Option<FunctionCall>,
    #[serde(default)]
    pub thought: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    function_declarations: Vec<ModelTool>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerateContentRequest {
    contents: Vec<HistoryItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    let mut contents = Vec::with_capacity(req.history.len() + 1);
    contents.extend(req.history.iter().cloned());
    contents.push(HistoryItem::user(req.query.clone()));

    let tools = if req.tools.is_empty() {
        vec![]
    } else {
        vec![Tool {
            function_declarations: req.tools.clone(),
        }]
    };

    GenerateContentRequest { contents, tools }
}

pub fn parse_reply(resp: GenerateContentResponse) -> Result<ModelReply, Error> {
    if let Some(reason) =
        resp.prompt_feedback.and_then(|feedback| feedback.block_reason)
    {
        return Err(Error::new(
            format!("prompt blocked: {reason}"),
            ErrorKind::Moderated,
        ));
    }

    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Err(Error::new("no candidates in response", ErrorKind::Other));
    };
    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(Error::new("response blocked", ErrorKind::Moderated));
    }

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let mut text = String::new();
    let mut calls = Vec::new();
    for part in parts {
        if let Some(call) = part.function_call {
            calls.push(call);
        } else if let Some(t) = part.text {
            if !part.thought {
                text.push_str(&t);
            }
        }
    }

    if calls.is_empty() {
        Ok(ModelReply::Text(text))
    } else {
        Ok(ModelReply::FunctionCalls(calls))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use spotlight_model::ModelProviderError;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            query: "list files in /tmp".to_owned(),
            history: vec![
                HistoryItem::user("Hello"),
                HistoryItem::model_text("Hi there"),
            ],
            tools: vec![ModelTool {
                name: "search_files".to_owned(),
                description: "Searches files.".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": { "path": { "type": "string" } }
                }),
            }],
            api_key: Some("xxx".to_owned()),
        };
        let expected = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "Hello" }] },
                { "role": "model", "parts": [{ "text": "Hi there" }] },
                { "role": "user", "parts": [{ "text": "list files in /tmp" }] }
            ],
            "tools": [{
                "functionDeclarations": [{
                    "name": "search_files",
                    "description": "Searches files.",
                    "parameters": {
                        "type": "object",
                        "properties": { "path": { "type": "string" } }
                    }
                }]
            }]
        });
        assert_eq!(
            serde_json::to_value(create_request(&request)).unwrap(),
            expected
        );
    }

    #[test]
    fn test_create_request_without_tools() {
        let request = ModelRequest {
            query: "Hi".to_owned(),
            ..Default::default()
        };
        let value = serde_json::to_value(create_request(&request)).unwrap();
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_parse_text() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "Two " },
                        { "text": "files." }
                    ]
                },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(
            parse_reply(resp).unwrap(),
            ModelReply::Text("Two files.".to_owned())
        );
    }

    #[test]
    fn test_parse_function_calls() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": { "name": "search_files", "args": { "path": "/tmp" } },
                        "thoughtSignature": "abc"
                    }]
                }
            }]
        }))
        .unwrap();
        let ModelReply::FunctionCalls(calls) = parse_reply(resp).unwrap() else {
            unreachable!();
        };
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, json!({ "path": "/tmp" }));
    }

    #[test]
    fn test_parse_blocked() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert_eq!(parse_reply(resp).unwrap_err().kind(), ErrorKind::Moderated);

        let resp: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert_eq!(parse_reply(resp).unwrap_err().kind(), ErrorKind::Other);
    }
}
