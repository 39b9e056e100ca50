use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use serde_json::json;
use spotlight_model::{
    ErrorKind, FunctionCall, HistoryItem, ModelProvider, ModelProviderError,
    ModelReply, ModelRequest, ModelTool,
};
use tokio::time::sleep;

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the query, or calls the first tool when the query mentions it.
struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelReply, Self::Error>> + Send + 'static
    {
        let result = 'blk: {
            if req.query.is_empty() {
                break 'blk Err(FakeModelProviderError(ErrorKind::InvalidRequest));
            }
            if req.api_key.is_none() {
                break 'blk Err(FakeModelProviderError(
                    ErrorKind::MissingCredential,
                ));
            }

            if let Some(tool) =
                req.tools.iter().find(|t| req.query.contains(&t.name))
            {
                break 'blk Ok(ModelReply::FunctionCalls(vec![FunctionCall {
                    name: tool.name.clone(),
                    args: json!({}),
                }]));
            }

            let turns = req.history.len();
            Ok(ModelReply::Text(format!(
                "You said {} after {turns} turns",
                req.query
            )))
        };
        async move {
            sleep(Duration::from_millis(1)).await;
            result
        }
    }
}

mod tests {
    use super::*;

    fn request(query: &str) -> ModelRequest {
        ModelRequest {
            query: query.to_owned(),
            api_key: Some("key".to_owned()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_completion() {
        let provider = FakeModelProvider;
        let mut req = request("Good morning");
        req.history.push(HistoryItem::user("Hi"));
        req.history.push(HistoryItem::model_text("Hello"));

        let reply = provider.send_request(&req).await.unwrap();
        assert_eq!(
            reply,
            ModelReply::Text("You said Good morning after 2 turns".to_owned())
        );
    }

    #[tokio::test]
    async fn test_function_call() {
        let provider = FakeModelProvider;
        let mut req = request("please run search_files");
        req.tools.push(ModelTool {
            name: "search_files".to_owned(),
            description: "Searches files".to_owned(),
            parameters: json!({ "type": "object" }),
        });

        let reply = provider.send_request(&req).await.unwrap();
        let ModelReply::FunctionCalls(calls) = reply else {
            unreachable!("unexpected reply: {reply:?}");
        };
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "search_files");
    }

    #[tokio::test]
    async fn test_error() {
        let provider = FakeModelProvider;
        let err = provider.send_request(&request("")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let mut req = request("Hi");
        req.api_key = None;
        let err = provider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredential);
    }

    #[test]
    fn test_request_debug_hides_key() {
        let debug = format!("{:?}", request("Hi"));
        assert!(!debug.contains("\"key\""));
        assert!(debug.contains("<deducted>"));
    }
}
