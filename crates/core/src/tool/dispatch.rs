use futures_util::future::join_all;
use serde_json::{Value, json};
use spotlight_model::{FunctionCall, FunctionResponse};
use tracing::Instrument;

use super::{Catalog, ToolHostObject, ToolResult};

/// The outcome of one function call.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolOutcome {
    /// The call as requested by the model.
    pub call: FunctionCall,
    /// The server the call was routed to.
    pub server_name: String,
    /// What the tool returned.
    pub result: ToolResult,
}

impl ToolOutcome {
    /// Converts the outcome into a function response for the model.
    ///
    /// The payload is always an object: successful non-object values are
    /// wrapped in `{"result": ...}`, failures become `{"error": ...}`.
    pub fn to_response(&self) -> FunctionResponse {
        let response = match &self.result {
            Ok(value @ Value::Object(_)) => value.clone(),
            Ok(value) => json!({ "result": value }),
            Err(err) => json!({ "error": err.reason() }),
        };
        FunctionResponse {
            name: self.call.name.clone(),
            response,
        }
    }
}

/// Runs all calls concurrently and waits for every one of them.
///
/// A failing call never cancels the others. Outcomes are returned in the
/// order of `calls`.
pub(crate) async fn dispatch_all(
    host: &dyn ToolHostObject,
    catalog: &Catalog,
    calls: Vec<FunctionCall>,
) -> Vec<ToolOutcome> {
    let span = debug_span!("tool dispatch", calls = calls.len());

    let pending = calls.into_iter().map(|call| {
        let server_name = catalog.owner_of(&call.name).to_owned();
        trace!("calling {}/{} with args: {:?}", server_name, call.name, call.args);
        let fut = host.call_tool(&server_name, &call.name, call.args.clone());
        async move {
            let result = fut.await;
            if let Err(err) = &result {
                warn!("tool {} failed: {err}", call.name);
            }
            ToolOutcome {
                call,
                server_name,
                result,
            }
        }
    });

    join_all(pending).instrument(span).await
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::tool::{
        AnyToolHost, DEFAULT_SERVER_NAME, Error, ToolHost, ToolInfo,
    };

    #[derive(Clone, Default)]
    struct RecordingHost {
        calls: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl ToolHost for RecordingHost {
        fn list_tools(
            &self,
        ) -> impl Future<Output = Result<Vec<ToolInfo>, Error>> + Send + 'static
        {
            std::future::ready(Ok(vec![]))
        }

        fn call_tool(
            &self,
            server_name: &str,
            tool_name: &str,
            args: Value,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            self.calls
                .lock()
                .unwrap()
                .push((server_name.to_owned(), tool_name.to_owned()));
            let fail = tool_name == "broken";
            // The slowest call is listed first to check ordering.
            let delay = if tool_name == "slow" { 20 } else { 1 };
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                if fail {
                    Err(Error::execution_error().with_reason("boom"))
                } else {
                    Ok(args)
                }
            }
        }
    }

    fn call(name: &str, args: Value) -> FunctionCall {
        FunctionCall {
            name: name.to_owned(),
            args,
        }
    }

    #[tokio::test]
    async fn test_dispatch_all() {
        let host = RecordingHost::default();
        let catalog = Catalog::new(vec![ToolInfo {
            name: "slow".to_owned(),
            description: String::new(),
            input_schema: Value::Null,
            server_name: Some("files".to_owned()),
        }]);
        let object = AnyToolHost(host.clone());

        let outcomes = dispatch_all(
            &object,
            &catalog,
            vec![
                call("slow", json!({ "path": "/tmp" })),
                call("broken", json!({})),
                call("echo", json!(42)),
            ],
        )
        .await;

        let names: Vec<_> =
            outcomes.iter().map(|o| o.call.name.as_str()).collect();
        assert_eq!(names, ["slow", "broken", "echo"]);
        assert_eq!(outcomes[0].server_name, "files");
        assert_eq!(outcomes[1].server_name, DEFAULT_SERVER_NAME);
        assert!(outcomes[1].result.is_err());
        assert_eq!(outcomes[2].result, Ok(json!(42)));
        assert_eq!(host.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_to_response() {
        let outcome = ToolOutcome {
            call: call("echo", json!({})),
            server_name: DEFAULT_SERVER_NAME.to_owned(),
            result: Ok(json!({ "files": [] })),
        };
        assert_eq!(outcome.to_response().response, json!({ "files": [] }));

        let outcome = ToolOutcome {
            result: Ok(json!("done")),
            ..outcome
        };
        assert_eq!(outcome.to_response().response, json!({ "result": "done" }));

        let outcome = ToolOutcome {
            result: Err(Error::not_found().with_reason("Server 'x' not found")),
            ..outcome
        };
        let response = outcome.to_response();
        assert_eq!(response.name, "echo");
        assert_eq!(
            response.response,
            json!({ "error": "Server 'x' not found" })
        );
    }
}
