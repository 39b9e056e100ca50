use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::{Value, json};
use spotlight_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use spotlight_model::{
    ErrorKind, FunctionCall, HistoryItem, ModelProvider, ModelProviderError,
    ModelReply, ModelRequest, ModelTool,
};
use spotlight_proxy::{AppState, router};
use spotlight_proxy_model::{ProxyConfig, ProxyProvider};
use spotlight_test_model::{PresetReply, TestModelProvider};
use tokio::net::TcpListener;

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Answers every request with `status` and `body`.
async fn serve_stub(status: StatusCode, body: Value) -> SocketAddr {
    let app = Router::new()
        .fallback(move || async move { (status, Json(body)).into_response() });
    serve(app).await
}

fn proxy_provider(addr: SocketAddr) -> ProxyProvider {
    ProxyProvider::new(ProxyConfig::with_base_url(format!("http://{addr}")))
}

fn request(query: &str, api_key: Option<&str>) -> ModelRequest {
    ModelRequest {
        query: query.to_owned(),
        api_key: api_key.map(str::to_owned),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_text_reply() {
    let mut model = TestModelProvider::default();
    model.add_reply(PresetReply::text("Hello!"));
    let addr = serve(router(AppState::new(model.clone()))).await;
    let provider = proxy_provider(addr);

    let mut req = request("Hi", Some("client-key"));
    req.history.push(HistoryItem::user("Earlier"));
    req.tools.push(ModelTool {
        name: "search_files".to_owned(),
        description: "Searches files".to_owned(),
        parameters: json!({ "type": "object" }),
    });
    let reply = provider.send_request(&req).await.unwrap();
    assert_eq!(reply, ModelReply::Text("Hello!".to_owned()));

    let relayed = model.requests();
    assert_eq!(relayed.len(), 1);
    assert_eq!(relayed[0], req);
}

#[tokio::test]
async fn test_tool_call_reply() {
    let call = FunctionCall {
        name: "search_files".to_owned(),
        args: json!({ "path": "/tmp" }),
    };
    let mut model = TestModelProvider::default();
    model.add_reply(PresetReply::function_calls([call.clone()]));
    let addr = serve(
        router(
            AppState::new(model)
                .with_fallback_api_key(Some("server-key".to_owned())),
        ),
    )
    .await;
    let provider = ProxyProvider::new(ProxyConfig::with_base_url(format!(
        "http://{addr}/"
    )));

    let reply = provider
        .send_request(&request("list files in /tmp", None))
        .await
        .unwrap();
    assert_eq!(reply, ModelReply::FunctionCalls(vec![call]));
}

#[tokio::test]
async fn test_missing_api_key() {
    let model = TestModelProvider::default();
    let addr = serve(router(AppState::new(model.clone()))).await;
    let provider = proxy_provider(addr);

    let err = provider.send_request(&request("Hi", None)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(err.message(), "Missing API key");
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_upstream_failure() {
    let mut model = TestModelProvider::default();
    model.add_reply(PresetReply::Failure(ErrorKind::Other));
    let addr = serve(router(AppState::new(model))).await;
    let provider = proxy_provider(addr);

    let err = provider
        .send_request(&request("Hi", Some("client-key")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
    assert_eq!(err.message(), "An error occurred");
}

#[tokio::test]
async fn test_proxy_rate_limited() {
    let addr = serve_stub(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": "Slow down" }),
    )
    .await;
    let provider = proxy_provider(addr);

    let err = provider
        .send_request(&request("Hi", Some("client-key")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    assert_eq!(err.message(), "Slow down");
}

#[tokio::test]
async fn test_gemini_rate_limited() {
    let addr = serve_stub(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "code": 429, "message": "Quota exceeded" } }),
    )
    .await;
    let provider = GeminiProvider::new(
        GeminiConfigBuilder::with_api_key("k")
            .with_base_url(format!("http://{addr}"))
            .build(),
    );

    let err = provider.send_request(&request("Hi", None)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    assert!(err.message().contains("Quota exceeded"));
}
