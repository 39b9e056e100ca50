use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use spotlight_core::ModelClient;
use spotlight_model::{ModelProvider, ModelRequest};
use spotlight_proxy_model::proto::{AgentRequest, AgentResponse, ErrorBody};
use tower_http::trace::TraceLayer;

/// Shared state of the proxy handlers.
pub struct AppState {
    model_client: ModelClient,
    fallback_api_key: Option<String>,
}

impl AppState {
    /// Creates the state, relaying to the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            fallback_api_key: None,
        }
    }

    /// Sets the credential used when a request doesn't carry one.
    #[inline]
    pub fn with_fallback_api_key(mut self, api_key: Option<String>) -> Self {
        self.fallback_api_key = api_key.filter(|key| !key.is_empty());
        self
    }
}

/// Builds the proxy router, serving `POST /api/agent`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/agent", post(agent))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

async fn agent(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AgentRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("rejected request body: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    let Some(query) = body.query.filter(|query| !query.trim().is_empty())
    else {
        return error_response(StatusCode::BAD_REQUEST, "Missing query");
    };
    let api_key = body
        .api_key
        .filter(|key| !key.is_empty())
        .or_else(|| state.fallback_api_key.clone());
    let Some(api_key) = api_key else {
        return error_response(StatusCode::BAD_REQUEST, "Missing API key");
    };

    let request = ModelRequest {
        query,
        history: body.history.unwrap_or_default(),
        tools: body
            .tools
            .unwrap_or_default()
            .into_iter()
            .flat_map(|tool| tool.function_declarations)
            .collect(),
        api_key: Some(api_key),
    };
    debug!(
        "relaying query with {} history item(s) and {} tool(s)",
        request.history.len(),
        request.tools.len()
    );

    match state.model_client.send_request(request).await {
        Ok(reply) => Json(AgentResponse::from(reply)).into_response(),
        Err(err) => {
            error!("upstream request failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "An error occurred")
        }
    }
}
