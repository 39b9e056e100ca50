#[macro_use]
extern crate tracing;

use std::env;

use anyhow::{Context, Result};
use spotlight_gemini_model::{GeminiConfigBuilder, GeminiProvider};
use spotlight_proxy::{AppState, router};
use tokio::net::TcpListener;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = GeminiConfigBuilder::new();
    if let Ok(model) = env::var("GEMINI_MODEL") {
        config = config.with_model(model);
    }
    let provider = GeminiProvider::new(config.build());

    let api_key = env::var("GOOGLE_API_KEY").ok();
    if api_key.is_none() {
        warn!("GOOGLE_API_KEY is not set, requests must carry their own key");
    }
    let state = AppState::new(provider).with_fallback_api_key(api_key);

    let addr =
        env::var("SPOTLIGHT_PROXY_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_owned());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on http://{addr}");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
