//! A model provider that goes through the spotlight model proxy.
//!
//! The proxy holds the server-side credential and relays requests to the
//! hosted chat API. See the `spotlight-proxy` crate for the other end.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use spotlight_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelReply, ModelRequest,
};

use proto::{AgentRequest, AgentResponse, ErrorBody, ToolDeclarations};

/// Error type for [`ProxyProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Configuration for [`ProxyProvider`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProxyConfig {
    endpoint: String,
}

impl ProxyConfig {
    /// Creates a configuration pointing at the given proxy.
    ///
    /// `base_url` is the proxy origin, e.g. `http://127.0.0.1:3000`. The
    /// `/api/agent` route is appended.
    #[inline]
    pub fn with_base_url<S: AsRef<str>>(base_url: S) -> Self {
        let base_url = base_url.as_ref().trim_end_matches('/');
        Self {
            endpoint: format!("{base_url}/api/agent"),
        }
    }

    /// Returns the full endpoint URL.
    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// A model provider talking to the model proxy endpoint.
#[derive(Clone, Debug)]
pub struct ProxyProvider {
    client: Client,
    config: Arc<ProxyConfig>,
}

impl ProxyProvider {
    /// Creates a new `ProxyProvider` with the given configuration.
    #[inline]
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

/// Converts a model request into the proxy's request body.
pub fn create_request(req: &ModelRequest) -> AgentRequest {
    let tools = if req.tools.is_empty() {
        vec![]
    } else {
        vec![ToolDeclarations {
            function_declarations: req.tools.clone(),
        }]
    };
    AgentRequest {
        query: Some(req.query.clone()),
        tools: Some(tools),
        history: Some(req.history.clone()),
        api_key: req.api_key.clone().filter(|key| !key.is_empty()),
    }
}

impl ModelProvider for ProxyProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelReply, Self::Error>> + Send + 'static
    {
        let body = create_request(req);
        let resp_fut = self.client.post(self.config.endpoint()).json(&body).send();

        async move {
            let resp = resp_fut
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

            let status = resp.status();
            if !status.is_success() {
                let kind = match status {
                    StatusCode::BAD_REQUEST => ErrorKind::InvalidRequest,
                    StatusCode::TOO_MANY_REQUESTS => {
                        ErrorKind::RateLimitExceeded
                    }
                    _ => ErrorKind::Other,
                };
                let message = match resp.json::<ErrorBody>().await {
                    Ok(body) => body.error,
                    Err(_) => format!("{status}"),
                };
                warn!("proxy returned {status}: {message}");
                return Err(Error::new(message, kind));
            }

            let reply: AgentResponse = resp
                .json()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
            trace!("got a reply: {reply:?}");
            Ok(reply.into())
        }
    }
}
