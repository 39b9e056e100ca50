//! Tool call supports.
//!
//! Tools are not implemented here: they live in an external host (see
//! [`ToolHost`]) which lists them and executes them on request.

mod catalog;
mod dispatch;
mod error;

use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use catalog::Catalog;
pub(crate) use dispatch::dispatch_all;
pub use dispatch::ToolOutcome;
pub use error::{Error, ErrorKind};

/// The server a tool call is routed to when the tool's owner is unknown.
///
/// The external host registers its file-system server under this name.
pub const DEFAULT_SERVER_NAME: &str = "filesystem";

/// The result of a tool call.
pub type ToolResult = Result<Value, Error>;

/// Describes a tool exposed by the tool host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Human-readable description of the tool.
    #[serde(default)]
    pub description: String,
    /// The input schema, typically a JSON schema object.
    #[serde(default, alias = "inputSchema")]
    pub input_schema: Value,
    /// The server that owns this tool, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
}

/// The external runtime that lists and executes tools.
///
/// Returned futures must be fully independent of `self`, since calls in the
/// same turn run concurrently.
pub trait ToolHost: Send + Sync + 'static {
    /// Lists the tools that are currently available.
    ///
    /// The host may still be starting up, in which case the list can be
    /// empty or incomplete.
    fn list_tools(
        &self,
    ) -> impl Future<Output = Result<Vec<ToolInfo>, Error>> + Send + 'static;

    /// Calls a tool on the given server.
    fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        args: Value,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

type BoxedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub(crate) trait ToolHostObject: Send + Sync + 'static {
    fn list_tools(&self) -> BoxedFuture<Result<Vec<ToolInfo>, Error>>;

    fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        args: Value,
    ) -> BoxedFuture<ToolResult>;
}

pub(crate) struct AnyToolHost<T: ToolHost>(pub T);

impl<T: ToolHost> ToolHostObject for AnyToolHost<T> {
    #[inline]
    fn list_tools(&self) -> BoxedFuture<Result<Vec<ToolInfo>, Error>> {
        Box::pin(self.0.list_tools())
    }

    #[inline]
    fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        args: Value,
    ) -> BoxedFuture<ToolResult> {
        Box::pin(self.0.call_tool(server_name, tool_name, args))
    }
}

/// A host without any tools, used when no host is configured.
pub(crate) struct NoToolHost;

impl ToolHost for NoToolHost {
    fn list_tools(
        &self,
    ) -> impl Future<Output = Result<Vec<ToolInfo>, Error>> + Send + 'static
    {
        std::future::ready(Ok(vec![]))
    }

    fn call_tool(
        &self,
        _server_name: &str,
        tool_name: &str,
        _args: Value,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let reason = format!("no tool host to run `{tool_name}`");
        std::future::ready(Err(Error::unavailable().with_reason(reason)))
    }
}
