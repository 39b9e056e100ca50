use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use spotlight_core::tool::{
    Error as ToolError, ToolHost, ToolInfo, ToolResult,
};

use crate::client::McpClient;
use crate::proto::{content_text, is_error_result};
use crate::{Error, McpServerConfig, McpServersConfig};

struct Server {
    client: Arc<McpClient>,
    tools: Vec<ToolInfo>,
}

type Servers = Arc<RwLock<BTreeMap<String, Server>>>;

/// A [`ToolHost`] that runs tools on MCP servers.
///
/// Servers become visible once their handshake and tool listing are done.
/// Until then, [`list_tools`](ToolHost::list_tools) returns only the tools
/// of servers that are ready, possibly none.
#[derive(Clone, Default)]
pub struct McpHost {
    servers: Servers,
}

impl McpHost {
    /// Creates a host without servers.
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Launches all configured servers in the background.
    ///
    /// Must be called from within a tokio runtime. A server that fails to
    /// start is logged and skipped.
    pub fn launch(config: McpServersConfig) -> Self {
        let host = Self::new();
        for (name, server_config) in config.mcp_servers {
            let servers = Arc::clone(&host.servers);
            tokio::spawn(async move {
                match start_server(&servers, &name, &server_config).await {
                    Ok(count) => {
                        info!("server {name} is ready with {count} tool(s)");
                    }
                    Err(err) => error!("failed to start server {name}: {err}"),
                }
            });
        }
        host
    }

    /// Returns the names of the servers that are ready.
    pub fn ready_servers(&self) -> Vec<String> {
        self.servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

async fn start_server(
    servers: &Servers,
    name: &str,
    config: &McpServerConfig,
) -> Result<usize, Error> {
    info!("launching server {name}: {} {:?}", config.command, config.args);
    let client = McpClient::spawn(name, config)?;
    register(servers, name, client).await
}

async fn register(
    servers: &Servers,
    name: &str,
    client: McpClient,
) -> Result<usize, Error> {
    client.initialize().await?;
    let mut tools = client.list_tools().await?;
    for tool in &mut tools {
        tool.server_name = Some(name.to_owned());
    }

    let count = tools.len();
    let server = Server {
        client: Arc::new(client),
        tools,
    };
    servers
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.to_owned(), server);
    Ok(count)
}

impl ToolHost for McpHost {
    fn list_tools(
        &self,
    ) -> impl Future<Output = Result<Vec<ToolInfo>, ToolError>> + Send + 'static
    {
        let tools: Vec<_> = self
            .servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .flat_map(|server| server.tools.iter().cloned())
            .collect();
        std::future::ready(Ok(tools))
    }

    fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        args: Value,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self
            .servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(server_name)
            .map(|server| Arc::clone(&server.client));
        let server_name = server_name.to_owned();
        let tool_name = tool_name.to_owned();

        async move {
            let Some(client) = client else {
                return Err(ToolError::not_found()
                    .with_reason(format!("Server '{server_name}' not found")));
            };
            let result = client
                .call_tool(&tool_name, args)
                .await
                .map_err(Error::into_tool_error)?;
            if is_error_result(&result) {
                let text = content_text(&result);
                return Err(ToolError::execution_error().with_reason(
                    if text.is_empty() {
                        format!("tool {tool_name} failed")
                    } else {
                        text
                    },
                ));
            }
            Ok(result)
        }
    }
}
