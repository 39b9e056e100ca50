use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spotlight_core::tool::DEFAULT_SERVER_NAME;

use crate::Error;

/// The name of the servers configuration file.
pub const CONFIG_FILE_NAME: &str = "mcp_servers.json";

/// How to launch one MCP server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// The executable to run.
    pub command: String,
    /// Arguments passed to the executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
}

/// All MCP servers to launch, by name.
///
/// Stored as `{"mcpServers": {"<name>": {"command": ..., "args": [...]}}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServersConfig {
    /// Servers by name.
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: BTreeMap<String, McpServerConfig>,
}

impl McpServersConfig {
    /// The configuration written on first start: a file-system server
    /// serving `root`.
    pub fn bundled(root: &Path) -> Self {
        let server = McpServerConfig {
            command: "npx".to_owned(),
            args: vec![
                "-y".to_owned(),
                "@modelcontextprotocol/server-filesystem".to_owned(),
                root.display().to_string(),
            ],
            env: None,
        };
        Self {
            mcp_servers: BTreeMap::from([(
                DEFAULT_SERVER_NAME.to_owned(),
                server,
            )]),
        }
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads the configuration at `path`.
    ///
    /// If the file doesn't exist yet, `default` is written there first.
    pub fn load_or_init(path: &Path, default: &Self) -> Result<Self, Error> {
        if !path.exists() {
            info!("MCP config not found, writing the default to {path:?}");
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(default)?)?;
        }
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
