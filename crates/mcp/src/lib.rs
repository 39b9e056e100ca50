//! A tool host backed by MCP servers.
//!
//! Every configured server is launched as a child process and spoken to
//! with newline-delimited JSON-RPC 2.0 over its stdio.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod client;
mod config;
mod error;
mod host;
mod proto;

pub use config::{CONFIG_FILE_NAME, McpServerConfig, McpServersConfig};
pub use error::{Error, ErrorKind};
pub use host::McpHost;
