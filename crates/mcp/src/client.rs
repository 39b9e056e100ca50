use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};
use spotlight_core::tool::ToolInfo;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::proto::{
    Incoming, ListToolsResult, PROTOCOL_VERSION, Request, RpcError,
};
use crate::{Error, ErrorKind, McpServerConfig};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type Responder = oneshot::Sender<Result<Value, RpcError>>;
type Pending = Arc<Mutex<HashMap<u64, Responder>>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// A connection to one MCP server.
///
/// Requests can be sent concurrently: each one gets its own id, and a
/// reader task routes every response to the caller waiting for that id.
pub(crate) struct McpClient {
    name: String,
    writer: AsyncMutex<Writer>,
    pending: Pending,
    next_id: AtomicU64,
    timeout: Duration,
    reader_task: JoinHandle<()>,
    // Killed on drop.
    _child: Option<Child>,
}

impl McpClient {
    /// Launches the server process and connects to its stdio.
    pub fn spawn(name: &str, config: &McpServerConfig) -> Result<Self, Error> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(env) = &config.env {
            command.envs(env);
        }

        let mut child = command.spawn()?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take())
        else {
            return Err(Error::new(ErrorKind::Io)
                .with_reason("child process has no piped stdio"));
        };
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(name.to_owned(), stderr));
        }

        Ok(Self::new(name, stdout, stdin, Some(child)))
    }

    /// Connects over an arbitrary byte stream pair.
    #[cfg(test)]
    pub fn connect<R, W>(name: &str, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::new(name, reader, writer, None)
    }

    fn new<R, W>(name: &str, reader: R, writer: W, child: Option<Child>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending = Pending::default();
        let reader_task =
            tokio::spawn(read_loop(name.to_owned(), reader, Arc::clone(&pending)));
        Self {
            name: name.to_owned(),
            writer: AsyncMutex::new(Box::new(writer)),
            pending,
            next_id: AtomicU64::new(1),
            timeout: DEFAULT_TIMEOUT,
            reader_task,
            _child: child,
        }
    }

    #[cfg(test)]
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Runs the handshake: `initialize`, then `notifications/initialized`.
    pub async fn initialize(&self) -> Result<(), Error> {
        let result = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "spotlight",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            )
            .await?;
        let protocol = result
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>");
        debug!("server {} initialized with protocol {protocol}", self.name);
        self.notify("notifications/initialized", Value::Null).await
    }

    /// Lists all tools, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>, Error> {
        let mut tools = vec![];
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let result = self.request("tools/list", params).await?;
            let page: ListToolsResult = serde_json::from_value(result)?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() && cursor.as_ref() != Some(&next) => {
                    cursor = Some(next);
                }
                _ => return Ok(tools),
            }
        }
    }

    /// Calls a tool and returns the raw `tools/call` result.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<Value, Error> {
        self.request("tools/call", json!({ "name": name, "arguments": args }))
            .await
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.lock_pending().insert(id, tx);

        trace!("-> {} #{id} {method}", self.name);
        if let Err(err) = self.send(&Request::new(id, method, params)).await {
            self.lock_pending().remove(&id);
            return Err(err);
        }

        match timeout(self.timeout, rx).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(err))) => Err(Error::remote(err)),
            Ok(Err(_)) => Err(Error::new(ErrorKind::Closed).with_reason(format!(
                "server {} exited before answering {method}",
                self.name
            ))),
            Err(_) => {
                self.lock_pending().remove(&id);
                Err(Error::new(ErrorKind::Timeout).with_reason(format!(
                    "server {} didn't answer {method} within {:?}",
                    self.name, self.timeout
                )))
            }
        }
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), Error> {
        trace!("-> {} {method}", self.name);
        self.send(&Request::notification(method, params)).await
    }

    async fn send(&self, request: &Request<'_>) -> Result<(), Error> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    #[inline]
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<u64, Responder>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

async fn read_loop<R: AsyncRead + Unpin>(name: String, reader: R, pending: Pending) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => route_message(&name, &line, &pending),
            Ok(None) => break,
            Err(err) => {
                warn!("failed to read from server {name}: {err}");
                break;
            }
        }
    }
    debug!("server {name} closed its output");

    // Wakes up everyone still waiting, they will see a closed channel.
    pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

fn route_message(name: &str, line: &str, pending: &Pending) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let msg: Incoming = match serde_json::from_str(line) {
        Ok(msg) => msg,
        Err(err) => {
            warn!("dropping malformed message from server {name}: {err}");
            return;
        }
    };

    if let Some(method) = &msg.method {
        // Server-initiated requests are not supported, so both they and
        // notifications are only logged.
        debug!("<- {name} {method} (ignored)");
        return;
    }

    let Some(id) = msg.id.as_ref().and_then(Value::as_u64) else {
        warn!("dropping response without a usable id from server {name}");
        return;
    };
    let responder = pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&id);
    let Some(responder) = responder else {
        warn!("dropping response #{id} from server {name}: nobody is waiting");
        return;
    };

    trace!("<- {name} #{id}");
    let response = match msg.error {
        Some(err) => Err(err),
        None => Ok(msg.result.unwrap_or(Value::Null)),
    };
    // The caller may have timed out in the meantime.
    responder.send(response).ok();
}

async fn forward_stderr<R: AsyncRead + Unpin>(name: String, stderr: R) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("[{name}] {line}");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};
    use tokio::sync::Mutex as AsyncMutex;

    use super::*;

    /// Starts an in-process MCP server and returns a client connected to it.
    ///
    /// The server lists `search_files` and `broken` over two pages, answers
    /// `search_files` with a JSON list of paths in a text item, `broken` with
    /// an `isError` result, `slow` after a delay, and never answers `hang`.
    pub(crate) fn fake_server(name: &str) -> McpClient {
        let (client_side, server_side) = duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (server_read, server_write) = tokio::io::split(server_side);
        let server_write = Arc::new(AsyncMutex::new(server_write));

        tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let msg: Value = serde_json::from_str(&line).unwrap();
                let Some(id) = msg.get("id").cloned() else {
                    continue;
                };
                let method = msg["method"].as_str().unwrap_or_default().to_owned();
                let params = msg["params"].clone();
                let server_write = Arc::clone(&server_write);

                tokio::spawn(async move {
                    let (delay, body) = respond(&method, &params);
                    let Some(body) = body else {
                        return;
                    };
                    tokio::time::sleep(delay).await;

                    let mut reply = json!({ "jsonrpc": "2.0", "id": id });
                    let (key, value) = body;
                    reply[key] = value;
                    let mut out = server_write.lock().await;
                    // A notification first, which the client must skip.
                    out.write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\",\"params\":{}}\n")
                        .await
                        .unwrap();
                    out.write_all(format!("{reply}\n").as_bytes()).await.unwrap();
                });
            }
        });

        McpClient::connect(name, client_read, client_write)
    }

    fn respond(method: &str, params: &Value) -> (Duration, Option<(&'static str, Value)>) {
        let no_delay = Duration::ZERO;
        let result = match method {
            "initialize" => json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "fake", "version": "0.0.0" }
            }),
            "tools/list" if params.get("cursor").is_none() => json!({
                "tools": [{
                    "name": "search_files",
                    "description": "Searches files",
                    "inputSchema": { "type": "object" }
                }],
                "nextCursor": "page-2"
            }),
            "tools/list" => json!({
                "tools": [{ "name": "broken", "inputSchema": {} }]
            }),
            "tools/call" => match params["name"].as_str().unwrap_or_default() {
                "search_files" => json!({
                    "content": [
                        { "type": "text", "text": "[\"/tmp/a.txt\", \"/tmp/b.txt\"]" }
                    ]
                }),
                "broken" => json!({
                    "content": [{ "type": "text", "text": "ENOENT: /nope" }],
                    "isError": true
                }),
                "slow" => {
                    return (
                        Duration::from_millis(50),
                        Some(("result", json!({ "content": [], "slow": true }))),
                    );
                }
                "hang" => return (no_delay, None),
                _ => {
                    return (
                        no_delay,
                        Some((
                            "error",
                            json!({ "code": -32602, "message": "Unknown tool" }),
                        )),
                    );
                }
            },
            _ => {
                return (
                    no_delay,
                    Some((
                        "error",
                        json!({ "code": -32601, "message": "Method not found" }),
                    )),
                );
            }
        };
        (no_delay, Some(("result", result)))
    }

    #[tokio::test]
    async fn test_handshake_and_listing() {
        let client = fake_server("files");
        client.initialize().await.unwrap();

        let tools = client.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["search_files", "broken"]);
        assert_eq!(tools[0].input_schema, json!({ "type": "object" }));
    }

    #[tokio::test]
    async fn test_concurrent_calls() {
        let client = fake_server("files");
        let (slow, fast) = tokio::join!(
            client.call_tool("slow", json!({})),
            client.call_tool("search_files", json!({ "path": "/tmp" })),
        );
        assert_eq!(slow.unwrap()["slow"], json!(true));
        assert!(fast.unwrap()["content"].is_array());
    }

    #[tokio::test]
    async fn test_remote_error() {
        let client = fake_server("files");
        let err = client.call_tool("missing", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote { code: -32602 });
        assert_eq!(err.reason(), "Unknown tool");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let mut client = fake_server("files");
        client.set_timeout(Duration::from_secs(1));
        let err = client.call_tool("hang", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(client.lock_pending().is_empty());
    }

    #[tokio::test]
    async fn test_closed() {
        let (client_side, server_side) = duplex(1024);
        let (client_read, client_write) = tokio::io::split(client_side);
        let client = McpClient::connect("gone", client_read, client_write);

        // Reads the request, then hangs up.
        let mut server = BufReader::new(server_side);
        let call = client.call_tool("search_files", json!({}));
        let hang_up = async move {
            let mut line = String::new();
            server.read_line(&mut line).await.unwrap();
            assert!(line.contains("tools/call"));
            drop(server);
        };
        let (result, ()) = tokio::join!(call, hang_up);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Closed);
    }
}
