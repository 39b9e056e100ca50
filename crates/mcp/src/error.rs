use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;

use spotlight_core::tool::Error as ToolError;

use crate::proto::RpcError;

// JSON-RPC error codes with a more specific tool error.
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Spawning the server or talking to it failed.
    Io,
    /// The configuration or a message couldn't be parsed.
    Protocol,
    /// The server answered with a JSON-RPC error.
    Remote {
        /// The JSON-RPC error code.
        code: i64,
    },
    /// The server didn't answer in time.
    Timeout,
    /// The server closed its output.
    Closed,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Io => write!(f, "I/O error"),
            ErrorKind::Protocol => write!(f, "Protocol error"),
            ErrorKind::Remote { code } => write!(f, "Remote error {code}"),
            ErrorKind::Timeout => write!(f, "Timed out"),
            ErrorKind::Closed => write!(f, "Connection closed"),
        }
    }
}

/// Describes an error while running MCP servers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    #[inline]
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self { kind, reason: None }
    }

    #[inline]
    pub(crate) fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }

    #[inline]
    pub(crate) fn remote(err: RpcError) -> Self {
        Error::new(ErrorKind::Remote { code: err.code }).with_reason(err.message)
    }

    pub(crate) fn into_tool_error(self) -> ToolError {
        let err = match self.kind {
            ErrorKind::Remote {
                code: METHOD_NOT_FOUND,
            } => ToolError::not_found(),
            ErrorKind::Remote {
                code: INVALID_PARAMS,
            } => ToolError::invalid_input(),
            ErrorKind::Remote { .. } | ErrorKind::Protocol => {
                ToolError::execution_error()
            }
            ErrorKind::Io | ErrorKind::Timeout | ErrorKind::Closed => {
                ToolError::unavailable()
            }
        };
        err.with_reason(self.reason())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::new(ErrorKind::Io).with_reason(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::Protocol).with_reason(err.to_string())
    }
}
