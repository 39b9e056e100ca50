use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use spotlight_model::{ErrorKind as ModelErrorKind, ModelProviderError};

/// The kind of error that ended a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The query was empty.
    MissingInput,
    /// No credential was available for the model.
    MissingCredential,
    /// The model request failed.
    Upstream,
    /// The model asked for tools, but none are available.
    NoToolsAvailable,
    /// The model replied with something the current stage can't handle.
    UnexpectedReply,
}

impl ErrorKind {
    /// Returns a generic message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::MissingInput => "Please type something to search for.",
            ErrorKind::MissingCredential => {
                "No API key is configured. Save one in the settings first."
            }
            ErrorKind::Upstream | ErrorKind::UnexpectedReply => {
                "An error occurred while processing your request."
            }
            ErrorKind::NoToolsAvailable => {
                "The request needs tools, but no tools are available."
            }
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MissingInput => write!(f, "Missing input"),
            ErrorKind::MissingCredential => write!(f, "Missing credential"),
            ErrorKind::Upstream => write!(f, "Upstream error"),
            ErrorKind::NoToolsAvailable => write!(f, "No tools available"),
            ErrorKind::UnexpectedReply => write!(f, "Unexpected reply"),
        }
    }
}

/// Describes why a turn failed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error of the given kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, reason: None }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
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

    /// Returns a generic message suitable for showing to the user.
    #[inline]
    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
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

impl From<Box<dyn ModelProviderError>> for Error {
    fn from(err: Box<dyn ModelProviderError>) -> Self {
        let kind = match err.kind() {
            ModelErrorKind::MissingCredential => ErrorKind::MissingCredential,
            _ => ErrorKind::Upstream,
        };
        Error::new(kind).with_reason(err.to_string())
    }
}
