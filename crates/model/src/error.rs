use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No credential was available for the request.
    MissingCredential,
    /// The request was rejected as malformed.
    InvalidRequest,
    /// The content is moderated.
    Moderated,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MissingCredential => write!(f, "Missing credential"),
            ErrorKind::InvalidRequest => write!(f, "Invalid request"),
            ErrorKind::Moderated => write!(f, "Moderated"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::RateLimitExceeded).unwrap(),
            "\"rate_limit_exceeded\""
        );
        let kind: ErrorKind =
            serde_json::from_str("\"missing_credential\"").unwrap();
        assert_eq!(kind, ErrorKind::MissingCredential);
    }
}
