use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

/// User settings the dispatcher runs with.
///
/// The serialized form is what gets persisted by front-ends, so the field
/// names are part of the on-disk format.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Credential for the chat model.
    #[serde(
        rename = "gemini_api_key",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<String>,
}

impl Settings {
    /// Creates settings with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    /// Returns the API key, treating an empty one as absent.
    #[inline]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<deducted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_persisted_shape() {
        let settings = Settings::with_api_key("secret");
        assert_eq!(
            serde_json::to_value(&settings).unwrap(),
            json!({ "gemini_api_key": "secret" })
        );
        assert!(!format!("{settings:?}").contains("secret"));

        let settings: Settings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings.api_key(), None);
        assert_eq!(Settings::with_api_key("").api_key(), None);
    }
}
