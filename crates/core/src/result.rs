//! Renderable results of a turn.

use std::path::Path;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::ToolInfo;

/// One renderable result.
///
/// The serialized form is `{"type": <tag>, "content": <payload>}`. Tags that
/// are not recognized decode to [`ResultItem::Unknown`], which front-ends
/// render as nothing.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "kebab-case")]
pub enum ResultItem {
    /// Text produced by the model.
    Text(String),
    /// A file-system entry produced by a tool.
    File(FileEntry),
    /// The formatted value of an arithmetic expression.
    Math(String),
    /// The tools currently available.
    ToolList(Vec<ToolInfo>),
    /// A result of an unrecognized kind.
    Unknown,
}

impl<'de> Deserialize<'de> for ResultItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(rename = "type")]
            tag: String,
            #[serde(default)]
            content: Value,
        }

        let raw = Raw::deserialize(deserializer)?;
        let item = match raw.tag.as_str() {
            "text" => ResultItem::Text(
                serde_json::from_value(raw.content).map_err(de::Error::custom)?,
            ),
            "file" => ResultItem::File(
                serde_json::from_value(raw.content).map_err(de::Error::custom)?,
            ),
            "math" => ResultItem::Math(
                serde_json::from_value(raw.content).map_err(de::Error::custom)?,
            ),
            "tool-list" => ResultItem::ToolList(
                serde_json::from_value(raw.content).map_err(de::Error::custom)?,
            ),
            other => {
                debug!("unknown result type: {other}");
                ResultItem::Unknown
            }
        };
        Ok(item)
    }
}

/// A file-system entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Full path of the entry.
    pub path: String,
    /// Whether the entry is a directory.
    #[serde(default, alias = "isDir")]
    pub is_dir: bool,
}

impl FileEntry {
    /// Returns the last path component, or the whole path if it has none.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.path)
    }

    /// Returns the extension of the entry, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.path)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

/// Extracts file entries from a tool's output.
///
/// Accepted shapes, checked in order:
/// - an array of paths or of `{path, is_dir}` objects,
/// - an object with a `files` or `results` array,
/// - an MCP tool result with `structuredContent`, or with `content` text
///   items that contain one of the shapes above as JSON.
///
/// Anything else yields no entries.
pub fn extract_file_entries(output: &Value) -> Vec<FileEntry> {
    match output {
        Value::Array(items) => items.iter().filter_map(file_entry).collect(),
        Value::Object(map) => {
            for key in ["files", "results"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    return items.iter().filter_map(file_entry).collect();
                }
            }
            if let Some(structured) = map.get("structuredContent") {
                return extract_file_entries(structured);
            }
            if let Some(Value::Array(content)) = map.get("content") {
                return content
                    .iter()
                    .filter_map(|item| item.get("text")?.as_str())
                    .filter_map(|text| serde_json::from_str::<Value>(text).ok())
                    .flat_map(|value| extract_file_entries(&value))
                    .collect();
            }
            vec![]
        }
        _ => vec![],
    }
}

fn file_entry(value: &Value) -> Option<FileEntry> {
    match value {
        Value::String(path) if !path.is_empty() => Some(FileEntry {
            path: path.clone(),
            is_dir: path.ends_with('/'),
        }),
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}
