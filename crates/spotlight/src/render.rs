//! Terminal rendering of result items.

use owo_colors::OwoColorize;
use spotlight_core::Error;
use spotlight_core::result::{FileEntry, ResultItem};

const BAR_CHAR: &str = "▎";

/// Returns the icon shown in front of a file entry.
pub fn file_icon(entry: &FileEntry) -> &'static str {
    if entry.is_dir {
        return "📁";
    }
    match entry.extension() {
        Some("app") => "🌐",
        Some("txt") => "📝",
        _ => "📄",
    }
}

/// Renders one result item, or `None` for items that show nothing.
pub fn render_item(item: &ResultItem) -> Option<String> {
    let rendered = match item {
        ResultItem::Text(text) => {
            format!("{}🤖 {}", BAR_CHAR.bright_cyan(), text.bright_white())
        }
        ResultItem::File(entry) => format!(
            "{}{} {}\n{} {}",
            BAR_CHAR.bright_blue(),
            file_icon(entry),
            entry.file_name().bright_white().bold(),
            BAR_CHAR.bright_blue(),
            entry.path.dimmed()
        ),
        ResultItem::Math(value) => format!(
            "{}🧮 {}  {}",
            BAR_CHAR.bright_green(),
            value.bright_white().bold(),
            "Result".dimmed()
        ),
        ResultItem::ToolList(tools) => {
            let bar = BAR_CHAR.bright_magenta();
            let mut lines = vec![format!("{bar}🛠️  Tools Available:")];
            if tools.is_empty() {
                lines.push(format!("{bar}   {}", "(none)".dimmed()));
            }
            for tool in tools {
                if tool.description.is_empty() {
                    lines.push(format!("{bar}   {}", tool.name.bold()));
                } else {
                    lines.push(format!(
                        "{bar}   {}: {}",
                        tool.name.bold(),
                        tool.description.dimmed()
                    ));
                }
            }
            lines.join("\n")
        }
        ResultItem::Unknown => return None,
    };
    Some(rendered)
}

/// Tracks which file rows of a turn have been shown already.
///
/// File rows are published before the summary, so a front-end can show
/// them while the turn is still running, then show the rest at the end.
#[derive(Debug, Default)]
pub struct FileRows {
    shown: usize,
}

impl FileRows {
    /// Returns the file rows in `results` not shown yet, and marks them as
    /// shown.
    pub fn take_new<'a>(
        &mut self,
        results: &'a [ResultItem],
    ) -> Vec<&'a ResultItem> {
        let files: Vec<_> = results
            .iter()
            .filter(|item| matches!(item, ResultItem::File(_)))
            .collect();
        let new = files.get(self.shown..).unwrap_or_default().to_vec();
        self.shown = self.shown.max(files.len());
        new
    }

    /// Returns the items of the final results that still need showing.
    pub fn remaining<'a>(
        &self,
        results: &'a [ResultItem],
    ) -> Vec<&'a ResultItem> {
        let mut skip = self.shown;
        results
            .iter()
            .filter(|item| {
                if skip > 0 && matches!(item, ResultItem::File(_)) {
                    skip -= 1;
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}

/// Renders the error that ended a turn.
pub fn render_error(err: &Error) -> String {
    format!(
        "{}⚠️  {}",
        BAR_CHAR.bright_red(),
        err.user_message().bright_red()
    )
}
