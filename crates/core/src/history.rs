//! Conversation history.

use spotlight_model::{HistoryItem, Part};

/// The transcript of one dispatcher session.
///
/// History only grows: items can be appended by the dispatcher, but are
/// never removed, reordered or modified afterwards.
#[derive(Clone, Default, Debug)]
pub struct History {
    items: Vec<HistoryItem>,
}

impl History {
    /// Returns all items in insertion order.
    #[inline]
    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    /// Returns the number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing has been said yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the text of the latest item, if it has any.
    pub fn last_text(&self) -> Option<&str> {
        self.items.last()?.parts.iter().find_map(|part| match part {
            Part::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    #[inline]
    pub(crate) fn push(&mut self, item: HistoryItem) {
        self.items.push(item);
    }
}
