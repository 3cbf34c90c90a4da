//! Case-insensitive search over catalog records.

use serde::Serialize;
use serde_json::Value;

/// Fields of a record that a user would recognise it by.
pub trait Searchable: Serialize {
    /// Display fields, in match priority order (name before title).
    fn display_fields(&self) -> Vec<&str>;
}

impl Searchable for Value {
    fn display_fields(&self) -> Vec<&str> {
        ["name", "title"]
            .into_iter()
            .filter_map(|key| self.get(key).and_then(Value::as_str))
            .collect()
    }
}

/// A search term normalised for matching: trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(term: &str) -> Self {
        Self(term.trim().to_lowercase())
    }

    /// A blank query matches everything.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `item` matches this query.
    ///
    /// Display fields are tried first; only when none of them matches is the
    /// whole record, serialised to JSON, searched as text.
    pub fn matches<T: Searchable>(&self, item: &T) -> bool {
        if self.is_empty() {
            return true;
        }
        if item
            .display_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&self.0))
        {
            return true;
        }
        serde_json::to_string(item)
            .map(|record| record.to_lowercase().contains(&self.0))
            .unwrap_or(false)
    }
}

/// Items of `items` matching `term`, in their original order.
pub fn filter_items<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    let query = SearchQuery::new(term);
    items.iter().filter(|item| query.matches(*item)).collect()
}
