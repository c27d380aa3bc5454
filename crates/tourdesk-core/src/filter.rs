//! Filter sets for list queries

use std::collections::BTreeMap;

/// One filter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Free text, enum value or id
    Text(String),
    /// Boolean flag
    Flag(bool),
}

impl FilterValue {
    /// Whether the value should be left out of the request
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Flag(_) => false,
        }
    }

    fn as_query_value(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Flag(flag) => flag.to_string(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for FilterValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

/// Active query constraints for a list view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSet(BTreeMap<String, FilterValue>);

impl FilterSet {
    /// Free-text search key shared by every list endpoint
    pub const SEARCH: &'static str = "search";

    /// Empty filter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter; returns whether the stored value changed
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> bool {
        let key = key.into();
        let value = value.into();
        if self.0.get(&key) == Some(&value) {
            return false;
        }
        self.0.insert(key, value);
        true
    }

    /// Builder-style [`FilterSet::set`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Drop a filter; returns whether it was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }

    /// Current value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    /// Current non-blank text for `key`
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(FilterValue::Text(text)) if !text.trim().is_empty() => Some(text.trim()),
            _ => None,
        }
    }

    /// Non-blank search text
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.text(Self::SEARCH)
    }

    /// Key/value pairs that go on the wire, blank entries omitted
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_blank())
            .map(|(key, value)| (key.clone(), value.as_query_value()))
            .collect()
    }

    /// URL-encoded query string without the leading `?`
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Whether no filter would be sent
    #[must_use]
    pub fn is_effectively_empty(&self) -> bool {
        self.0.values().all(FilterValue::is_blank)
    }
}
