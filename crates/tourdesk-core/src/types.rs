//! Core data types shared by the client and the admin pages

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Opaque record identifier
pub type RecordId = String;

/// Read an id out of a JSON value; backends send both strings and numbers
#[must_use]
pub fn value_as_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a field value counts as "not filled in"
#[must_use]
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<RecordId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_as_id(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

/// Look up `path` in `fields`, descending into objects on `.`
fn lookup<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = fields.get(parts.next()?)?;
    parts.try_fold(first, |value, key| value.as_object()?.get(key))
}

/// One persisted entity as returned by the backend
///
/// Linked entities usually arrive denormalized (city names, tag names inlined).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap a field map
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a record from a JSON value, which must be an object
    pub fn from_value(value: Value) -> crate::Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(crate::Error::api(
                None,
                format!("Expected a record object, got {}", kind_of(&other)),
            )),
        }
    }

    /// Record id, if the backend sent one
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.0.get("id").and_then(value_as_id)
    }

    /// Field value; `path` may use dots to reach nested objects
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.0, path)
    }

    /// Field value as a string slice
    #[must_use]
    pub fn text(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Whether the field is missing, null, blank or an empty list
    #[must_use]
    pub fn is_blank(&self, path: &str) -> bool {
        is_blank(self.get(path))
    }

    /// All fields, in backend order
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying map
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// In-progress, locally mutable copy of a record being created or edited
///
/// The whole draft is sent on submit; unset fields stay as explicit `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Draft(Map<String, Value>);

impl Draft {
    /// Empty draft
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Field value
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        lookup(&self.0, field)
    }

    /// Field value as a string slice
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Set a field
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Builder-style [`Draft::set`]
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Whether the field is missing, null, blank or an empty list
    #[must_use]
    pub fn is_blank(&self, field: &str) -> bool {
        is_blank(self.get(field))
    }

    /// Whether the draft has the field at all (even as `null`)
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Ids held in a list field, in insertion order
    #[must_use]
    pub fn ids(&self, field: &str) -> Vec<RecordId> {
        self.get(field)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(value_as_id).collect())
            .unwrap_or_default()
    }

    /// Append `id` to a list field unless already present
    ///
    /// Returns whether the draft changed.
    pub fn add_id(&mut self, field: &str, id: &str) -> bool {
        let mut ids = self.ids(field);
        if ids.iter().any(|existing| existing == id) {
            return false;
        }
        ids.push(id.to_string());
        self.set(field, ids);
        true
    }

    /// Remove `id` from a list field
    ///
    /// Returns whether the draft changed.
    pub fn remove_id(&mut self, field: &str, id: &str) -> bool {
        let mut ids = self.ids(field);
        let before = ids.len();
        ids.retain(|existing| existing != id);
        if ids.len() == before {
            return false;
        }
        self.set(field, ids);
        true
    }

    /// All fields
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutable access to all fields
    pub const fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// JSON body sent to create/update endpoints
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Draft {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Reference tag shared by locations and tours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag id
    #[serde(deserialize_with = "deserialize_id")]
    pub id: RecordId,
    /// Display name
    pub name: String,
    /// Optional grouping ("cuisine", "activity", ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Tag {
    /// Create a tag without a type
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: None,
        }
    }
}

/// Ids chosen for a bulk action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet(BTreeSet<RecordId>);

impl SelectionSet {
    /// Empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id; returns whether it was newly added
    pub fn insert(&mut self, id: impl Into<RecordId>) -> bool {
        self.0.insert(id.into())
    }

    /// Remove an id; returns whether it was present
    pub fn remove(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }

    /// Flip membership; returns whether the id is now selected
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.0.remove(id) {
            false
        } else {
            self.0.insert(id.to_string());
            true
        }
    }

    /// Whether `id` is selected
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Deselect everything
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of selected ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected ids in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.0.iter()
    }

    /// Snapshot of the selected ids
    #[must_use]
    pub fn to_vec(&self) -> Vec<RecordId> {
        self.0.iter().cloned().collect()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
