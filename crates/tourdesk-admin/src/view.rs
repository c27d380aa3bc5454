//! Table rows, badges, row actions and stat cards

use crate::schema::{BadgeRule, PageSchema};
use serde_json::Value;
use std::collections::HashMap;
use tourdesk_core::{Error, FilterSet, Operation, Record, RecordId, Result, SelectionSet, Tag};

/// Placeholder for missing values
pub const EMPTY_CELL: &str = "-";

/// Per-row action control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    /// Open the edit form
    Edit,
    /// Delete the record
    Delete,
    /// Approve a pending record
    Approve,
    /// Reject a pending record
    Reject,
}

impl RowAction {
    /// Button label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit",
            Self::Delete => "Delete",
            Self::Approve => "Approve",
            Self::Reject => "Reject",
        }
    }
}

/// Colour family of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    /// Approved, verified, active
    Positive,
    /// Waiting on someone
    Warning,
    /// Rejected or disabled
    Negative,
    /// Privileged roles
    Info,
    /// Anything else
    Neutral,
}

/// Small label derived from a record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    /// Display text
    pub label: String,
    /// Colour family
    pub tone: BadgeTone,
}

/// One rendered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Record id; rows without one cannot be selected or acted upon
    pub id: Option<RecordId>,
    /// Cell text, one per column
    pub cells: Vec<String>,
    /// Derived badges
    pub badges: Vec<Badge>,
    /// Whether the row is in the selection
    pub selected: bool,
    /// Controls shown for the row
    pub actions: Vec<RowAction>,
}

/// One dashboard statistic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    /// Key in the stats object
    pub key: String,
    /// Humanized label
    pub label: String,
    /// Display value
    pub value: String,
}

/// Records that pass the page's local search, if it has one
///
/// Pages with `local_search` fields also match the search text against
/// those fields, case-insensitively, on top of the backend filtering.
#[must_use]
pub fn visible_records(
    schema: &PageSchema,
    records: &[Record],
    filters: &FilterSet,
) -> Vec<Record> {
    let needle = match filters.search() {
        Some(search) if !schema.local_search.is_empty() => search.to_lowercase(),
        _ => return records.to_vec(),
    };

    records
        .iter()
        .filter(|record| {
            schema.local_search.iter().any(|field| {
                record
                    .text(field)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        })
        .cloned()
        .collect()
}

/// Render every visible record as a table row
#[must_use]
pub fn render_rows(
    schema: &PageSchema,
    records: &[Record],
    filters: &FilterSet,
    selection: &SelectionSet,
    tags: &[Tag],
) -> Vec<Row> {
    let tag_names: HashMap<&str, &str> = tags
        .iter()
        .map(|tag| (tag.id.as_str(), tag.name.as_str()))
        .collect();
    let tag_field = schema.tag_field().map(|field| field.name);

    visible_records(schema, records, filters)
        .iter()
        .map(|record| {
            let id = record.id();
            let cells = schema
                .columns
                .iter()
                .map(|column| {
                    if Some(column.field) == tag_field {
                        tag_cell(record.get(column.field), &tag_names)
                    } else {
                        cell_text(record.get(column.field))
                    }
                })
                .collect();

            Row {
                selected: id.as_deref().is_some_and(|id| selection.contains(id)),
                badges: badges(schema, record),
                actions: if id.is_some() {
                    row_actions(schema, record)
                } else {
                    Vec::new()
                },
                cells,
                id,
            }
        })
        .collect()
}

/// Display text for one value
#[must_use]
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL.to_string(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(Value::String(text)) if text.trim().is_empty() => EMPTY_CELL.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Array(items)) if items.is_empty() => EMPTY_CELL.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                Value::Object(object) => object
                    .get("name")
                    .and_then(Value::as_str)
                    .map_or_else(|| item.to_string(), ToString::to_string),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(object @ Value::Object(_)) => object.to_string(),
    }
}

fn tag_cell(value: Option<&Value>, tag_names: &HashMap<&str, &str>) -> String {
    let Some(Value::Array(items)) = value else {
        return cell_text(value);
    };

    let names: Vec<String> = items
        .iter()
        .filter_map(tourdesk_core::types::value_as_id)
        .map(|id| {
            tag_names
                .get(id.as_str())
                .map_or(id.clone(), |name| (*name).to_string())
        })
        .collect();

    if names.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        names.join(", ")
    }
}

fn tone_for(value: &str) -> BadgeTone {
    match value.to_ascii_lowercase().as_str() {
        "approved" | "verified" | "active" => BadgeTone::Positive,
        "pending" => BadgeTone::Warning,
        "rejected" | "unverified" | "inactive" => BadgeTone::Negative,
        "admin" | "moderator" => BadgeTone::Info,
        _ => BadgeTone::Neutral,
    }
}

/// Badges for `record`, in rule order
#[must_use]
pub fn badges(schema: &PageSchema, record: &Record) -> Vec<Badge> {
    schema
        .badges
        .iter()
        .filter_map(|rule| match *rule {
            BadgeRule::Flag { field, on, off } => {
                let label = if record.get(field).and_then(Value::as_bool) == Some(true) {
                    on
                } else {
                    off
                };
                Some(Badge {
                    label: label.to_string(),
                    tone: tone_for(label),
                })
            }
            BadgeRule::Value { field } => record
                .text(field)
                .filter(|text| !text.trim().is_empty())
                .map(|text| Badge {
                    label: text.to_string(),
                    tone: tone_for(text),
                }),
        })
        .collect()
}

/// Controls shown for `record`
///
/// Edit and delete depend on what the backend offers for the resource;
/// approve and reject only appear while the record is pending.
#[must_use]
pub fn row_actions(schema: &PageSchema, record: &Record) -> Vec<RowAction> {
    let mut actions = Vec::new();
    if schema.resource.supports(Operation::Update) {
        actions.push(RowAction::Edit);
    }
    if schema.resource.supports(Operation::Delete) {
        actions.push(RowAction::Delete);
    }
    let pending = schema
        .moderation
        .is_some_and(|moderation| record.text(moderation.field) == Some(moderation.pending));
    if pending {
        actions.push(RowAction::Approve);
        actions.push(RowAction::Reject);
    }
    actions
}

/// Check the business rules for `action` on `record`
///
/// # Errors
///
/// Returns [`Error::ActionBlocked`] with the message to show instead of
/// making the request, or [`Error::Unsupported`] when the backend has no
/// endpoint for it.
pub fn guard_action(schema: &PageSchema, record: &Record, action: RowAction) -> Result<()> {
    let resource = schema.resource;
    match action {
        RowAction::Edit | RowAction::Delete => {
            let operation = if action == RowAction::Edit {
                Operation::Update
            } else {
                Operation::Delete
            };
            if resource.supports(operation) {
                Ok(())
            } else {
                Err(Error::Unsupported {
                    resource,
                    operation,
                })
            }
        }
        RowAction::Approve | RowAction::Reject => {
            let Some(moderation) = schema.moderation else {
                return Err(Error::blocked(format!("{resource} cannot be moderated")));
            };
            if record.text(moderation.field) != Some(moderation.pending) {
                let verb = if action == RowAction::Approve {
                    "approved"
                } else {
                    "rejected"
                };
                return Err(Error::blocked(format!(
                    "Only pending {resource} can be {verb}"
                )));
            }
            if action == RowAction::Approve && record.is_blank(moderation.approve_requires) {
                return Err(Error::blocked(moderation.approve_blocked_message));
            }
            Ok(())
        }
    }
}

/// `total_locations` -> `Total locations`
#[must_use]
pub fn humanize(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.trim().chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Cards for the scalar entries of a stats object, in backend order
#[must_use]
pub fn stat_cards(stats: &Record) -> Vec<StatCard> {
    stats
        .fields()
        .iter()
        .filter(|(_, value)| matches!(value, Value::Number(_) | Value::String(_) | Value::Bool(_)))
        .map(|(key, value)| StatCard {
            key: key.clone(),
            label: humanize(key),
            value: cell_text(Some(value)),
        })
        .collect()
}
