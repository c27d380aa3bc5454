//! Static page descriptions: form fields, table columns and row rules

use serde_json::{Map, Number, Value};
use tourdesk_core::types::value_as_id;
use tourdesk_core::{Draft, Error, Record, RecordId, Resource, Result};
use validator::ValidateEmail;

/// Input kind of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Multi-line free text
    LongText,
    /// E-mail address
    Email,
    /// Integer or decimal number
    Number,
    /// Checkbox
    Bool,
    /// One of a fixed set of values
    Choice(&'static [&'static str]),
    /// List of tag ids
    TagIds,
    /// Id of another record (city, user, ...)
    Reference,
}

/// When a field must be filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Required {
    /// Optional
    Never,
    /// Required on every submit
    Always,
    /// Required only when creating
    OnCreate,
}

/// Value a field starts with in a new draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// Explicit `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Text
    Text(&'static str),
    /// Empty list
    EmptyList,
}

impl FieldDefault {
    /// JSON value for this default
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(flag),
            Self::Text(text) => Value::String(text.to_string()),
            Self::EmptyList => Value::Array(Vec::new()),
        }
    }
}

/// One form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key in the record and the request body
    pub name: &'static str,
    /// Human label
    pub label: &'static str,
    /// Input kind
    pub kind: FieldKind,
    /// Required rule
    pub required: Required,
    /// Initial value
    pub default: FieldDefault,
}

impl FieldSpec {
    /// Optional field defaulting to `null` (or `[]` for tag lists)
    #[must_use]
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        let default = match kind {
            FieldKind::TagIds => FieldDefault::EmptyList,
            _ => FieldDefault::Null,
        };
        Self {
            name,
            label,
            kind,
            required: Required::Never,
            default,
        }
    }

    /// Make the field required on every submit
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = Required::Always;
        self
    }

    /// Make the field required only on create
    #[must_use]
    pub const fn required_on_create(mut self) -> Self {
        self.required = Required::OnCreate;
        self
    }

    /// Override the initial value
    #[must_use]
    pub const fn default_to(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    /// Whether the field must be filled in for `mode`
    #[must_use]
    pub const fn is_required(&self, mode: &FormMode) -> bool {
        match self.required {
            Required::Never => false,
            Required::Always => true,
            Required::OnCreate => matches!(mode, FormMode::Create),
        }
    }
}

/// Whether a form creates a record or edits an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// New record, sent with `POST`
    Create,
    /// Existing record, sent with `PUT ?id=`
    Edit {
        /// Id of the edited record
        id: RecordId,
    },
}

/// One table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Record field, dotted for nested values
    pub field: &'static str,
    /// Header label
    pub label: &'static str,
}

/// Derives a badge from a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeRule {
    /// Boolean field shown as one of two labels
    Flag {
        /// Record field
        field: &'static str,
        /// Label when true
        on: &'static str,
        /// Label when false or missing
        off: &'static str,
    },
    /// Text field shown as-is, toned by value
    Value {
        /// Record field
        field: &'static str,
    },
}

/// Moderation workflow for records with a status field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moderation {
    /// Status field
    pub field: &'static str,
    /// Status that shows approve/reject controls
    pub pending: &'static str,
    /// Status set by approve
    pub approved: &'static str,
    /// Status set by reject
    pub rejected: &'static str,
    /// Field that must be present before approving
    pub approve_requires: &'static str,
    /// Blocking message when it is absent
    pub approve_blocked_message: &'static str,
}

/// Static description of one list page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSchema {
    /// Backend resource
    pub resource: Resource,
    /// Page title
    pub title: &'static str,
    /// Form fields, in display order
    pub fields: &'static [FieldSpec],
    /// Table columns, in display order
    pub columns: &'static [ColumnSpec],
    /// Badge rules
    pub badges: &'static [BadgeRule],
    /// Fields matched by the search box when the page also filters locally
    pub local_search: &'static [&'static str],
    /// Moderation workflow, if any
    pub moderation: Option<Moderation>,
}

impl PageSchema {
    /// Field spec by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The tag id list field, if the page has one
    #[must_use]
    pub fn tag_field(&self) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|field| field.kind == FieldKind::TagIds)
    }

    /// Draft for a new record with every default filled in
    #[must_use]
    pub fn new_draft(&self) -> Draft {
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.name.to_string(), field.default.to_value()))
            .collect();
        Draft::from(fields)
    }

    /// Draft for editing `record`
    ///
    /// Only schema fields are copied; missing or `null` ones get their
    /// default. A tag list missing from the record is rebuilt from an
    /// inlined `tags` array of objects.
    #[must_use]
    pub fn draft_from(&self, record: &Record) -> Draft {
        let mut draft = self.new_draft();
        for field in self.fields {
            match record.get(field.name) {
                Some(Value::Null) | None => {
                    if field.kind == FieldKind::TagIds {
                        let ids = inlined_tag_ids(record);
                        if !ids.is_empty() {
                            draft.set(field.name, ids);
                        }
                    }
                }
                Some(value) => draft.set(field.name, value.clone()),
            }
        }
        draft
    }

    /// Check required fields and value formats
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Validation`] found, in field order.
    pub fn validate(&self, draft: &Draft, mode: &FormMode) -> Result<()> {
        for field in self.fields {
            let value = draft.get(field.name);

            if tourdesk_core::types::is_blank(value) {
                if field.is_required(mode) {
                    return Err(Error::validation(
                        field.name,
                        format!("{} is required", field.label),
                    ));
                }
                continue;
            }

            check_format(field, value)?;
        }

        let unapprovable = self.moderation.filter(|moderation| {
            draft.text(moderation.field) == Some(moderation.approved)
                && draft.is_blank(moderation.approve_requires)
        });
        if let Some(moderation) = unapprovable {
            return Err(Error::blocked(moderation.approve_blocked_message));
        }
        Ok(())
    }

    /// Request body for `draft`
    ///
    /// Every schema field is present. Blank text becomes `null` and numeric
    /// text becomes a number; fields outside the schema pass through.
    #[must_use]
    pub fn payload(&self, draft: &Draft) -> Draft {
        let mut body = Map::new();
        for field in self.fields {
            let value = draft
                .get(field.name)
                .cloned()
                .unwrap_or_else(|| field.default.to_value());
            body.insert(field.name.to_string(), normalize(field, value));
        }
        for (key, value) in draft.fields() {
            if !body.contains_key(key) {
                body.insert(key.clone(), value.clone());
            }
        }
        Draft::from(body)
    }
}

fn inlined_tag_ids(record: &Record) -> Vec<RecordId> {
    record
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|tag| tag.get("id").and_then(value_as_id))
                .collect()
        })
        .unwrap_or_default()
}

fn check_format(field: &FieldSpec, value: Option<&Value>) -> Result<()> {
    let invalid = |message: String| Err(Error::validation(field.name, message));

    match (field.kind, value) {
        (FieldKind::Email, Some(Value::String(text)))
            if !text.trim().to_string().validate_email() =>
        {
            invalid(format!("{} must be a valid e-mail address", field.label))
        }
        (FieldKind::Number, Some(Value::String(text))) if text.trim().parse::<f64>().is_err() => {
            invalid(format!("{} must be a number", field.label))
        }
        (FieldKind::Number, Some(value)) if !value.is_number() && !value.is_string() => {
            invalid(format!("{} must be a number", field.label))
        }
        (FieldKind::Choice(allowed), Some(Value::String(text)))
            if !allowed.contains(&text.as_str()) =>
        {
            invalid(format!(
                "{} must be one of: {}",
                field.label,
                allowed.join(", ")
            ))
        }
        _ => Ok(()),
    }
}

fn normalize(field: &FieldSpec, value: Value) -> Value {
    match value {
        Value::String(text) if text.trim().is_empty() => Value::Null,
        Value::String(text) if field.kind == FieldKind::Number => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| {
                text.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            })
            .unwrap_or(Value::String(text)),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pages::{LOCATIONS, TOURS, USERS};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_new_draft_fills_defaults() {
        let draft = LOCATIONS.new_draft();

        assert_eq!(draft.get("verified"), Some(&json!(true)));
        assert_eq!(draft.get("tag_ids"), Some(&json!([])));
        assert_eq!(draft.get("address"), Some(&Value::Null));
        assert_eq!(draft.fields().len(), LOCATIONS.fields.len());
    }

    #[test]
    fn test_draft_from_record_keeps_known_fields_only() {
        let record = Record::from_value(json!({
            "id": "l1",
            "name": "Cafe X",
            "city_name": "Lisbon",
            "verified": null,
            "tags": [{"id": "t1", "name": "Coffee"}, {"id": 2, "name": "Brunch"}]
        }))
        .unwrap();

        let draft = LOCATIONS.draft_from(&record);

        assert_eq!(draft.text("name"), Some("Cafe X"));
        assert!(!draft.contains("city_name"));
        assert!(!draft.contains("id"));
        assert_eq!(draft.get("verified"), Some(&json!(true)));
        assert_eq!(draft.ids("tag_ids"), vec!["t1", "2"]);
    }

    #[test]
    fn test_validate_reports_first_missing_required_field() {
        let draft = LOCATIONS.new_draft().with("name", "Cafe X");

        let error = LOCATIONS.validate(&draft, &FormMode::Create).unwrap_err();
        match error {
            Error::Validation { field, message } => {
                assert_eq!(field, "city_id");
                assert_eq!(message, "City is required");
            }
            other => unreachable!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_does_not_satisfy_required() {
        let draft = TOURS.new_draft().with("title", "   ");
        assert!(TOURS.validate(&draft, &FormMode::Create).is_err());
    }

    #[test]
    fn test_password_required_only_on_create() {
        let draft = USERS
            .new_draft()
            .with("email", "ana@example.com")
            .with("name", "Ana");

        assert!(USERS.validate(&draft, &FormMode::Create).is_err());
        assert!(
            USERS
                .validate(&draft, &FormMode::Edit { id: "u1".into() })
                .is_ok()
        );
    }

    #[test]
    fn test_approved_status_needs_trip_format() {
        let draft = TOURS
            .new_draft()
            .with("title", "Mystery trip")
            .with("status", "approved");
        let mode = FormMode::Edit { id: "t2".into() };

        assert!(matches!(
            TOURS.validate(&draft, &mode),
            Err(Error::ActionBlocked { .. })
        ));
        assert!(
            TOURS
                .validate(&draft.clone().with("status", "pending"), &mode)
                .is_ok()
        );
        assert!(
            TOURS
                .validate(&draft.with("trip_format", "walking"), &mode)
                .is_ok()
        );
    }

    #[test]
    fn test_format_checks() {
        let bad_email = USERS
            .new_draft()
            .with("email", "not-an-email")
            .with("name", "Ana")
            .with("password", "secret");
        assert!(USERS.validate(&bad_email, &FormMode::Create).is_err());

        let bad_category = LOCATIONS
            .new_draft()
            .with("name", "X")
            .with("city_id", "c1")
            .with("category", "spaceport");
        assert!(LOCATIONS.validate(&bad_category, &FormMode::Create).is_err());

        let bad_number = LOCATIONS
            .new_draft()
            .with("name", "X")
            .with("city_id", "c1")
            .with("category", "cafe")
            .with("latitude", "north");
        assert!(LOCATIONS.validate(&bad_number, &FormMode::Create).is_err());
    }

    #[test]
    fn test_payload_normalizes_blank_and_numeric_text() {
        let draft = LOCATIONS
            .new_draft()
            .with("name", "Cafe X")
            .with("address", "  ")
            .with("latitude", "38.7")
            .with("price_level", "2");

        let body = LOCATIONS.payload(&draft);

        assert_eq!(body.get("address"), Some(&Value::Null));
        assert_eq!(body.get("latitude"), Some(&json!(38.7)));
        assert_eq!(body.get("price_level"), Some(&json!(2)));
    }

    #[test]
    fn test_payload_fills_fields_missing_from_draft() {
        let draft = Draft::new().with("title", "Old town walk");
        let body = TOURS.payload(&draft);

        assert_eq!(body.fields().len(), TOURS.fields.len());
        assert_eq!(body.get("status"), Some(&json!("pending")));
    }
}
