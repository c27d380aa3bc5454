//! The admin API contract and response envelope handling

use async_trait::async_trait;
use serde_json::{Map, Value};
use tourdesk_core::{
    Draft, Error, FilterSet, Operation, Record, RecordId, Resource, Result, StatsPeriod, Tag,
};

/// Operations the admin backend exposes
///
/// Every call makes at most one request; failures propagate without retry.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// List records matching `filters`
    async fn list(&self, resource: Resource, filters: &FilterSet) -> Result<Vec<Record>>;

    /// Fetch one record
    async fn get_by_id(&self, resource: Resource, id: &str) -> Result<Record>;

    /// Create a record from a full draft
    async fn create(&self, resource: Resource, draft: &Draft) -> Result<Record>;

    /// Replace a record with a full draft
    async fn update(&self, resource: Resource, id: &str, draft: &Draft) -> Result<Record>;

    /// Delete one record
    async fn delete(&self, resource: Resource, id: &str) -> Result<()>;

    /// All reference tags
    async fn tags(&self) -> Result<Vec<Tag>>;

    /// Dashboard statistics
    async fn stats(&self, period: Option<StatsPeriod>) -> Result<Record>;
}

/// Fail with [`Error::Unsupported`] unless the backend offers `operation`
pub fn ensure_supported(resource: Resource, operation: Operation) -> Result<()> {
    if resource.supports(operation) {
        Ok(())
    } else {
        Err(Error::Unsupported {
            resource,
            operation,
        })
    }
}

/// Generic message used when the backend gives none
#[must_use]
pub fn fallback_message(resource: Resource, operation: Operation) -> String {
    let target = match operation {
        Operation::List => resource.as_str(),
        _ => resource.singular(),
    };
    format!("Failed to {operation} {target}")
}

/// Reject non-2xx responses and `success: false` bodies
pub fn check_envelope(status: u16, body: &Value, fallback: &str) -> Result<()> {
    let flagged_failure = body.get("success").and_then(Value::as_bool) == Some(false);
    if (200..300).contains(&status) && !flagged_failure {
        return Ok(());
    }

    let message = body
        .get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(fallback);

    Err(Error::api(Some(status), message))
}

/// Pull the record list out of a list response
pub fn extract_records(body: Value, resource: Resource) -> Result<Vec<Record>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut envelope) => {
            match envelope
                .remove("data")
                .or_else(|| envelope.remove(resource.as_str()))
            {
                Some(Value::Array(items)) => items,
                Some(Value::Null) | None => Vec::new(),
                Some(_) => {
                    return Err(Error::api(
                        None,
                        format!("Malformed {resource} list in response"),
                    ));
                }
            }
        }
        _ => return Err(Error::api(None, format!("Malformed {resource} response"))),
    };

    items.into_iter().map(Record::from_value).collect()
}

/// Pull a single record out of a get/create/update response
///
/// Falls back to the envelope itself minus `success` and `message` when
/// the backend inlines the record.
pub fn extract_record(body: Value, resource: Resource) -> Result<Record> {
    let Value::Object(mut envelope) = body else {
        return Err(Error::api(None, format!("Malformed {resource} response")));
    };

    if let Some(inner) = envelope
        .remove("data")
        .or_else(|| envelope.remove(resource.singular()))
        .filter(Value::is_object)
    {
        return Record::from_value(inner);
    }

    envelope.shift_remove("success");
    envelope.shift_remove("message");
    Ok(Record::new(envelope))
}

/// Pull the tag list out of a tags response
pub fn extract_tags(body: Value) -> Result<Vec<Tag>> {
    extract_records(body, Resource::Tags)?
        .into_iter()
        .map(|record| {
            serde_json::from_value::<Tag>(Value::Object(record.into_fields())).map_err(Error::from)
        })
        .collect()
}

/// Request body for the bulk delete endpoint
#[must_use]
pub fn bulk_delete_body(ids: &[RecordId]) -> Value {
    let mut body = Map::new();
    body.insert("ids".to_string(), ids.to_vec().into());
    Value::Object(body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_success_envelope_passes() {
        assert!(check_envelope(200, &json!({"success": true, "data": []}), "x").is_ok());
        assert!(check_envelope(204, &Value::Null, "x").is_ok());
    }

    #[test]
    fn test_success_false_fails_with_backend_message() {
        let error =
            check_envelope(200, &json!({"success": false, "message": "Name taken"}), "x")
                .unwrap_err();
        match error {
            Error::Api { status, message } => {
                assert_eq!(status, Some(200));
                assert_eq!(message, "Name taken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_status_falls_back_to_generic_message() {
        let fallback = fallback_message(Resource::Locations, Operation::List);
        let error = check_envelope(500, &json!({"message": ""}), &fallback).unwrap_err();
        assert_eq!(error.to_string(), "Failed to list locations");
    }

    #[test]
    fn test_fallback_message_uses_singular_for_single_record_operations() {
        assert_eq!(
            fallback_message(Resource::Tours, Operation::Update),
            "Failed to update tour"
        );
    }

    #[test]
    fn test_extract_records_from_data_key() {
        let body = json!({"success": true, "data": [{"id": "1"}, {"id": "2"}]});
        let records = extract_records(body, Resource::Locations).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_extract_records_from_resource_key_and_bare_array() {
        let keyed = json!({"success": true, "users": [{"id": 1}]});
        assert_eq!(extract_records(keyed, Resource::Users).unwrap().len(), 1);

        let bare = json!([{"id": 1}, {"id": 2}, {"id": 3}]);
        assert_eq!(extract_records(bare, Resource::Users).unwrap().len(), 3);
    }

    #[test]
    fn test_extract_records_missing_payload_is_empty() {
        let records = extract_records(json!({"success": true}), Resource::Tours).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_extract_record_variants() {
        let wrapped = json!({"success": true, "location": {"id": "l1", "name": "Cafe"}});
        let record = extract_record(wrapped, Resource::Locations).unwrap();
        assert_eq!(record.id().as_deref(), Some("l1"));

        let inline = json!({"success": true, "message": "ok", "total_tours": 4});
        let record = extract_record(inline, Resource::Stats).unwrap();
        assert_eq!(record.get("total_tours"), Some(&json!(4)));
        assert!(record.get("success").is_none());
    }

    #[test]
    fn test_extract_tags() {
        let body = json!({"success": true, "tags": [{"id": 1, "name": "Coffee"}]});
        let tags = extract_tags(body).unwrap();
        assert_eq!(tags, vec![Tag::new("1", "Coffee")]);
    }

    #[test]
    fn test_ensure_supported() {
        assert!(ensure_supported(Resource::Locations, Operation::Create).is_ok());
        assert!(matches!(
            ensure_supported(Resource::Users, Operation::Get),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn test_bulk_delete_body() {
        let body = bulk_delete_body(&["t1".to_string(), "t2".to_string()]);
        assert_eq!(body, json!({"ids": ["t1", "t2"]}));
    }
}
