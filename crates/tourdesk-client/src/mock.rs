//! In-memory admin backend for tests and offline demos

use crate::api::{self, AdminApi};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tourdesk_core::{
    Draft, Error, FilterSet, Operation, Record, RecordId, Resource, Result, StatsPeriod, Tag,
};

/// A call received by [`MockAdminApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `list` with the encoded query string
    List {
        /// Target resource
        resource: Resource,
        /// Query string as it would go on the wire
        query: String,
    },
    /// `get_by_id`
    Get {
        /// Target resource
        resource: Resource,
        /// Requested id
        id: RecordId,
    },
    /// `create` with the sent body
    Create {
        /// Target resource
        resource: Resource,
        /// Full draft body
        body: Value,
    },
    /// `update` with the sent body
    Update {
        /// Target resource
        resource: Resource,
        /// Updated id
        id: RecordId,
        /// Full draft body
        body: Value,
    },
    /// `delete`
    Delete {
        /// Target resource
        resource: Resource,
        /// Deleted id
        id: RecordId,
    },
    /// `tags`
    Tags,
    /// `stats`
    Stats {
        /// Requested period
        period: Option<StatsPeriod>,
    },
}

#[derive(Debug, Clone)]
enum Failure {
    Api(String),
    Network(String),
}

impl Failure {
    fn to_error(&self) -> Error {
        match self {
            Self::Api(message) => Error::api(Some(500), message.clone()),
            Self::Network(message) => Error::network(message.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    records: HashMap<Resource, Vec<Record>>,
    tags: Vec<Tag>,
    stats: Record,
    calls: Vec<MockCall>,
    failing_operations: HashMap<(Resource, Operation), Failure>,
    failing_deletes: HashSet<RecordId>,
    list_delays: VecDeque<Duration>,
    delay: Duration,
}

/// Mock admin backend keeping records in memory
///
/// Clones share state, so a test can hand one clone to a controller and
/// inspect calls through another.
#[derive(Debug, Clone, Default)]
pub struct MockAdminApi {
    state: Arc<Mutex<MockState>>,
}

impl MockAdminApi {
    /// Create an empty mock backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed records for a resource
    #[must_use]
    pub fn with_records(self, resource: Resource, records: Vec<Record>) -> Self {
        self.state.lock().records.insert(resource, records);
        self
    }

    /// Seed records from JSON objects; non-objects are skipped
    #[must_use]
    pub fn with_json(self, resource: Resource, values: Vec<Value>) -> Self {
        let records = values
            .into_iter()
            .filter_map(|value| Record::from_value(value).ok())
            .collect();
        self.with_records(resource, records)
    }

    /// Seed reference tags
    #[must_use]
    pub fn with_tags(self, tags: Vec<Tag>) -> Self {
        self.state.lock().tags = tags;
        self
    }

    /// Seed dashboard statistics
    #[must_use]
    pub fn with_stats(self, stats: Record) -> Self {
        self.state.lock().stats = stats;
        self
    }

    /// Delay every call by `delay`
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.lock().delay = delay;
        self
    }

    /// Delay the next list calls, one entry per call, before the default delay applies
    pub fn queue_list_delays(&self, delays: impl IntoIterator<Item = Duration>) {
        self.state.lock().list_delays.extend(delays);
    }

    /// Make every `operation` on `resource` fail with an API error
    pub fn fail_operation(&self, resource: Resource, operation: Operation, message: &str) {
        self.state
            .lock()
            .failing_operations
            .insert((resource, operation), Failure::Api(message.to_string()));
    }

    /// Make every `operation` on `resource` fail as if the network were down
    pub fn fail_network(&self, resource: Resource, operation: Operation) {
        self.state.lock().failing_operations.insert(
            (resource, operation),
            Failure::Network("connection refused".to_string()),
        );
    }

    /// Make deletes of `id` fail
    pub fn fail_delete(&self, id: &str) {
        self.state.lock().failing_deletes.insert(id.to_string());
    }

    /// Remove every scripted failure
    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing_operations.clear();
        state.failing_deletes.clear();
    }

    /// Every call received so far
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    /// Number of list calls for `resource`
    #[must_use]
    pub fn list_count(&self, resource: Resource) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, MockCall::List { resource: r, .. } if *r == resource))
            .count()
    }

    /// Ids passed to delete, in call order
    #[must_use]
    pub fn deleted_ids(&self) -> Vec<RecordId> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Delete { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether any create, update or delete was received
    #[must_use]
    pub fn has_mutations(&self) -> bool {
        self.state.lock().calls.iter().any(|call| {
            matches!(
                call,
                MockCall::Create { .. } | MockCall::Update { .. } | MockCall::Delete { .. }
            )
        })
    }

    /// Currently stored records for `resource`
    #[must_use]
    pub fn records(&self, resource: Resource) -> Vec<Record> {
        self.state
            .lock()
            .records
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Record the call, then return the scripted failure and delay for it
    fn begin(
        &self,
        resource: Resource,
        operation: Operation,
        call: MockCall,
    ) -> (Option<Error>, Duration) {
        let mut state = self.state.lock();
        state.calls.push(call);

        let is_record_list = operation == Operation::List
            && matches!(resource, Resource::Locations | Resource::Tours | Resource::Users);
        let delay = if is_record_list {
            state.list_delays.pop_front().unwrap_or(state.delay)
        } else {
            state.delay
        };
        let failure = state
            .failing_operations
            .get(&(resource, operation))
            .map(Failure::to_error);
        drop(state);

        (failure, delay)
    }

    async fn settle(&self, resource: Resource, operation: Operation, call: MockCall) -> Result<()> {
        api::ensure_supported(resource, operation)?;
        let (failure, delay) = self.begin(resource, operation, call);
        if !delay.is_zero() {
            sleep(delay).await;
        }
        failure.map_or(Ok(()), Err)
    }
}

fn matches_filters(record: &Record, filters: &FilterSet) -> bool {
    filters.query_pairs().iter().all(|(key, wanted)| {
        if key == FilterSet::SEARCH {
            let needle = wanted.to_lowercase();
            return record.fields().values().any(|value| {
                value
                    .as_str()
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            });
        }

        match record.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(tourdesk_core::types::value_as_id)
                .any(|item| &item == wanted),
            Some(Value::String(text)) => text == wanted,
            Some(Value::Bool(flag)) => flag.to_string() == *wanted,
            Some(other) => other.to_string() == *wanted,
            None => false,
        }
    })
}

#[async_trait]
impl AdminApi for MockAdminApi {
    async fn list(&self, resource: Resource, filters: &FilterSet) -> Result<Vec<Record>> {
        let call = MockCall::List {
            resource,
            query: filters.to_query_string(),
        };
        self.settle(resource, Operation::List, call).await?;

        Ok(self
            .records(resource)
            .into_iter()
            .filter(|record| matches_filters(record, filters))
            .collect())
    }

    async fn get_by_id(&self, resource: Resource, id: &str) -> Result<Record> {
        let call = MockCall::Get {
            resource,
            id: id.to_string(),
        };
        self.settle(resource, Operation::Get, call).await?;

        self.records(resource)
            .into_iter()
            .find(|record| record.id().as_deref() == Some(id))
            .ok_or_else(|| Error::api(Some(404), format!("{} not found", resource.singular())))
    }

    async fn create(&self, resource: Resource, draft: &Draft) -> Result<Record> {
        let call = MockCall::Create {
            resource,
            body: draft.to_value(),
        };
        self.settle(resource, Operation::Create, call).await?;

        let mut fields = draft.fields().clone();
        fields
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        let record = Record::new(fields);

        self.state
            .lock()
            .records
            .entry(resource)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, resource: Resource, id: &str, draft: &Draft) -> Result<Record> {
        let call = MockCall::Update {
            resource,
            id: id.to_string(),
            body: draft.to_value(),
        };
        self.settle(resource, Operation::Update, call).await?;

        let mut state = self.state.lock();
        let record = state
            .records
            .get_mut(&resource)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|record| record.id().as_deref() == Some(id))
            })
            .ok_or_else(|| Error::api(Some(404), format!("{} not found", resource.singular())))?;

        let mut fields = record.fields().clone();
        for (key, value) in draft.fields() {
            fields.insert(key.clone(), value.clone());
        }
        *record = Record::new(fields);
        Ok(record.clone())
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<()> {
        let call = MockCall::Delete {
            resource,
            id: id.to_string(),
        };
        self.settle(resource, Operation::Delete, call).await?;

        let mut state = self.state.lock();
        if state.failing_deletes.contains(id) {
            return Err(Error::api(
                Some(409),
                format!("Cannot delete {} {id}", resource.singular()),
            ));
        }
        if let Some(records) = state.records.get_mut(&resource) {
            records.retain(|record| record.id().as_deref() != Some(id));
        }
        Ok(())
    }

    async fn tags(&self) -> Result<Vec<Tag>> {
        self.settle(Resource::Tags, Operation::List, MockCall::Tags)
            .await?;
        Ok(self.state.lock().tags.clone())
    }

    async fn stats(&self, period: Option<StatsPeriod>) -> Result<Record> {
        self.settle(Resource::Stats, Operation::List, MockCall::Stats { period })
            .await?;
        Ok(self.state.lock().stats.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn backend() -> MockAdminApi {
        MockAdminApi::new().with_json(
            Resource::Locations,
            vec![
                json!({"id": "l1", "name": "Cafe Lisboa", "category": "cafe", "verified": true, "tag_ids": ["t1"]}),
                json!({"id": "l2", "name": "Museu", "category": "museum", "verified": false, "tag_ids": []}),
            ],
        )
    }

    #[tokio::test]
    async fn test_list_applies_filters() {
        let api = backend();

        let all = api.list(Resource::Locations, &FilterSet::new()).await.unwrap();
        assert_eq!(all.len(), 2);

        let cafes = api
            .list(Resource::Locations, &FilterSet::new().with("search", "lisboa"))
            .await
            .unwrap();
        assert_eq!(cafes.len(), 1);

        let tagged = api
            .list(Resource::Locations, &FilterSet::new().with("tag_id", "t1"))
            .await
            .unwrap();
        assert!(tagged.is_empty(), "tag_id is not a record field");

        let by_tag_list = api
            .list(Resource::Locations, &FilterSet::new().with("tag_ids", "t1"))
            .await
            .unwrap();
        assert_eq!(by_tag_list.len(), 1);

        let unverified = api
            .list(Resource::Locations, &FilterSet::new().with("verified", false))
            .await
            .unwrap();
        assert_eq!(unverified.len(), 1);
        assert_eq!(api.list_count(Resource::Locations), 5);
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_records_body() {
        let api = MockAdminApi::new();
        let draft = Draft::new().with("name", "Cafe X").with("address", Value::Null);

        let created = api.create(Resource::Locations, &draft).await.unwrap();

        assert!(created.id().is_some());
        assert_eq!(api.records(Resource::Locations).len(), 1);
        assert_eq!(
            api.calls(),
            vec![MockCall::Create {
                resource: Resource::Locations,
                body: json!({"name": "Cafe X", "address": null}),
            }]
        );
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let api = backend();
        let draft = Draft::new().with("name", "Cafe Porto");

        let updated = api.update(Resource::Locations, "l1", &draft).await.unwrap();

        assert_eq!(updated.text("name"), Some("Cafe Porto"));
        assert_eq!(updated.text("category"), Some("cafe"));
    }

    #[tokio::test]
    async fn test_scripted_delete_failure() {
        let api = backend();
        api.fail_delete("l2");

        assert!(api.delete(Resource::Locations, "l1").await.is_ok());
        assert!(api.delete(Resource::Locations, "l2").await.is_err());
        assert_eq!(api.deleted_ids(), vec!["l1", "l2"]);
        assert_eq!(api.records(Resource::Locations).len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_operations_are_not_recorded() {
        let api = backend();
        assert!(api.get_by_id(Resource::Users, "u1").await.is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure() {
        let api = backend();
        api.fail_network(Resource::Locations, Operation::List);

        let error = api
            .list(Resource::Locations, &FilterSet::new())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Network { .. }));

        api.clear_failures();
        assert!(api.list(Resource::Locations, &FilterSet::new()).await.is_ok());
    }
}
