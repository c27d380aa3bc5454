//! List page controller: loading, filtering, selection and mutations

use crate::debounce::Debouncer;
use crate::form::{DraftSink, FormModal};
use crate::schema::{FormMode, PageSchema};
use crate::view::{self, Row, RowAction};
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tourdesk_client::AdminApi;
use tourdesk_core::filter::FilterValue;
use tourdesk_core::{
    Draft, Error, FilterSet, Record, RecordId, Resource, Result, SelectionSet, Tag,
};
use tracing::{debug, info, warn};

/// Default quiet period before a filter change reloads the list
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Load state of a list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    /// Not mounted yet, or unmounted
    Idle,
    /// A reload is in flight
    Loading,
    /// The latest reload succeeded
    Ready,
    /// The latest reload failed; `retry` is available
    Error(String),
}

impl ListState {
    /// Banner text for the error state
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Result of a bulk delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Ids deleted successfully
    pub succeeded: Vec<RecordId>,
    /// Ids that failed, with the error message
    pub failed: Vec<(RecordId, String)>,
}

impl BulkOutcome {
    /// Number of attempted deletes
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether every delete succeeded
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Banner text, e.g. `Deleted 2 of 3 tours`
    #[must_use]
    pub fn summary(&self, resource: Resource) -> String {
        format!(
            "Deleted {} of {} {resource}",
            self.succeeded.len(),
            self.attempted()
        )
    }
}

/// Point-in-time copy of a page's state
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    /// Load state
    pub state: ListState,
    /// Loaded records
    pub records: Vec<Record>,
    /// Active filters
    pub filters: FilterSet,
    /// Selected ids
    pub selection: SelectionSet,
    /// Reference tags
    pub tags: Vec<Tag>,
    /// Id of the single delete in flight
    pub deleting_id: Option<RecordId>,
    /// Whether a bulk delete is in flight
    pub is_deleting_selected: bool,
    /// Ids with an approve/reject in flight
    pub moderating: Vec<RecordId>,
}

#[derive(Debug)]
struct PageState {
    state: ListState,
    records: Vec<Record>,
    filters: FilterSet,
    selection: SelectionSet,
    tags: Vec<Tag>,
    seq: u64,
    mounted: bool,
    deleting_id: Option<RecordId>,
    is_deleting_selected: bool,
    moderating: HashSet<RecordId>,
}

impl PageState {
    fn new() -> Self {
        Self {
            state: ListState::Idle,
            records: Vec::new(),
            filters: FilterSet::new(),
            selection: SelectionSet::new(),
            tags: Vec::new(),
            seq: 0,
            mounted: false,
            deleting_id: None,
            is_deleting_selected: false,
            moderating: HashSet::new(),
        }
    }

    fn is_loaded(&self, id: &str) -> bool {
        self.records
            .iter()
            .any(|record| record.id().as_deref() == Some(id))
    }

    fn record(&self, id: &str) -> Option<Record> {
        self.records
            .iter()
            .find(|record| record.id().as_deref() == Some(id))
            .cloned()
    }
}

struct Inner {
    api: Arc<dyn AdminApi>,
    schema: &'static PageSchema,
    debouncer: Debouncer,
    state: Mutex<PageState>,
}

/// Controller for one list page
///
/// Cheap to clone; clones drive the same page. State lives behind a short
/// lock that is never held across a request.
#[derive(Clone)]
pub struct ListController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ListController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListController")
            .field("resource", &self.inner.schema.resource)
            .field("state", &self.inner.state.lock().state)
            .finish_non_exhaustive()
    }
}

impl ListController {
    /// Controller with the default debounce
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, schema: &'static PageSchema) -> Self {
        Self::with_debounce(api, schema, DEFAULT_DEBOUNCE)
    }

    /// Controller with a custom filter debounce
    #[must_use]
    pub fn with_debounce(
        api: Arc<dyn AdminApi>,
        schema: &'static PageSchema,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                schema,
                debouncer: Debouncer::new(debounce),
                state: Mutex::new(PageState::new()),
            }),
        }
    }

    /// Page schema
    #[must_use]
    pub fn schema(&self) -> &'static PageSchema {
        self.inner.schema
    }

    fn resource(&self) -> Resource {
        self.inner.schema.resource
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> ListSnapshot {
        let page = self.inner.state.lock();
        let mut moderating: Vec<_> = page.moderating.iter().cloned().collect();
        moderating.sort_unstable();
        ListSnapshot {
            state: page.state.clone(),
            records: page.records.clone(),
            filters: page.filters.clone(),
            selection: page.selection.clone(),
            tags: page.tags.clone(),
            deleting_id: page.deleting_id.clone(),
            is_deleting_selected: page.is_deleting_selected,
            moderating,
        }
    }

    /// Current load state
    #[must_use]
    pub fn state(&self) -> ListState {
        self.inner.state.lock().state.clone()
    }

    /// Loaded records
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.inner.state.lock().records.clone()
    }

    /// Reference tags loaded on mount
    #[must_use]
    pub fn tags(&self) -> Vec<Tag> {
        self.inner.state.lock().tags.clone()
    }

    /// Rendered table rows
    #[must_use]
    pub fn rows(&self) -> Vec<Row> {
        let page = self.inner.state.lock();
        view::render_rows(
            self.inner.schema,
            &page.records,
            &page.filters,
            &page.selection,
            &page.tags,
        )
    }

    /// Load tags and the first page of records
    ///
    /// A tag load failure is logged and leaves the tag list empty.
    ///
    /// # Errors
    ///
    /// Returns the list error; the page is then in [`ListState::Error`].
    pub async fn mount(&self) -> Result<()> {
        self.inner.state.lock().mounted = true;

        match self.inner.api.tags().await {
            Ok(tags) => {
                debug!(resource = %self.resource(), count = tags.len(), "Loaded tags");
                self.inner.state.lock().tags = tags;
            }
            Err(error) => {
                warn!(resource = %self.resource(), error = %error, "Failed to load tags");
            }
        }

        self.reload().await
    }

    /// Stop the page: cancel the pending debounce and ignore late responses
    pub fn unmount(&self) {
        let cancelled = self.inner.debouncer.cancel();
        let mut page = self.inner.state.lock();
        page.mounted = false;
        page.seq += 1;
        page.state = ListState::Idle;
        debug!(resource = %self.resource(), cancelled, "List page unmounted");
    }

    /// Fetch the list with the current filters
    ///
    /// Only the most recently started reload may update the page; earlier
    /// responses are discarded when they arrive.
    ///
    /// # Errors
    ///
    /// Returns the list error when this reload is still the latest one.
    pub async fn reload(&self) -> Result<()> {
        let (seq, filters) = {
            let mut page = self.inner.state.lock();
            if !page.mounted {
                debug!(resource = %self.resource(), "Skipping reload of unmounted page");
                return Ok(());
            }
            page.seq += 1;
            page.state = ListState::Loading;
            page.selection.clear();
            (page.seq, page.filters.clone())
        };

        let result = self.inner.api.list(self.resource(), &filters).await;

        let mut page = self.inner.state.lock();
        if !page.mounted || page.seq != seq {
            debug!(
                resource = %self.resource(),
                seq,
                latest = page.seq,
                "Discarding stale list response"
            );
            return Ok(());
        }

        page.selection.clear();
        match result {
            Ok(records) => {
                let records = view::visible_records(self.inner.schema, &records, &filters);
                info!(resource = %self.resource(), count = records.len(), seq, "List loaded");
                page.records = records;
                page.state = ListState::Ready;
                Ok(())
            }
            Err(error) => {
                warn!(resource = %self.resource(), error = %error, seq, "List load failed");
                page.state = ListState::Error(error.user_message());
                Err(error)
            }
        }
    }

    /// Reload after a failed load
    ///
    /// Returns `false` without a request outside [`ListState::Error`].
    ///
    /// # Errors
    ///
    /// Returns the list error if the retry fails again.
    pub async fn retry(&self) -> Result<bool> {
        let failed = matches!(self.inner.state.lock().state, ListState::Error(_));
        if !failed {
            debug!(resource = %self.resource(), "Retry ignored outside the error state");
            return Ok(false);
        }
        self.reload().await?;
        Ok(true)
    }

    /// Change a filter value; a changed value schedules a debounced reload
    ///
    /// Returns whether the value changed.
    pub fn set_filter(&self, key: &str, value: impl Into<FilterValue>) -> bool {
        let (changed, mounted) = {
            let mut page = self.inner.state.lock();
            (page.filters.set(key, value), page.mounted)
        };
        if changed && mounted {
            self.schedule_reload();
        }
        changed
    }

    /// Remove a filter; schedules a debounced reload when one was set
    pub fn clear_filter(&self, key: &str) -> bool {
        let (changed, mounted) = {
            let mut page = self.inner.state.lock();
            (page.filters.remove(key), page.mounted)
        };
        if changed && mounted {
            self.schedule_reload();
        }
        changed
    }

    /// Active filters
    #[must_use]
    pub fn filters(&self) -> FilterSet {
        self.inner.state.lock().filters.clone()
    }

    /// Whether a filter change is waiting for its quiet period
    #[must_use]
    pub fn has_pending_reload(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    fn schedule_reload(&self) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let controller = Self { inner };
            if let Err(error) = controller.reload().await {
                debug!(error = %error, "Debounced reload failed");
            }
        });
    }

    async fn reload_after_mutation(&self) {
        if let Err(error) = self.reload().await {
            debug!(resource = %self.resource(), error = %error, "Reload after mutation failed");
        }
    }

    /// Select a loaded record; returns whether the selection changed
    pub fn select(&self, id: &str) -> bool {
        let mut page = self.inner.state.lock();
        page.is_loaded(id) && page.selection.insert(id)
    }

    /// Deselect a record; returns whether it was selected
    pub fn deselect(&self, id: &str) -> bool {
        self.inner.state.lock().selection.remove(id)
    }

    /// Flip selection of a loaded record; returns whether it is now selected
    pub fn toggle_selection(&self, id: &str) -> bool {
        let mut page = self.inner.state.lock();
        page.is_loaded(id) && page.selection.toggle(id)
    }

    /// Select every loaded record
    pub fn select_all(&self) {
        let mut page = self.inner.state.lock();
        let ids: Vec<_> = page.records.iter().filter_map(Record::id).collect();
        for id in ids {
            page.selection.insert(id);
        }
    }

    /// Deselect everything
    pub fn clear_selection(&self) {
        self.inner.state.lock().selection.clear();
    }

    /// Current selection
    #[must_use]
    pub fn selection(&self) -> SelectionSet {
        self.inner.state.lock().selection.clone()
    }

    /// Delete one record, then reload
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] while another single delete is in flight,
    /// or the delete error. A failed delete does not reload.
    pub async fn delete(&self, id: &str) -> Result<()> {
        {
            let mut page = self.inner.state.lock();
            if let Some(record) = page.record(id) {
                view::guard_action(self.inner.schema, &record, RowAction::Delete)?;
            }
            if page.deleting_id.is_some() {
                return Err(Error::busy("delete"));
            }
            page.deleting_id = Some(id.to_string());
        }

        let result = self.inner.api.delete(self.resource(), id).await;
        self.inner.state.lock().deleting_id = None;

        match result {
            Ok(()) => {
                info!(resource = %self.resource(), id, "Record deleted");
                self.reload_after_mutation().await;
                Ok(())
            }
            Err(error) => {
                warn!(resource = %self.resource(), id, error = %error, "Delete failed");
                Err(error)
            }
        }
    }

    /// Delete every selected record, then reload once
    ///
    /// Deletes run concurrently and all settle before the reload,
    /// whatever their outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] while another bulk delete is in flight.
    pub async fn delete_selected(&self) -> Result<BulkOutcome> {
        let ids = {
            let mut page = self.inner.state.lock();
            if page.is_deleting_selected {
                return Err(Error::busy("bulk delete"));
            }
            let ids = page.selection.to_vec();
            if ids.is_empty() {
                return Ok(BulkOutcome::default());
            }
            page.is_deleting_selected = true;
            ids
        };

        let resource = self.resource();
        let api = &self.inner.api;
        let results = join_all(ids.iter().map(|id| api.delete(resource, id))).await;

        let mut outcome = BulkOutcome::default();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(()) => outcome.succeeded.push(id),
                Err(error) => outcome.failed.push((id, error.user_message())),
            }
        }

        self.inner.state.lock().is_deleting_selected = false;

        if outcome.is_complete() {
            info!(%resource, count = outcome.succeeded.len(), "Bulk delete finished");
        } else {
            warn!(
                %resource,
                succeeded = outcome.succeeded.len(),
                failed = outcome.failed.len(),
                "Bulk delete partially failed"
            );
        }

        self.reload_after_mutation().await;
        Ok(outcome)
    }

    /// Approve a pending record
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionBlocked`] without a request when the record
    /// fails the approve rules, [`Error::Busy`] while another moderation of
    /// the same id is in flight, or the update error.
    pub async fn approve(&self, id: &str) -> Result<Record> {
        self.moderate(id, RowAction::Approve).await
    }

    /// Reject a pending record
    ///
    /// # Errors
    ///
    /// Same as [`ListController::approve`].
    pub async fn reject(&self, id: &str) -> Result<Record> {
        self.moderate(id, RowAction::Reject).await
    }

    async fn moderate(&self, id: &str, action: RowAction) -> Result<Record> {
        let schema = self.inner.schema;
        let payload = {
            let mut page = self.inner.state.lock();
            let record = page.record(id).ok_or_else(|| Error::NotFound {
                resource: format!("{} {id}", schema.resource.singular()),
            })?;
            view::guard_action(schema, &record, action)?;
            let Some(moderation) = schema.moderation else {
                return Err(Error::blocked(format!("{} cannot be moderated", schema.resource)));
            };
            if !page.moderating.insert(id.to_string()) {
                return Err(Error::busy(format!("{} {id}", action.label().to_lowercase())));
            }

            let status = if action == RowAction::Approve {
                moderation.approved
            } else {
                moderation.rejected
            };
            let mut draft = schema.draft_from(&record);
            draft.set(moderation.field, Value::from(status));
            schema.payload(&draft)
        };

        let result = self.inner.api.update(self.resource(), id, &payload).await;
        self.inner.state.lock().moderating.remove(id);

        match result {
            Ok(record) => {
                info!(resource = %self.resource(), id, action = action.label(), "Record moderated");
                self.reload_after_mutation().await;
                Ok(record)
            }
            Err(error) => {
                warn!(resource = %self.resource(), id, error = %error, "Moderation failed");
                Err(error)
            }
        }
    }

    /// Form for a new record, with the loaded tags
    #[must_use]
    pub fn create_form(&self) -> FormModal {
        FormModal::create(self.inner.schema, self.tags())
    }

    /// Form editing a loaded record
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the id is not loaded, or
    /// [`Error::Unsupported`] when the resource cannot be updated.
    pub fn edit_form(&self, id: &str) -> Result<FormModal> {
        let (record, tags) = {
            let page = self.inner.state.lock();
            let record = page.record(id).ok_or_else(|| Error::NotFound {
                resource: format!("{} {id}", self.resource().singular()),
            })?;
            (record, page.tags.clone())
        };
        view::guard_action(self.inner.schema, &record, RowAction::Edit)?;
        FormModal::edit(self.inner.schema, &record, tags)
    }
}

#[async_trait]
impl DraftSink for ListController {
    async fn save(&self, mode: &FormMode, draft: &Draft) -> Result<Record> {
        let resource = self.resource();
        let saved = match mode {
            FormMode::Create => self.inner.api.create(resource, draft).await?,
            FormMode::Edit { id } => self.inner.api.update(resource, id, draft).await?,
        };
        info!(%resource, id = saved.id().as_deref().unwrap_or("-"), "Record saved");
        self.reload_after_mutation().await;
        Ok(saved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pages::{LOCATIONS, TOURS};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tourdesk_client::MockAdminApi;
    use tourdesk_core::Operation;

    fn locations() -> MockAdminApi {
        MockAdminApi::new().with_json(
            Resource::Locations,
            vec![
                json!({"id": "l1", "name": "Cafe X"}),
                json!({"id": "l2", "name": "Museu"}),
            ],
        )
    }

    #[tokio::test]
    async fn test_mount_loads_tags_and_records() {
        let api = locations().with_tags(vec![Tag::new("t1", "Coffee")]);
        let controller = ListController::new(Arc::new(api.clone()), &LOCATIONS);
        assert_eq!(controller.state(), ListState::Idle);

        controller.mount().await.unwrap();

        assert_eq!(controller.state(), ListState::Ready);
        assert_eq!(controller.records().len(), 2);
        assert_eq!(controller.tags().len(), 1);
        assert_eq!(api.list_count(Resource::Locations), 1);
    }

    #[tokio::test]
    async fn test_tag_failure_does_not_block_mount() {
        let api = locations();
        api.fail_operation(Resource::Tags, Operation::List, "tags down");
        let controller = ListController::new(Arc::new(api), &LOCATIONS);

        controller.mount().await.unwrap();

        assert_eq!(controller.state(), ListState::Ready);
        assert!(controller.tags().is_empty());
    }

    #[tokio::test]
    async fn test_selection_restricted_to_loaded_ids() {
        let controller = ListController::new(Arc::new(locations()), &LOCATIONS);
        controller.mount().await.unwrap();

        assert!(controller.select("l1"));
        assert!(!controller.select("l1"));
        assert!(!controller.select("ghost"));
        assert!(!controller.toggle_selection("ghost"));
        controller.select_all();
        assert_eq!(controller.selection().len(), 2);
    }

    #[tokio::test]
    async fn test_busy_single_delete() {
        let api = locations().with_delay(Duration::from_millis(50));
        let controller = ListController::new(Arc::new(api.clone()), &LOCATIONS);
        controller.mount().await.unwrap();

        let first = controller.clone();
        let pending = tokio::spawn(async move { first.delete("l1").await });
        tokio::task::yield_now().await;
        assert_eq!(controller.snapshot().deleting_id.as_deref(), Some("l1"));

        let error = controller.delete("l2").await.unwrap_err();
        assert!(matches!(error, Error::Busy { .. }));

        pending.await.unwrap().unwrap();
        assert_eq!(api.deleted_ids(), vec!["l1"]);
        assert_eq!(controller.snapshot().deleting_id, None);
    }

    #[tokio::test]
    async fn test_reject_moderates_without_trip_format() {
        let api = MockAdminApi::new().with_json(
            Resource::Tours,
            vec![json!({"id": "t1", "title": "Walk", "status": "pending"})],
        );
        let controller = ListController::new(Arc::new(api.clone()), &TOURS);
        controller.mount().await.unwrap();

        let updated = controller.reject("t1").await.unwrap();

        assert_eq!(updated.text("status"), Some("rejected"));
        assert_eq!(api.list_count(Resource::Tours), 2);
    }

    #[tokio::test]
    async fn test_unmounted_page_ignores_reload() {
        let api = locations();
        let controller = ListController::new(Arc::new(api.clone()), &LOCATIONS);

        controller.reload().await.unwrap();
        assert!(controller.set_filter("search", "cafe"));
        assert!(!controller.has_pending_reload());
        assert_eq!(api.list_count(Resource::Locations), 0);
    }
}
