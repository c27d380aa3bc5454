//! Create/edit form state

use crate::schema::{FormMode, PageSchema};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use tourdesk_core::{Draft, Error, Record, Result, Tag};
use tracing::debug;

/// Persists a submitted draft
#[async_trait]
pub trait DraftSink: Send + Sync {
    /// Create or update the record described by `draft`
    async fn save(&self, mode: &FormMode, draft: &Draft) -> Result<Record>;
}

/// Proposes tag names for a piece of free text
#[async_trait]
pub trait TagSuggester: Send + Sync {
    /// Candidate tag names, best first
    async fn suggest(&self, text: &str) -> Result<Vec<String>>;
}

/// Suggests the distinct longer words of the text
#[derive(Debug, Clone)]
pub struct KeywordSuggester {
    min_len: usize,
    limit: usize,
}

impl Default for KeywordSuggester {
    fn default() -> Self {
        Self {
            min_len: 4,
            limit: 10,
        }
    }
}

impl KeywordSuggester {
    /// Suggester keeping words of at least `min_len` characters, at most `limit` of them
    #[must_use]
    pub const fn new(min_len: usize, limit: usize) -> Self {
        Self { min_len, limit }
    }
}

#[async_trait]
impl TagSuggester for KeywordSuggester {
    async fn suggest(&self, text: &str) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| word.chars().count() >= self.min_len)
            .map(str::to_lowercase)
            .filter(|word| seen.insert(word.clone()))
            .take(self.limit)
            .collect())
    }
}

/// A suggested tag name and the existing tag it maps to, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSuggestion {
    /// Suggested name
    pub name: String,
    /// Available tag with the same name, ignoring case
    pub tag: Option<Tag>,
}

impl TagSuggestion {
    /// Only suggestions matching an existing tag can be added
    #[must_use]
    pub const fn is_addable(&self) -> bool {
        self.tag.is_some()
    }
}

/// Fields whose text feeds tag suggestions
const SUGGESTION_SOURCES: [&str; 2] = ["description", "recommendations"];

/// Modal form editing one draft
#[derive(Debug, Clone)]
pub struct FormModal {
    schema: &'static PageSchema,
    mode: FormMode,
    draft: Draft,
    tags: Vec<Tag>,
    saving: bool,
    error: Option<String>,
    closed: bool,
}

impl FormModal {
    /// Form for a new record
    #[must_use]
    pub fn create(schema: &'static PageSchema, tags: Vec<Tag>) -> Self {
        Self::open(schema, FormMode::Create, schema.new_draft(), tags)
    }

    /// Form editing `record`
    ///
    /// # Errors
    ///
    /// Fails when the record has no id to update.
    pub fn edit(schema: &'static PageSchema, record: &Record, tags: Vec<Tag>) -> Result<Self> {
        let id = record.id().ok_or_else(|| Error::NotFound {
            resource: format!("{} without id", schema.resource.singular()),
        })?;
        Ok(Self::open(
            schema,
            FormMode::Edit { id },
            schema.draft_from(record),
            tags,
        ))
    }

    fn open(
        schema: &'static PageSchema,
        mode: FormMode,
        draft: Draft,
        tags: Vec<Tag>,
    ) -> Self {
        Self {
            schema,
            mode,
            draft,
            tags,
            saving: false,
            error: None,
            closed: false,
        }
    }

    /// Page the form belongs to
    #[must_use]
    pub const fn schema(&self) -> &'static PageSchema {
        self.schema
    }

    /// Create or edit
    #[must_use]
    pub const fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Current draft
    #[must_use]
    pub const fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Tags that can be attached
    #[must_use]
    pub fn available_tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Whether a save is in flight
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        self.saving
    }

    /// Inline error from the last submit
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the modal is still shown
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.closed
    }

    /// Whether the submit control is enabled
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        !self.saving && !self.closed
    }

    /// Submit control label
    #[must_use]
    pub const fn submit_label(&self) -> &'static str {
        match (self.saving, &self.mode) {
            (true, _) => "Saving...",
            (false, FormMode::Create) => "Create",
            (false, FormMode::Edit { .. }) => "Save",
        }
    }

    /// Set a field of the draft
    pub fn set_field(&mut self, field: &str, value: impl Into<Value>) {
        self.draft.set(field, value);
    }

    /// Attach a tag; returns whether the draft changed
    pub fn add_tag(&mut self, tag_id: &str) -> bool {
        self.schema
            .tag_field()
            .is_some_and(|field| self.draft.add_id(field.name, tag_id))
    }

    /// Detach a tag; returns whether the draft changed
    pub fn remove_tag(&mut self, tag_id: &str) -> bool {
        self.schema
            .tag_field()
            .is_some_and(|field| self.draft.remove_id(field.name, tag_id))
    }

    /// Whether the "suggest tags" action is enabled
    #[must_use]
    pub fn can_suggest_tags(&self) -> bool {
        self.schema.tag_field().is_some()
            && SUGGESTION_SOURCES
                .iter()
                .any(|field| self.schema.field(field).is_some() && !self.draft.is_blank(field))
    }

    /// Ask `suggester` for tags matching the draft's free text
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionBlocked`] when there is no text to work from,
    /// or the suggester's error.
    pub async fn suggest_tags(&self, suggester: &dyn TagSuggester) -> Result<Vec<TagSuggestion>> {
        if !self.can_suggest_tags() {
            return Err(Error::blocked(
                "Add a description or recommendations to get tag suggestions",
            ));
        }

        let text = SUGGESTION_SOURCES
            .iter()
            .filter_map(|field| self.draft.text(field))
            .collect::<Vec<_>>()
            .join("\n");

        let names = suggester.suggest(&text).await?;
        Ok(names
            .into_iter()
            .map(|name| {
                let tag = self
                    .tags
                    .iter()
                    .find(|tag| tag.name.to_lowercase() == name.trim().to_lowercase())
                    .cloned();
                TagSuggestion { name, tag }
            })
            .collect())
    }

    /// Attach the tag behind a suggestion; unmatched suggestions are ignored
    pub fn add_suggestion(&mut self, suggestion: &TagSuggestion) -> bool {
        suggestion
            .tag
            .as_ref()
            .is_some_and(|tag| self.add_tag(&tag.id))
    }

    /// Close without saving
    pub fn cancel(&mut self) {
        self.closed = true;
        self.saving = false;
    }

    /// Validate and mark the form as saving
    ///
    /// Returns the request body on success. On a validation error the
    /// message is shown inline and nothing is marked as saving.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] while a save is in flight, or the
    /// validation error.
    pub fn begin_submit(&mut self) -> Result<Draft> {
        if self.saving {
            return Err(Error::busy("save"));
        }
        if self.closed {
            return Err(Error::blocked("The form is closed"));
        }

        if let Err(error) = self.schema.validate(&self.draft, &self.mode) {
            debug!(resource = %self.schema.resource, error = %error, "Form validation failed");
            self.error = Some(error.user_message());
            return Err(error);
        }

        self.error = None;
        self.saving = true;
        Ok(self.schema.payload(&self.draft))
    }

    /// Record the outcome of a save started with [`FormModal::begin_submit`]
    ///
    /// Success closes the modal; an error is shown inline and the modal
    /// stays open.
    ///
    /// # Errors
    ///
    /// Passes the save error through.
    pub fn finish_submit(&mut self, outcome: Result<Record>) -> Result<Record> {
        self.saving = false;
        match outcome {
            Ok(record) => {
                self.closed = true;
                Ok(record)
            }
            Err(error) => {
                self.error = Some(error.user_message());
                Err(error)
            }
        }
    }

    /// Validate, save through `sink`, and close on success
    ///
    /// # Errors
    ///
    /// Returns the validation or save error; the modal stays open.
    pub async fn submit(&mut self, sink: &dyn DraftSink) -> Result<Record> {
        let payload = self.begin_submit()?;
        let outcome = sink.save(&self.mode, &payload).await;
        self.finish_submit(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pages::{LOCATIONS, TOURS};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<Draft>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl DraftSink for RecordingSink {
        async fn save(&self, _mode: &FormMode, draft: &Draft) -> Result<Record> {
            self.saved.lock().push(draft.clone());
            match &self.fail_with {
                Some(message) => Err(Error::api(Some(400), message.clone())),
                None => Ok(Record::new(draft.fields().clone())),
            }
        }
    }

    fn tags() -> Vec<Tag> {
        vec![Tag::new("t1", "Coffee"), Tag::new("t2", "Brunch")]
    }

    #[test]
    fn test_submit_label_follows_mode_and_state() {
        let mut form = FormModal::create(&LOCATIONS, tags());
        assert_eq!(form.submit_label(), "Create");

        form.set_field("name", "Cafe X");
        form.set_field("city_id", "c1");
        form.set_field("category", "cafe");
        form.begin_submit().unwrap();
        assert_eq!(form.submit_label(), "Saving...");
        assert!(!form.can_submit());
        assert!(matches!(form.begin_submit(), Err(Error::Busy { .. })));

        let record = Record::from_value(json!({"id": "l1", "name": "Cafe X"})).unwrap();
        let edit = FormModal::edit(&LOCATIONS, &record, tags()).unwrap();
        assert_eq!(edit.submit_label(), "Save");
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_sink() {
        let sink = RecordingSink::default();
        let mut form = FormModal::create(&LOCATIONS, tags());
        form.set_field("name", "Cafe X");

        let error = form.submit(&sink).await.unwrap_err();

        assert!(matches!(error, Error::Validation { .. }));
        assert!(sink.saved.lock().is_empty());
        assert_eq!(form.error(), Some("City is required"));
        assert!(form.is_open());
        assert!(!form.is_saving());
    }

    #[tokio::test]
    async fn test_sink_error_keeps_modal_open() {
        let sink = RecordingSink {
            fail_with: Some("Title already taken".to_string()),
            ..RecordingSink::default()
        };
        let mut form = FormModal::create(&TOURS, tags());
        form.set_field("title", "Old town walk");

        assert!(form.submit(&sink).await.is_err());
        assert_eq!(form.error(), Some("Title already taken"));
        assert!(form.is_open());
        assert!(form.can_submit());
    }

    #[tokio::test]
    async fn test_success_closes_modal() {
        let sink = RecordingSink::default();
        let mut form = FormModal::create(&TOURS, tags());
        form.set_field("title", "Old town walk");

        form.submit(&sink).await.unwrap();

        assert!(!form.is_open());
        assert_eq!(sink.saved.lock().len(), 1);
    }

    #[test]
    fn test_tag_add_remove_is_idempotent() {
        let mut form = FormModal::create(&LOCATIONS, tags());

        assert!(form.add_tag("t1"));
        assert!(!form.add_tag("t1"));
        assert_eq!(form.draft().ids("tag_ids"), vec!["t1"]);

        assert!(form.remove_tag("t1"));
        assert!(!form.remove_tag("t1"));
        assert!(form.draft().ids("tag_ids").is_empty());
    }

    #[tokio::test]
    async fn test_suggestions_need_text_and_matching_tags() {
        let mut form = FormModal::create(&LOCATIONS, tags());
        assert!(!form.can_suggest_tags());
        assert!(form.suggest_tags(&KeywordSuggester::default()).await.is_err());

        form.set_field("description", "Great coffee, lazy brunch and coffee again");
        assert!(form.can_suggest_tags());

        let suggestions = form
            .suggest_tags(&KeywordSuggester::default())
            .await
            .unwrap();
        let names: Vec<_> = suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["great", "coffee", "lazy", "brunch", "again"]);

        let addable: Vec<_> = suggestions.iter().filter(|s| s.is_addable()).collect();
        assert_eq!(addable.len(), 2);

        for suggestion in &suggestions {
            form.add_suggestion(suggestion);
        }
        assert_eq!(form.draft().ids("tag_ids"), vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_suggestions_match_accented_tag_names() {
        let tags = vec![Tag::new("t9", "Ópera"), Tag::new("t8", "Église")];
        let mut form = FormModal::create(&LOCATIONS, tags);
        form.set_field("description", "A night at the ÓPERA near the église");

        let suggestions = form
            .suggest_tags(&KeywordSuggester::default())
            .await
            .unwrap();
        let matched: Vec<_> = suggestions
            .iter()
            .map(|s| (s.name.as_str(), s.is_addable()))
            .collect();
        assert_eq!(
            matched,
            vec![("night", false), ("ópera", true), ("near", false), ("église", true)]
        );

        for suggestion in &suggestions {
            form.add_suggestion(suggestion);
        }
        assert_eq!(form.draft().ids("tag_ids"), vec!["t9", "t8"]);
    }

    #[test]
    fn test_cancel_closes_without_saving() {
        let mut form = FormModal::create(&LOCATIONS, tags());
        form.cancel();
        assert!(!form.is_open());
        assert!(form.begin_submit().is_err());
    }
}
