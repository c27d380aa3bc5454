//! List pages, forms and exports for the tourdesk admin console
//!
//! Each list page is a [`ListController`] driven by a static
//! [`PageSchema`]. Forms are [`FormModal`]s that hand their draft to the
//! controller on submit; table rows and badges come from [`view`].

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod controller;
pub mod debounce;
pub mod export;
pub mod form;
pub mod pages;
pub mod schema;
pub mod view;

pub use controller::{BulkOutcome, ListController, ListSnapshot, ListState};
pub use debounce::Debouncer;
pub use export::{CsvExport, export_csv};
pub use form::{DraftSink, FormModal, KeywordSuggester, TagSuggester, TagSuggestion};
pub use schema::{FieldKind, FieldSpec, FormMode, PageSchema};
pub use view::{Badge, BadgeTone, Row, RowAction, StatCard};
