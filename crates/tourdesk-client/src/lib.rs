//! REST client for the tourdesk admin backend
//!
//! [`AdminApi`] is the seam between list pages and the backend. The
//! reqwest-backed [`HttpAdminApi`] talks to the real service and
//! [`MockAdminApi`] keeps everything in memory for tests.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api;
pub mod http;
pub mod mock;
pub mod session;

pub use api::AdminApi;
pub use http::HttpAdminApi;
pub use mock::{MockAdminApi, MockCall};
pub use session::Session;
