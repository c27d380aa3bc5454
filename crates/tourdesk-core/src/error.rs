//! Error types for the tourdesk admin console

use crate::resource::{Operation, Resource};
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tourdesk admin console
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure: the request never produced a usable response
    #[error("Network error: {message}")]
    Network {
        /// Error message
        message: String,
    },

    /// The backend answered with a non-2xx status or `success: false`
    #[error("{message}")]
    Api {
        /// HTTP status, when one was received
        status: Option<u16>,
        /// Backend message, or a generic fallback
        message: String,
    },

    /// Client-side validation failed before any request was made
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// A business rule refused the action
    #[error("{message}")]
    ActionBlocked {
        /// Blocking message shown to the user
        message: String,
    },

    /// The backend offers no endpoint for this operation
    #[error("{operation} is not supported for {resource}")]
    Unsupported {
        /// Resource the operation was attempted on
        resource: Resource,
        /// Attempted operation
        operation: Operation,
    },

    /// The same action is already in flight
    #[error("{action} is already in progress")]
    Busy {
        /// Action that is in flight
        action: String,
    },

    /// Not found error
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Nothing to export
    #[error("No {resource} data to export")]
    NoData {
        /// Resource whose list was empty
        resource: Resource,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a new network error
    #[must_use]
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    #[must_use]
    pub fn api<S: Into<String>>(status: Option<u16>, message: S) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a new validation error
    #[must_use]
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new blocked-action error
    #[must_use]
    pub fn blocked<S: Into<String>>(message: S) -> Self {
        Self::ActionBlocked {
            message: message.into(),
        }
    }

    /// Create a new busy error
    #[must_use]
    pub fn busy<S: Into<String>>(action: S) -> Self {
        Self::Busy {
            action: action.into(),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the failure happened client-side, before any request
    #[must_use]
    pub const fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::ActionBlocked { .. }
                | Self::Unsupported { .. }
                | Self::Busy { .. }
                | Self::NoData { .. }
        )
    }

    /// Text for an inline banner
    ///
    /// Validation errors show only their message, since the field is
    /// already highlighted next to the input.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Network { .. } => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}
