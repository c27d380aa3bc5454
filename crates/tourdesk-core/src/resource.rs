//! Backend resources and the operations each one exposes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A backend resource served under `/api/admin-<name>`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Points of interest (cafes, museums, ...)
    Locations,
    /// User-submitted tours awaiting moderation
    Tours,
    /// Platform accounts
    Users,
    /// Reference tags shared by locations and tours
    Tags,
    /// Dashboard statistics
    Stats,
}

/// A CRUD operation on a resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `GET` with filters
    List,
    /// `GET ?id=`
    Get,
    /// `POST`
    Create,
    /// `PUT ?id=`
    Update,
    /// `DELETE`
    Delete,
}

impl Resource {
    /// Every resource, in menu order
    pub const ALL: [Self; 5] = [
        Self::Locations,
        Self::Tours,
        Self::Users,
        Self::Tags,
        Self::Stats,
    ];

    /// Plural name used in paths, payload keys and export file names
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locations => "locations",
            Self::Tours => "tours",
            Self::Users => "users",
            Self::Tags => "tags",
            Self::Stats => "stats",
        }
    }

    /// Singular payload key for single-record responses
    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Locations => "location",
            Self::Tours => "tour",
            Self::Users => "user",
            Self::Tags => "tag",
            Self::Stats => "stats",
        }
    }

    /// Endpoint path relative to the API base URL
    #[must_use]
    pub fn path(self) -> String {
        format!("/api/admin-{}", self.as_str())
    }

    /// Whether the backend offers `operation` for this resource
    #[must_use]
    pub const fn supports(self, operation: Operation) -> bool {
        match self {
            Self::Locations => true,
            Self::Tours => !matches!(operation, Operation::Create),
            Self::Users => !matches!(operation, Operation::Get),
            Self::Tags | Self::Stats => matches!(operation, Operation::List),
        }
    }

    /// Whether deletions go through the bulk `{"ids": [...]}` endpoint
    #[must_use]
    pub const fn uses_bulk_delete(self) -> bool {
        matches!(self, Self::Tours)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|resource| resource.as_str() == wanted || resource.singular() == wanted)
            .ok_or_else(|| crate::Error::NotFound {
                resource: format!("resource '{s}'"),
            })
    }
}

impl Operation {
    /// Lowercase verb used in messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting window for dashboard statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    /// Last seven days
    Week,
    /// Last thirty days
    Month,
    /// Last twelve months
    Year,
}

impl StatsPeriod {
    /// Query parameter value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatsPeriod {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(crate::Error::validation(
                "period",
                format!("Unknown period '{other}', expected week, month or year"),
            )),
        }
    }
}
