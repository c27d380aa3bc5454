//! Page schemas for the locations, tours and users lists

use crate::schema::{
    BadgeRule, ColumnSpec, FieldDefault, FieldKind, FieldSpec, Moderation, PageSchema,
};
use tourdesk_core::Resource;

/// Allowed location categories
pub const LOCATION_CATEGORIES: &[&str] = &[
    "cafe",
    "restaurant",
    "bar",
    "museum",
    "park",
    "hotel",
    "shop",
    "attraction",
    "other",
];

/// Allowed tour trip formats
pub const TRIP_FORMATS: &[&str] = &["walking", "cycling", "driving", "public_transport", "mixed"];

/// Tour moderation states
pub const TOUR_STATUSES: &[&str] = &["pending", "approved", "rejected"];

/// Account roles
pub const USER_ROLES: &[&str] = &["user", "admin", "moderator"];

/// Locations page
pub const LOCATIONS: PageSchema = PageSchema {
    resource: Resource::Locations,
    title: "Locations",
    fields: &[
        FieldSpec::new("name", "Name", FieldKind::Text).required(),
        FieldSpec::new("city_id", "City", FieldKind::Reference).required(),
        FieldSpec::new("category", "Category", FieldKind::Choice(LOCATION_CATEGORIES)).required(),
        FieldSpec::new("address", "Address", FieldKind::Text),
        FieldSpec::new("description", "Description", FieldKind::LongText),
        FieldSpec::new("recommendations", "Recommendations", FieldKind::LongText),
        FieldSpec::new("latitude", "Latitude", FieldKind::Number),
        FieldSpec::new("longitude", "Longitude", FieldKind::Number),
        FieldSpec::new("website", "Website", FieldKind::Text),
        FieldSpec::new("phone", "Phone", FieldKind::Text),
        FieldSpec::new("image_url", "Image URL", FieldKind::Text),
        FieldSpec::new("price_level", "Price level", FieldKind::Number),
        FieldSpec::new("tag_ids", "Tags", FieldKind::TagIds),
        FieldSpec::new("verified", "Verified", FieldKind::Bool)
            .default_to(FieldDefault::Bool(true)),
    ],
    columns: &[
        ColumnSpec {
            field: "name",
            label: "Name",
        },
        ColumnSpec {
            field: "city_name",
            label: "City",
        },
        ColumnSpec {
            field: "category",
            label: "Category",
        },
        ColumnSpec {
            field: "tag_ids",
            label: "Tags",
        },
        ColumnSpec {
            field: "verified",
            label: "Verified",
        },
    ],
    badges: &[BadgeRule::Flag {
        field: "verified",
        on: "verified",
        off: "unverified",
    }],
    local_search: &[],
    moderation: None,
};

/// Tours page
pub const TOURS: PageSchema = PageSchema {
    resource: Resource::Tours,
    title: "Tours",
    fields: &[
        FieldSpec::new("title", "Title", FieldKind::Text).required(),
        FieldSpec::new("description", "Description", FieldKind::LongText),
        FieldSpec::new("city_id", "City", FieldKind::Reference),
        FieldSpec::new("trip_format", "Trip format", FieldKind::Choice(TRIP_FORMATS)),
        FieldSpec::new("duration_hours", "Duration (hours)", FieldKind::Number),
        FieldSpec::new("price", "Price", FieldKind::Number),
        FieldSpec::new("status", "Status", FieldKind::Choice(TOUR_STATUSES))
            .default_to(FieldDefault::Text("pending")),
        FieldSpec::new("tag_ids", "Tags", FieldKind::TagIds),
        FieldSpec::new("is_public", "Public", FieldKind::Bool)
            .default_to(FieldDefault::Bool(false)),
    ],
    columns: &[
        ColumnSpec {
            field: "title",
            label: "Title",
        },
        ColumnSpec {
            field: "user_name",
            label: "Author",
        },
        ColumnSpec {
            field: "trip_format",
            label: "Format",
        },
        ColumnSpec {
            field: "status",
            label: "Status",
        },
        ColumnSpec {
            field: "is_public",
            label: "Public",
        },
    ],
    badges: &[BadgeRule::Value { field: "status" }],
    local_search: &[],
    moderation: Some(Moderation {
        field: "status",
        pending: "pending",
        approved: "approved",
        rejected: "rejected",
        approve_requires: "trip_format",
        approve_blocked_message: "Cannot approve a tour without a trip format",
    }),
};

/// Users page
pub const USERS: PageSchema = PageSchema {
    resource: Resource::Users,
    title: "Users",
    fields: &[
        FieldSpec::new("email", "Email", FieldKind::Email).required(),
        FieldSpec::new("name", "Name", FieldKind::Text).required(),
        FieldSpec::new("password", "Password", FieldKind::Text).required_on_create(),
        FieldSpec::new("role", "Role", FieldKind::Choice(USER_ROLES))
            .default_to(FieldDefault::Text("user")),
        FieldSpec::new("is_active", "Active", FieldKind::Bool)
            .default_to(FieldDefault::Bool(true)),
    ],
    columns: &[
        ColumnSpec {
            field: "name",
            label: "Name",
        },
        ColumnSpec {
            field: "email",
            label: "Email",
        },
        ColumnSpec {
            field: "role",
            label: "Role",
        },
        ColumnSpec {
            field: "is_active",
            label: "Active",
        },
    ],
    badges: &[BadgeRule::Value { field: "role" }],
    local_search: &["name", "email"],
    moderation: None,
};

/// Schema for a list page, if `resource` has one
#[must_use]
pub const fn for_resource(resource: Resource) -> Option<&'static PageSchema> {
    match resource {
        Resource::Locations => Some(&LOCATIONS),
        Resource::Tours => Some(&TOURS),
        Resource::Users => Some(&USERS),
        Resource::Tags | Resource::Stats => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Resource::Locations, true)]
    #[case(Resource::Tours, true)]
    #[case(Resource::Users, true)]
    #[case(Resource::Tags, false)]
    #[case(Resource::Stats, false)]
    fn test_for_resource(#[case] resource: Resource, #[case] has_page: bool) {
        let schema = for_resource(resource);
        assert_eq!(schema.is_some(), has_page);
        if let Some(schema) = schema {
            assert_eq!(schema.resource, resource);
        }
    }

    #[test]
    fn test_field_names_are_unique() {
        for schema in [&LOCATIONS, &TOURS, &USERS] {
            let mut names: Vec<_> = schema.fields.iter().map(|field| field.name).collect();
            names.sort_unstable();
            let total = names.len();
            names.dedup();
            assert_eq!(names.len(), total, "{} has duplicate fields", schema.title);
        }
    }

    #[test]
    fn test_only_tours_are_moderated() {
        assert!(LOCATIONS.moderation.is_none());
        assert!(USERS.moderation.is_none());
        let moderation = TOURS.moderation.unwrap_or_else(|| unreachable!());
        assert_eq!(moderation.approve_requires, "trip_format");
        assert!(TOURS.field(moderation.approve_requires).is_some());
    }
}
