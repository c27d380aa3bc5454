//! Common fixtures for admin workflow tests

#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tourdesk_admin::{ListController, PageSchema};
use tourdesk_client::MockAdminApi;
use tourdesk_core::{Resource, Tag};

/// Debounce used by controllers built here
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(500);

/// Seed locations
pub fn location_fixtures() -> Vec<Value> {
    vec![
        json!({"id": "l1", "name": "Cafe Lisboa", "city_id": "c1", "city_name": "Lisbon", "category": "cafe", "verified": true, "tag_ids": ["t1"]}),
        json!({"id": "l2", "name": "Museu do Azulejo", "city_id": "c1", "city_name": "Lisbon", "category": "museum", "verified": false, "tag_ids": []}),
        json!({"id": "l3", "name": "Parque Verde", "city_id": "c2", "city_name": "Porto", "category": "park", "verified": true, "tag_ids": ["t2"]}),
    ]
}

/// Seed tours, one of them missing a trip format
pub fn tour_fixtures() -> Vec<Value> {
    vec![
        json!({"id": "t1", "title": "Old town walk", "status": "pending", "trip_format": "walking", "is_public": true}),
        json!({"id": "t2", "title": "Mystery trip", "status": "pending", "trip_format": null}),
        json!({"id": "t3", "title": "River cruise", "status": "approved", "trip_format": "mixed"}),
    ]
}

/// Seed users
pub fn user_fixtures() -> Vec<Value> {
    vec![
        json!({"id": "u1", "name": "Ana Silva", "email": "ana@example.com", "role": "admin", "is_active": true}),
        json!({"id": "u2", "name": "Bruno Costa", "email": "bruno@example.com", "role": "user", "is_active": true}),
    ]
}

/// Seed tags
pub fn tag_fixtures() -> Vec<Tag> {
    vec![Tag::new("t1", "Coffee"), Tag::new("t2", "Nature")]
}

/// Mock backend with every fixture loaded
pub fn seeded_backend() -> MockAdminApi {
    MockAdminApi::new()
        .with_json(Resource::Locations, location_fixtures())
        .with_json(Resource::Tours, tour_fixtures())
        .with_json(Resource::Users, user_fixtures())
        .with_tags(tag_fixtures())
}

/// Controller over a clone of `api`
pub fn controller(api: &MockAdminApi, schema: &'static PageSchema) -> ListController {
    ListController::with_debounce(Arc::new(api.clone()), schema, TEST_DEBOUNCE)
}
