//! HTTP client for communicating with the admin REST backend

use crate::api::{self, AdminApi};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tourdesk_core::config::ApiConfig;
use tourdesk_core::{
    Draft, Error, FilterSet, Operation, Record, RecordId, Resource, Result, StatsPeriod, Tag,
};
use tracing::{debug, warn};

/// API client for making HTTP requests to the admin backend
#[derive(Debug, Clone)]
pub struct HttpAdminApi {
    client: Client,
    base_url: String,
    session: Session,
}

impl HttpAdminApi {
    /// Create a client with the default timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, session: Session) -> Result<Self> {
        Self::from_config(
            &ApiConfig {
                base_url: base_url.into(),
                ..ApiConfig::default()
            },
            session,
        )
    }

    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig, session: Session) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, config.base_url.clone(), session))
    }

    /// Wrap an existing [`reqwest::Client`]
    pub fn with_client(client: Client, base_url: impl Into<String>, session: Session) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            session,
        }
    }

    /// Session whose token is attached to requests
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Delete several records in one request through the bulk endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the resource has no bulk endpoint or the request fails.
    pub async fn delete_many(&self, resource: Resource, ids: &[RecordId]) -> Result<()> {
        api::ensure_supported(resource, Operation::Delete)?;
        if !resource.uses_bulk_delete() {
            return Err(Error::Unsupported {
                resource,
                operation: Operation::Delete,
            });
        }

        let body = api::bulk_delete_body(ids);
        self.send(
            Method::DELETE,
            self.url(resource, None),
            Some(&body),
            &api::fallback_message(resource, Operation::Delete),
        )
        .await?;
        Ok(())
    }

    fn url(&self, resource: Resource, query: Option<String>) -> String {
        let mut url = format!("{}{}", self.base_url, resource.path());
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    fn id_query(id: &str) -> String {
        format!("id={}", urlencoding::encode(id))
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        body: Option<&Value>,
        fallback: &str,
    ) -> Result<Value> {
        debug!(%method, %url, "Sending admin API request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::network(format!("{fallback}: {e}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| Error::network(format!("{fallback}: {e}")))?;

        let parsed = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                Err(_) if !(200..300).contains(&status) => Value::Null,
                Err(e) => {
                    return Err(Error::api(
                        Some(status),
                        format!("{fallback}: invalid response body ({e})"),
                    ));
                }
            }
        };

        if let Err(error) = api::check_envelope(status, &parsed, fallback) {
            warn!(%method, %url, status, error = %error, "Admin API request failed");
            return Err(error);
        }

        Ok(parsed)
    }
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn list(&self, resource: Resource, filters: &FilterSet) -> Result<Vec<Record>> {
        api::ensure_supported(resource, Operation::List)?;
        let url = self.url(resource, Some(filters.to_query_string()));
        let body = self
            .send(
                Method::GET,
                url,
                None,
                &api::fallback_message(resource, Operation::List),
            )
            .await?;
        api::extract_records(body, resource)
    }

    async fn get_by_id(&self, resource: Resource, id: &str) -> Result<Record> {
        api::ensure_supported(resource, Operation::Get)?;
        let url = self.url(resource, Some(Self::id_query(id)));
        let body = self
            .send(
                Method::GET,
                url,
                None,
                &api::fallback_message(resource, Operation::Get),
            )
            .await?;
        api::extract_record(body, resource)
    }

    async fn create(&self, resource: Resource, draft: &Draft) -> Result<Record> {
        api::ensure_supported(resource, Operation::Create)?;
        let url = self.url(resource, None);
        let body = self
            .send(
                Method::POST,
                url,
                Some(&draft.to_value()),
                &api::fallback_message(resource, Operation::Create),
            )
            .await?;
        api::extract_record(body, resource)
    }

    async fn update(&self, resource: Resource, id: &str, draft: &Draft) -> Result<Record> {
        api::ensure_supported(resource, Operation::Update)?;
        let url = self.url(resource, Some(Self::id_query(id)));
        let body = self
            .send(
                Method::PUT,
                url,
                Some(&draft.to_value()),
                &api::fallback_message(resource, Operation::Update),
            )
            .await?;
        api::extract_record(body, resource)
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<()> {
        api::ensure_supported(resource, Operation::Delete)?;
        if resource.uses_bulk_delete() {
            return self.delete_many(resource, &[id.to_string()]).await;
        }

        let url = self.url(resource, Some(Self::id_query(id)));
        self.send(
            Method::DELETE,
            url,
            None,
            &api::fallback_message(resource, Operation::Delete),
        )
        .await?;
        Ok(())
    }

    async fn tags(&self) -> Result<Vec<Tag>> {
        let url = self.url(Resource::Tags, None);
        let body = self
            .send(
                Method::GET,
                url,
                None,
                &api::fallback_message(Resource::Tags, Operation::List),
            )
            .await?;
        api::extract_tags(body)
    }

    async fn stats(&self, period: Option<StatsPeriod>) -> Result<Record> {
        let query = period.map(|period| format!("period={period}"));
        let url = self.url(Resource::Stats, query);
        let body = self
            .send(
                Method::GET,
                url,
                None,
                &api::fallback_message(Resource::Stats, Operation::List),
            )
            .await?;
        api::extract_record(body, Resource::Stats)
    }
}
