//! Full-text search against Typesense.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::ServiceError;
use crate::config::SearchSettings;

/// Header carrying the Typesense API key.
pub const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Exact-match filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSearching {
    /// Field name.
    pub name: String,
    /// Required value.
    pub value: String,
}

/// Sort clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBySearching {
    /// Field name.
    pub name: String,
    /// `asc` or `desc`.
    pub value: String,
}

/// Input of the `search_text` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    /// Query text; must not be blank.
    pub text: String,
    /// Filters, combined with AND.
    #[serde(default)]
    pub conditions: Vec<ConditionSearching>,
    /// Sort clauses, in priority order.
    #[serde(default)]
    pub order_bys: Vec<OrderBySearching>,
}

impl Search {
    /// `filter_by` parameter, or `None` without conditions.
    #[must_use]
    pub fn filter_by(&self) -> Option<String> {
        (!self.conditions.is_empty()).then(|| {
            self.conditions
                .iter()
                .map(|c| format!("{}:={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join(" && ")
        })
    }

    /// `sort_by` parameter, or `None` without sort clauses.
    #[must_use]
    pub fn sort_by(&self) -> Option<String> {
        (!self.order_bys.is_empty()).then(|| {
            self.order_bys
                .iter()
                .map(|o| format!("{}:{}", o.name, o.value))
                .collect::<Vec<_>>()
                .join(",")
        })
    }
}

/// Backend of the `search_text` action.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Run a search and return the raw backend document.
    async fn search_text(&self, search: &Search) -> Result<Value, ServiceError>;
}

/// Typesense HTTP client.
#[derive(Debug, Clone)]
pub struct TypesenseSearch {
    client: Client,
    settings: SearchSettings,
}

impl TypesenseSearch {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns the error from building the HTTP client.
    pub fn new(settings: SearchSettings) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/collections/{}/documents/search",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.collection
        )
    }
}

#[async_trait]
impl SearchService for TypesenseSearch {
    async fn search_text(&self, search: &Search) -> Result<Value, ServiceError> {
        let url = self.endpoint();
        let mut query = vec![
            ("q", search.text.clone()),
            ("query_by", self.settings.query_by.clone()),
        ];
        if let Some(filter) = search.filter_by() {
            query.push(("filter_by", filter));
        }
        if let Some(sort) = search.sort_by() {
            query.push(("sort_by", sort));
        }

        debug!(url = %url, query = ?query, "Calling search backend");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.settings.api_key)
            .query(&query)
            .send()
            .await
            .inspect_err(|e| error!(url = %url, error = %e, "Search request failed"))?;

        let status = response.status();
        if !status.is_success() {
            error!(url = %url, status = status.as_u16(), "Search backend returned an error status");
            return Err(ServiceError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
