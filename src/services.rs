//! Contracts for the external collaborators: activity search,
//! recommendations, and airport disambiguation.
//!
//! The core does not care about their wire formats — a structured request
//! goes in, a result page or a failure with a message comes out. Failures
//! are caught at the store boundary and recorded as dismissible messages,
//! never propagated to the UI as panics or raw errors.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::activity::{ActivityFilters, ResultPage};
use crate::model::flight::AirportCandidate;

/// What an external call can fail with. The message is user-visible.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("request failed: {0}")]
    Failed(String),
}

/// Structured activity search request: location, date range, filter bundle,
/// pagination cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub city: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub filters: ActivityFilters,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl SearchRequest {
    pub fn for_city(city: impl Into<String>) -> Self {
        SearchRequest {
            city: city.into(),
            country_code: None,
            check_in: None,
            check_out: None,
            filters: ActivityFilters::default(),
            cursor: None,
        }
    }

    /// The same request ignoring pagination, for staleness comparison: a
    /// `load_more` page belongs to the search that issued it.
    pub fn without_cursor(&self) -> SearchRequest {
        SearchRequest {
            cursor: None,
            ..self.clone()
        }
    }
}

/// Paged activity search.
#[async_trait(?Send)]
pub trait ActivitySearchService {
    async fn search(&self, request: &SearchRequest) -> Result<ResultPage, ServiceError>;
}

/// Destination-scoped recommendations.
#[async_trait(?Send)]
pub trait RecommendationService {
    async fn recommendations(
        &self,
        city: &str,
        country_code: Option<&str>,
    ) -> Result<ResultPage, ServiceError>;
}

/// Resolves a free-text city to candidate airport codes.
#[async_trait(?Send)]
pub trait AirportLookupService {
    async fn candidates(&self, city: &str) -> Result<Vec<AirportCandidate>, ServiceError>;
}
