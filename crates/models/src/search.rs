use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::StoreListing;

/// Canonical, validated search. Rebuilt on every filter change, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchQuery {
    pub location_term: String,
    pub radius_miles: f64,
    pub store_type: Option<String>,
    pub services: BTreeSet<String>,
    pub open_now_only: bool,
    pub page: u32,
    pub limit: u32,
}

impl SearchQuery {
    /// Same filters, different page. The only way page navigation derives a query.
    pub fn with_page(&self, page: u32) -> Self {
        Self { page: page.max(1), ..self.clone() }
    }

    /// Digit-only terms are postal codes; anything else is a free-form address.
    pub fn is_zip_code(&self) -> bool {
        !self.location_term.is_empty() && self.location_term.chars().all(|c| c.is_ascii_digit())
    }

    pub fn to_request(&self) -> SearchRequest {
        let (zip_code, address) = if self.is_zip_code() {
            (Some(self.location_term.clone()), None)
        } else {
            (None, Some(self.location_term.clone()))
        };
        SearchRequest {
            zip_code,
            address,
            page: self.page,
            limit: self.limit,
            filters: SearchFilters {
                radius_miles: self.radius_miles,
                store_type: self.store_type.clone(),
                services: self.services.iter().cloned().collect(),
                open_now: self.open_now_only,
            },
        }
    }
}

/// Body of `POST /stores/search`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub filters: SearchFilters,
}

impl SearchRequest {
    /// Unanchored listing used by the admin console to page through every store.
    pub fn browse(page: u32, limit: u32, radius_miles: f64) -> Self {
        Self {
            zip_code: None,
            address: None,
            page: page.max(1),
            limit: limit.max(1),
            filters: SearchFilters { radius_miles, store_type: None, services: Vec::new(), open_now: false },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchFilters {
    pub radius_miles: f64,
    pub store_type: Option<String>,
    pub services: Vec<String>,
    pub open_now: bool,
}

/// Body returned by `POST /stores/search`.
///
/// The backend reports internal failures as a 200 with `error` set and no results.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<StoreListing>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpenStatus {
    Open,
    Closed,
}

impl OpenStatus {
    pub fn is_open(self) -> bool {
        matches!(self, OpenStatus::Open)
    }
}

impl fmt::Display for OpenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenStatus::Open => f.write_str("OPEN"),
            OpenStatus::Closed => f.write_str("CLOSED"),
        }
    }
}

/// A listing decorated with its open/closed state at evaluation time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub store: StoreListing,
    pub open_status: OpenStatus,
}
