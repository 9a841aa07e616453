//! Data models for the console core.
//!
//! These models match the backend's JSON contract (snake_case fields).

mod auth;
mod campaign;
mod geo;
mod overview;
mod partner;
mod promo;

pub use auth::*;
pub use campaign::*;
pub use geo::*;
pub use overview::*;
pub use partner::*;
pub use promo::*;

use serde::{Deserialize, Serialize};

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Filters and pagination shared by the promotions list endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub partner_type: Option<PartnerType>,
    pub campaign_id: Option<u64>,
    pub partner_id: Option<u64>,
    pub geo_missing: bool,
}

impl ListQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Blank search strings are not sent.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = Some(search).filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_type(mut self, partner_type: Option<PartnerType>) -> Self {
        self.partner_type = partner_type;
        self
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(status) = &self.status {
            params.push(("status", status.clone()));
        }
        if let Some(partner_type) = self.partner_type {
            params.push(("type", partner_type.as_str().to_string()));
        }
        if let Some(campaign_id) = self.campaign_id {
            params.push(("campaign_id", campaign_id.to_string()));
        }
        if let Some(partner_id) = self.partner_id {
            params.push(("partner_id", partner_id.to_string()));
        }
        if self.geo_missing {
            params.push(("geo_missing", "true".to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_params() {
        let query = ListQuery::page(2)
            .with_search("  ")
            .with_type(Some(PartnerType::MobileVendor));
        assert_eq!(
            query.to_params(),
            vec![
                ("page", "2".to_string()),
                ("type", "MOBILE_VENDOR".to_string())
            ]
        );
    }
}
