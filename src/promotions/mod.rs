//! Promotions API client.
//!
//! Wraps the backend's promotions endpoints on top of the [`Gateway`].
//! Reads take a [`Scope`] and never fail on scope grounds; writes derive
//! their parameters from [`Scope::write_query`] before anything is sent.
//! Without a backend every read returns an empty result.

mod campaigns;
mod codes;
mod partners;
mod payouts;

pub use codes::MAX_CODES_PER_BATCH;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::errors::Result;
use crate::gateway::Gateway;
use crate::models::{ListQuery, Overview, Page};
use crate::scope::Scope;

/// Client for the promotions module.
#[derive(Clone)]
pub struct PromotionsClient {
    gateway: Arc<Gateway>,
}

impl PromotionsClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// GET /promotions/overview - KPIs for the scope.
    pub async fn overview(&self, scope: &Scope) -> Result<Overview> {
        if self.gateway.is_demo() {
            return Ok(Overview::default());
        }
        self.gateway
            .get("/promotions/overview", scope.read_query().params())
            .await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &ListQuery,
        scope: &Scope,
    ) -> Result<Page<T>> {
        if self.gateway.is_demo() {
            return Ok(Page::empty());
        }
        let mut params = query.to_params();
        params.extend(scope.read_query().params().iter().cloned());
        self.gateway.get(path, &params).await
    }
}
