//! Redemption code endpoints.

use reqwest::Method;

use super::PromotionsClient;
use crate::errors::{ConsoleError, Result};
use crate::models::{GenerateCodesRequest, GenerateCodesResponse, ListQuery, Page, PromoCode};
use crate::scope::Scope;

/// Largest batch a single generation request may ask for.
pub const MAX_CODES_PER_BATCH: u32 = 10_000;

impl PromotionsClient {
    /// GET /promotions/codes - List codes.
    pub async fn list_codes(&self, query: &ListQuery, scope: &Scope) -> Result<Page<PromoCode>> {
        self.list("/promotions/codes", query, scope).await
    }

    /// POST /promotions/codes/generate - Issue a batch of codes for a campaign.
    pub async fn generate_codes(
        &self,
        request: &GenerateCodesRequest,
        scope: &Scope,
    ) -> Result<GenerateCodesResponse> {
        if request.campaign_id == 0 {
            return Err(ConsoleError::validation("campaign_id", "Select a campaign"));
        }
        if request.quantity == 0 || request.quantity > MAX_CODES_PER_BATCH {
            return Err(ConsoleError::validation(
                "quantity",
                format!("Quantity must be between 1 and {}", MAX_CODES_PER_BATCH),
            ));
        }
        let scope = scope.write_query()?;

        self.gateway
            .send(Method::POST, "/promotions/codes/generate", &scope, Some(request))
            .await
    }
}
