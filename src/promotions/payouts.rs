//! Redemption, payout and order endpoints.

use reqwest::Method;

use super::PromotionsClient;
use crate::errors::Result;
use crate::models::{ListQuery, Order, Page, Payout, Redemption};
use crate::scope::Scope;

impl PromotionsClient {
    /// GET /promotions/redemptions - List redemptions.
    pub async fn list_redemptions(
        &self,
        query: &ListQuery,
        scope: &Scope,
    ) -> Result<Page<Redemption>> {
        self.list("/promotions/redemptions", query, scope).await
    }

    /// GET /promotions/payouts - List payouts.
    pub async fn list_payouts(&self, query: &ListQuery, scope: &Scope) -> Result<Page<Payout>> {
        self.list("/promotions/payouts", query, scope).await
    }

    /// POST /promotions/payouts/:id/pay - Pay (or retry) a payout.
    pub async fn pay_payout(&self, id: u64, scope: &Scope) -> Result<()> {
        let scope = scope.write_query()?;
        self.gateway
            .execute(
                Method::POST,
                &format!("/promotions/payouts/{}/pay", id),
                &scope,
                None::<&()>,
            )
            .await
    }

    /// GET /sales/orders?source=PROMOTIONS - Orders placed through promotions.
    pub async fn list_orders(&self, query: &ListQuery, scope: &Scope) -> Result<Page<Order>> {
        if self.gateway.is_demo() {
            return Ok(Page::empty());
        }
        let mut params = vec![("source", "PROMOTIONS".to_string())];
        params.extend(query.to_params());
        params.extend(scope.read_query().params().iter().cloned());
        self.gateway.get("/sales/orders", &params).await
    }
}
