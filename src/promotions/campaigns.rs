//! Campaign endpoints.

use reqwest::Method;

use super::PromotionsClient;
use crate::campaigns::{validate_campaign, CampaignAction};
use crate::errors::{ConsoleError, Result};
use crate::models::{Campaign, ListQuery, NewCampaign, Page};
use crate::scope::Scope;

impl PromotionsClient {
    /// GET /promotions/campaigns - List campaigns.
    pub async fn list_campaigns(&self, query: &ListQuery, scope: &Scope) -> Result<Page<Campaign>> {
        self.list("/promotions/campaigns", query, scope).await
    }

    /// GET /promotions/campaigns/:id - Get a single campaign.
    pub async fn get_campaign(&self, id: u64) -> Result<Campaign> {
        if self.gateway.is_demo() {
            return Err(ConsoleError::NotFound(format!("Campaign {} not found", id)));
        }
        self.gateway
            .get(&format!("/promotions/campaigns/{}", id), &[])
            .await
    }

    /// POST /promotions/campaigns - Create a campaign in draft.
    pub async fn create_campaign(&self, campaign: &NewCampaign, scope: &Scope) -> Result<Campaign> {
        validate_campaign(campaign)?;
        let scope = scope.write_query()?;
        self.gateway
            .send(Method::POST, "/promotions/campaigns", &scope, Some(campaign))
            .await
    }

    /// POST /promotions/campaigns/:id/activate|pause|end
    pub async fn campaign_action(&self, id: u64, action: CampaignAction, scope: &Scope) -> Result<()> {
        let scope = scope.write_query()?;
        self.gateway
            .execute(
                Method::POST,
                &format!("/promotions/campaigns/{}/{}", id, action.endpoint()),
                &scope,
                None::<&()>,
            )
            .await
    }
}
