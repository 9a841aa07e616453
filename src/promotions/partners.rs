//! Partner endpoints.

use reqwest::Method;

use super::PromotionsClient;
use crate::errors::{ConsoleError, Result};
use crate::models::{
    Coordinates, ListQuery, MapPartner, MapQuery, NewPartner, Page, Partner, PartnerStatus,
};
use crate::permissions::PARTNERS_MANAGE;
use crate::scope::{Scope, ScopeQuery};
use crate::session::Session;

impl PromotionsClient {
    /// GET /promotions/partners - List partners.
    pub async fn list_partners(&self, query: &ListQuery, scope: &Scope) -> Result<Page<Partner>> {
        self.list("/promotions/partners", query, scope).await
    }

    /// GET /promotions/partners?geo_missing=true - Partners without coordinates.
    pub async fn list_partners_missing_location(
        &self,
        query: &ListQuery,
        scope: &Scope,
    ) -> Result<Page<Partner>> {
        let query = ListQuery {
            geo_missing: true,
            ..query.clone()
        };
        self.list("/promotions/partners", &query, scope).await
    }

    /// GET /promotions/partners/:id - Get a single partner.
    pub async fn get_partner(&self, id: u64) -> Result<Partner> {
        if self.gateway.is_demo() {
            return Err(ConsoleError::NotFound(format!("Partner {} not found", id)));
        }
        self.gateway
            .get(&format!("/promotions/partners/{}", id), &[])
            .await
    }

    /// POST /promotions/partners - Create a partner.
    pub async fn create_partner(&self, partner: &NewPartner, scope: &Scope) -> Result<Partner> {
        let partner = partner.validated()?;
        let scope = scope.write_query()?;
        self.gateway
            .send(Method::POST, "/promotions/partners", &scope, Some(&partner))
            .await
    }

    /// PUT /promotions/partners/:id - Replace a partner's details.
    pub async fn update_partner(
        &self,
        id: u64,
        partner: &NewPartner,
        scope: &Scope,
    ) -> Result<Partner> {
        let partner = partner.validated()?;
        let scope = scope.write_query()?;
        self.gateway
            .send(
                Method::PUT,
                &format!("/promotions/partners/{}", id),
                &scope,
                Some(&partner),
            )
            .await
    }

    /// POST /promotions/partners/:id/suspend|activate
    ///
    /// The local record changes only once the backend has accepted.
    pub async fn set_partner_status(
        &self,
        partner: &mut Partner,
        status: PartnerStatus,
        session: &Session,
        scope: &Scope,
    ) -> Result<()> {
        if !session.has_permission(PARTNERS_MANAGE) {
            return Err(ConsoleError::PermissionDenied(
                "Managing partners is not permitted for this unit".to_string(),
            ));
        }
        let scope = scope.write_query()?;
        let action = match status {
            PartnerStatus::Active => "activate",
            PartnerStatus::Suspended => "suspend",
        };

        self.gateway
            .execute(
                Method::POST,
                &format!("/promotions/partners/{}/{}", partner.id, action),
                &scope,
                None::<&()>,
            )
            .await?;

        partner.status = status;
        Ok(())
    }

    /// PUT /promotions/partners/:id/geolocation - Persist captured coordinates.
    ///
    /// Out-of-range coordinates are rejected before any request is made.
    /// Repeated calls overwrite.
    pub async fn update_geolocation(&self, partner_id: u64, coordinates: Coordinates) -> Result<()> {
        coordinates.validate()?;

        let result = self
            .gateway
            .execute(
                Method::PUT,
                &format!("/promotions/partners/{}/geolocation", partner_id),
                &ScopeQuery::unscoped(),
                Some(&coordinates),
            )
            .await;

        result.map_err(|e| match e {
            ConsoleError::AuthorizationExpired
            | ConsoleError::Offline(_)
            | ConsoleError::Validation { .. } => e,
            other => ConsoleError::GeoUpdate(format!(
                "Failed to save location for partner {}: {}",
                partner_id,
                other.message()
            )),
        })
    }

    /// GET /promotions/map/partners - Partners inside a viewport.
    pub async fn map_partners(&self, query: &MapQuery) -> Result<Vec<MapPartner>> {
        if self.gateway.is_demo() {
            return Ok(Vec::new());
        }
        self.gateway
            .get("/promotions/map/partners", &query.to_params())
            .await
    }
}
