//! Geolocation capture.
//!
//! Three ways to obtain a partner's coordinates, all ending in the same
//! persistence call: a device position fix, a pick on a map, and bulk
//! remediation through the queue of partners without a location. The map
//! view that plots located partners lives here too.

mod device;
mod map_view;
mod picker;
mod queue;

pub use device::*;
pub use map_view::*;
pub use picker::*;
pub use queue::*;

use std::time::Duration;

use crate::errors::{ConsoleError, Result};
use crate::models::Coordinates;
use crate::promotions::PromotionsClient;

/// Acquires coordinates and persists them for a partner.
#[derive(Clone)]
pub struct GeoCapture {
    client: PromotionsClient,
    position_timeout: Duration,
}

impl GeoCapture {
    pub fn new(client: PromotionsClient, position_timeout: Duration) -> Self {
        Self {
            client,
            position_timeout,
        }
    }

    pub fn client(&self) -> &PromotionsClient {
        &self.client
    }

    /// Validate and persist `coordinates` for `partner_id`.
    pub async fn save(&self, partner_id: u64, coordinates: Coordinates) -> Result<()> {
        self.client
            .update_geolocation(partner_id, coordinates)
            .await?;
        tracing::info!(partner = partner_id, "Location saved");
        Ok(())
    }

    /// Take a device fix and persist it immediately.
    ///
    /// Denial, unavailability or timeout leaves the partner untouched.
    pub async fn capture_from_device(
        &self,
        partner_id: u64,
        provider: &dyn PositionProvider,
    ) -> Result<Coordinates> {
        let coordinates = acquire_position(provider, self.position_timeout).await?;
        self.save(partner_id, coordinates).await?;
        Ok(coordinates)
    }

    /// Persist the picker's pending marker and close the picker.
    ///
    /// On failure the picker stays open with its marker so the user can
    /// retry or cancel.
    pub async fn confirm_pick(&self, partner_id: u64, picker: &mut MapPicker) -> Result<Coordinates> {
        let coordinates = picker.pending().ok_or_else(|| {
            ConsoleError::validation("marker", "Pick a location on the map first")
        })?;
        self.save(partner_id, coordinates).await?;
        picker.close();
        Ok(coordinates)
    }
}
