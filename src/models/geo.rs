//! Coordinates and map query models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PartnerStatus, PartnerType};
use crate::errors::{ConsoleError, Result};

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude must lie in [-90, 90] and longitude in [-180, 180].
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(ConsoleError::validation(
                "lat",
                format!("Latitude {} is outside [-90, 90]", self.lat),
            ));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(ConsoleError::validation(
                "lng",
                format!("Longitude {} is outside [-180, 180]", self.lng),
            ));
        }
        Ok(())
    }
}

/// Visible map area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl BoundingBox {
    pub fn new(south_west: Coordinates, north_east: Coordinates) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Wire form: `south,west,north,east`.
    pub fn to_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.south_west.lat, self.south_west.lng, self.north_east.lat, self.north_east.lng
        )
    }
}

/// Query parameters of `GET /promotions/map/partners`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapQuery {
    pub bbox: BoundingBox,
    pub zoom: u8,
    pub partner_type: Option<PartnerType>,
    pub status: Option<PartnerStatus>,
    pub search: Option<String>,
}

impl MapQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("bbox", self.bbox.to_param()), ("zoom", self.zoom.to_string())];
        if let Some(partner_type) = self.partner_type {
            params.push(("type", partner_type.as_str().to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.clone()));
        }
        params
    }
}

/// A partner as plotted on the map, with its activity aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapPartner {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub partner_type: PartnerType,
    pub status: PartnerStatus,
    pub phone: String,
    pub location: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub redemptions_count: u64,
    #[serde(default)]
    pub redemptions_amount: f64,
    #[serde(default)]
    pub orders_count: u64,
    #[serde(default)]
    pub orders_amount: f64,
    #[serde(default)]
    pub pending_payouts_count: u64,
    #[serde(default)]
    pub pending_payouts_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds_are_inclusive() {
        assert!(Coordinates::new(90.0, 180.0).validate().is_ok());
        assert!(Coordinates::new(-90.0, -180.0).validate().is_ok());
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let err = Coordinates::new(95.0, 0.0).validate().unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "lat"));
    }

    #[test]
    fn test_out_of_range_longitude_rejected() {
        let err = Coordinates::new(0.0, -180.5).validate().unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "lng"));
    }

    #[test]
    fn test_nan_rejected() {
        assert!(Coordinates::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_map_query_params_skip_blank_search() {
        let query = MapQuery {
            bbox: BoundingBox::new(Coordinates::new(6.4, 3.2), Coordinates::new(6.7, 3.5)),
            zoom: 11,
            partner_type: Some(PartnerType::FixedRetail),
            status: None,
            search: Some("  ".to_string()),
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("bbox", "6.4,3.2,6.7,3.5".to_string()),
                ("zoom", "11".to_string()),
                ("type", "FIXED_RETAIL".to_string()),
            ]
        );
    }
}
