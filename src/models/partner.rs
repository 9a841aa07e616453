//! Partner model and the creation form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;
use crate::errors::{ConsoleError, Result};

/// Kind of retail partner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerType {
    FixedRetail,
    MobileVendor,
}

impl PartnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerType::FixedRetail => "FIXED_RETAIL",
            PartnerType::MobileVendor => "MOBILE_VENDOR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FIXED_RETAIL" => Some(PartnerType::FixedRetail),
            "MOBILE_VENDOR" => Some(PartnerType::MobileVendor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    Active,
    Suspended,
}

impl PartnerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerStatus::Active => "active",
            PartnerStatus::Suspended => "suspended",
        }
    }
}

/// A promotions partner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    pub id: u64,
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub partner_type: PartnerType,
    /// Free-text location description
    pub location: String,
    pub status: PartnerStatus,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub geolocation_captured_at: Option<DateTime<Utc>>,
}

impl Partner {
    pub fn has_location(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Request body for `POST /promotions/partners`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPartner {
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub partner_type: PartnerType,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl NewPartner {
    /// Check the form and return a copy with trimmed text fields.
    pub fn validated(&self) -> Result<NewPartner> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConsoleError::validation("name", "Name is required"));
        }
        if name.chars().count() > 100 {
            return Err(ConsoleError::validation(
                "name",
                "Name must be at most 100 characters",
            ));
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(ConsoleError::validation("phone", "Phone number is required"));
        }
        if phone.chars().count() > 20 {
            return Err(ConsoleError::validation("phone", "Phone number is too long"));
        }
        if !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '(' | ')' | '-'))
        {
            return Err(ConsoleError::validation("phone", "Enter a valid phone number"));
        }

        let location = self.location.trim();
        if location.is_empty() {
            return Err(ConsoleError::validation("location", "Location is required"));
        }
        if location.chars().count() > 200 {
            return Err(ConsoleError::validation(
                "location",
                "Location must be at most 200 characters",
            ));
        }

        if let Some(coordinates) = &self.coordinates {
            coordinates.validate()?;
        }

        Ok(NewPartner {
            name: name.to_string(),
            phone: phone.to_string(),
            partner_type: self.partner_type,
            location: location.to_string(),
            coordinates: self.coordinates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewPartner {
        NewPartner {
            name: "  Mama Put Chiller ".to_string(),
            phone: "+234 (801) 555-0101".to_string(),
            partner_type: PartnerType::FixedRetail,
            location: "Yaba market".to_string(),
            coordinates: None,
        }
    }

    #[test]
    fn test_valid_form_is_trimmed() {
        let partner = form().validated().unwrap();
        assert_eq!(partner.name, "Mama Put Chiller");
    }

    #[test]
    fn test_phone_with_letters_rejected() {
        let mut partner = form();
        partner.phone = "0801-CALL-ME".to_string();
        let err = partner.validated().unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "phone"));
    }

    #[test]
    fn test_name_and_location_length_limits_are_inclusive() {
        let mut partner = form();
        partner.name = "n".repeat(100);
        partner.location = "l".repeat(200);
        assert!(partner.validated().is_ok());

        partner.name = "n".repeat(101);
        let err = partner.validated().unwrap_err();
        assert_eq!(
            err,
            ConsoleError::validation("name", "Name must be at most 100 characters")
        );

        partner.name = "n".repeat(100);
        partner.location = "l".repeat(201);
        let err = partner.validated().unwrap_err();
        assert_eq!(
            err,
            ConsoleError::validation("location", "Location must be at most 200 characters")
        );
    }

    #[test]
    fn test_blank_location_rejected() {
        let mut partner = form();
        partner.location = "   ".to_string();
        assert!(partner.validated().is_err());
    }

    #[test]
    fn test_captured_coordinates_are_range_checked() {
        let mut partner = form();
        partner.coordinates = Some(Coordinates::new(6.5, 200.0));
        assert!(partner.validated().is_err());
    }

    #[test]
    fn test_type_serializes_as_wire_name() {
        let json = serde_json::to_value(form()).unwrap();
        assert_eq!(json["type"], "FIXED_RETAIL");
        assert!(json.get("coordinates").is_none());
    }
}
