//! Redemption codes, redemptions, payouts and orders.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{PartnerType, UnitId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Active,
    Redeemed,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromoCode {
    pub id: u64,
    pub code: String,
    pub campaign_id: u64,
    #[serde(default)]
    pub campaign_name: Option<String>,
    #[serde(default)]
    pub issued_to: Option<String>,
    pub status: CodeStatus,
    pub expires_at: NaiveDate,
    #[serde(default)]
    pub redeemed_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /promotions/codes/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateCodesRequest {
    pub campaign_id: u64,
    pub quantity: u32,
    pub expires_at: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateCodesResponse {
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Paid,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Redemption {
    pub id: u64,
    pub date: DateTime<Utc>,
    pub partner_id: u64,
    pub partner_name: String,
    pub partner_type: PartnerType,
    pub campaign_id: u64,
    pub campaign_name: String,
    pub amount: f64,
    pub payout_status: PayoutStatus,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payout {
    pub id: u64,
    pub partner_id: u64,
    pub partner_name: String,
    pub phone: String,
    pub amount: f64,
    pub status: PayoutStatus,
    /// Reference assigned by the payment provider once the transfer is made
    #[serde(default)]
    pub provider_reference: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Payout {
    /// Pending and failed payouts can be (re)paid.
    pub fn is_payable(&self) -> bool {
        matches!(self.status, PayoutStatus::Pending | PayoutStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

/// A sales order that originated from the promotions channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: u64,
    pub order_no: String,
    pub partner_id: u64,
    pub partner_name: String,
    pub date: DateTime<Utc>,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub owner_unit_id: Option<UnitId>,
    #[serde(default)]
    pub owner_unit_name: Option<String>,
}
