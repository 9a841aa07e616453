//! Promotions overview KPIs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RankedPartner {
    pub id: u64,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Redemption,
    Order,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityItem {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub time: String,
}

/// Response body of `GET /promotions/overview`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Overview {
    pub active_campaigns: u64,
    pub today_redemptions_count: u64,
    pub today_redemptions_amount: f64,
    pub pending_payouts_count: u64,
    pub pending_payouts_amount: f64,
    pub orders_today: u64,
    pub top_fixed_retail: Vec<RankedPartner>,
    pub top_mobile_vendors: Vec<RankedPartner>,
    pub recent_activity: Vec<ActivityItem>,
}
