//! Campaign models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UnitId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignType {
    VolumeRebate,
    MysteryShopper,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Ended,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Ended => "ended",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Ended)
    }
}

/// One step of a volume rebate: reaching `threshold` earns `reward_amount`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CampaignTier {
    pub threshold: u64,
    pub reward_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<CampaignTier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<f64>,
    #[serde(default)]
    pub total_redemptions: u64,
    #[serde(default)]
    pub total_spend: f64,
    #[serde(default)]
    pub owner_unit_id: Option<UnitId>,
    #[serde(default)]
    pub owner_unit_name: Option<String>,
}

/// Request body for `POST /promotions/campaigns`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCampaign {
    pub name: String,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<CampaignTier>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<f64>,
}
