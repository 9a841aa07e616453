//! Three-step campaign creation.
//!
//! Details, then reward rules, then a read-only review. Everything is held
//! in memory until the single create call at the end.

use chrono::NaiveDate;

use crate::errors::{ConsoleError, Result};
use crate::models::{Campaign, CampaignTier, CampaignType, NewCampaign};
use crate::promotions::PromotionsClient;
use crate::scope::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStep {
    Details,
    Rewards,
    Review,
}

/// In-memory campaign being assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignDraft {
    step: DraftStep,
    pub name: String,
    pub campaign_type: CampaignType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tiers: Vec<CampaignTier>,
    pub reward_amount: Option<f64>,
}

impl Default for CampaignDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignDraft {
    pub fn new() -> Self {
        Self {
            step: DraftStep::Details,
            name: String::new(),
            campaign_type: CampaignType::VolumeRebate,
            start_date: None,
            end_date: None,
            tiers: Vec::new(),
            reward_amount: None,
        }
    }

    pub fn step(&self) -> DraftStep {
        self.step
    }

    pub fn set_details(
        &mut self,
        name: impl Into<String>,
        campaign_type: CampaignType,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) {
        self.name = name.into();
        self.campaign_type = campaign_type;
        self.start_date = start_date;
        self.end_date = end_date;
    }

    pub fn add_tier(&mut self, threshold: u64, reward_amount: f64) {
        self.tiers.push(CampaignTier {
            threshold,
            reward_amount,
        });
    }

    /// Remove a tier; the last remaining tier cannot be removed.
    pub fn remove_tier(&mut self, index: usize) -> bool {
        if self.tiers.len() > 1 && index < self.tiers.len() {
            self.tiers.remove(index);
            true
        } else {
            false
        }
    }

    pub fn validate_details(&self) -> Result<()> {
        validate_details(&self.name, self.start_date, self.end_date).map(|_| ())
    }

    pub fn validate_rewards(&self) -> Result<()> {
        match self.campaign_type {
            CampaignType::VolumeRebate => validate_tiers(&self.tiers),
            CampaignType::MysteryShopper => validate_reward(self.reward_amount),
        }
    }

    /// Move to the next step if the current one is complete.
    pub fn advance(&mut self) -> Result<DraftStep> {
        self.step = match self.step {
            DraftStep::Details => {
                self.validate_details()?;
                DraftStep::Rewards
            }
            DraftStep::Rewards => {
                self.validate_rewards()?;
                DraftStep::Review
            }
            DraftStep::Review => DraftStep::Review,
        };
        Ok(self.step)
    }

    pub fn back(&mut self) -> DraftStep {
        self.step = match self.step {
            DraftStep::Details | DraftStep::Rewards => DraftStep::Details,
            DraftStep::Review => DraftStep::Rewards,
        };
        self.step
    }

    /// The record that would be submitted. Only reward fields matching the
    /// campaign type are included.
    pub fn review(&self) -> Result<NewCampaign> {
        let (start_date, end_date) = validate_details(&self.name, self.start_date, self.end_date)?;
        self.validate_rewards()?;

        let (tiers, reward_amount) = match self.campaign_type {
            CampaignType::VolumeRebate => (Some(self.tiers.clone()), None),
            CampaignType::MysteryShopper => (None, self.reward_amount),
        };

        Ok(NewCampaign {
            name: self.name.trim().to_string(),
            campaign_type: self.campaign_type,
            start_date,
            end_date,
            tiers,
            reward_amount,
        })
    }

    /// Create the campaign. Only allowed from the review step.
    pub async fn submit(&self, client: &PromotionsClient, scope: &Scope) -> Result<Campaign> {
        if self.step != DraftStep::Review {
            return Err(ConsoleError::validation(
                "step",
                "Review the campaign before submitting",
            ));
        }
        let campaign = self.review()?;
        let created = client.create_campaign(&campaign, scope).await?;
        tracing::info!(campaign = created.id, "Campaign created");
        Ok(created)
    }
}

/// Full validation of a campaign about to be created.
pub fn validate_campaign(campaign: &NewCampaign) -> Result<()> {
    validate_details(
        &campaign.name,
        Some(campaign.start_date),
        Some(campaign.end_date),
    )?;
    match campaign.campaign_type {
        CampaignType::VolumeRebate => {
            validate_tiers(campaign.tiers.as_deref().unwrap_or_default())
        }
        CampaignType::MysteryShopper => validate_reward(campaign.reward_amount),
    }
}

fn validate_details(
    name: &str,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate)> {
    if name.trim().is_empty() {
        return Err(ConsoleError::validation("name", "Campaign name is required"));
    }
    let start = start_date
        .ok_or_else(|| ConsoleError::validation("start_date", "Start date is required"))?;
    let end =
        end_date.ok_or_else(|| ConsoleError::validation("end_date", "End date is required"))?;
    if end < start {
        return Err(ConsoleError::validation(
            "end_date",
            "End date must be on or after the start date",
        ));
    }
    Ok((start, end))
}

fn validate_tiers(tiers: &[CampaignTier]) -> Result<()> {
    if tiers.is_empty() {
        return Err(ConsoleError::validation("tiers", "Add at least one tier"));
    }
    for (index, tier) in tiers.iter().enumerate() {
        if tier.threshold == 0 {
            return Err(ConsoleError::validation(
                format!("tiers[{}].threshold", index),
                "Threshold must be greater than zero",
            ));
        }
        if !(tier.reward_amount.is_finite() && tier.reward_amount > 0.0) {
            return Err(ConsoleError::validation(
                format!("tiers[{}].reward_amount", index),
                "Reward amount must be greater than zero",
            ));
        }
    }
    Ok(())
}

fn validate_reward(reward_amount: Option<f64>) -> Result<()> {
    match reward_amount {
        Some(amount) if amount.is_finite() && amount > 0.0 => Ok(()),
        _ => Err(ConsoleError::validation(
            "reward_amount",
            "Reward amount must be greater than zero",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn rebate_draft() -> CampaignDraft {
        let mut draft = CampaignDraft::new();
        draft.set_details(
            "Harmattan rebate",
            CampaignType::VolumeRebate,
            date(2026, 11, 1),
            date(2026, 12, 31),
        );
        draft
    }

    #[test]
    fn test_details_required_before_rewards() {
        let mut draft = CampaignDraft::new();
        assert!(draft.advance().is_err());
        assert_eq!(draft.step(), DraftStep::Details);
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut draft = rebate_draft();
        draft.end_date = date(2026, 10, 1);
        let err = draft.advance().unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "end_date"));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut draft = rebate_draft();
        draft.advance().unwrap();
        draft.add_tier(0, 500.0);
        assert!(draft.advance().is_err());
        assert_eq!(draft.step(), DraftStep::Rewards);
    }

    #[test]
    fn test_positive_tiers_accepted() {
        let mut draft = rebate_draft();
        draft.advance().unwrap();
        draft.add_tier(100, 500.0);
        draft.add_tier(200, 1000.0);
        assert_eq!(draft.advance().unwrap(), DraftStep::Review);

        let campaign = draft.review().unwrap();
        assert_eq!(campaign.tiers.as_ref().map(Vec::len), Some(2));
        assert!(campaign.reward_amount.is_none());
    }

    #[test]
    fn test_rebate_needs_a_tier() {
        let mut draft = rebate_draft();
        draft.advance().unwrap();
        assert!(draft.advance().is_err());
    }

    #[test]
    fn test_mystery_shopper_needs_positive_reward() {
        let mut draft = rebate_draft();
        draft.campaign_type = CampaignType::MysteryShopper;
        draft.advance().unwrap();
        draft.reward_amount = Some(0.0);
        assert!(draft.advance().is_err());
        draft.reward_amount = Some(2500.0);
        assert_eq!(draft.advance().unwrap(), DraftStep::Review);

        let campaign = draft.review().unwrap();
        assert!(campaign.tiers.is_none());
        assert_eq!(campaign.reward_amount, Some(2500.0));
    }

    #[test]
    fn test_last_tier_cannot_be_removed() {
        let mut draft = rebate_draft();
        draft.add_tier(100, 500.0);
        assert!(!draft.remove_tier(0));
        draft.add_tier(200, 900.0);
        assert!(draft.remove_tier(0));
        assert_eq!(draft.tiers[0].threshold, 200);
    }

    #[test]
    fn test_back_keeps_values() {
        let mut draft = rebate_draft();
        draft.advance().unwrap();
        assert_eq!(draft.back(), DraftStep::Details);
        assert_eq!(draft.name, "Harmattan rebate");
    }
}
