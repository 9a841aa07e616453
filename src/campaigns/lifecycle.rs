//! Campaign state machine.
//!
//! ```text
//! draft --activate--> active --pause--> paused --activate--> active
//!                     active --end--> ended      paused --end--> ended
//! ```

use crate::errors::{ConsoleError, Result};
use crate::models::{Campaign, CampaignStatus};
use crate::promotions::PromotionsClient;
use crate::scope::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignAction {
    /// Start a draft or resume a paused campaign
    Activate,
    Pause,
    End,
}

impl CampaignAction {
    pub fn endpoint(&self) -> &'static str {
        match self {
            CampaignAction::Activate => "activate",
            CampaignAction::Pause => "pause",
            CampaignAction::End => "end",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "activate" | "resume" => Some(CampaignAction::Activate),
            "pause" => Some(CampaignAction::Pause),
            "end" => Some(CampaignAction::End),
            _ => None,
        }
    }
}

/// Status reached by applying `action` to `status`, if the transition is offered.
pub fn next_status(status: CampaignStatus, action: CampaignAction) -> Option<CampaignStatus> {
    use CampaignAction::*;
    use CampaignStatus::*;

    match (status, action) {
        (Draft, Activate) | (Paused, Activate) => Some(Active),
        (Active, Pause) => Some(Paused),
        (Active, End) | (Paused, End) => Some(Ended),
        _ => None,
    }
}

/// Actions to offer for a campaign in `status`.
pub fn available_actions(status: CampaignStatus) -> Vec<CampaignAction> {
    [
        CampaignAction::Activate,
        CampaignAction::Pause,
        CampaignAction::End,
    ]
    .into_iter()
    .filter(|action| next_status(status, *action).is_some())
    .collect()
}

/// Drives campaign transitions through the backend.
#[derive(Clone)]
pub struct CampaignLifecycle {
    client: PromotionsClient,
}

impl CampaignLifecycle {
    pub fn new(client: PromotionsClient) -> Self {
        Self { client }
    }

    /// Apply `action` to `campaign`.
    ///
    /// Ended campaigns and the read-only aggregate scope are refused before
    /// any request is made. The local status changes only after the backend
    /// accepts; on failure it is left as it was.
    pub async fn apply(
        &self,
        campaign: &mut Campaign,
        action: CampaignAction,
        scope: &Scope,
    ) -> Result<CampaignStatus> {
        if campaign.status.is_terminal() {
            return Err(ConsoleError::validation(
                "status",
                format!("Campaign {} has already ended", campaign.id),
            ));
        }
        if scope.is_read_only() {
            return Err(ConsoleError::validation(
                "scope",
                "Campaigns cannot be changed from the all-units view",
            ));
        }
        let next = next_status(campaign.status, action).ok_or_else(|| {
            ConsoleError::validation(
                "status",
                format!(
                    "Cannot {} a {} campaign",
                    action.endpoint(),
                    campaign.status.as_str()
                ),
            )
        })?;

        self.client.campaign_action(campaign.id, action, scope).await?;

        tracing::info!(
            campaign = campaign.id,
            from = campaign.status.as_str(),
            to = next.as_str(),
            "Campaign transitioned"
        );
        campaign.status = next;
        Ok(next)
    }
}
