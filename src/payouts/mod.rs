//! Partner payouts desk.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::errors::{ConsoleError, Result};
use crate::models::{ListQuery, Page, Payout, PayoutStatus};
use crate::promotions::PromotionsClient;
use crate::scope::Scope;

/// Pending and paid payouts for one scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayoutBoard {
    pub pending: Page<Payout>,
    pub paid: Page<Payout>,
}

/// Lists payouts and pays them, at most one request per payout at a time.
#[derive(Clone)]
pub struct PayoutDesk {
    client: PromotionsClient,
    in_flight: Arc<Mutex<HashSet<u64>>>,
}

/// Releases the in-flight slot of a payout when the request finishes.
struct InFlight {
    set: Arc<Mutex<HashSet<u64>>>,
    id: u64,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

impl PayoutDesk {
    pub fn new(client: PromotionsClient) -> Self {
        Self {
            client,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn load(&self, page: u32, scope: &Scope) -> Result<PayoutBoard> {
        let pending = ListQuery::page(page).with_status(PayoutStatus::Pending.as_str());
        let paid = ListQuery::page(page).with_status(PayoutStatus::Paid.as_str());

        let (pending, paid) = tokio::try_join!(
            self.client.list_payouts(&pending, scope),
            self.client.list_payouts(&paid, scope),
        )?;
        Ok(PayoutBoard { pending, paid })
    }

    pub fn is_paying(&self, payout_id: u64) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&payout_id)
    }

    /// Pay a pending or failed payout. The record becomes `Paid` only once
    /// the backend accepts the request.
    pub async fn pay(&self, payout: &mut Payout, scope: &Scope) -> Result<()> {
        if !payout.is_payable() {
            return Err(ConsoleError::validation(
                "status",
                format!("Payout {} is already {}", payout.id, payout.status.as_str()),
            ));
        }
        scope.write_query()?;

        let _slot = self.claim(payout.id)?;
        self.client.pay_payout(payout.id, scope).await?;

        payout.status = PayoutStatus::Paid;
        tracing::info!(payout = payout.id, amount = payout.amount, "Payout paid");
        Ok(())
    }

    fn claim(&self, payout_id: u64) -> Result<InFlight> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(payout_id) {
            tracing::warn!(payout = payout_id, "Payout already being paid");
            return Err(ConsoleError::validation(
                "payout_id",
                format!("Payout {} is already being paid", payout_id),
            ));
        }
        Ok(InFlight {
            set: Arc::clone(&self.in_flight),
            id: payout_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::gateway::Gateway;
    use crate::storage::StateStore;
    use chrono::Utc;

    async fn demo_desk() -> PayoutDesk {
        let state = Arc::new(StateStore::in_memory().await.unwrap());
        let gateway = Arc::new(Gateway::new(&Config::demo(), state).unwrap());
        PayoutDesk::new(PromotionsClient::new(gateway))
    }

    fn payout(status: PayoutStatus) -> Payout {
        Payout {
            id: 7,
            partner_id: 3,
            partner_name: "Mama Put Stores".to_string(),
            phone: "+2348000000000".to_string(),
            amount: 1500.0,
            status,
            provider_reference: None,
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_claim_rejects_duplicate_until_released() {
        let desk = demo_desk().await;
        let slot = desk.claim(7).unwrap();
        assert!(desk.is_paying(7));
        assert!(desk.claim(7).is_err());

        drop(slot);
        assert!(!desk.is_paying(7));
        assert!(desk.claim(7).is_ok());
    }

    #[tokio::test]
    async fn test_paid_payout_not_paid_again() {
        let desk = demo_desk().await;
        let mut paid = payout(PayoutStatus::Paid);
        let err = desk.pay(&mut paid, &Scope::current()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_all_scope_rejected() {
        let desk = demo_desk().await;
        let mut pending = payout(PayoutStatus::Pending);
        let err = desk.pay(&mut pending, &Scope::all()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { .. }));
        assert_eq!(pending.status, PayoutStatus::Pending);
    }

    #[tokio::test]
    async fn test_offline_failure_keeps_status_and_releases_slot() {
        let desk = demo_desk().await;
        let mut failed = payout(PayoutStatus::Failed);
        let err = desk.pay(&mut failed, &Scope::current()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Offline(_)));
        assert_eq!(failed.status, PayoutStatus::Failed);
        assert!(!desk.is_paying(7));
    }

    #[tokio::test]
    async fn test_demo_board_is_empty() {
        let desk = demo_desk().await;
        let board = desk.load(1, &Scope::current()).await.unwrap();
        assert_eq!(board, PayoutBoard::default());
    }
}
