//! Magvlyn Console core
//!
//! Session, permission and scope handling for the operations console, plus
//! the promotions client built on top of them: partners and their
//! geolocation, campaigns, codes, redemptions and payouts.

pub mod campaigns;
pub mod config;
pub mod coordinator;
pub mod demo;
pub mod errors;
pub mod gateway;
pub mod geo;
pub mod models;
pub mod payouts;
pub mod permissions;
pub mod promotions;
pub mod scope;
pub mod session;
pub mod storage;

use std::sync::Arc;

use campaigns::CampaignLifecycle;
use config::Config;
use coordinator::{Coordinator, Navigator, Notifier};
use errors::Result;
use gateway::Gateway;
use geo::{GeoCapture, GeoQueue, MapView};
use models::UnitId;
use payouts::PayoutDesk;
use promotions::PromotionsClient;
use scope::ScopeResolver;
use session::SessionStore;
use storage::StateStore;

/// Console state shared by every screen and command.
#[derive(Clone)]
pub struct Console {
    pub config: Arc<Config>,
    pub state: Arc<StateStore>,
    pub gateway: Arc<Gateway>,
    pub session: Arc<SessionStore>,
    pub scope: Arc<ScopeResolver>,
    pub promotions: PromotionsClient,
    pub campaigns: CampaignLifecycle,
    pub geo: GeoCapture,
    pub payouts: PayoutDesk,
}

impl Console {
    /// Open the persisted state at `config.state_path` and wire the console.
    pub async fn open(config: Config) -> Result<Self> {
        let state = Arc::new(StateStore::open(&config.state_path).await?);
        Self::with_state(config, state)
    }

    pub fn with_state(config: Config, state: Arc<StateStore>) -> Result<Self> {
        let gateway = Arc::new(Gateway::new(&config, Arc::clone(&state))?);
        let promotions = PromotionsClient::new(Arc::clone(&gateway));

        Ok(Self {
            session: Arc::new(SessionStore::new(Arc::clone(&gateway))),
            scope: Arc::new(ScopeResolver::new()),
            campaigns: CampaignLifecycle::new(promotions.clone()),
            geo: GeoCapture::new(promotions.clone(), config.geo_timeout),
            payouts: PayoutDesk::new(promotions.clone()),
            promotions,
            gateway,
            state,
            config: Arc::new(config),
        })
    }

    /// Coordinator bound to this console's session and scope. Feed it with
    /// [`Gateway::subscribe`].
    pub fn coordinator(
        &self,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Coordinator {
        Coordinator::new(
            Arc::clone(&self.session),
            Arc::clone(&self.scope),
            navigator,
            notifier,
        )
    }

    pub fn map_view(&self) -> MapView {
        MapView::new(self.promotions.clone(), self.config.map_debounce)
    }

    pub fn geo_queue(&self) -> GeoQueue {
        GeoQueue::new(self.geo.clone())
    }

    /// Switch the active unit and drop any scope the new unit may not use.
    pub async fn switch_unit(&self, unit_id: UnitId) -> Result<()> {
        self.session.switch_active_unit(unit_id).await?;
        self.scope.revalidate(&self.session.snapshot());
        Ok(())
    }
}
