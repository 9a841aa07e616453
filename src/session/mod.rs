//! Session store: who is acting, on behalf of which unit, with what rights.
//!
//! [`SessionStore`] is an observable container over a [`Session`] value.
//! Every mutation replaces the value in a single `watch` send, so
//! subscribers never see the active unit and its permissions disagree.

use std::sync::Arc;

use reqwest::Method;
use tokio::sync::watch;

use crate::demo;
use crate::errors::{ConsoleError, Result};
use crate::gateway::Gateway;
use crate::models::{
    AuthProfile, AuthResponse, Identity, LoginRequest, SwitchUnitRequest, SwitchUnitResponse,
    Unit, UnitId,
};
use crate::permissions::PermissionSet;
use crate::scope::ScopeQuery;

/// Snapshot of the authenticated session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub units: Vec<Unit>,
    pub active_unit_id: Option<UnitId>,
    pub active_permissions: PermissionSet,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Session {
    /// The state before bootstrap has finished.
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    /// Build an authenticated session, rejecting a profile whose active unit
    /// is not one of its units.
    pub fn from_profile(profile: AuthProfile) -> Result<Self> {
        let active = profile
            .units
            .iter()
            .find(|unit| unit.id == profile.active_unit_id)
            .ok_or_else(|| ConsoleError::RequestFailed {
                status: None,
                message: format!(
                    "Active unit {} is not among the identity's units",
                    profile.active_unit_id
                ),
            })?;
        let active_permissions = PermissionSet::new(active.permissions.iter().cloned());

        Ok(Self {
            identity: Some(profile.identity),
            active_unit_id: Some(profile.active_unit_id),
            units: profile.units,
            active_permissions,
            is_authenticated: true,
            is_loading: false,
        })
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    pub fn active_unit(&self) -> Option<&Unit> {
        self.active_unit_id.and_then(|id| self.unit(id))
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.active_permissions.contains(name)
    }

    /// The active unit is a member of the unit list, or both are empty.
    pub fn is_consistent(&self) -> bool {
        match self.active_unit_id {
            Some(id) => self.unit(id).is_some(),
            None => self.units.is_empty(),
        }
    }
}

/// Observable owner of the [`Session`].
pub struct SessionStore {
    gateway: Arc<Gateway>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self { gateway, state }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.state.borrow().has_permission(name)
    }

    /// Restore the session from the persisted credential, if any.
    ///
    /// Any failure clears persisted state and leaves the session
    /// unauthenticated. Nothing is retried.
    pub async fn bootstrap(&self) -> Result<()> {
        if self.gateway.is_demo() {
            tracing::info!("No backend configured, starting demo session");
            return self.establish(demo::demo_auth()).await;
        }

        if self.gateway.state().token().is_none() {
            tracing::debug!("No persisted credential");
            self.state.send_replace(Session::default());
            return Ok(());
        }

        let restored = match self.gateway.get::<AuthProfile>("/auth/me", &[]).await {
            Ok(profile) => Session::from_profile(profile),
            Err(e) => Err(e),
        };

        match restored {
            Ok(session) => {
                if let Some(unit_id) = session.active_unit_id {
                    self.gateway.state().save_active_unit(unit_id).await?;
                }
                tracing::info!(unit = ?session.active_unit_id, "Session restored");
                self.state.send_replace(session);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Persisted session rejected: {}", e);
                self.gateway.state().clear().await?;
                self.state.send_replace(Session::default());
                Err(e)
            }
        }
    }

    /// Exchange credentials for a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ConsoleError::validation("email", "Email is required"));
        }
        if password.is_empty() {
            return Err(ConsoleError::validation("password", "Password is required"));
        }

        if self.gateway.is_demo() {
            self.establish(demo::demo_auth()).await?;
            return Ok(self.snapshot());
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .gateway
            .exchange_credentials("/auth/login", &request)
            .await?;
        self.establish(response).await?;

        Ok(self.snapshot())
    }

    async fn establish(&self, response: AuthResponse) -> Result<()> {
        let session = Session::from_profile(response.profile)?;
        let active_unit_id = session.active_unit_id.unwrap_or_default();

        self.gateway
            .state()
            .save_credentials(&response.token, active_unit_id)
            .await?;

        tracing::info!(unit = active_unit_id, units = session.units.len(), "Signed in");
        self.state.send_replace(session);
        Ok(())
    }

    /// Forget the credential and reset to the unauthenticated state.
    pub async fn logout(&self) -> Result<()> {
        self.reset();
        self.gateway.state().clear().await?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Reset the in-memory session only; used once the gateway has already
    /// cleared the persisted credential.
    pub fn reset(&self) {
        self.state.send_replace(Session::default());
    }

    /// Make `unit_id` the active unit.
    ///
    /// On success the active unit and its permissions are replaced together;
    /// on failure the session is left exactly as it was.
    pub async fn switch_active_unit(&self, unit_id: UnitId) -> Result<()> {
        let current = self.snapshot();
        if !current.is_authenticated {
            return Err(ConsoleError::AuthorizationExpired);
        }
        let unit = current.unit(unit_id).cloned().ok_or_else(|| {
            ConsoleError::validation("unit_id", format!("Unit {} is not one of your units", unit_id))
        })?;

        let (active_unit_id, permissions) = if self.gateway.is_demo() {
            (unit.id, unit.permissions)
        } else {
            let response: SwitchUnitResponse = self
                .gateway
                .send(
                    Method::POST,
                    "/auth/switch-unit",
                    &ScopeQuery::unscoped(),
                    Some(&SwitchUnitRequest { unit_id }),
                )
                .await?;
            if current.unit(response.active_unit_id).is_none() {
                return Err(ConsoleError::RequestFailed {
                    status: None,
                    message: format!(
                        "Backend switched to unknown unit {}",
                        response.active_unit_id
                    ),
                });
            }
            (response.active_unit_id, response.permissions)
        };

        // The session may have been reset while the request was in flight.
        let permissions = PermissionSet::new(permissions);
        let applied = self.state.send_if_modified(|session| {
            if !session.is_authenticated || session.unit(active_unit_id).is_none() {
                return false;
            }
            session.active_unit_id = Some(active_unit_id);
            session.active_permissions = permissions;
            true
        });
        if !applied {
            tracing::warn!(unit = active_unit_id, "Session ended during unit switch");
            return Err(ConsoleError::AuthorizationExpired);
        }

        match self.gateway.state().save_active_unit(active_unit_id).await {
            Ok(true) => {
                tracing::info!(unit = active_unit_id, "Active unit switched");
                Ok(())
            }
            Ok(false) => {
                tracing::warn!(unit = active_unit_id, "Credential cleared during unit switch");
                self.restore_active_unit(active_unit_id, &current);
                Err(ConsoleError::AuthorizationExpired)
            }
            Err(e) => {
                self.restore_active_unit(active_unit_id, &current);
                Err(e)
            }
        }
    }

    /// Put back the unit that was active before a switch that could not be
    /// persisted, unless the session has moved on since.
    fn restore_active_unit(&self, switched_to: UnitId, previous: &Session) {
        self.state.send_if_modified(|session| {
            if !session.is_authenticated || session.active_unit_id != Some(switched_to) {
                return false;
            }
            session.active_unit_id = previous.active_unit_id;
            session.active_permissions = previous.active_permissions.clone();
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::permissions::{GLOBAL_VIEW, PAYOUTS_MANAGE};
    use crate::storage::StateStore;

    async fn demo_store() -> SessionStore {
        let state = Arc::new(StateStore::in_memory().await.unwrap());
        let gateway = Arc::new(Gateway::new(&Config::demo(), state).unwrap());
        SessionStore::new(gateway)
    }

    #[test]
    fn test_profile_with_foreign_active_unit_is_rejected() {
        let mut profile = demo::demo_auth().profile;
        profile.active_unit_id = 42;
        assert!(Session::from_profile(profile).is_err());
    }

    #[test]
    fn test_empty_session_is_consistent() {
        assert!(Session::default().is_consistent());
    }

    #[tokio::test]
    async fn test_starts_loading_and_unauthenticated() {
        let store = demo_store().await;
        let session = store.snapshot();
        assert!(session.is_loading);
        assert!(!session.is_authenticated);
    }

    #[tokio::test]
    async fn test_demo_bootstrap_signs_in() {
        let store = demo_store().await;
        store.bootstrap().await.unwrap();

        let session = store.snapshot();
        assert!(session.is_authenticated);
        assert_eq!(session.active_unit_id, Some(1));
        assert!(session.is_consistent());
        assert!(store.has_permission(GLOBAL_VIEW));
    }

    #[tokio::test]
    async fn test_demo_switch_replaces_permissions() {
        let store = demo_store().await;
        store.login("demo@magvlyn.com", "secret").await.unwrap();
        let mut rx = store.subscribe();

        store.switch_active_unit(2).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let session = rx.borrow_and_update().clone();
        assert_eq!(session.active_unit_id, Some(2));
        assert!(!session.has_permission(PAYOUTS_MANAGE));
        assert!(!store.has_permission(GLOBAL_VIEW));
    }

    #[tokio::test]
    async fn test_switch_to_foreign_unit_leaves_state() {
        let store = demo_store().await;
        store.login("demo@magvlyn.com", "secret").await.unwrap();
        let before = store.snapshot();

        assert!(store.switch_active_unit(77).await.is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_switch_after_credential_cleared_is_not_persisted() {
        let store = demo_store().await;
        store.login("demo@magvlyn.com", "secret").await.unwrap();
        store.gateway.state().clear().await.unwrap();

        let err = store.switch_active_unit(2).await.unwrap_err();

        assert_eq!(err, ConsoleError::AuthorizationExpired);
        assert!(store.gateway.state().active_unit_id().is_none());
        let session = store.snapshot();
        assert_eq!(session.active_unit_id, Some(1));
        assert!(session.is_consistent());
    }

    #[tokio::test]
    async fn test_switch_after_logout_is_rejected() {
        let store = demo_store().await;
        store.login("demo@magvlyn.com", "secret").await.unwrap();
        store.logout().await.unwrap();

        let err = store.switch_active_unit(2).await.unwrap_err();

        assert_eq!(err, ConsoleError::AuthorizationExpired);
        assert_eq!(store.snapshot(), Session::default());
        assert!(store.gateway.state().active_unit_id().is_none());
    }

    #[tokio::test]
    async fn test_login_requires_email() {
        let store = demo_store().await;
        let err = store.login("  ", "pw").await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let store = demo_store().await;
        store.login("demo@magvlyn.com", "secret").await.unwrap();
        store.logout().await.unwrap();

        assert_eq!(store.snapshot(), Session::default());
        assert!(store.gateway.state().token().is_none());
    }
}
