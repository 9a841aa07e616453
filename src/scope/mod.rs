//! Promotions scope: which unit's data a read or write targets.
//!
//! [`ScopeResolver`] holds the user's choice (current unit, aggregate view,
//! or an explicit target unit) and never touches the network. Writes can
//! only be parameterized through [`Scope::write_query`], which refuses the
//! read-only aggregate view and a target mode with no unit selected.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::{ConsoleError, Result};
use crate::models::{Unit, UnitId};
use crate::permissions::{has_permission, GLOBAL_VIEW, RUN_ACTIONS_ANY_UNIT};
use crate::session::Session;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    #[default]
    Current,
    All,
    Target,
}

/// A resolved scope. `target_unit_id` is only ever set in target mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope {
    mode: ScopeMode,
    target_unit_id: Option<UnitId>,
}

impl Scope {
    pub fn current() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            mode: ScopeMode::All,
            target_unit_id: None,
        }
    }

    /// Target mode, possibly still waiting for a unit to be picked.
    pub fn target(unit_id: Option<UnitId>) -> Self {
        Self {
            mode: ScopeMode::Target,
            target_unit_id: unit_id,
        }
    }

    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    pub fn target_unit_id(&self) -> Option<UnitId> {
        self.target_unit_id
    }

    pub fn is_read_only(&self) -> bool {
        self.mode == ScopeMode::All
    }

    /// False for target mode without a unit.
    pub fn is_complete(&self) -> bool {
        self.mode != ScopeMode::Target || self.target_unit_id.is_some()
    }

    /// Parameters for list and read calls.
    ///
    /// An incomplete target scope reads the active unit's data.
    pub fn read_query(&self) -> ScopeQuery {
        match (self.mode, self.target_unit_id) {
            (ScopeMode::All, _) => ScopeQuery::with("scope", "all".to_string()),
            (ScopeMode::Target, Some(id)) => ScopeQuery::with("target_unit_id", id.to_string()),
            _ => ScopeQuery::unscoped(),
        }
    }

    /// Parameters for a mutating call, or the reason it must not be sent.
    pub fn write_query(&self) -> Result<ScopeQuery> {
        match (self.mode, self.target_unit_id) {
            (ScopeMode::Current, _) => Ok(ScopeQuery::unscoped()),
            (ScopeMode::All, _) => Err(ConsoleError::validation(
                "scope",
                "The all-units view is read-only",
            )),
            (ScopeMode::Target, Some(id)) => {
                Ok(ScopeQuery::with("target_unit_id", id.to_string()))
            }
            (ScopeMode::Target, None) => Err(ConsoleError::validation(
                "target_unit_id",
                "Select a unit to act on",
            )),
        }
    }
}

/// Scope parameters attached to an outbound request.
///
/// Outside this module a value can only be obtained from a [`Scope`] or as
/// explicitly unscoped, so an incomplete target never reaches the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeQuery {
    params: Vec<(&'static str, String)>,
}

impl ScopeQuery {
    /// For calls addressed by entity id that carry no scope.
    pub fn unscoped() -> Self {
        Self::default()
    }

    fn with(key: &'static str, value: String) -> Self {
        Self {
            params: vec![(key, value)],
        }
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }
}

/// The selector's raw state; the target is remembered while other modes
/// are shown, as a select box would.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeSelection {
    pub mode: ScopeMode,
    pub selected_target: Option<UnitId>,
}

impl ScopeSelection {
    pub fn scope(&self) -> Scope {
        match self.mode {
            ScopeMode::Current => Scope::current(),
            ScopeMode::All => Scope::all(),
            ScopeMode::Target => Scope::target(self.selected_target),
        }
    }
}

/// Observable container for the promotions scope selection.
pub struct ScopeResolver {
    state: watch::Sender<ScopeSelection>,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeResolver {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ScopeSelection::default());
        Self { state }
    }

    pub fn scope(&self) -> Scope {
        self.state.borrow().scope()
    }

    pub fn selection(&self) -> ScopeSelection {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScopeSelection> {
        self.state.subscribe()
    }

    /// Every entry into the promotions module starts at the current unit.
    pub fn enter_module(&self) {
        self.state.send_replace(ScopeSelection::default());
    }

    /// Modes the selector should offer; empty when only the current unit
    /// is available and the selector is hidden.
    pub fn available_modes(session: &Session) -> Vec<ScopeMode> {
        let can_view_all = has_permission(session, GLOBAL_VIEW);
        let can_target = has_permission(session, RUN_ACTIONS_ANY_UNIT);
        if !can_view_all && !can_target {
            return Vec::new();
        }

        let mut modes = vec![ScopeMode::Current];
        if can_view_all {
            modes.push(ScopeMode::All);
        }
        if can_target {
            modes.push(ScopeMode::Target);
        }
        modes
    }

    /// Units that can be picked as a target.
    pub fn targetable_units(session: &Session) -> &[Unit] {
        if has_permission(session, RUN_ACTIONS_ANY_UNIT) {
            &session.units
        } else {
            &[]
        }
    }

    pub fn set_mode(&self, mode: ScopeMode, session: &Session) -> Result<Scope> {
        let required = match mode {
            ScopeMode::Current => None,
            ScopeMode::All => Some(GLOBAL_VIEW),
            ScopeMode::Target => Some(RUN_ACTIONS_ANY_UNIT),
        };
        if let Some(name) = required {
            if !has_permission(session, name) {
                return Err(ConsoleError::PermissionDenied(format!(
                    "Scope mode {:?} requires the {} permission",
                    mode, name
                )));
            }
        }

        self.state.send_modify(|selection| selection.mode = mode);
        Ok(self.scope())
    }

    /// Pick the unit a target-mode scope acts on.
    pub fn select_target(&self, unit_id: UnitId, session: &Session) -> Result<Scope> {
        if !has_permission(session, RUN_ACTIONS_ANY_UNIT) {
            return Err(ConsoleError::PermissionDenied(format!(
                "Acting on another unit requires the {} permission",
                RUN_ACTIONS_ANY_UNIT
            )));
        }
        if session.unit(unit_id).is_none() {
            return Err(ConsoleError::validation(
                "target_unit_id",
                format!("Unit {} is not one of your units", unit_id),
            ));
        }

        self.state
            .send_modify(|selection| selection.selected_target = Some(unit_id));
        Ok(self.scope())
    }

    /// Drop back to the current unit if the session no longer permits the
    /// selected mode or target, e.g. after a unit switch.
    pub fn revalidate(&self, session: &Session) {
        let selection = self.selection();
        let still_allowed = match selection.mode {
            ScopeMode::Current => true,
            ScopeMode::All => has_permission(session, GLOBAL_VIEW),
            ScopeMode::Target => {
                has_permission(session, RUN_ACTIONS_ANY_UNIT)
                    && selection
                        .selected_target
                        .map_or(true, |id| session.unit(id).is_some())
            }
        };

        if !still_allowed {
            tracing::info!("Scope {:?} no longer permitted, resetting", selection.mode);
            self.state.send_replace(ScopeSelection::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Identity, Unit};
    use crate::permissions::PermissionSet;

    fn session(permissions: &[&str]) -> Session {
        Session {
            identity: Some(Identity {
                id: 1,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            }),
            units: vec![
                Unit {
                    id: 1,
                    name: "HQ".to_string(),
                    role: "admin".to_string(),
                    permissions: permissions.iter().map(|p| p.to_string()).collect(),
                },
                Unit {
                    id: 2,
                    name: "Lagos".to_string(),
                    role: "manager".to_string(),
                    permissions: vec![],
                },
            ],
            active_unit_id: Some(1),
            active_permissions: PermissionSet::new(permissions.iter().copied()),
            is_authenticated: true,
            is_loading: false,
        }
    }

    #[test]
    fn test_default_is_current() {
        let resolver = ScopeResolver::new();
        assert_eq!(resolver.scope(), Scope::current());
        assert!(resolver.scope().read_query().params().is_empty());
    }

    #[test]
    fn test_all_requires_global_view() {
        let resolver = ScopeResolver::new();
        let err = resolver
            .set_mode(ScopeMode::All, &session(&[]))
            .unwrap_err();
        assert!(matches!(err, ConsoleError::PermissionDenied(_)));
        assert_eq!(resolver.scope(), Scope::current());

        let scope = resolver
            .set_mode(ScopeMode::All, &session(&[GLOBAL_VIEW]))
            .unwrap();
        assert_eq!(
            scope.read_query().params(),
            &[("scope", "all".to_string())]
        );
    }

    #[test]
    fn test_all_scope_refuses_writes() {
        assert!(Scope::all().write_query().is_err());
        assert!(Scope::all().is_read_only());
    }

    #[test]
    fn test_target_without_unit_is_incomplete() {
        let resolver = ScopeResolver::new();
        let s = session(&[RUN_ACTIONS_ANY_UNIT]);
        let scope = resolver.set_mode(ScopeMode::Target, &s).unwrap();

        assert_eq!(scope.target_unit_id(), None);
        assert!(!scope.is_complete());
        let err = scope.write_query().unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "target_unit_id"));
    }

    #[test]
    fn test_target_with_unit_writes_target_param() {
        let resolver = ScopeResolver::new();
        let s = session(&[RUN_ACTIONS_ANY_UNIT]);
        resolver.set_mode(ScopeMode::Target, &s).unwrap();
        let scope = resolver.select_target(2, &s).unwrap();

        assert_eq!(
            scope.write_query().unwrap().params(),
            &[("target_unit_id", "2".to_string())]
        );
    }

    #[test]
    fn test_target_must_be_a_member_unit() {
        let resolver = ScopeResolver::new();
        let s = session(&[RUN_ACTIONS_ANY_UNIT]);
        resolver.set_mode(ScopeMode::Target, &s).unwrap();
        assert!(resolver.select_target(99, &s).is_err());
    }

    #[test]
    fn test_target_id_hidden_outside_target_mode() {
        let resolver = ScopeResolver::new();
        let s = session(&[RUN_ACTIONS_ANY_UNIT, GLOBAL_VIEW]);
        resolver.set_mode(ScopeMode::Target, &s).unwrap();
        resolver.select_target(2, &s).unwrap();
        let scope = resolver.set_mode(ScopeMode::Current, &s).unwrap();

        assert_eq!(scope, Scope::current());
        assert_eq!(resolver.selection().selected_target, Some(2));
    }

    #[test]
    fn test_enter_module_resets() {
        let resolver = ScopeResolver::new();
        resolver
            .set_mode(ScopeMode::All, &session(&[GLOBAL_VIEW]))
            .unwrap();
        resolver.enter_module();
        assert_eq!(resolver.scope(), Scope::current());
    }

    #[test]
    fn test_available_modes() {
        assert!(ScopeResolver::available_modes(&session(&[])).is_empty());
        assert_eq!(
            ScopeResolver::available_modes(&session(&[GLOBAL_VIEW])),
            vec![ScopeMode::Current, ScopeMode::All]
        );
        assert_eq!(
            ScopeResolver::available_modes(&session(&[GLOBAL_VIEW, RUN_ACTIONS_ANY_UNIT])),
            vec![ScopeMode::Current, ScopeMode::All, ScopeMode::Target]
        );
    }

    #[test]
    fn test_revalidate_drops_lost_privilege() {
        let resolver = ScopeResolver::new();
        resolver
            .set_mode(ScopeMode::All, &session(&[GLOBAL_VIEW]))
            .unwrap();
        resolver.revalidate(&session(&[]));
        assert_eq!(resolver.scope(), Scope::current());
    }
}
