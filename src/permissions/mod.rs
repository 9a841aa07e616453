//! Permission evaluation and permission-gated navigation.
//!
//! Evaluation is a membership test against the session's active permission
//! set, read at call time. Nothing here is cached, so a unit switch is
//! reflected by the very next check.

use std::collections::HashSet;

use crate::scope::{Scope, ScopeMode};
use crate::session::Session;

/// Aggregate read-only view across every unit.
pub const GLOBAL_VIEW: &str = "global_view";
/// Privileged reads and writes against a unit other than the active one.
pub const RUN_ACTIONS_ANY_UNIT: &str = "run_actions_any_unit";

pub const PROMOTIONS_VIEW: &str = "promotions.view";
pub const PARTNERS_MANAGE: &str = "promotions.partners.manage";
pub const CAMPAIGNS_MANAGE: &str = "promotions.campaigns.manage";
pub const CODES_MANAGE: &str = "promotions.codes.manage";
pub const REDEMPTIONS_VIEW: &str = "promotions.redemptions.view";
pub const PAYOUTS_MANAGE: &str = "promotions.payouts.manage";
pub const ORDERS_VIEW: &str = "promotions.orders.view";

/// Permission names granted to the active unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(HashSet<String>);

impl PermissionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names in sorted order, for display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Whether the session's active unit grants `name`.
pub fn has_permission(session: &Session, name: &str) -> bool {
    session.active_permissions.contains(name)
}

/// Whether mutating actions guarded by `name` should be offered under `scope`.
///
/// The aggregate view is read-only regardless of permissions.
pub fn can_manage(session: &Session, scope: &Scope, name: &str) -> bool {
    has_permission(session, name) && scope.mode() != ScopeMode::All
}

/// A top-level console section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
    pub permission: Option<&'static str>,
}

pub const NAVIGATION: &[NavItem] = &[
    NavItem {
        label: "Dashboard",
        path: "/dashboard",
        permission: None,
    },
    NavItem {
        label: "Master Data",
        path: "/master-data",
        permission: Some("master-data.view"),
    },
    NavItem {
        label: "Inventory",
        path: "/inventory",
        permission: Some("inventory.view"),
    },
    NavItem {
        label: "Production",
        path: "/production",
        permission: Some("production.view"),
    },
    NavItem {
        label: "Sales & Distribution",
        path: "/sales",
        permission: Some("sales.view"),
    },
    NavItem {
        label: "Finance",
        path: "/finance",
        permission: Some("finance.view"),
    },
    NavItem {
        label: "Franchise Management",
        path: "/franchise",
        permission: Some("franchise.manage"),
    },
    NavItem {
        label: "Promotions",
        path: "/promotions",
        permission: Some(PROMOTIONS_VIEW),
    },
    NavItem {
        label: "Reports",
        path: "/reports",
        permission: Some("reports.view"),
    },
    NavItem {
        label: "Settings",
        path: "/settings",
        permission: Some("settings.view"),
    },
];

/// Sections the session may see.
pub fn visible_navigation(session: &Session) -> Vec<&'static NavItem> {
    NAVIGATION
        .iter()
        .filter(|item| match item.permission {
            Some(name) => has_permission(session, name),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(permissions: &[&str]) -> Session {
        Session {
            active_permissions: PermissionSet::new(permissions.iter().copied()),
            is_authenticated: true,
            ..Session::default()
        }
    }

    #[test]
    fn test_membership() {
        let session = session_with(&[PAYOUTS_MANAGE]);
        assert!(has_permission(&session, PAYOUTS_MANAGE));
        assert!(!has_permission(&session, CODES_MANAGE));
    }

    #[test]
    fn test_can_manage_is_false_in_aggregate_view() {
        let session = session_with(&[CAMPAIGNS_MANAGE, GLOBAL_VIEW]);
        assert!(can_manage(&session, &Scope::current(), CAMPAIGNS_MANAGE));
        assert!(!can_manage(&session, &Scope::all(), CAMPAIGNS_MANAGE));
    }

    #[test]
    fn test_navigation_filtered_by_permissions() {
        let session = session_with(&["inventory.view", PROMOTIONS_VIEW]);
        let labels: Vec<&str> = visible_navigation(&session)
            .iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(labels, vec!["Dashboard", "Inventory", "Promotions"]);
    }
}
