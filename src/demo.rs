//! Built-in identity used when no backend is configured.

use crate::models::{AuthProfile, AuthResponse, Identity, Unit};
use crate::permissions::{
    CAMPAIGNS_MANAGE, CODES_MANAGE, GLOBAL_VIEW, ORDERS_VIEW, PARTNERS_MANAGE, PAYOUTS_MANAGE,
    PROMOTIONS_VIEW, REDEMPTIONS_VIEW, RUN_ACTIONS_ANY_UNIT,
};

pub const DEMO_TOKEN: &str = "demo-token";

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Two units: an HQ with every grant and a franchise with view rights only.
pub fn demo_auth() -> AuthResponse {
    AuthResponse {
        token: DEMO_TOKEN.to_string(),
        profile: AuthProfile {
            identity: Identity {
                id: 1,
                name: "Demo User".to_string(),
                email: "demo@magvlyn.com".to_string(),
            },
            units: vec![
                Unit {
                    id: 1,
                    name: "Magvlyn HQ".to_string(),
                    role: "admin".to_string(),
                    permissions: names(&[
                        "dashboard.view",
                        "master-data.view",
                        "inventory.view",
                        "production.view",
                        "sales.view",
                        "finance.view",
                        "franchise.manage",
                        "reports.view",
                        "settings.view",
                        PROMOTIONS_VIEW,
                        PARTNERS_MANAGE,
                        CAMPAIGNS_MANAGE,
                        CODES_MANAGE,
                        REDEMPTIONS_VIEW,
                        PAYOUTS_MANAGE,
                        ORDERS_VIEW,
                        GLOBAL_VIEW,
                        RUN_ACTIONS_ANY_UNIT,
                    ]),
                },
                Unit {
                    id: 2,
                    name: "Franchise - Lagos".to_string(),
                    role: "manager".to_string(),
                    permissions: names(&[
                        "dashboard.view",
                        "inventory.view",
                        "production.view",
                        "sales.view",
                        "reports.view",
                        PROMOTIONS_VIEW,
                        REDEMPTIONS_VIEW,
                        ORDERS_VIEW,
                    ]),
                },
            ],
            active_unit_id: 1,
        },
    }
}
