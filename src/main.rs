//! Magvlyn Console command line
//!
//! Signs in against the backend (or the built-in demo identity when no
//! backend is configured) and drives the promotions module from a shell.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use magvlyn_console::campaigns::CampaignAction;
use magvlyn_console::config::Config;
use magvlyn_console::coordinator::{Coordinator, Navigator, Notice, NoticeLevel, Notifier, Route};
use magvlyn_console::errors::ConsoleError;
use magvlyn_console::models::{Coordinates, ListQuery, PartnerType};
use magvlyn_console::permissions::{
    can_manage, visible_navigation, CAMPAIGNS_MANAGE, PARTNERS_MANAGE, PAYOUTS_MANAGE,
};
use magvlyn_console::scope::{Scope, ScopeMode, ScopeResolver};
use magvlyn_console::Console;

/// Operations console for promotions.
#[derive(Parser)]
#[command(name = "magvlyn-console")]
#[command(about = "Magvlyn operations console", long_about = None)]
struct Cli {
    /// View every unit at once (read-only)
    #[arg(long, global = true, conflicts_with = "target")]
    all: bool,

    /// Act on behalf of another unit
    #[arg(long, global = true, value_name = "UNIT")]
    target: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session.
    Logout,

    /// Show the signed-in identity, active unit and what it may do.
    Whoami,

    /// Make another of your units the active one.
    #[command(name = "switch-unit")]
    SwitchUnit { unit_id: u64 },

    /// List partners.
    Partners {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
        /// FIXED_RETAIL or MOBILE_VENDOR
        #[arg(long = "type")]
        partner_type: Option<String>,
    },

    /// List partners that still have no location.
    #[command(name = "geo-queue")]
    GeoQueue {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },

    /// Save a partner's coordinates.
    #[command(name = "set-location")]
    SetLocation {
        partner_id: u64,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },

    /// List campaigns.
    Campaigns {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        status: Option<String>,
    },

    /// Activate, pause, resume or end a campaign.
    Campaign {
        campaign_id: u64,
        /// activate, pause, resume or end
        action: String,
    },

    /// Pay a pending or failed payout.
    Pay {
        payout_id: u64,
        /// Page of the payout list the payout is on
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Promotions KPIs.
    Overview,
}

struct Terminal;

impl Navigator for Terminal {
    fn navigate(&self, route: Route) {
        match route {
            Route::Login => eprintln!("Session ended. Sign in again with `magvlyn-console login`."),
            other => eprintln!("-> {}", other.path()),
        }
    }
}

impl Notifier for Terminal {
    fn notify(&self, notice: Notice) {
        let level = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{}] {}: {}", level, notice.title, notice.description);
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), ConsoleError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_scope(cli: &Cli, console: &Console) -> Result<Scope, ConsoleError> {
    let session = console.session.snapshot();
    console.scope.enter_module();
    if cli.all {
        console.scope.set_mode(ScopeMode::All, &session)?;
    } else if let Some(unit_id) = cli.target {
        console.scope.set_mode(ScopeMode::Target, &session)?;
        console.scope.select_target(unit_id, &session)?;
    }
    Ok(console.scope.scope())
}

fn require(console: &Console, scope: &Scope, permission: &str) -> Result<(), ConsoleError> {
    if can_manage(&console.session.snapshot(), scope, permission) {
        Ok(())
    } else {
        Err(ConsoleError::PermissionDenied(format!(
            "This action requires {} and a writable scope",
            permission
        )))
    }
}

async fn run(cli: &Cli, console: &Console, coordinator: &Coordinator) -> Result<(), ConsoleError> {
    if let Commands::Login { email, password } = &cli.command {
        let session = console.session.login(email, password).await?;
        return print(&json!({
            "identity": session.identity,
            "active_unit_id": session.active_unit_id,
            "units": session.units,
        }));
    }

    if let Err(e) = console.session.bootstrap().await {
        tracing::debug!("Bootstrap failed: {}", e);
    }
    if matches!(cli.command, Commands::Logout) {
        console.session.logout().await?;
        return print(&json!({ "signed_out": true }));
    }
    if !console.session.snapshot().is_authenticated {
        coordinator.end_session();
        return Err(ConsoleError::AuthorizationExpired);
    }

    let scope = build_scope(cli, console)?;

    match &cli.command {
        Commands::Login { .. } | Commands::Logout => Ok(()),
        Commands::Whoami => {
            let session = console.session.snapshot();
            let navigation: Vec<&str> = visible_navigation(&session)
                .into_iter()
                .map(|item| item.label)
                .collect();
            print(&json!({
                "identity": session.identity,
                "active_unit": session.active_unit(),
                "permissions": session.active_permissions.sorted(),
                "navigation": navigation,
                "scope_modes": ScopeResolver::available_modes(&session),
                "demo": console.config.is_demo(),
            }))
        }
        Commands::SwitchUnit { unit_id } => {
            console.switch_unit(*unit_id).await?;
            let session = console.session.snapshot();
            print(&json!({
                "active_unit": session.active_unit(),
                "permissions": session.active_permissions.sorted(),
            }))
        }
        Commands::Partners {
            page,
            search,
            partner_type,
        } => {
            let partner_type = match partner_type {
                Some(raw) => Some(PartnerType::parse(raw).ok_or_else(|| {
                    ConsoleError::validation("type", format!("Unknown partner type {}", raw))
                })?),
                None => None,
            };
            let query = ListQuery::page(*page)
                .with_search(search.clone().unwrap_or_default())
                .with_type(partner_type);
            print(&console.promotions.list_partners(&query, &scope).await?)
        }
        Commands::GeoQueue { page, search } => {
            let mut queue = console.geo_queue();
            queue.set_search(search.clone().unwrap_or_default());
            queue.set_page(*page);
            queue.load(&scope).await?;
            print(&json!({ "data": queue.items(), "total": queue.total() }))
        }
        Commands::SetLocation {
            partner_id,
            lat,
            lng,
        } => {
            require(console, &scope, PARTNERS_MANAGE)?;
            let coordinates = Coordinates::new(*lat, *lng);
            console.geo.save(*partner_id, coordinates).await?;
            print(&json!({ "partner_id": partner_id, "coordinates": coordinates }))
        }
        Commands::Campaigns { page, status } => {
            let mut query = ListQuery::page(*page);
            if let Some(status) = status {
                query = query.with_status(status.clone());
            }
            print(&console.promotions.list_campaigns(&query, &scope).await?)
        }
        Commands::Campaign {
            campaign_id,
            action,
        } => {
            require(console, &scope, CAMPAIGNS_MANAGE)?;
            let action = CampaignAction::parse(action).ok_or_else(|| {
                ConsoleError::validation("action", format!("Unknown campaign action {}", action))
            })?;
            let mut campaign = console.promotions.get_campaign(*campaign_id).await?;
            console.campaigns.apply(&mut campaign, action, &scope).await?;
            print(&campaign)
        }
        Commands::Pay { payout_id, page } => {
            require(console, &scope, PAYOUTS_MANAGE)?;
            let board = console.payouts.load(*page, &scope).await?;
            let mut payout = board
                .pending
                .data
                .into_iter()
                .find(|p| p.id == *payout_id)
                .ok_or_else(|| {
                    ConsoleError::NotFound(format!("No payable payout {} on page {}", payout_id, page))
                })?;
            console.payouts.pay(&mut payout, &scope).await?;
            print(&payout)
        }
        Commands::Overview => print(&console.promotions.overview(&scope).await?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if config.is_demo() {
        tracing::warn!("No backend configured (MAGVLYN_API_BASE_URL). Running in demo mode!");
    }
    tracing::debug!("State path: {:?}", config.state_path);

    let console = Console::open(config).await?;
    let terminal = Arc::new(Terminal);
    let coordinator = console.coordinator(terminal.clone(), terminal);
    let mut events = console.gateway.subscribe();

    let outcome = run(&cli, &console, &coordinator).await;

    while let Ok(event) = events.try_recv() {
        coordinator.handle(&event);
    }

    if let Err(e) = outcome {
        tracing::debug!(code = e.error_code(), "Command failed");
        return Err(e.into());
    }
    Ok(())
}
