//! Forkline CLI - Order food, run a restaurant menu, and work orders from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept in FORKLINE_SESSION_FILE)
//! FORKLINE_PASSWORD=secret forkline login -u casey
//!
//! # Browse and order
//! forkline restaurants
//! forkline menu --restaurant 3
//! forkline order -i 12 -i 14:2 --note "no onions"
//!
//! # Restaurant side
//! forkline orders --filter active
//! forkline advance 41 ready
//! forkline food add -n "Focaccia" -d "Rosemary" -p 6.00 -c Bread
//! forkline food delete 12 --yes
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami` - Session management
//! - `restaurants`, `menu` - Browse the catalog
//! - `order`, `orders`, `advance` - Place and track orders
//! - `food` - Manage a restaurant's menu

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;

use clap::{Parser, Subcommand};
use forkline_client::ClientConfig;
use forkline_core::{FoodId, FoodStatus, OrderId, OrderStatus, Price, Role, UserId};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "forkline")]
#[command(author, version, about = "Forkline food ordering client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a username or email
    Login {
        /// Username or email address
        #[arg(short, long)]
        user: String,

        #[arg(long, env = "FORKLINE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register(commands::auth::RegisterArgs),
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami {
        /// Reload the profile from the backend first
        #[arg(long)]
        refresh: bool,
    },
    /// List restaurants
    Restaurants,
    /// Show a menu
    Menu {
        /// Restaurant to show (customers and admins)
        #[arg(short, long)]
        restaurant: Option<UserId>,

        /// Text to look for in name or description
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        status: Option<FoodStatus>,
    },
    /// Add items to a cart and place the order
    Order {
        /// `FOOD_ID` or `FOOD_ID:QUANTITY`, repeatable
        #[arg(short, long = "item", value_parser = commands::orders::parse_line, required = true)]
        items: Vec<(FoodId, u32)>,

        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// List orders visible to the signed-in account
    Orders {
        /// `all`, `active`, or a status such as `ready`
        #[arg(short, long, default_value = "all")]
        filter: forkline_client::models::OrderFilter,
    },
    /// Move an order to its next status
    Advance { order: OrderId, status: OrderStatus },
    /// Manage the signed-in restaurant's menu
    Food {
        #[command(subcommand)]
        action: FoodAction,
    },
}

#[derive(Subcommand)]
enum FoodAction {
    /// Add a menu item
    Add(commands::food::AddArgs),
    /// Change fields of a menu item
    Edit(commands::food::EditArgs),
    /// Switch an item between available and unavailable
    ToggleStatus { id: FoodId },
    /// Mark or unmark an item as popular
    TogglePopular { id: FoodId },
    /// Delete a menu item
    Delete {
        id: FoodId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    use secrecy::ExposeSecret;

    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.expose_secret(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "forkline_client=info,forkline_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open(config)?;
    let mut out = std::io::stdout().lock();

    let result = dispatch(cli.command, &mut ctx, &mut out).await;
    ctx.finish(&mut out)?;
    result
}

async fn dispatch(
    command: Commands,
    ctx: &mut Context,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Login { user, password } => {
            commands::auth::login(ctx, &user, SecretString::from(password), out).await?;
        }
        Commands::Register(args) => commands::auth::register(ctx, args, out).await?,
        Commands::Logout => commands::auth::logout(ctx, out)?,
        Commands::Whoami { refresh } => commands::auth::whoami(ctx, refresh, out).await?,
        Commands::Restaurants => commands::browse::restaurants(ctx, out).await?,
        Commands::Menu {
            restaurant,
            search,
            category,
            status,
        } => {
            let filter = forkline_client::models::MenuFilter {
                search,
                category,
                status,
            };
            commands::browse::menu(ctx, restaurant, &filter, out).await?;
        }
        Commands::Order { items, note } => commands::orders::place(ctx, &items, &note, out).await?,
        Commands::Orders { filter } => commands::orders::list(ctx, filter, out).await?,
        Commands::Advance { order, status } => {
            commands::orders::advance(ctx, order, status, out).await?;
        }
        Commands::Food { action } => match action {
            FoodAction::Add(args) => commands::food::add(ctx, args, out).await?,
            FoodAction::Edit(args) => commands::food::edit(ctx, args, out).await?,
            FoodAction::ToggleStatus { id } => commands::food::toggle_status(ctx, id, out).await?,
            FoodAction::TogglePopular { id } => {
                commands::food::toggle_popular(ctx, id, out).await?;
            }
            FoodAction::Delete { id, yes } => commands::food::delete(ctx, id, yes, out).await?,
        },
    }
    Ok(())
}

/// Only self-registrable roles are accepted.
fn parse_role(s: &str) -> Result<Role, String> {
    let role: Role = s.parse()?;
    if role.is_self_registrable() {
        Ok(role)
    } else {
        Err(format!("{role} accounts cannot be registered"))
    }
}

fn parse_price(s: &str) -> Result<Price, String> {
    s.parse().map_err(|e: forkline_core::PriceError| e.to_string())
}
