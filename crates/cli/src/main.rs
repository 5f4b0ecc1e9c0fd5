//! Pupusas CLI - catalog and checkout from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Print the product listing
//! pupusas products
//!
//! # Run one checkout from JSON files
//! pupusas checkout --cart cart.json --customer customer.json
//! ```
//!
//! # Commands
//!
//! - `products` - Load the catalog and print its products as JSON
//! - `checkout` - Fill a cart, charge it, and create the order

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pupusas_storefront::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "pupusas")]
#[command(author, version, about = "Pupusas storefront tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the catalog and print its products
    Products,
    /// Run a checkout for a cart file
    Checkout {
        /// JSON file with an array of cart items (`id`, `name`, `price`, `quantity`)
        #[arg(short, long)]
        cart: PathBuf,

        /// JSON file with the customer's contact and address details
        #[arg(short = 'u', long)]
        customer: PathBuf,

        /// Wait for the cart to reset before exiting
        #[arg(long)]
        wait: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
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

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pupusas_storefront=info,pupusas_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Must outlive every command so queued events are flushed on exit
    let _sentry_guard = init_sentry(&config);

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Products => commands::products::run(config).await,
        Commands::Checkout {
            cart,
            customer,
            wait,
        } => commands::checkout::run(config, &cart, &customer, wait).await,
    }
}
