//! Emporium CLI - Database migrations, catalog seeding, and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront and session-store migrations
//! emp-cli migrate
//!
//! # Load categories and products from YAML
//! emp-cli seed catalog catalog.yaml
//!
//! # Replace the whole catalog
//! emp-cli seed catalog catalog.yaml --clear
//!
//! # Show catalog row counts
//! emp-cli catalog stats
//!
//! # Create a shopper account (password from EMPORIUM_NEW_USER_PASSWORD)
//! emp-cli user create -u jane -e jane@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `EMPORIUM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `EMPORIUM_NEW_USER_PASSWORD` - Password for `user create`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "emp-cli")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Inspect the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage shopper accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load categories and products from a YAML file
    Catalog {
        /// Path to the YAML file
        file: String,

        /// Delete the existing catalog first
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Show category, product, and review counts
    Stats,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Username (letters, digits and @.+-_)
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(long, default_value = "")]
        first_name: String,

        /// Last name
        #[arg(long, default_value = "")]
        last_name: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file, clear } => {
                commands::seed::catalog(&file, clear).await?;
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Stats => commands::catalog::stats().await?,
        },
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                first_name,
                last_name,
            } => {
                commands::user::create(&username, &email, &first_name, &last_name).await?;
            }
        },
    }
    Ok(())
}
