//! Luxe CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! luxe-cli migrate
//!
//! # Load the demo catalog (or --file PATH for your own)
//! luxe-cli seed
//!
//! # Grant or revoke admin rights
//! luxe-cli admin grant -e admin@example.com
//! luxe-cli admin revoke -e admin@example.com
//!
//! # List users
//! luxe-cli admin list
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert categories and products from YAML
//! - `admin` - Manage the admin flag on user accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "luxe-cli")]
#[command(author, version, about = "Luxe CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from YAML
    Seed {
        /// Catalog file (defaults to the built-in demo catalog)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant admin rights to an existing user
    Grant {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke admin rights
    Revoke {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// List users and their admin flag
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::catalog(file.as_deref()).await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => commands::admin::set_admin(&email, true).await?,
            AdminAction::Revoke { email } => commands::admin::set_admin(&email, false).await?,
            AdminAction::List => commands::admin::list().await?,
        },
    }
    Ok(())
}
