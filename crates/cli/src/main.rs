//! Recipe catalog CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! rc-cli migrate
//!
//! # Block until the database accepts connections
//! rc-cli wait-for-db --interval-secs 1 --max-attempts 60
//!
//! # Create a staff superuser
//! rc-cli user create-superuser -e admin@example.com -p secret -n "Admin"
//!
//! # Delete expired bearer tokens
//! rc-cli user purge-tokens
//! ```
//!
//! All commands read `CATALOG_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rc-cli")]
#[command(author, version, about = "Recipe catalog CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Wait until the database accepts connections
    WaitForDb {
        /// Seconds between connection attempts
        #[arg(long, default_value_t = 1)]
        interval_secs: u64,

        /// Give up after this many failed attempts
        #[arg(long, default_value_t = 60)]
        max_attempts: u32,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user with the staff and superuser flags set
    CreateSuperuser {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Delete expired bearer tokens
    PurgeTokens,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::WaitForDb {
            interval_secs,
            max_attempts,
        } => commands::wait_for_db::run(interval_secs, max_attempts).await?,
        Commands::User { action } => match action {
            UserAction::CreateSuperuser {
                email,
                password,
                name,
            } => {
                commands::user::create_superuser(&email, &password, name.as_deref()).await?;
            }
            UserAction::PurgeTokens => commands::user::purge_tokens().await?,
        },
    }
    Ok(())
}
