//! Roster CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! roster-cli migrate
//!
//! # Create a user
//! roster-cli user create -n "Ada Lovelace" -e ada@example.com
//!
//! # List users (active only by default)
//! roster-cli user list --all
//!
//! # Deactivate a user
//! roster-cli user deactivate 42
//!
//! # Count users
//! roster-cli user count --status inactive
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create|list|deactivate|count` - Manage users

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "roster-cli")]
#[command(author, version, about = "Roster CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,
    },
    /// List users
    List {
        /// Include inactive users
        #[arg(long)]
        all: bool,
    },
    /// Deactivate a user (soft delete)
    Deactivate {
        /// User id
        id: i32,
    },
    /// Count users
    Count {
        /// Restrict to one status (`active` or `inactive`)
        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::User { action } => match action {
            UserAction::Create { name, email } => {
                commands::user::create(&name, &email).await?;
            }
            UserAction::List { all } => {
                commands::user::list(all).await?;
            }
            UserAction::Deactivate { id } => {
                commands::user::deactivate(id).await?;
            }
            UserAction::Count { status } => {
                commands::user::count(status.as_deref()).await?;
            }
        },
    }
    Ok(())
}
