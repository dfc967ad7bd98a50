//! Wildbloom CLI - migrations, seeding, and admin account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! wb-cli migrate
//!
//! # Load the demo catalog (idempotent; existing slugs are skipped)
//! wb-cli seed
//!
//! # Manage admin panel accounts
//! wb-cli admin create -e mara@wildbloom.shop -n "Mara Jensen" -r super_admin
//! wb-cli admin list
//! wb-cli admin set-role -e mara@wildbloom.shop -r viewer
//! ```
//!
//! Every command reads `DATABASE_URL` from the environment (a `.env` file
//! works) and talks to the database directly; neither server binary needs
//! to be running.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wb-cli")]
#[command(author, version, about = "Wildbloom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Insert the demo catalog (skips slugs that already exist)
    Seed,
    /// Manage admin panel accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Password; omit to have one generated and printed once
        #[arg(short, long)]
        password: Option<String>,
    },
    /// List admin accounts
    List,
    /// Change an account's role
    SetRole {
        /// Email address of the account to change
        #[arg(short, long)]
        email: String,

        /// New role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long)]
        role: String,
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
        Commands::Seed => commands::seed::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create(&email, &name, &role, password.as_deref()).await?;
            }
            AdminAction::List => commands::admin::list().await?,
            AdminAction::SetRole { email, role } => {
                commands::admin::set_role(&email, &role).await?;
            }
        },
    }
    Ok(())
}
