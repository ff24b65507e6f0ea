//! Simpler Proofs CLI - database migrations and store provisioning.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sp-cli migrate
//!
//! # Create a store for an identity-provider user (skipping onboarding)
//! sp-cli store create --user-id 7d6f2a64-3a0e-4c55-9a57-0d7f1f0c2b11 --name "Sunny Prints"
//! ```
//!
//! Both commands read `DATABASE_URL` (a `.env` file is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sp-cli")]
#[command(author, version, about = "Simpler Proofs CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage stores
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Create a store with default settings
    Create {
        /// Owning user id from the identity provider
        #[arg(short, long)]
        user_id: String,

        /// Store display name
        #[arg(short, long)]
        name: String,

        /// URL slug (generated from the name when omitted)
        #[arg(short, long)]
        slug: Option<String>,
    },
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
        Commands::Store { action } => match action {
            StoreAction::Create {
                user_id,
                name,
                slug,
            } => {
                commands::store::create(&user_id, &name, slug.as_deref()).await?;
            }
        },
    }
    Ok(())
}
