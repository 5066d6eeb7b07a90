//! Store Ratings CLI - Database migrations and account tools.
//!
//! # Usage
//!
//! ```bash
//! # Create tables and the session store schema
//! sr-cli migrate
//!
//! # Create an admin account (password from --password or RATINGS_ADMIN_PASSWORD)
//! sr-cli admin create -e admin@example.com -n "Store Ratings Administrator" -a "1 Main St"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create an admin account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "sr-cli")]
#[command(author, version, about = "Store Ratings CLI tools")]
struct Cli {
    /// `PostgreSQL` connection string
    #[arg(long, env = "RATINGS_DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Full name (20 to 60 characters)
        #[arg(short, long)]
        name: String,

        /// Postal address (up to 400 characters)
        #[arg(short, long)]
        address: String,

        /// Password (8 to 16 characters, one uppercase, one special)
        #[arg(long, env = "RATINGS_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

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
    let database_url = SecretString::from(cli.database_url);
    match cli.command {
        Commands::Migrate => commands::migrate::run(&database_url).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                address,
                password,
            } => {
                commands::admin::create_admin(&database_url, &email, &name, &address, &password)
                    .await?;
            }
        },
    }
    Ok(())
}
