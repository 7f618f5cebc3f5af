//! Cartwheel CLI - database migrations and catalog operations.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! cartwheel migrate
//!
//! # Load products from a YAML file into the catalog store
//! cartwheel seed catalog.yaml
//!
//! # Rebuild the search index of a running storefront
//! cartwheel reindex --url http://localhost:3000
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cartwheel")]
#[command(author, version, about = "Cartwheel CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Create products listed in a YAML file
    Seed {
        /// Path to the catalog file
        file: String,
    },
    /// Ask a running storefront to rebuild its search index
    Reindex {
        /// Storefront base URL
        #[arg(long, env = "STOREFRONT_BASE_URL", default_value = "http://localhost:3000")]
        url: String,
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
        Commands::Reindex { url } => commands::reindex::trigger(&url).await?,
    }
    Ok(())
}
