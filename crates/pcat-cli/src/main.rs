mod ingest;
mod score;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pcat_core::ScoringMethod;
use pcat_scraper::InputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pcat")]
#[command(about = "Product catalog ingest and scoring")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Scrape and store every product URL listed in a file
    Ingest {
        /// CSV, TXT or JSON file of product URLs
        file: PathBuf,
        /// Input format; inferred from the file extension when omitted
        #[arg(long)]
        format: Option<InputFormat>,
        /// Run against an in-memory store and skip image downloads
        #[arg(long)]
        dry_run: bool,
        /// Do not download product images
        #[arg(long)]
        no_images: bool,
        /// Print the run counters as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recompute every stored product's score
    Score {
        /// Scoring method; defaults to the method in the scoring config
        #[arg(long)]
        method: Option<ScoringMethod>,
    },
    /// List the available scoring methods
    Methods,
    /// Categorize a pro/con text
    Categorize {
        text: String,
        /// Treat the text as a con instead of inferring its polarity
        #[arg(long)]
        con: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = pcat_core::load_app_config().context("failed to load configuration")?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Db { command }) => run_db(&config, command).await,
        Some(Commands::Ingest {
            file,
            format,
            dry_run,
            no_images,
            json,
        }) => {
            ingest::run_ingest(
                &config,
                &ingest::IngestOptions {
                    file,
                    format,
                    dry_run,
                    no_images,
                    json,
                },
            )
            .await
        }
        Some(Commands::Score { method }) => score::run_score(&config, method).await,
        Some(Commands::Methods) => {
            score::run_methods(&config);
            Ok(())
        }
        Some(Commands::Categorize { text, con }) => score::run_categorize(&config, &text, con),
        None => {
            println!("pcat: no command given, see --help");
            Ok(())
        }
    }
}

async fn run_db(config: &pcat_core::AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = pcat_db::connect_pool_from_config(config)
        .await
        .context("failed to connect to database")?;
    match command {
        DbCommands::Ping => {
            pcat_db::ping(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = pcat_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
