//! DocVault operational CLI.
//!
//! Wires configuration, logging, and the database pool for the
//! migrate/health maintenance commands.

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_database::DatabasePool;

#[derive(Debug, Parser)]
#[command(name = "docvault", about = "DocVault maintenance commands")]
struct Cli {
    /// Configuration environment name (overlay file under config/).
    #[arg(long, default_value = "development", env = "DOCVAULT_ENV")]
    env: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Database migration management
    Migrate {
        #[command(subcommand)]
        command: MigrateCommand,
    },
    /// Check database connectivity
    Health,
}

#[derive(Debug, Subcommand)]
enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Show applied migrations
    Status,
    /// Drop the schema and re-run all migrations
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(&cli, &config).await {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(cli: &Cli, config: &AppConfig) -> Result<(), AppError> {
    let pool = DatabasePool::connect(&config.database).await?;

    match &cli.command {
        Command::Migrate { command } => match command {
            MigrateCommand::Run => {
                docvault_database::migration::run_migrations(pool.pool()).await?;
                println!("All migrations applied.");
            }
            MigrateCommand::Status => {
                let applied = docvault_database::migration::applied_migrations(pool.pool()).await?;
                if applied.is_empty() {
                    println!("No migrations applied yet.");
                }
                for migration in &applied {
                    println!(
                        "{:>4}  {}  ({})",
                        migration.version, migration.description, migration.installed_on
                    );
                }
            }
            MigrateCommand::Reset { force } => {
                if !force {
                    let confirm = dialoguer::Confirm::new()
                        .with_prompt("This will DROP all tables and re-run migrations. Continue?")
                        .default(false)
                        .interact()
                        .map_err(|e| AppError::validation(format!("Input error: {}", e)))?;

                    if !confirm {
                        println!("Cancelled.");
                        pool.close().await;
                        return Ok(());
                    }
                }

                docvault_database::migration::reset_database(pool.pool()).await?;
                println!("Database reset complete.");
            }
        },
        Command::Health => {
            let healthy = pool.health_check().await?;
            println!("database: {}", if healthy { "ok" } else { "unhealthy" });
        }
    }

    pool.close().await;
    Ok(())
}
