//! festrec - batch reconciliation command line
//!
//! Registers recurring-event entities, maintains their priors, and ingests
//! JSON Lines observation files produced by external parsers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use festrec_common::config::{resolve_config_path, resolve_database_path, CONFIG_ENV_VAR, DATABASE_ENV_VAR};
use festrec_engine::models::EntityProfile;
use festrec_engine::services::{parse_observations, run_batch};
use festrec_engine::{FestrecConfig, Priors, PriorsCache, Reconciler, SqliteStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Command-line arguments for festrec
#[derive(Parser, Debug)]
#[command(name = "festrec")]
#[command(about = "Reconcile event and festival date observations into stored facts")]
#[command(version)]
struct Args {
    /// SQLite database file (else FESTREC_DB, config, then the data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML configuration file (else FESTREC_CONFIG, then ~/.config/festrec)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level directive (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a recurring-event entity and print its id
    Register {
        /// URL-style short name, e.g. harvest-fair
        #[arg(long)]
        slug: String,

        /// The entity's own website
        #[arg(long)]
        website: Option<String>,

        /// Month the event usually starts in (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        typical_month: Option<u32>,

        /// Usual length in days
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        typical_duration: Option<u32>,
    },

    /// Replace an entity's priors
    Priors {
        #[arg(long)]
        entity: Uuid,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        typical_month: Option<u32>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        typical_duration: Option<u32>,
    },

    /// Reconcile a JSON Lines observation file and print per-source counts
    Ingest {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let config = FestrecConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    let level = args.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting festrec v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config: {}", path.display());
    }

    let db_path = resolve_database_path(
        args.db.as_deref(),
        DATABASE_ENV_VAR,
        config.database_path.as_deref(),
    );
    info!("Database: {}", db_path.display());

    let pool = festrec_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;
    let reconciler = Reconciler::new(SqliteStore::new(pool), &config.reconcile);

    match args.command {
        Command::Register {
            slug,
            website,
            typical_month,
            typical_duration,
        } => {
            let profile = EntityProfile::new(
                slug,
                website,
                Priors {
                    typical_month,
                    typical_duration_days: typical_duration,
                },
            );
            reconciler
                .register_entity(&profile)
                .await
                .context("Failed to register entity")?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Priors {
            entity,
            typical_month,
            typical_duration,
        } => {
            let priors = Priors {
                typical_month,
                typical_duration_days: typical_duration,
            };
            let mut cache = PriorsCache::new();
            reconciler
                .update_priors(&mut cache, entity, priors)
                .await
                .context("Failed to update priors")?;
            println!("{}", serde_json::to_string_pretty(&priors)?);
        }
        Command::Ingest { file } => {
            let input = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let summary = run_batch(&reconciler, parse_observations(&input)).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
