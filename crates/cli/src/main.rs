mod commands;

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rewards_dedup_core::{DedupOptions, DedupTarget, Preset, StoreSettings};
use rewards_dedup_service::{DedupService, ServiceError};
use rewards_dedup_storage::MongoStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rewards-dedup")]
#[command(about = "Remove duplicate reward records from MongoDB and lock them out with unique indexes", long_about = None)]
struct Cli {
    /// MongoDB connection string [env: MONGO_URL]
    #[arg(long, global = true)]
    uri: Option<String>,
    /// Database name [env: MONGO_DB, default: rewards_db]
    #[arg(long, global = true)]
    database: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check connectivity to the database
    Ping,
    /// List duplicate groups and which record of each would be kept
    Scan {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long)]
        json: bool,
    },
    /// Delete duplicates, keeping the latest record per key, then add a unique index
    Dedup {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Deduplicate every known rewards collection
    All {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Install the full index layout for a collection kind
    Indexes {
        #[arg(long)]
        preset: Preset,
        #[arg(long)]
        collection: Option<String>,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Collection kind supplying default key and collection
    #[arg(long)]
    preset: Option<Preset>,
    #[arg(long)]
    collection: Option<String>,
    /// Grouping key field(s), comma-separated or repeated
    #[arg(long, value_delimiter = ',')]
    key: Vec<String>,
    /// Field whose greatest value marks the record to keep
    #[arg(long)]
    timestamp: Option<String>,
}

impl TargetArgs {
    fn resolve(self) -> Result<DedupTarget> {
        Ok(DedupTarget::resolve(self.preset, self.collection, &self.key, self.timestamp)?)
    }
}

#[derive(Args)]
struct RunArgs {
    /// Report what would be deleted without deleting or indexing
    #[arg(long)]
    dry_run: bool,
    /// Upper bound on scan/delete passes [env: REWARDS_DEDUP_MAX_PASSES, default: 3]
    #[arg(long)]
    max_passes: Option<u32>,
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn options(&self) -> DedupOptions {
        let options = DedupOptions::from_env().with_dry_run(self.dry_run);
        match self.max_passes {
            Some(n) => options.with_max_passes(n),
            None => options,
        }
    }
}

async fn connect(uri: Option<String>, database: Option<String>) -> Result<DedupService> {
    let settings = StoreSettings::from_env(uri, database)?;
    let store = MongoStore::connect(&settings).await?;
    let service = DedupService::new(Arc::new(store));
    service.ping().await?;
    tracing::info!(uri = %settings.redacted_uri(), database = %settings.database, "Connected");
    Ok(service)
}

fn report_failure(err: &anyhow::Error) {
    match err.downcast_ref::<ServiceError>() {
        Some(ServiceError::ResidualDuplicates { collection, index, total, .. }) => {
            tracing::error!(
                collection = %collection,
                index = %index,
                colliding = total,
                "duplicates remain after deletion, re-run once concurrent writers have stopped"
            );
        },
        _ => tracing::error!(error = %err, "rewards-dedup failed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = execute(cli).await {
        report_failure(&err);
        return Err(err);
    }
    Ok(())
}

async fn execute(cli: Cli) -> Result<()> {
    let Cli { uri, database, command } = cli;

    match command {
        Commands::Ping => {
            connect(uri, database).await?;
            println!("ok");
        },
        Commands::Scan { target, json } => {
            let target = target.resolve()?;
            let service = connect(uri, database).await?;
            commands::scan::run(&service, &target, json).await?;
        },
        Commands::Dedup { target, run } => {
            let target = target.resolve()?;
            let options = run.options();
            let service = connect(uri, database).await?;
            commands::dedup::run(&service, &target, options, run.json).await?;
        },
        Commands::All { run } => {
            let options = run.options();
            let service = connect(uri, database).await?;
            commands::dedup::run_all(&service, options, run.json).await?;
        },
        Commands::Indexes { preset, collection } => {
            let collection = commands::indexes::collection_for(preset, collection)?;
            let service = connect(uri, database).await?;
            commands::indexes::run(&service, &collection, preset).await?;
        },
    }

    Ok(())
}
