mod broker;
mod catalog;
mod categorizer;
mod consumer;
mod db;
mod error;
mod models;
mod settings;
mod writer;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use broker::FileLog;
use categorizer::Ruleset;
use consumer::{Consumer, Shutdown};
use error::Result;

#[derive(Parser)]
#[command(
    name = "teller",
    about = "Ingests bank-transaction events from a durable log, categorizes them, and stores the result."
)]
struct Cli {
    /// Path to settings JSON (default: ~/.config/teller/settings.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema and seed categories from the configured rules.
    Init,
    /// Run the ingestion consumer until interrupted.
    Run {
        /// Stop after the first empty poll instead of waiting for more events.
        #[arg(long)]
        drain: bool,
    },
    /// Append events (one JSON payload per line) onto the log.
    Publish {
        /// Read payloads from this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the category the configured rules assign to a description.
    Classify { description: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("teller=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => init(config),
        Commands::Run { drain } => run(config, drain).await,
        Commands::Publish { file } => publish(config, file.as_deref()),
        Commands::Classify { description } => classify(config, &description),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init(config: Option<&Path>) -> Result<()> {
    let settings = settings::load_settings(config)?;
    let conn = db::get_connection(Path::new(&settings.db_path))?;
    db::init_db(&conn)?;
    // Seed through the resolver: same create-or-fetch protocol as the
    // runtime path, idempotent across re-runs.
    for rule in &settings.categorization {
        catalog::resolve(&conn, &rule.name)?;
    }
    let ruleset = Ruleset::new(settings.categorization);
    catalog::resolve(&conn, ruleset.fallback())?;
    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0))?;
    println!("Initialized {} ({count} categories)", settings.db_path);
    Ok(())
}

async fn run(config: Option<&Path>, drain: bool) -> Result<()> {
    let settings = settings::load_settings(config)?;
    let conn = db::get_connection(Path::new(&settings.db_path))?;
    db::init_db(&conn)?;
    let log = FileLog::open(&settings.broker)?;
    let ruleset = Ruleset::new(settings.categorization);

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_shutdown.cancel();
        }
    });

    let mut consumer = Consumer::new(
        log,
        conn,
        ruleset,
        Duration::from_millis(settings.broker.poll_timeout_ms),
        drain,
        shutdown,
    );
    consumer.run().await?;
    Ok(())
}

fn publish(config: Option<&Path>, file: Option<&Path>) -> Result<()> {
    let settings = settings::load_settings(config)?;
    let log = FileLog::open(&settings.broker)?;
    let content = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => std::io::read_to_string(std::io::stdin())?,
    };
    let mut published = 0usize;
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        log.publish(line)?;
        published += 1;
    }
    println!("Published {published} events to {}", settings.broker.topic);
    Ok(())
}

fn classify(config: Option<&Path>, description: &str) -> Result<()> {
    let settings = settings::load_settings(config)?;
    let ruleset = Ruleset::new(settings.categorization);
    println!("{}", ruleset.classify(description));
    Ok(())
}
