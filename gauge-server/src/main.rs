use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gauge_core::{Scenario, SessionStore, SqliteSessionStore};
use gauge_server::{AppState, ConfigLoader, GaugeServer, ServerConfig};

#[derive(Parser)]
#[command(name = "gauge", about = "Adaptive assessment engine for training scenarios")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the assessment server
    Serve(ServeArgs),
    /// Load scenarios from a TOML file into the database
    Seed(SeedArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,

    /// Override the configured database path
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Args)]
struct SeedArgs {
    /// TOML file with one [[scenario]] table per entry
    file: PathBuf,

    /// Override the configured database path
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(serde::Deserialize)]
struct SeedFile {
    #[serde(rename = "scenario")]
    scenarios: Vec<Scenario>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Seed(args) => seed(args),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let host = args.host.unwrap_or(config.host.clone());
    let port = args.port.unwrap_or(config.port);
    let db = args.db.unwrap_or(config.database_path.clone());

    if let Some(parent) = db.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let state = AppState::open(&db, config.provider())?;
    let server = GaugeServer::new(ServerConfig::new(host, port), Arc::new(state));
    server.run().await?;
    Ok(())
}

fn seed(args: SeedArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let db = args.db.unwrap_or(config.database_path);

    if let Some(parent) = db.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = SqliteSessionStore::open(&db)?;
    let contents = std::fs::read_to_string(&args.file)?;
    let seed: SeedFile = toml::from_str(&contents)?;

    for scenario in &seed.scenarios {
        store.put_scenario(scenario)?;
        tracing::info!(id = %scenario.id, title = %scenario.title, "scenario seeded");
    }

    println!("Seeded {} scenarios into {}", seed.scenarios.len(), db.display());
    Ok(())
}
