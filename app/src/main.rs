use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use common::constant::{DEFAULT_PUBLISH_INTERVAL_SECS, DEFAULT_REFRESH_INTERVAL_SECS};
use common::logger;
use connector::{MarketClient, MarketDataConfig};
use dashboard::{ConsoleRenderer, Dashboard, DashboardConfig};
use dotenvy::dotenv;
use publisher::{Publisher, PublisherConfig};
use sketch::SketchStore;
use store::{HttpRecordStore, MemoryRecordStore, RecordStore, StoreConfig, StoreCredentials};
use tracing::info;

#[derive(Parser)]
#[command(name = "coinboard", about = "Token market board on the record store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Fetch market data and publish records on a fixed interval
    Publish(PublishArgs),
    /// Read published records and render the board on a fixed interval
    Dashboard(DashboardArgs),
    /// Save or list sketches
    Sketch {
        #[command(subcommand)]
        command: SketchCommand,
    },
    /// Run publisher and dashboard together against an in-memory store
    Demo,
}

#[derive(Args, Debug, Clone)]
struct PublishArgs {
    /// Seconds between publish cycles
    #[arg(long, default_value_t = DEFAULT_PUBLISH_INTERVAL_SECS)]
    interval: u64,
}

#[derive(Args, Debug, Clone)]
struct DashboardArgs {
    /// Address whose records to read (falls back to OWNER_ADDRESS)
    #[arg(long)]
    owner: Option<String>,
    /// Seconds between dashboard refreshes
    #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL_SECS)]
    interval: u64,
}

#[derive(Subcommand, Debug, Clone)]
enum SketchCommand {
    /// Save an encoded image read from a file, printing the record key
    Save { path: PathBuf },
    /// List the most recent sketches for an owner
    List { owner: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    logger::init_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Publish(args) => run_publisher(args).await,
        Command::Dashboard(args) => run_dashboard(args).await,
        Command::Sketch { command } => run_sketch(command).await,
        Command::Demo => run_demo().await,
    }
}

fn load_store_credentials() -> Result<StoreCredentials> {
    let address = env::var("STORE_ADDRESS")
        .map_err(|_| anyhow!("STORE_ADDRESS not set in environment/.env"))?;
    let secret = env::var("STORE_SECRET")
        .map_err(|_| anyhow!("STORE_SECRET not set in environment/.env"))?;
    Ok(StoreCredentials { address, secret })
}

fn store_config(credentials: Option<StoreCredentials>) -> StoreConfig {
    let mut cfg = StoreConfig::default();
    if let Ok(endpoint) = env::var("STORE_ENDPOINT") {
        cfg.endpoint = endpoint;
    }
    cfg.credentials = credentials;
    cfg
}

async fn run_publisher(args: PublishArgs) -> Result<()> {
    let credentials = load_store_credentials()?;
    info!(address = %credentials.address, "publishing as record-store address");
    let store: Arc<dyn RecordStore> =
        Arc::new(HttpRecordStore::from_config(&store_config(Some(credentials))));
    let market = Arc::new(MarketClient::from_config(&MarketDataConfig::default()));
    let cfg = PublisherConfig {
        interval: Duration::from_secs(args.interval),
        ..Default::default()
    };
    let publisher = Arc::new(Publisher::new(cfg, market, store));
    publisher.spawn().join().await;
    Ok(())
}

async fn run_dashboard(args: DashboardArgs) -> Result<()> {
    let owner = args
        .owner
        .or_else(|| env::var("OWNER_ADDRESS").ok())
        .ok_or_else(|| anyhow!("owner address required: pass --owner or set OWNER_ADDRESS"))?;
    info!(%owner, "dashboard reading records");
    let store: Arc<dyn RecordStore> = Arc::new(HttpRecordStore::from_config(&store_config(None)));
    let mut cfg = DashboardConfig::for_owner(owner);
    cfg.interval = Duration::from_secs(args.interval);
    let dashboard = Arc::new(Dashboard::new(cfg, store, Box::new(ConsoleRenderer)));
    dashboard.spawn().join().await;
    Ok(())
}

async fn run_sketch(command: SketchCommand) -> Result<()> {
    match command {
        SketchCommand::Save { path } => {
            let credentials = load_store_credentials()?;
            let store: Arc<dyn RecordStore> =
                Arc::new(HttpRecordStore::from_config(&store_config(Some(credentials))));
            let image_data = std::fs::read_to_string(&path)?;
            let key = SketchStore::new(store).save(image_data.trim()).await?;
            println!("{key}");
        }
        SketchCommand::List { owner } => {
            let store: Arc<dyn RecordStore> =
                Arc::new(HttpRecordStore::from_config(&store_config(None)));
            let sketches = SketchStore::new(store).load(&owner).await;
            for sketch in sketches {
                println!(
                    "{} {} {} bytes",
                    sketch.key,
                    sketch.timestamp_ms,
                    sketch.image_data.len()
                );
            }
        }
    }
    Ok(())
}

/// Publish real market data into an in-memory store and render it from the
/// same process. Handy for trying the pipeline without a store deployment.
async fn run_demo() -> Result<()> {
    let address = "0xdemo".to_string();
    let store = Arc::new(MemoryRecordStore::new(address.clone()));
    let market = Arc::new(MarketClient::from_config(&MarketDataConfig::default()));
    let publisher = Arc::new(Publisher::new(
        PublisherConfig::default(),
        market,
        store.clone(),
    ));
    let dashboard = Arc::new(Dashboard::new(
        DashboardConfig::for_owner(address),
        store,
        Box::new(ConsoleRenderer),
    ));

    let publish_handle = publisher.spawn();
    let dashboard_handle = dashboard.spawn();
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    publish_handle.stop().await;
    dashboard_handle.stop().await;
    Ok(())
}
