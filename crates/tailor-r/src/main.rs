use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::sync::Arc;
use tailor_engine::config::loader::ConfigLoader;
use tailor_engine::controller::BackgroundController;
use tailor_engine::store::{FileStore, KeyedStore, MemoryStore};
use tailor_r::host::RemoteHost;
use tailor_r::server::RemoteServer;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(author, version, about = "Tailor background controller", long_about = None)]
struct Args {
    /// WebSocket port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path of the JSON store file (overrides the config file)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Config file to load instead of the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep all state in memory; nothing survives exit
    #[arg(long, conflicts_with = "store")]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout is reserved for the startup banner.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ConfigLoader::load(args.config.as_deref()).await?;
    let port = args.port.unwrap_or(config.remote.port);

    let store: Arc<dyn KeyedStore> = if args.ephemeral {
        info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let path = args.store.clone().unwrap_or_else(|| config.store.path.clone());
        Arc::new(FileStore::open(&path).await?)
    };

    let (command_tx, _) = broadcast::channel(100);
    let host = Arc::new(RemoteHost::new(command_tx.clone()));
    let controller = BackgroundController::from_config(store, host, &config);

    let server = RemoteServer::new(port, controller, command_tx)
        .with_response_timeout(config.messaging.response_timeout());
    let handle = server.start().await?;
    println!(
        "Tailor controller ready. Connect the browser extension to ws://{}",
        handle.local_addr
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.shutdown();
    Ok(())
}
