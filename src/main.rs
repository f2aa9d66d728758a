use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use herald::api::{serve, AppState};
use herald::catalog::{AgentCatalog, CatalogConfig};
use herald::engine::RunLifecycle;
use herald::executor::EchoExecutor;
use herald::store::InMemoryRunStore;
use herald::Config;

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Agent protocol server: discover agents, invoke them, track runs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve {
        #[arg(long, help = "Port to listen on")]
        port: Option<u16>,
        #[arg(long, help = "Agent catalog YAML file")]
        agents: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, agents } => run_server(port, agents).await?,
    }

    Ok(())
}

async fn run_server(port: Option<u16>, agents: Option<PathBuf>) -> Result<()> {
    let config = Config::from_env();
    let port = port.unwrap_or(config.port);
    let base_url = config.base_url.clone().unwrap_or_else(|| format!("http://localhost:{}", port));

    let agents_file = agents.or_else(|| config.agents_file.clone().map(PathBuf::from));
    let catalog = match &agents_file {
        Some(path) => AgentCatalog::from_file(path, &base_url)?,
        None => AgentCatalog::from_config(CatalogConfig::builtin(), &base_url),
    };

    let store = match config.run_capacity {
        Some(capacity) => InMemoryRunStore::with_capacity(capacity),
        None => InMemoryRunStore::new(),
    };

    let catalog = Arc::new(catalog);
    let lifecycle = Arc::new(RunLifecycle::new(
        Arc::new(store),
        catalog.clone(),
        Arc::new(EchoExecutor),
    ));

    println!("Serving {} agents", catalog.len());

    serve(AppState { lifecycle, catalog }, port).await
}
