//! rmcoin node entry point.

use anyhow::{Context, Result};
use clap::Parser;
use rmcoin_server::{router, AppState, Args, HttpChainFetcher};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let blockchain = Arc::new(
        args.build_blockchain()
            .context("Failed to initialize blockchain")?,
    );
    if !args.peers.is_empty() {
        let peers = blockchain
            .connect_nodes(&args.peers)
            .context("Invalid --peer address")?;
        info!(?peers, "registered bootstrap peers");
    }

    let fetcher =
        HttpChainFetcher::new(args.peer_timeout()).context("Failed to build HTTP client")?;
    let app = router(AppState::new(Arc::clone(&blockchain), fetcher));

    let addr = args.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        %addr,
        node_id = blockchain.node_id(),
        difficulty = blockchain.pow().difficulty(),
        length = blockchain.len(),
        "node listening"
    );
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
