//! Command-line configuration for the node binary.

use crate::fetcher::DEFAULT_PEER_TIMEOUT;
use clap::Parser;
use rmcoin_chain::{Blockchain, BlockchainConfig, NodeError};
use rmcoin_consensus::DEFAULT_DIFFICULTY;
use rmcoin_storage::ChainStore;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "rmcoin-node")]
#[command(about = "Run an rmcoin blockchain node", long_about = None)]
pub struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Leading zero hex digits required of each proof (network-wide)
    #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
    pub difficulty: usize,

    /// Amount credited to this node per mined block
    #[arg(long, default_value_t = 1)]
    pub mining_reward: u64,

    /// Receiver of mining rewards (random if omitted)
    #[arg(long)]
    pub node_id: Option<String>,

    /// Directory for the chain snapshot (in-memory if omitted)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Peer to register at startup (repeatable)
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Timeout for each peer chain fetch, in seconds
    #[arg(long, default_value_t = DEFAULT_PEER_TIMEOUT.as_secs())]
    pub peer_timeout_secs: u64,
}

impl Args {
    /// Socket address string to bind to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_timeout_secs)
    }

    pub fn blockchain_config(&self) -> BlockchainConfig {
        let mut config = BlockchainConfig {
            difficulty: self.difficulty,
            mining_reward: self.mining_reward,
            ..BlockchainConfig::default()
        };
        if let Some(node_id) = &self.node_id {
            config.node_id = node_id.clone();
        }
        config
    }

    /// Build the node, loading the snapshot from `--data-dir` if given.
    pub fn build_blockchain(&self) -> Result<Blockchain, NodeError> {
        let config = self.blockchain_config();
        match &self.data_dir {
            Some(dir) => Blockchain::with_store(config, ChainStore::open(dir)?),
            None => Ok(Blockchain::new(config)),
        }
    }
}
