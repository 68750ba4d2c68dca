//! CLI commands module.

use crate::client::NodeClient;
use anyhow::Result;
use clap::Subcommand;

mod chain;
mod demo;
mod mine;
mod peers;
mod tx;

#[derive(Subcommand)]
pub enum Commands {
    /// Show the node's full chain
    Chain,
    /// Show pending transactions
    Pending,
    /// Submit a transaction
    Tx(tx::TxArgs),
    /// Mine a block with every pending transaction
    Mine,
    /// Register peer nodes
    Connect {
        /// Peer URLs, e.g. http://localhost:5001
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// Validate the node's chain
    Validate,
    /// Replace the chain with the longest valid peer chain
    Sync,
    /// Walk through submit, mine, connect and validate on one node
    Demo(demo::DemoArgs),
    /// Exercise a multi-node network end to end
    NetworkTest(network_test::NetworkTestArgs),
}

pub fn run(node: &str, cmd: Commands) -> Result<()> {
    let client = NodeClient::new(node)?;
    match cmd {
        Commands::Chain => chain::show_chain(&client),
        Commands::Pending => chain::show_pending(&client),
        Commands::Tx(args) => tx::run(&client, args),
        Commands::Mine => mine::run(&client),
        Commands::Connect { nodes } => peers::connect(&client, &nodes),
        Commands::Validate => chain::validate(&client),
        Commands::Sync => peers::sync(&client),
        Commands::Demo(args) => demo::run(&client, args),
        Commands::NetworkTest(args) => network_test::run(args),
    }
}
