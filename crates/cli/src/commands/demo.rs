//! Single-node walkthrough: submit, mine, connect, validate.

use crate::client::NodeClient;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct DemoArgs {
    /// Peers to register in the connect step
    #[arg(
        long,
        num_args = 1..,
        default_values_t = [
            "http://localhost:5001".to_string(),
            "http://localhost:5002".to_string(),
            "http://localhost:5003".to_string(),
        ]
    )]
    peers: Vec<String>,
}

pub fn run(client: &NodeClient, args: DemoArgs) -> Result<()> {
    println!("{}", "rmcoin Blockchain Example".bold().cyan());
    println!("{}", "=".repeat(30));

    step(1, "Getting initial blockchain...");
    let chain = client
        .get_chain()
        .with_context(|| format!("Is a node running at {}?", client.url()))?;
    println!("  Initial chain length: {}", chain.length.to_string().bright_cyan());

    step(2, "Adding a transaction...");
    match client.add_transaction("Alice", "Bob", 25) {
        Ok(response) => println!("  Transaction added: {}", response.message),
        Err(e) => failed(&e),
    }

    step(3, "Mining a block...");
    match client.mine_block() {
        Ok(block) => {
            println!("  {}", "Block mined successfully!".green());
            println!("  Block index: {}", block.index.to_string().bright_cyan());
            println!("  Transactions in block: {}", block.transactions.len());
        }
        Err(e) => failed(&e),
    }

    step(4, "Getting updated blockchain...");
    let chain = client.get_chain()?;
    println!("  Updated chain length: {}", chain.length.to_string().bright_cyan());
    if let Some(last) = chain.chain.last() {
        println!("  Last block index: {}", last.index);
        println!("  Last block transactions: {}", last.transactions.len());
    }

    step(5, "Connecting to other nodes...");
    match client.connect_nodes(&args.peers) {
        Ok(response) => println!("  Connected to {} nodes", response.total_nodes.len()),
        Err(e) => failed(&e),
    }

    step(6, "Validating blockchain...");
    match client.is_valid() {
        Ok(response) => println!("  Validation result: {}", response.message),
        Err(e) => failed(&e),
    }

    println!();
    println!("{}", "=".repeat(30));
    println!("{}", "Example completed!".bold().green());
    Ok(())
}

fn step(n: usize, title: &str) {
    println!();
    println!("{} {}", format!("{n}.").bold(), title.bold());
}

fn failed(error: &anyhow::Error) {
    println!("  {} {:#}", "Error:".red().bold(), error);
}
