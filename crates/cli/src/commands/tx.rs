//! Transaction submission command.

use crate::client::NodeClient;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct TxArgs {
    /// Sender identifier
    #[arg(short, long)]
    sender: String,

    /// Receiver identifier
    #[arg(short, long)]
    receiver: String,

    /// Amount to transfer
    #[arg(short, long)]
    amount: u64,
}

pub fn run(client: &NodeClient, args: TxArgs) -> Result<()> {
    let response = client.add_transaction(&args.sender, &args.receiver, args.amount)?;

    println!("{}  {}", "✓".green().bold(), response.message);
    println!(
        "  {} → {}  {}",
        args.sender,
        args.receiver,
        args.amount.to_string().bright_cyan()
    );
    println!(
        "  Pool position: {}",
        response.position.to_string().bright_black()
    );
    Ok(())
}
