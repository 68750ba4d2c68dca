//! Mining command.

use crate::client::NodeClient;
use anyhow::Result;
use colored::Colorize;

pub fn run(client: &NodeClient) -> Result<()> {
    println!("{}", "Mining block...".bold().cyan());

    let block = client.mine_block()?;

    println!("{}  {}", "✓".green().bold(), block.message);
    println!();
    println!("  Index:         {}", block.index.to_string().bright_cyan());
    println!("  Hash:          {}", block.hash.to_hex().bright_yellow());
    println!(
        "  Previous Hash: {}",
        block.previous_hash.to_hex().bright_black()
    );
    println!("  Proof:         {}", block.proof);
    println!("  Timestamp:     {}", block.timestamp);
    println!(
        "  Transactions:  {}",
        block.transactions.len().to_string().bright_cyan()
    );
    for (i, tx) in block.transactions.iter().enumerate() {
        super::chain::print_transaction(i, tx);
    }
    println!();
    Ok(())
}
