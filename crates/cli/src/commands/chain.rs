//! Chain inspection commands.

use crate::client::NodeClient;
use anyhow::Result;
use colored::Colorize;
use rmcoin_core::{Block, Transaction};

pub fn show_chain(client: &NodeClient) -> Result<()> {
    let response = client.get_chain()?;

    println!();
    println!(
        "{} {}",
        "Chain of".bold().cyan(),
        client.url().bold().cyan()
    );
    println!("  Length: {}", response.length.to_string().bright_cyan());
    println!();

    for block in &response.chain {
        print_block(block);
    }
    Ok(())
}

pub fn show_pending(client: &NodeClient) -> Result<()> {
    let response = client.get_pending()?;

    println!();
    println!("{}", "Pending Transactions:".bold().cyan());
    println!();
    if response.transactions.is_empty() {
        println!("  {}", "(none)".bright_black());
    }
    for (i, tx) in response.transactions.iter().enumerate() {
        print_transaction(i, tx);
    }
    println!();
    Ok(())
}

pub fn validate(client: &NodeClient) -> Result<()> {
    let response = client.is_valid()?;

    if response.valid {
        println!("{}  {}", "✓".green().bold(), response.message);
    } else {
        println!("{}  {}", "✗".red().bold(), response.message);
        if let Some(reason) = response.reason {
            println!("   {}", reason.bright_black());
        }
    }
    Ok(())
}

pub(super) fn print_block(block: &Block) {
    println!(
        "  {} {} {}",
        format!("#{}", block.index).bright_black(),
        block.hash.to_hex()[..16].bright_yellow(),
        format!("({} txs)", block.transactions.len()).bright_black()
    );
    println!("      Timestamp:     {}", block.timestamp);
    println!("      Proof:         {}", block.proof);
    println!(
        "      Previous Hash: {}",
        block.previous_hash.to_hex()[..16].bright_black()
    );
    for (i, tx) in block.transactions.iter().enumerate() {
        print!("  ");
        print_transaction(i, tx);
    }
    println!();
}

pub(super) fn print_transaction(i: usize, tx: &Transaction) {
    let sender = if tx.is_reward() {
        tx.sender.bright_magenta()
    } else {
        tx.sender.normal()
    };
    println!(
        "  {} {} → {}  {}",
        format!("{}.", i + 1).bright_black(),
        sender,
        tx.receiver,
        tx.amount.to_string().bright_cyan()
    );
}
