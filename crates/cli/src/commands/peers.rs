//! Peer registration and sync commands.

use crate::client::NodeClient;
use anyhow::Result;
use colored::Colorize;

pub fn connect(client: &NodeClient, nodes: &[String]) -> Result<()> {
    let response = client.connect_nodes(nodes)?;

    println!("{}  {}", "✓".green().bold(), response.message);
    for peer in &response.total_nodes {
        println!("  {}", peer.bright_yellow());
    }
    Ok(())
}

pub fn sync(client: &NodeClient) -> Result<()> {
    let response = client.replace_chain()?;

    let mark = if response.replaced {
        "↻".yellow().bold()
    } else {
        "✓".green().bold()
    };
    println!("{}  {}", mark, response.message);
    println!("  Length: {}", response.length.to_string().bright_cyan());
    Ok(())
}
