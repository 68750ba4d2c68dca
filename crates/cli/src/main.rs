//! rmcoin CLI entry point.

use clap::Parser;

mod client;
mod commands;

#[derive(Parser)]
#[command(name = "rmcoin")]
#[command(about = "Client for rmcoin blockchain nodes", long_about = None)]
struct Cli {
    /// Base URL of the node to talk to
    #[arg(short, long, global = true, default_value = "http://localhost:5000")]
    node: String,

    #[command(subcommand)]
    command: Option<commands::Commands>,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(&cli.node, cmd) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("rmcoin - client for rmcoin blockchain nodes");
            println!("Run 'rmcoin --help' for usage information.");
        }
    }
}
