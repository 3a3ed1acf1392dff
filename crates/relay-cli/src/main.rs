//! Relay CLI
//!
//! Command-line interface for a single relay node

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "relay")]
#[command(about = "Relay - Per-node command dispatch pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Dispatch one command through a node's pipeline
    Dispatch(commands::dispatch::DispatchArgs),
    /// Print the compiled pipeline of a node
    Describe(commands::describe::DescribeArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Dispatch(args) => commands::dispatch::execute(args),
        Commands::Describe(args) => commands::describe::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
