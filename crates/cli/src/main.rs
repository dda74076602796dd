use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
use commands::{cache::BuildCacheArgs, graph::GraphArgs, inspect::InspectArgs};

#[derive(Parser)]
#[command(name = "solgraph")]
#[command(about = "Call and dependency graphs for Solidity projects")]
#[command(version)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the call graph JSON for a file or directory
    Graph(GraphArgs),

    /// Print contracts, functions and classified calls of one file
    Inspect(InspectArgs),

    /// Pre-build library graphs for every configured library
    BuildCache(BuildCacheArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Graph(args) => args.execute(),
        Commands::Inspect(args) => args.execute(),
        Commands::BuildCache(args) => args.execute(),
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
