use clap::{Parser, Subcommand};
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::util::configure_threads;
use commands::{baseline, criticality, optimize};

#[derive(Parser)]
#[command(
    name = "wdn",
    version,
    about = "Water distribution network analysis and design optimization"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    /// Worker threads for parallel sweeps ("auto" or a count)
    #[arg(long, global = true, default_value = "auto")]
    threads: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the network as-is and report pressures and resilience
    Baseline(baseline::BaselineArgs),
    /// Rank pipes by the impact of closing each one (N-1 screening)
    Criticality(criticality::CriticalityArgs),
    /// Search pipe diameters minimizing cost under design constraints
    Optimize(optimize::OptimizeArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    configure_threads(&cli.threads);

    match cli.command {
        Commands::Baseline(args) => baseline::run(&args),
        Commands::Criticality(args) => criticality::run(&args),
        Commands::Optimize(args) => optimize::run(&args),
    }
}
