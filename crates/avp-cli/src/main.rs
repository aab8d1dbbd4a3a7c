//! CLI tooling for delivery-notice scanning.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{address, checksum, config, replay, resolve};

/// Delivery-notice scanning - resolve tracking numbers and recipient addresses
#[derive(Parser)]
#[command(name = "avp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a tracking number from barcode content and OCR text
    Resolve(resolve::ResolveArgs),

    /// Compute the check character of a 14-character payload
    Checksum(checksum::ChecksumArgs),

    /// Extract the recipient address from recognized text
    Address(address::AddressArgs),

    /// Replay recorded frames through a scan session
    Replay(replay::ReplayArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Resolve(args) => resolve::run(args).await,
        Commands::Checksum(args) => checksum::run(args).await,
        Commands::Address(args) => address::run(args, cli.config.as_deref()).await,
        Commands::Replay(args) => replay::run(args, cli.config.as_deref()).await,
        Commands::Config(args) => config::run(args).await,
    }
}
