//! Binary entrypoint for the unitload CLI.
use clap::Parser;
use tracing_subscriber::EnvFilter;
use unitload_cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli, &mut std::io::stdout().lock())
}
