//! Unitload CLI: resolve units from a config file
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use unitload_config::LoaderConfig;
use unitload_engine::{InMemoryHost, ResolutionEngine};

#[derive(Parser, Debug)]
#[command(name = "unitload", about = "Load-time unit resolution and patching", version)]
pub struct Cli {
    /// Print prometheus metrics after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve units and print a summary of each
    Resolve {
        #[arg(long, short)]
        config: PathBuf,

        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List artifact sources in search order
    Sources {
        #[arg(long, short)]
        config: PathBuf,
    },
}

fn build_engine(path: &Path) -> Result<ResolutionEngine> {
    let mut config = LoaderConfig::from_path(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    config.apply_env();
    ResolutionEngine::from_config(&config, Arc::new(InMemoryHost::new()))
        .context("failed to build engine")
}

/// Runs `cli`, writing results to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let (engine, failure) = match &cli.command {
        Command::Resolve { config, names } => {
            let engine = build_engine(config)?;
            let mut failed = 0;

            for name in names {
                match engine.resolve(name.as_str()) {
                    Ok(unit) => writeln!(out, "{}", unit.summary())?,
                    Err(e) => {
                        tracing::error!(unit = %name, error = %e, "resolution failed");
                        failed += 1;
                    }
                }
            }

            let failure = (failed > 0)
                .then(|| anyhow::anyhow!("{} of {} units failed to resolve", failed, names.len()));
            (engine, failure)
        }
        Command::Sources { config } => {
            let engine = build_engine(config)?;
            for (position, location) in engine.list_artifact_sources().iter().enumerate() {
                writeln!(out, "{}\t{}", position, location)?;
            }
            (engine, None)
        }
    };

    // Metrics go out even when some units failed.
    if cli.metrics {
        write!(out, "{}", engine.metrics().encode()?)?;
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
