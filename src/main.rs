mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{CacheCommands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archmap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cache_dir = cli.cache_dir.as_ref();

    match cli.command {
        Commands::Facts { path, file, markup } => {
            cli::facts(&path, file.as_deref(), markup)?;
        }
        Commands::Summary { path, markup } => {
            cli::summary(&path, markup)?;
        }
        Commands::Graph {
            path,
            markup,
            no_cache,
            report,
        } => {
            cli::graph(&path, markup, no_cache, report, cache_dir)?;
        }
        Commands::Cache { command } => match command {
            CacheCommands::Clear => cli::cache_clear(cache_dir)?,
            CacheCommands::Info { format } => cli::cache_info(cache_dir, &format)?,
        },
    }

    Ok(())
}
