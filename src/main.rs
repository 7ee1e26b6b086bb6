//! ROM Filter - Curate an arcade ROM set from a MAME catalog

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rom_filter::cli::{self, commands, Cli, Commands};
use rom_filter::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(EnvFilter::from_default_env().add_directive(format!("rom_filter={}", level).parse()?))
        .init();

    match cli.command {
        Some(Commands::Filters(args)) => {
            commands::run_filters(&args, &config, cli.output)?;
        }
        Some(Commands::List(args)) => {
            commands::run_list(&args, &config, cli.output)?;
        }
        Some(Commands::Copy(args)) => {
            commands::run_copy(&args, &config, cli.output).await?;
        }
        Some(Commands::Interactive(args)) => {
            cli::interactive::run_interactive_session(&args, &config).await?;
        }
        None => {
            // Default: run interactive mode
            cli::interactive::run_interactive_session(&cli::InteractiveArgs::default(), &config)
                .await?;
        }
    }

    Ok(())
}
