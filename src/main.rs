//! calldigest - Structured summaries of call-center transcripts
//!
//! Entry point for the calldigest CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use calldigest::cli::{Cli, Commands};
use calldigest::config::{LogFormat, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        calldigest::cli::completions::print(shell);
        return Ok(());
    }

    // Load configuration only for runtime commands.
    let (settings, warnings) = Settings::load_with_warnings()?;
    init_logging(&settings, cli.verbose);
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    match cli.command {
        Commands::Handle { event } => {
            calldigest::cli::commands::handle_event(&settings, event).await?;
        }
        Commands::Show { contact_id, json } => {
            calldigest::cli::commands::show_summaries(&settings, &contact_id, json)?;
        }
        Commands::List { limit } => {
            calldigest::cli::commands::list_summaries(&settings, limit)?;
        }
        Commands::Config(config_cmd) => {
            calldigest::cli::commands::config_command(&settings, config_cmd)?;
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

fn init_logging(settings: &Settings, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        settings.general.log_level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    match settings.general.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
