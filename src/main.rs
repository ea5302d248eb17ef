//! yt-assistant CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use yt_assistant::cli::{commands, Cli, Commands};
use yt_assistant::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("yt_assistant={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    match &cli.command {
        Commands::Process {
            url,
            duration,
            quality,
            force,
        } => {
            commands::run_process(url, duration, quality, *force, cli.parallel, settings).await?;
        }

        Commands::Ask {
            url,
            question,
            k,
            model,
            evaluate,
        } => {
            commands::run_ask(url, question, *k, model.clone(), *evaluate, cli.parallel, settings)
                .await?;
        }

        Commands::Summarize {
            url,
            length,
            model,
            evaluate,
        } => {
            commands::run_summarize(url, length, model.clone(), *evaluate, cli.parallel, settings)
                .await?;
        }

        Commands::Transcript {
            input,
            output,
            translate,
        } => {
            commands::run_transcript(input, output.clone(), translate.clone(), settings).await?;
        }

        Commands::Languages => {
            commands::run_languages();
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Remove { key } => {
            commands::run_remove(key, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_deref())?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
