//! KNER CLI - Command-line interface
//!
//! Usage:
//!   kner predict <text>
//!   kner predict --file <path>
//!   kner history --skip 0 --limit 50
//!   kner health
//!   kner shell

mod render;
mod shell;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use kner_client::{HttpNerClient, NerBackend};
use kner_core::{AppConfig, LoggingConfig};
use kner_extractor::{decode, EntityStats};
use kner_session::file::read_text_file;

#[derive(Parser)]
#[command(name = "kner")]
#[command(about = "Khmer named-entity recognition client")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// NER service origin, overrides configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag text and print the decoded entities
    Predict {
        /// Text to analyse
        text: Option<String>,
        /// Read the text from a .txt file instead
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List past predictions stored by the service
    History {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        /// Page size, defaults to the configured history page size
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Check service health
    Health,
    /// Interactive session
    Shell,
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    if let Some(url) = &cli.base_url {
        config.api.base_url = url.clone();
    }
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.logging);

    let client = HttpNerClient::from_config(&config);
    tracing::debug!(base_url = %client.api().base_url, prefix = %client.api().prefix, "Using NER service");

    match cli.command {
        Commands::Predict { text, file, json } => {
            let text = match (text, file) {
                (Some(text), None) => text,
                (None, Some(path)) => {
                    let file = read_text_file(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?;
                    kner_session::file::check_file_type(&file.name, file.media_type.as_deref())?;
                    file.contents
                }
                _ => bail!("provide either TEXT or --file"),
            };
            if text.trim().is_empty() {
                bail!("nothing to analyse: input is blank");
            }

            let result = client.predict(&text).await?;
            let entities = decode(&result.tokens);

            if json {
                let output = json!({
                    "entities": entities,
                    "stats": EntityStats::from_entities(&entities),
                    "processing_time": result.processing_time,
                    "word_count": result.word_count,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                render::print_entities(&entities);
                render::print_summary(&entities, result.processing_time);
            }
        }
        Commands::History { skip, limit, json } => {
            let limit = limit.unwrap_or(config.api.history_page_size);
            let records = client.get_history(skip, limit).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                render::print_history(&records);
            }
        }
        Commands::Health => {
            let health = match client.health().await {
                Ok(health) => health,
                Err(e) if e.is_backend_failure() => {
                    println!("status: unreachable");
                    bail!("service is unreachable: {e}");
                }
                Err(e) => return Err(e.into()),
            };
            println!("status: {}", health.status);
            if let Some(loaded) = health.models_loaded {
                println!("models loaded: {loaded}");
            }
            if let Some(device) = &health.device {
                println!("device: {device}");
            }
            if let Some(error) = &health.error {
                println!("error: {error}");
            }
            if !health.is_healthy() {
                bail!("service is unhealthy");
            }
        }
        Commands::Shell => {
            shell::run(client, config.api.history_page_size).await?;
        }
    }

    Ok(())
}
