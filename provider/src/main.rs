use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use speechmatics_plugin_api::{Diagnostics, ObjectValue, ProviderServer};
use speechmatics_provider::SpeechmaticsProvider;
use speechmatics_provider::config::load_provider_block;

/// Environment variable holding the log filter, e.g. `debug` or
/// `speechmatics_provider=trace`.
const LOG_ENV: &str = "SPEECHMATICS_LOG";

/// Speechmatics provider - local harness for the provider lifecycle
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-speechmatics")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Provider block (YAML). Without it, only environment variables are used.
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the provider, resource and data source schemas as JSON
    Schema,

    /// Configure the provider and check the credentials against the API
    Validate,

    /// List transcription jobs through the `speechmatics_jobs` data source
    Jobs {
        /// Maximum number of jobs to return
        #[arg(short = 'l', long = "limit")]
        limit: Option<i64>,

        /// Include deleted jobs
        #[arg(long = "include-deleted")]
        include_deleted: bool,
    },
}

fn provider_block(path: Option<&Path>) -> anyhow::Result<ObjectValue> {
    match path {
        Some(path) => {
            info!("Loading provider block from {}", path.display());
            load_provider_block(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(ObjectValue::new()),
    }
}

fn report(diags: &Diagnostics) -> anyhow::Result<()> {
    for d in diags.iter() {
        eprintln!("{d}");
    }
    if diags.has_error() {
        return Err(anyhow!("{} error(s) reported", diags.errors().count()));
    }
    Ok(())
}

async fn configured_server(
    config: Option<&Path>,
) -> anyhow::Result<ProviderServer<SpeechmaticsProvider>> {
    let server = ProviderServer::new(SpeechmaticsProvider::new(env!("CARGO_PKG_VERSION")));
    let diags = server.configure(provider_block(config)?).await;
    report(&diags).context("provider configuration failed")?;
    Ok(server)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before the environment is read)
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries command output only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schema => {
            let server = ProviderServer::new(SpeechmaticsProvider::new(env!("CARGO_PKG_VERSION")));
            let schemas = json!({
                "provider": server.provider_schema(),
                "resource_schemas": server.resource_schemas(),
                "data_source_schemas": server.data_source_schemas(),
            });
            println!("{}", serde_json::to_string_pretty(&schemas)?);
        }
        Commands::Validate => {
            let server = configured_server(cli.config.as_deref()).await?;
            println!(
                "Provider {} {} configured; credentials accepted.",
                server.metadata().type_name,
                server.metadata().version
            );
        }
        Commands::Jobs {
            limit,
            include_deleted,
        } => {
            let server = configured_server(cli.config.as_deref()).await?;
            let mut query = ObjectValue::new().with("limit", limit);
            if include_deleted {
                query.set("include_deleted", true);
            }
            let result = server
                .read_data_source("speechmatics_jobs", query)
                .await
                .map_err(|diags| {
                    for d in diags.iter() {
                        eprintln!("{d}");
                    }
                    anyhow!("reading speechmatics_jobs failed")
                })?;
            println!("{}", serde_json::to_string_pretty(&result.get("jobs").to_json())?);
        }
    }

    Ok(())
}
