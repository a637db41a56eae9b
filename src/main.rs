//! FraudGuard - Main Entry Point

use clap::{Parser, Subcommand};
use fraudguard::pipeline::{ModelSlot, TrainingPipeline};
use fraudguard::server::run_server;
use fraudguard::Settings;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fraudguard", about = "Fraud detection training and serving", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Train a model from a dataset file without starting the server
    Train {
        /// Path to a CSV, JSON, or Parquet dataset
        #[arg(long)]
        data: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fraudguard=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::default();

    match cli.command {
        Some(Commands::Train { data }) => {
            let content = std::fs::read(&data)?;
            let pipeline = TrainingPipeline::new(settings, Arc::new(ModelSlot::new()));
            let report = tokio::task::spawn_blocking(move || {
                pipeline.run_upload(&data, &content)
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            run_server(settings).await?;
        }
        None => run_server(settings).await?,
    }

    Ok(())
}
