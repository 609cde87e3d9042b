//! Knowledge base maintenance
//!
//! Run with: cargo run -p lpdp-rag --features cli --bin lpdp-rag-admin -- <command>

use anyhow::Context;
use clap::{Parser, Subcommand};
use lpdp_rag::{RagConfig, RagService};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lpdp-rag-admin")]
#[command(about = "Maintain the LPDP assistant's document index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, chunk and index every PDF, JSON and text file in a directory
    Populate {
        /// Directory to scan; defaults to the configured documents path
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Remove all indexed passages
    Depopulate {
        /// Also delete the session checkpoint database
        #[arg(long)]
        sessions: bool,
    },
    /// Print collection statistics
    Stats,
    /// Ask one question and print the answer envelope
    Ask {
        question: String,
        /// Session to record the turn under
        #[arg(short, long)]
        session: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lpdp_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load()?;
    let service = RagService::from_config(&config).context("initializing service")?;

    match cli.command {
        Commands::Populate { dir } => {
            let dir = dir.unwrap_or_else(|| config.retrieval.documents_path.clone());
            let (files, chunks) = service
                .populate_from_dir(&dir)
                .await
                .with_context(|| format!("populating from {}", dir.display()))?;
            println!("Indexed {} files as {} chunks", files, chunks);
            println!("Collection now holds {} passages", service.collection_stats().await?.document_count);
        }
        Commands::Depopulate { sessions } => {
            let removed = service.depopulate().await?;
            println!("Removed {} passages", removed);
            if sessions {
                drop(service);
                let path = &config.sessions.db_path;
                match std::fs::remove_file(path) {
                    Ok(()) => println!("Deleted session database {}", path.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(e).with_context(|| format!("deleting {}", path.display()))
                    }
                }
            }
        }
        Commands::Stats => {
            let stats = service.collection_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Ask { question, session } => {
            let session = session.unwrap_or_else(|| Uuid::new_v4().to_string());
            let envelope = service.answer_envelope(&question, &session).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
    }

    Ok(())
}
