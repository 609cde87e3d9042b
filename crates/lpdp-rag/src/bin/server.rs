//! Assistant server binary
//!
//! Run with: cargo run -p lpdp-rag --bin lpdp-rag-server

use lpdp_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lpdp_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                  LPDP Scholarship Assistant               ║
║          Tool-driven retrieval, per-session memory        ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Vector index: {}", config.vector_db.index_file().display());
    tracing::info!("  - Session backend: {:?}", config.sessions.backend);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    if config.llm.api_key.is_none() {
        tracing::warn!("GROQ_API_KEY is not set; questions will be answered with 503");
    }

    tracing::info!("Checking Ollama at {}...", config.embeddings.base_url);
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/api/tags", config.embeddings.base_url))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => tracing::info!("Ollama is running"),
        _ => {
            tracing::warn!("Ollama not available at {}", config.embeddings.base_url);
            tracing::warn!("  Start it with `ollama serve` and pull {}", config.embeddings.model);
        }
    }

    let server = RagServer::new(config);

    println!("\nServer starting...");
    println!("  Chat:   http://{}/chat", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /chat          - Ask a question");
    println!("  GET  /chat/history  - Session transcript");
    println!("  POST /chat/clear    - Forget the session");
    println!("  GET  /admin/stats   - Collection statistics");
    println!("  POST /admin/upload  - Upload documents");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
