//! Classifier server binary
//!
//! Run with: cargo run -p credit-approval --bin credit-approval-server

use credit_approval::{server::ClassifierServer, ClassifierConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_approval=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                 Credit Approval Classifier                ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = ClassifierConfig::load()?;
    let server = ClassifierServer::new(config)?;

    println!("\nServer starting...");
    println!("  Predict: POST http://{}/predict", server.address());
    println!("  Health:  http://{}/health", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
