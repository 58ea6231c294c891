use anyhow::Context;
use tracing::info;

use edge::api::{create_router, AppState};
use edge::database::{DatabaseConfig, DatabaseManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "edge=info,tower_http=debug".to_string()),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Database connection
    let db = DatabaseManager::new(DatabaseConfig::default())
        .await
        .context("Failed to create database pool")?;
    db.test_connection()
        .await
        .context("Database connectivity check failed")?;

    // Build our application with routes
    let state = AppState::new(db.pool().clone());
    let app = create_router(state);

    // Determine port
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting server on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
