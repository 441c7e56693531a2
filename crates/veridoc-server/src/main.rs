//! VeriDoc server binary.

use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use veridoc_server::{create_router, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let bind_addr =
        std::env::var("VERIDOC_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    // Optional Ed25519 seed enabling the digital signature tier.
    let signing_key = match std::env::var("VERIDOC_SIGNING_SEED") {
        Ok(seed) => Some(veridoc_signing::signing_key_from_seed_hex(&seed)?),
        Err(_) => {
            tracing::info!("No signing seed configured; digital signatures disabled");
            None
        }
    };

    let pool = db::create_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let app = create_router(pool, signing_key)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("VeriDoc server listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
