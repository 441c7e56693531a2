//! API routes for the VeriDoc server.

pub mod approvals;
pub mod audits;
pub mod document_types;
pub mod documents;
pub mod equipment;
pub mod nonconformities;
pub mod notifications;
pub mod signatures;

use axum::Router;
use ed25519_dalek::SigningKey;
use sqlx::PgPool;

use self::signatures::SignatureState;

/// Creates the main API router with all routes mounted.
///
/// `signing_key` enables the digital signature tier when present.
pub fn create_router(pool: PgPool, signing_key: Option<SigningKey>) -> Router {
    Router::new().nest("/api/v1", api_v1_routes(pool, signing_key))
}

/// Creates the v1 API routes.
fn api_v1_routes(pool: PgPool, signing_key: Option<SigningKey>) -> Router {
    let signature_state = SignatureState {
        pool: pool.clone(),
        signing_key,
    };

    Router::new()
        .nest("/documents", documents::router(pool.clone()))
        .nest("/document-types", document_types::router(pool.clone()))
        .nest("/approvals", approvals::router(pool.clone()))
        .nest("/nonconformities", nonconformities::router(pool.clone()))
        .nest("/audits", audits::router(pool.clone()))
        .nest("/equipment", equipment::router(pool.clone()))
        .nest("/notifications", notifications::router(pool))
        .nest("/signatures", signatures::router(signature_state))
}
