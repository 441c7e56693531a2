//! Document signature endpoints: sign, verify, list, export certificate.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use veridoc_signing::{
    content_hash, hash_matches, sign_certificate, verify_certificate, CertificateEnvelope,
    SignatureCertificate, SignerInfo,
};

use crate::error::AppError;
use crate::models::{
    DocumentSignature, NewDocumentSignature, SignatureKind, VerificationOutcome,
};
use crate::routes::documents::{load_current_version, load_document, load_user};

/// Shared state for signature routes: the pool plus the server's optional
/// Ed25519 key for the digital tier.
#[derive(Clone)]
pub struct SignatureState {
    pub pool: PgPool,
    pub signing_key: Option<SigningKey>,
}

/// Request body for signing a document.
/// Note: in production, signer_id would come from authentication.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub document_id: Uuid,
    pub signer_id: Uuid,
    pub kind: SignatureKind,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Query for listing a document's signatures.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub version: Option<String>,
}

/// Response for a stored signature.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub document_version: String,
    pub signer_id: Uuid,
    pub kind: String,
    pub content_hash: String,
    pub signed_at: String,
    pub valid: bool,
}

impl SignatureResponse {
    fn from_signature(signature: DocumentSignature) -> Self {
        Self {
            id: signature.id,
            document_id: signature.document_id,
            document_version: signature.document_version,
            signer_id: signature.signer_id,
            kind: signature.kind.as_str().to_string(),
            content_hash: signature.content_hash,
            signed_at: signature.signed_at.to_rfc3339(),
            valid: signature.valid,
        }
    }
}

/// Response for a verification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub signature_id: Uuid,
    pub valid: bool,
    pub reason: String,
}

/// Creates the signatures router.
pub fn router(state: SignatureState) -> Router {
    Router::new()
        .route("/", post(sign_document))
        .route("/{id}/verify", post(verify_signature))
        .route("/{id}/certificate", get(export_certificate))
        .route("/document/{document_id}", get(list_signatures))
        .with_state(state)
}

/// Signs the current version of a document.
///
/// One signature per (document, version, signer): duplicates are refused.
/// The content hash is captured at signing time; the digital tier also
/// wraps the certificate payload in an Ed25519 envelope when the server
/// has a signing key configured.
async fn sign_document(
    State(state): State<SignatureState>,
    Json(request): Json<SignRequest>,
) -> Result<Json<SignatureResponse>, AppError> {
    let pool = &state.pool;
    let signer = load_user(pool, request.signer_id).await?;
    let document = load_document(pool, request.document_id).await?;
    let version = load_current_version(pool, &document).await?;

    let hash = content_hash(&version.content);
    let signer_info = SignerInfo {
        signer_id: signer.id,
        signer_name: signer.full_name.clone(),
        signer_email: signer.email.clone(),
        document_code: document.code.clone(),
        document_version: document.current_version.clone(),
        signed_at: Utc::now(),
        ip_address: request.ip_address.clone(),
    };

    let certificate_info = match (&request.kind, &state.signing_key) {
        (SignatureKind::Digital, Some(signing_key)) => {
            let envelope = sign_certificate(signing_key, signer_info, &version.content)
                .map_err(|e| AppError::Internal(format!("Failed to sign certificate: {}", e)))?;
            serde_json::to_value(&envelope)
                .map_err(|e| AppError::Internal(format!("Failed to encode envelope: {}", e)))?
        }
        (SignatureKind::Digital, None) => {
            return Err(AppError::Validation(
                "Digital signatures are not available: no signing key configured".to_string(),
            ))
        }
        _ => serde_json::to_value(&signer_info)
            .map_err(|e| AppError::Internal(format!("Failed to encode certificate: {}", e)))?,
    };

    let new_signature = NewDocumentSignature {
        document_id: document.id,
        document_version: document.current_version.clone(),
        signer_id: signer.id,
        kind: request.kind,
        content_hash: hash,
        certificate_info,
        ip_address: request.ip_address,
    };

    let signature: DocumentSignature = sqlx::query_as(
        r#"
        INSERT INTO document_signatures
            (id, document_id, document_version, signer_id, kind, content_hash,
             certificate_info, ip_address, signed_at, valid)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, NOW(), TRUE)
        RETURNING id, document_id, document_version, signer_id, kind, content_hash,
                  certificate_info, ip_address, signed_at, valid
        "#,
    )
    .bind(new_signature.document_id)
    .bind(&new_signature.document_version)
    .bind(new_signature.signer_id)
    .bind(new_signature.kind)
    .bind(&new_signature.content_hash)
    .bind(&new_signature.certificate_info)
    .bind(&new_signature.ip_address)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        AppError::from_db(e, "This version was already signed by this user")
    })?;

    tracing::info!(
        signature_id = %signature.id,
        document_id = %document.id,
        version = %signature.document_version,
        kind = signature.kind.as_str(),
        "Document signed"
    );

    Ok(Json(SignatureResponse::from_signature(signature)))
}

/// Verifies a stored signature against the current content of the signed
/// version.
///
/// Hash drift flips the stored `valid` flag to false permanently. A
/// missing document or version is reported as its own reason rather than
/// silently treated as invalid.
async fn verify_signature(
    State(state): State<SignatureState>,
    Path(signature_id): Path<Uuid>,
) -> Result<Json<VerifyResponse>, AppError> {
    let pool = &state.pool;
    let signature = load_signature(pool, signature_id).await?;

    let outcome = resolve_outcome(&state, &signature).await?;

    if outcome == VerificationOutcome::ContentChanged && signature.valid {
        // One-way transition: once drift is detected the signature stays
        // invalid.
        sqlx::query("UPDATE document_signatures SET valid = FALSE WHERE id = $1")
            .bind(signature.id)
            .execute(pool)
            .await?;

        tracing::warn!(
            signature_id = %signature.id,
            document_id = %signature.document_id,
            "Signature invalidated: content changed after signing"
        );
    }

    Ok(Json(VerifyResponse {
        signature_id: signature.id,
        valid: outcome.is_valid(),
        reason: outcome.reason().to_string(),
    }))
}

/// Computes the verification outcome without mutating anything.
async fn resolve_outcome(
    state: &SignatureState,
    signature: &DocumentSignature,
) -> Result<VerificationOutcome, AppError> {
    if !signature.valid {
        return Ok(VerificationOutcome::Revoked);
    }

    let document = match load_document(&state.pool, signature.document_id).await {
        Ok(document) => document,
        Err(AppError::NotFound(_)) => return Ok(VerificationOutcome::DocumentMissing),
        Err(e) => return Err(e),
    };

    let version: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT content FROM document_versions
        WHERE document_id = $1 AND version = $2
        "#,
    )
    .bind(document.id)
    .bind(&signature.document_version)
    .fetch_optional(&state.pool)
    .await?;

    let Some((content,)) = version else {
        return Ok(VerificationOutcome::VersionMissing);
    };

    if !hash_matches(&signature.content_hash, &content) {
        return Ok(VerificationOutcome::ContentChanged);
    }

    // Digital signatures additionally carry an Ed25519 envelope over the
    // certificate payload.
    if signature.kind == SignatureKind::Digital {
        if let Some(signing_key) = &state.signing_key {
            let envelope: CertificateEnvelope =
                serde_json::from_value(signature.certificate_info.clone()).map_err(|e| {
                    AppError::Internal(format!("Stored envelope is unreadable: {}", e))
                })?;
            if verify_certificate(&signing_key.verifying_key(), &content, &envelope).is_err() {
                return Ok(VerificationOutcome::EnvelopeInvalid);
            }
        }
    }

    Ok(VerificationOutcome::Valid)
}

/// Lists a document's signatures, newest first, optionally filtered to
/// one version.
async fn list_signatures(
    State(state): State<SignatureState>,
    Path(document_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SignatureResponse>>, AppError> {
    let document = load_document(&state.pool, document_id).await?;

    let signatures: Vec<DocumentSignature> = sqlx::query_as(
        r#"
        SELECT id, document_id, document_version, signer_id, kind, content_hash,
               certificate_info, ip_address, signed_at, valid
        FROM document_signatures
        WHERE document_id = $1
          AND ($2::text IS NULL OR document_version = $2)
        ORDER BY signed_at DESC
        "#,
    )
    .bind(document.id)
    .bind(&query.version)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(
        signatures
            .into_iter()
            .map(SignatureResponse::from_signature)
            .collect(),
    ))
}

/// Exports the certificate of a stored signature for external checks.
async fn export_certificate(
    State(state): State<SignatureState>,
    Path(signature_id): Path<Uuid>,
) -> Result<Json<SignatureCertificate>, AppError> {
    let pool = &state.pool;
    let signature = load_signature(pool, signature_id).await?;
    let document = load_document(pool, signature.document_id).await?;
    let signer = load_user(pool, signature.signer_id).await?;

    Ok(Json(SignatureCertificate {
        signature_id: signature.id,
        document_code: document.code,
        document_title: document.title,
        document_version: signature.document_version,
        signer_name: signer.full_name,
        signer_email: signer.email,
        signed_at: signature.signed_at,
        signature_kind: signature.kind.as_str().to_string(),
        content_hash: signature.content_hash,
        is_valid: signature.valid,
    }))
}

/// Loads a signature by ID.
async fn load_signature(pool: &PgPool, id: Uuid) -> Result<DocumentSignature, AppError> {
    sqlx::query_as::<_, DocumentSignature>(
        r#"
        SELECT id, document_id, document_version, signer_id, kind, content_hash,
               certificate_info, ip_address, signed_at, valid
        FROM document_signatures
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Signature not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_request_deserialization() {
        let json = r#"{
            "documentId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516",
            "signerId": "0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0",
            "kind": "electronic"
        }"#;
        let request: SignRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.kind, SignatureKind::Electronic);
        assert!(request.ip_address.is_none());
    }

    #[test]
    fn test_signature_response_serialization() {
        let signature = DocumentSignature {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            document_version: "1.0".to_string(),
            signer_id: Uuid::new_v4(),
            kind: SignatureKind::Electronic,
            content_hash: "ab".repeat(32),
            certificate_info: serde_json::json!({}),
            ip_address: None,
            signed_at: Utc::now(),
            valid: true,
        };

        let json = serde_json::to_string(&SignatureResponse::from_signature(signature)).unwrap();
        assert!(json.contains("\"documentVersion\":\"1.0\""));
        assert!(json.contains("\"kind\":\"electronic\""));
        assert!(json.contains("\"valid\":true"));
    }

    #[test]
    fn test_verify_response_serialization() {
        let response = VerifyResponse {
            signature_id: Uuid::new_v4(),
            valid: false,
            reason: VerificationOutcome::ContentChanged.reason().to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"valid\":false"));
        assert!(json.contains("content was changed"));
    }
}
