//! Document type registry endpoints.

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{DocumentType, NewDocumentType};
use crate::routes::documents::load_user;

/// Request body for registering a document type.
/// Note: in production, actor_id would come from authentication.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentTypeRequest {
    pub actor_id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Response for a document type.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub active: bool,
}

impl DocumentTypeResponse {
    fn from_type(document_type: DocumentType) -> Self {
        Self {
            id: document_type.id,
            code: document_type.code,
            name: document_type.name,
            description: document_type.description,
            color: document_type.color,
            icon: document_type.icon,
            active: document_type.active,
        }
    }
}

/// Creates the document types router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(list_types).post(create_type))
        .with_state(pool)
}

/// Registers a document type.
async fn create_type(
    State(pool): State<PgPool>,
    Json(request): Json<CreateDocumentTypeRequest>,
) -> Result<Json<DocumentTypeResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if !actor.can_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can register document types".to_string(),
        ));
    }
    if request.code.trim().is_empty() || request.name.trim().is_empty() {
        return Err(AppError::Validation("Code and name are required".to_string()));
    }

    let mut new_type = NewDocumentType::new(request.code, request.name, actor.id);
    new_type.description = request.description;
    if let Some(color) = request.color {
        new_type.color = color;
    }
    if let Some(icon) = request.icon {
        new_type.icon = icon;
    }

    let document_type: DocumentType = sqlx::query_as(
        r#"
        INSERT INTO document_types
            (id, code, name, description, color, icon, active, created_by, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, TRUE, $6, NOW())
        RETURNING id, code, name, description, color, icon, active, created_by, created_at
        "#,
    )
    .bind(&new_type.code)
    .bind(&new_type.name)
    .bind(&new_type.description)
    .bind(&new_type.color)
    .bind(&new_type.icon)
    .bind(new_type.created_by)
    .fetch_one(&pool)
    .await
    .map_err(|e| AppError::from_db(e, "A document type with this code already exists"))?;

    Ok(Json(DocumentTypeResponse::from_type(document_type)))
}

/// Lists active document types.
async fn list_types(
    State(pool): State<PgPool>,
) -> Result<Json<Vec<DocumentTypeResponse>>, AppError> {
    let types: Vec<DocumentType> = sqlx::query_as(
        r#"
        SELECT id, code, name, description, color, icon, active, created_by, created_at
        FROM document_types
        WHERE active = TRUE
        ORDER BY code
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(
        types.into_iter().map(DocumentTypeResponse::from_type).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{
            "actorId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516",
            "code": "SOP",
            "name": "Standard operating procedure"
        }"#;
        let request: CreateDocumentTypeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.code, "SOP");
        assert!(request.color.is_none());
    }
}
