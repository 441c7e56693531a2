//! Document lifecycle endpoints: create, edit, submit for approval,
//! restore versions, obsolete, read confirmations.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::events::{notifications, DomainEvent};
use crate::models::{
    next_version_label, ApprovalStage, Document, DocumentStatus, DocumentVersion,
    NewApprovalFlow, NewDocument, NewDocumentVersion, User, INITIAL_VERSION,
};

/// Request body for creating a document.
/// Note: in production, actor_id would come from authentication.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    /// ID of the acting user.
    pub actor_id: Uuid,
    pub title: String,
    /// Semantic type tag (procedure, policy, work instruction, ...).
    pub kind: String,
    #[serde(default)]
    pub document_type_id: Option<Uuid>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Initial content of version 1.0.
    pub content: String,
    #[serde(default)]
    pub validity_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Request body for editing a document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDocumentRequest {
    pub actor_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub validity_date: Option<chrono::DateTime<chrono::Utc>>,
    /// Replacement content for the active draft version.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub changelog: Option<String>,
}

/// Request body for submitting a document for approval.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitForApprovalRequest {
    pub actor_id: Uuid,
    /// Approvers in the configured order. Must be non-empty.
    pub approver_ids: Vec<Uuid>,
    /// Stage tag for the created flow rows. Defaults to approval.
    #[serde(default)]
    pub stage: Option<ApprovalStage>,
    #[serde(default)]
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
}

/// Request body carrying only the acting user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRequest {
    pub actor_id: Uuid,
}

/// Query filters for the document list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
}

/// Response for a document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub kind: String,
    pub status: String,
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub author_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_date: Option<String>,
    pub is_expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_to_expire: Option<i64>,
    pub created_at: String,
}

impl DocumentResponse {
    fn from_document(document: Document) -> Self {
        let is_expired = document.is_expired();
        let days_to_expire = document.days_to_expire();
        Self {
            id: document.id,
            code: document.code,
            title: document.title,
            kind: document.kind,
            status: document.status.as_str().to_string(),
            current_version: document.current_version,
            department: document.department,
            keywords: document.keywords,
            summary: document.summary,
            author_id: document.author_id,
            validity_date: document.validity_date.map(|d| d.to_rfc3339()),
            is_expired,
            days_to_expire,
            created_at: document.created_at.to_rfc3339(),
        }
    }
}

/// Response for one version row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub id: Uuid,
    pub version: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    pub created_by: Uuid,
    pub created_at: String,
}

impl VersionResponse {
    fn from_version(version: DocumentVersion) -> Self {
        Self {
            id: version.id,
            version: version.version,
            content: version.content,
            changelog: version.changelog,
            created_by: version.created_by,
            created_at: version.created_at.to_rfc3339(),
        }
    }
}

/// Response for viewing a document with its active version.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentViewResponse {
    #[serde(flatten)]
    pub document: DocumentResponse,
    pub current_content: VersionResponse,
}

/// Response for submission: the created approval flow rows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitForApprovalResponse {
    pub document_id: Uuid,
    pub document_status: String,
    pub flow_ids: Vec<Uuid>,
}

/// Response for a read confirmation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmReadingResponse {
    pub confirmed: bool,
    pub message: String,
}

/// Creates the documents router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(list_documents).post(create_document))
        .route("/{id}", get(view_document).put(edit_document))
        .route("/{id}/submit", post(submit_for_approval))
        .route("/{id}/restore/{version_id}", post(restore_version))
        .route("/{id}/obsolete", post(mark_obsolete))
        .route("/{id}/confirm-reading", post(confirm_reading))
        .route("/{id}/readings", get(list_readings))
        .route("/{id}/versions", get(list_versions))
        .with_state(pool)
}

/// Creates a document in draft with its initial version, atomically.
async fn create_document(
    State(pool): State<PgPool>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if !actor.can_create_documents() {
        return Err(AppError::Forbidden(
            "You do not have permission to create documents".to_string(),
        ));
    }

    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("Content is required".to_string()));
    }
    if request.kind.trim().is_empty() {
        return Err(AppError::Validation("Document kind is required".to_string()));
    }

    let new_document = NewDocument::new(
        request.title,
        request.kind,
        actor.id,
        request.department,
        request.keywords,
        request.summary,
        request.document_type_id,
        request.validity_date,
    );

    let mut tx = pool.begin().await?;

    let document: Document = sqlx::query_as(
        r#"
        INSERT INTO documents
            (id, code, title, kind, document_type_id, status, current_version,
             department, keywords, summary, author_id, validity_date, active, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, 'draft', $5, $6, $7, $8, $9, $10, TRUE, NOW())
        RETURNING id, code, title, kind, document_type_id, status, current_version,
                  department, keywords, summary, author_id, validity_date,
                  last_revision_date, active, created_at
        "#,
    )
    .bind(&new_document.code)
    .bind(&new_document.title)
    .bind(&new_document.kind)
    .bind(new_document.document_type_id)
    .bind(INITIAL_VERSION)
    .bind(&new_document.department)
    .bind(&new_document.keywords)
    .bind(&new_document.summary)
    .bind(new_document.author_id)
    .bind(new_document.validity_date)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::from_db(e, "A document with this code already exists"))?;

    let initial = NewDocumentVersion::initial(document.id, request.content, actor.id);
    sqlx::query(
        r#"
        INSERT INTO document_versions
            (id, document_id, version, content, changelog, created_by, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, NOW())
        "#,
    )
    .bind(initial.document_id)
    .bind(&initial.version)
    .bind(&initial.content)
    .bind(&initial.changelog)
    .bind(initial.created_by)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        document_id = %document.id,
        code = %document.code,
        author_id = %actor.id,
        "Document created"
    );

    let recipients = quality_recipients(&pool).await.unwrap_or_default();
    notifications::enqueue(
        &pool,
        &DomainEvent::DocumentCreated {
            document_id: document.id,
            code: document.code.clone(),
            title: document.title.clone(),
            recipients,
        },
    )
    .await;

    Ok(Json(DocumentResponse::from_document(document)))
}

/// Lists active documents, newest first, with optional filters.
async fn list_documents(
    State(pool): State<PgPool>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let search = query
        .search
        .as_deref()
        .map(|s| format!("%{}%", s))
        .unwrap_or_else(|| "%".to_string());

    let documents: Vec<Document> = sqlx::query_as(
        r#"
        SELECT id, code, title, kind, document_type_id, status, current_version,
               department, keywords, summary, author_id, validity_date,
               last_revision_date, active, created_at
        FROM documents
        WHERE active = TRUE
          AND (title ILIKE $1 OR code ILIKE $1 OR COALESCE(keywords, '') ILIKE $1)
          AND ($2::text IS NULL OR kind = $2)
          AND ($3::document_status IS NULL OR status = $3)
        ORDER BY created_at DESC
        LIMIT 100
        "#,
    )
    .bind(&search)
    .bind(&query.kind)
    .bind(query.status)
    .fetch_all(&pool)
    .await?;

    Ok(Json(
        documents
            .into_iter()
            .map(DocumentResponse::from_document)
            .collect(),
    ))
}

/// Returns a document with its active version content.
async fn view_document(
    State(pool): State<PgPool>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentViewResponse>, AppError> {
    let document = load_document(&pool, document_id).await?;
    let version = load_current_version(&pool, &document).await?;

    Ok(Json(DocumentViewResponse {
        document: DocumentResponse::from_document(document),
        current_content: VersionResponse::from_version(version),
    }))
}

/// Edits document metadata and the active draft version's content.
///
/// Approved content is immutable: the edit is refused and the caller is
/// told to create a new version instead.
async fn edit_document(
    State(pool): State<PgPool>,
    Path(document_id): Path<Uuid>,
    Json(request): Json<EditDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    let document = load_document(&pool, document_id).await?;

    if !(actor.can_create_documents() || document.author_id == actor.id) {
        return Err(AppError::Forbidden(
            "You do not have permission to edit this document".to_string(),
        ));
    }

    if !document.status.allows_edit() {
        return Err(AppError::Validation(format!(
            "Documents in status '{}' cannot be edited directly. Create a new version instead",
            document.status.as_str()
        )));
    }

    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }
    }
    if let Some(content) = &request.content {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Content cannot be empty".to_string()));
        }
    }

    let mut tx = pool.begin().await?;

    let updated: Document = sqlx::query_as(
        r#"
        UPDATE documents
        SET title = COALESCE($2, title),
            department = COALESCE($3, department),
            keywords = COALESCE($4, keywords),
            summary = COALESCE($5, summary),
            validity_date = COALESCE($6, validity_date),
            last_revision_date = NOW()
        WHERE id = $1
        RETURNING id, code, title, kind, document_type_id, status, current_version,
                  department, keywords, summary, author_id, validity_date,
                  last_revision_date, active, created_at
        "#,
    )
    .bind(document.id)
    .bind(&request.title)
    .bind(&request.department)
    .bind(&request.keywords)
    .bind(&request.summary)
    .bind(request.validity_date)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(content) = &request.content {
        sqlx::query(
            r#"
            UPDATE document_versions
            SET content = $3, changelog = COALESCE($4, changelog)
            WHERE document_id = $1 AND version = $2
            "#,
        )
        .bind(document.id)
        .bind(&document.current_version)
        .bind(content)
        .bind(&request.changelog)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(Json(DocumentResponse::from_document(updated)))
}

/// Submits a draft for approval, creating one pending flow row per
/// approver in the given order.
async fn submit_for_approval(
    State(pool): State<PgPool>,
    Path(document_id): Path<Uuid>,
    Json(request): Json<SubmitForApprovalRequest>,
) -> Result<Json<SubmitForApprovalResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if request.approver_ids.is_empty() {
        return Err(AppError::Validation(
            "At least one approver is required".to_string(),
        ));
    }

    let document = load_document(&pool, document_id).await?;
    if !(actor.can_create_documents() || document.author_id == actor.id) {
        return Err(AppError::Forbidden(
            "You do not have permission to submit this document".to_string(),
        ));
    }
    if !document.status.allows_submission() {
        return Err(AppError::Validation(format!(
            "Only draft documents can be submitted (status: {})",
            document.status.as_str()
        )));
    }

    // Every approver must exist, be active, and hold approval capability.
    for approver_id in &request.approver_ids {
        let approver = load_user(&pool, *approver_id).await?;
        if !approver.active || !approver.can_approve_documents() {
            return Err(AppError::Validation(format!(
                "User {} cannot approve documents",
                approver.username
            )));
        }
    }

    let stage = request.stage.unwrap_or(ApprovalStage::Approval);
    let flows = NewApprovalFlow::for_submission(
        document.id,
        &request.approver_ids,
        stage,
        request.deadline,
    );

    let mut tx = pool.begin().await?;

    let mut flow_ids = Vec::with_capacity(flows.len());
    for flow in &flows {
        let flow_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO approval_flows
                (id, document_id, approver_id, stage, status, order_index,
                 assigned_at, deadline)
            VALUES (gen_random_uuid(), $1, $2, $3, 'pending', $4, NOW(), $5)
            RETURNING id
            "#,
        )
        .bind(flow.document_id)
        .bind(flow.approver_id)
        .bind(flow.stage)
        .bind(flow.order_index)
        .bind(flow.deadline)
        .fetch_one(&mut *tx)
        .await?;
        flow_ids.push(flow_id);
    }

    sqlx::query("UPDATE documents SET status = 'in_review' WHERE id = $1")
        .bind(document.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        document_id = %document.id,
        approvers = flow_ids.len(),
        "Document submitted for approval"
    );

    for approver_id in &request.approver_ids {
        notifications::enqueue(
            &pool,
            &DomainEvent::ApprovalPending {
                document_id: document.id,
                code: document.code.clone(),
                title: document.title.clone(),
                approver_id: *approver_id,
            },
        )
        .await;
    }

    Ok(Json(SubmitForApprovalResponse {
        document_id: document.id,
        document_status: DocumentStatus::InReview.as_str().to_string(),
        flow_ids,
    }))
}

/// Restores a historical version as a new version.
async fn restore_version(
    State(pool): State<PgPool>,
    Path((document_id, version_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<VersionResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    let document = load_document(&pool, document_id).await?;

    if !(actor.can_create_documents() || document.author_id == actor.id) {
        return Err(AppError::Forbidden(
            "You do not have permission to restore versions".to_string(),
        ));
    }

    let source: DocumentVersion = sqlx::query_as(
        r#"
        SELECT id, document_id, version, content, changelog, created_by, created_at
        FROM document_versions
        WHERE id = $1
        "#,
    )
    .bind(version_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Version not found".to_string()))?;

    if source.document_id != document.id {
        return Err(AppError::NotFound(
            "Version does not belong to this document".to_string(),
        ));
    }

    let next_version = next_version_label(&document.current_version).ok_or_else(|| {
        AppError::Validation(format!(
            "Current version '{}' is not numeric",
            document.current_version
        ))
    })?;

    let restored = NewDocumentVersion::restored_from(
        document.id,
        next_version.clone(),
        &source,
        actor.id,
    );

    let mut tx = pool.begin().await?;

    let version: DocumentVersion = sqlx::query_as(
        r#"
        INSERT INTO document_versions
            (id, document_id, version, content, changelog, created_by, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, NOW())
        RETURNING id, document_id, version, content, changelog, created_by, created_at
        "#,
    )
    .bind(restored.document_id)
    .bind(&restored.version)
    .bind(&restored.content)
    .bind(&restored.changelog)
    .bind(restored.created_by)
    .fetch_one(&mut *tx)
    .await?;

    // Content changed, so an approved document drops back to draft.
    if document.status == DocumentStatus::Approved {
        sqlx::query(
            r#"
            UPDATE documents
            SET current_version = $2, last_revision_date = NOW(), status = 'draft'
            WHERE id = $1
            "#,
        )
        .bind(document.id)
        .bind(&next_version)
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query(
            r#"
            UPDATE documents
            SET current_version = $2, last_revision_date = NOW()
            WHERE id = $1
            "#,
        )
        .bind(document.id)
        .bind(&next_version)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        document_id = %document.id,
        restored_from = %source.version,
        new_version = %next_version,
        "Version restored"
    );

    Ok(Json(VersionResponse::from_version(version)))
}

/// Manually retires a document.
async fn mark_obsolete(
    State(pool): State<PgPool>,
    Path(document_id): Path<Uuid>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if !actor.can_create_documents() {
        return Err(AppError::Forbidden(
            "You do not have permission to obsolete documents".to_string(),
        ));
    }

    let document = load_document(&pool, document_id).await?;
    if document.status == DocumentStatus::Obsolete {
        return Err(AppError::AlreadyProcessed(
            "Document is already obsolete".to_string(),
        ));
    }

    let updated: Document = sqlx::query_as(
        r#"
        UPDATE documents
        SET status = 'obsolete'
        WHERE id = $1
        RETURNING id, code, title, kind, document_type_id, status, current_version,
                  department, keywords, summary, author_id, validity_date,
                  last_revision_date, active, created_at
        "#,
    )
    .bind(document.id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(DocumentResponse::from_document(updated)))
}

/// Records a read confirmation for the current version, once.
async fn confirm_reading(
    State(pool): State<PgPool>,
    Path(document_id): Path<Uuid>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<ConfirmReadingResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    let document = load_document(&pool, document_id).await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO document_readings
            (id, document_id, user_id, version_read, read_at)
        VALUES (gen_random_uuid(), $1, $2, $3, NOW())
        ON CONFLICT (document_id, user_id, version_read) DO NOTHING
        "#,
    )
    .bind(document.id)
    .bind(actor.id)
    .bind(&document.current_version)
    .execute(&pool)
    .await?;

    if inserted.rows_affected() == 0 {
        return Ok(Json(ConfirmReadingResponse {
            confirmed: false,
            message: "Reading already confirmed for this version".to_string(),
        }));
    }

    Ok(Json(ConfirmReadingResponse {
        confirmed: true,
        message: "Reading confirmed".to_string(),
    }))
}

/// Response for one read confirmation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingResponse {
    pub user_id: Uuid,
    pub version_read: String,
    pub read_at: String,
}

/// Read confirmations for a document, newest first.
async fn list_readings(
    State(pool): State<PgPool>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Vec<ReadingResponse>>, AppError> {
    let document = load_document(&pool, document_id).await?;

    let readings: Vec<crate::models::DocumentReading> = sqlx::query_as(
        r#"
        SELECT id, document_id, user_id, version_read, read_at, ip_address
        FROM document_readings
        WHERE document_id = $1
        ORDER BY read_at DESC
        "#,
    )
    .bind(document.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(
        readings
            .into_iter()
            .map(|reading| ReadingResponse {
                user_id: reading.user_id,
                version_read: reading.version_read,
                read_at: reading.read_at.to_rfc3339(),
            })
            .collect(),
    ))
}

/// Version history, newest first.
async fn list_versions(
    State(pool): State<PgPool>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Vec<VersionResponse>>, AppError> {
    let document = load_document(&pool, document_id).await?;

    let versions: Vec<DocumentVersion> = sqlx::query_as(
        r#"
        SELECT id, document_id, version, content, changelog, created_by, created_at
        FROM document_versions
        WHERE document_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(document.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(
        versions
            .into_iter()
            .map(VersionResponse::from_version)
            .collect(),
    ))
}

/// Loads a document by ID.
pub(crate) async fn load_document(pool: &PgPool, id: Uuid) -> Result<Document, AppError> {
    sqlx::query_as::<_, Document>(
        r#"
        SELECT id, code, title, kind, document_type_id, status, current_version,
               department, keywords, summary, author_id, validity_date,
               last_revision_date, active, created_at
        FROM documents
        WHERE id = $1 AND active = TRUE
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
}

/// Loads a user by ID.
pub(crate) async fn load_user(pool: &PgPool, id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, full_name, role, active, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Loads the version row the document's current_version label points at.
pub(crate) async fn load_current_version(
    pool: &PgPool,
    document: &Document,
) -> Result<DocumentVersion, AppError> {
    sqlx::query_as::<_, DocumentVersion>(
        r#"
        SELECT id, document_id, version, content, changelog, created_by, created_at
        FROM document_versions
        WHERE document_id = $1 AND version = $2
        "#,
    )
    .bind(document.id)
    .bind(&document.current_version)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Current version not found".to_string()))
}

/// Active users who should hear about new documents.
async fn quality_recipients(pool: &PgPool) -> Result<Vec<Uuid>, AppError> {
    let ids: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM users
        WHERE active = TRUE AND role IN ('administrator', 'quality_manager')
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_response() -> DocumentResponse {
        DocumentResponse {
            id: Uuid::new_v4(),
            code: "SOP-2026-4F2A91BC".to_string(),
            title: "Incoming inspection".to_string(),
            kind: "sop".to_string(),
            status: "draft".to_string(),
            current_version: "1.0".to_string(),
            department: Some("Quality".to_string()),
            keywords: None,
            summary: None,
            author_id: Uuid::new_v4(),
            validity_date: None,
            is_expired: false,
            days_to_expire: None,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_document_response_serialization() {
        let json = serde_json::to_string(&sample_response()).unwrap();
        assert!(json.contains("\"currentVersion\":\"1.0\""));
        assert!(json.contains("\"status\":\"draft\""));
        assert!(json.contains("\"isExpired\":false"));
        // None fields are omitted entirely.
        assert!(!json.contains("\"keywords\":"));
        assert!(!json.contains("\"daysToExpire\":"));
    }

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{
            "actorId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516",
            "title": "Calibration procedure",
            "kind": "procedure",
            "content": "1. Scope ..."
        }"#;
        let request: CreateDocumentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.title, "Calibration procedure");
        assert_eq!(request.kind, "procedure");
        assert!(request.validity_date.is_none());
        assert!(request.department.is_none());
    }

    #[test]
    fn test_submit_request_requires_approver_list_field() {
        let json = r#"{
            "actorId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516",
            "approverIds": []
        }"#;
        let request: SubmitForApprovalRequest = serde_json::from_str(json).unwrap();
        assert!(request.approver_ids.is_empty());
        assert!(request.stage.is_none());
    }

    #[test]
    fn test_view_response_flattens_document() {
        let response = DocumentViewResponse {
            document: sample_response(),
            current_content: VersionResponse {
                id: Uuid::new_v4(),
                version: "1.0".to_string(),
                content: "1. Scope ...".to_string(),
                changelog: Some("Initial version".to_string()),
                created_by: Uuid::new_v4(),
                created_at: Utc::now().to_rfc3339(),
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"code\":\"SOP-2026-4F2A91BC\""));
        assert!(json.contains("\"currentContent\":"));
        assert!(json.contains("\"changelog\":\"Initial version\""));
    }
}
