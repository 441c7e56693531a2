//! Non-conformity (CAPA) endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::events::{notifications, DomainEvent};
use crate::models::{
    format_nc_code, ActionCategory, ActionStatus, CorrectiveAction, NewCorrectiveAction,
    NewNonConformity, NonConformity, NonConformitySource, NonConformityStatus, Severity,
};
use crate::routes::documents::load_user;

/// Request body for opening a non-conformity.
/// Note: in production, actor_id would come from authentication.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenNonConformityRequest {
    pub actor_id: Uuid,
    pub title: String,
    pub description: String,
    pub source: NonConformitySource,
    pub severity: Severity,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub responsible_area: Option<String>,
    #[serde(default)]
    pub responsible_id: Option<Uuid>,
    #[serde(default)]
    pub document_id: Option<Uuid>,
    #[serde(default)]
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
}

/// Request body for updating a non-conformity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNonConformityRequest {
    pub actor_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub status: Option<NonConformityStatus>,
    #[serde(default)]
    pub responsible_area: Option<String>,
    #[serde(default)]
    pub responsible_id: Option<Uuid>,
    #[serde(default)]
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
}

/// Request body for filing a corrective/preventive action.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileActionRequest {
    pub actor_id: Uuid,
    pub category: ActionCategory,
    pub description: String,
    #[serde(default)]
    pub justification: Option<String>,
    pub responsible_id: Uuid,
    #[serde(default)]
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
}

/// Request body for updating an action's status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActionStatusRequest {
    pub actor_id: Uuid,
    pub status: ActionStatus,
}

/// Query filters for the NC list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<NonConformityStatus>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Response for a non-conformity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonConformityResponse {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub source: String,
    pub severity: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_id: Option<Uuid>,
    pub opened_by: Uuid,
    pub opened_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
    pub is_overdue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_to_deadline: Option<i64>,
}

impl NonConformityResponse {
    fn from_nc(nc: NonConformity) -> Self {
        let is_overdue = nc.is_overdue();
        let days_to_deadline = nc.days_to_deadline();
        Self {
            id: nc.id,
            code: nc.code,
            title: nc.title,
            description: nc.description,
            source: nc.source.as_str().to_string(),
            severity: nc.severity.as_str().to_string(),
            status: nc.status.as_str().to_string(),
            responsible_area: nc.responsible_area,
            responsible_id: nc.responsible_id,
            opened_by: nc.opened_by,
            opened_at: nc.opened_at.to_rfc3339(),
            deadline: nc.deadline.map(|d| d.to_rfc3339()),
            closed_at: nc.closed_at.map(|d| d.to_rfc3339()),
            is_overdue,
            days_to_deadline,
        }
    }
}

/// Response for one corrective action.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub id: Uuid,
    pub non_conformity_id: Uuid,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    pub status: String,
    pub responsible_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub is_overdue: bool,
}

impl ActionResponse {
    fn from_action(action: CorrectiveAction) -> Self {
        let is_overdue = action.is_overdue();
        Self {
            id: action.id,
            non_conformity_id: action.non_conformity_id,
            category: action.category.as_str().to_string(),
            description: action.description,
            justification: action.justification,
            status: action.status.as_str().to_string(),
            responsible_id: action.responsible_id,
            deadline: action.deadline.map(|d| d.to_rfc3339()),
            completed_at: action.completed_at.map(|d| d.to_rfc3339()),
            is_overdue,
        }
    }
}

/// Creates the non-conformities router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(list_ncs).post(open_nc))
        .route("/{id}", get(view_nc).put(update_nc))
        .route("/{id}/actions", get(list_actions).post(file_action))
        .route("/actions/{action_id}/status", put(update_action_status))
        .with_state(pool)
}

/// Opens a non-conformity with a yearly-sequential code.
async fn open_nc(
    State(pool): State<PgPool>,
    Json(request): Json<OpenNonConformityRequest>,
) -> Result<Json<NonConformityResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if !actor.can_create_documents() {
        return Err(AppError::Forbidden(
            "You do not have permission to open non-conformities".to_string(),
        ));
    }

    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }
    if let Some(responsible_id) = request.responsible_id {
        load_user(&pool, responsible_id).await?;
    }

    let year = Utc::now().year();
    let mut tx = pool.begin().await?;

    // Yearly sequence: count of codes already issued this year, plus one.
    let issued: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM non_conformities WHERE code LIKE $1",
    )
    .bind(format!("NC-{}-%", year))
    .fetch_one(&mut *tx)
    .await?;

    let new_nc = NewNonConformity {
        code: format_nc_code(year, issued + 1),
        title: request.title,
        description: request.description,
        source: request.source,
        severity: request.severity,
        origin: request.origin,
        responsible_area: request.responsible_area,
        responsible_id: request.responsible_id,
        opened_by: actor.id,
        document_id: request.document_id,
        deadline: request.deadline,
    };

    let nc: NonConformity = sqlx::query_as(
        r#"
        INSERT INTO non_conformities
            (id, code, title, description, source, severity, status, origin,
             responsible_area, responsible_id, opened_by, document_id, opened_at, deadline)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, 'open', $6, $7, $8, $9, $10, NOW(), $11)
        RETURNING id, code, title, description, source, severity, status, origin,
                  responsible_area, responsible_id, opened_by, document_id,
                  opened_at, deadline, closed_at
        "#,
    )
    .bind(&new_nc.code)
    .bind(&new_nc.title)
    .bind(&new_nc.description)
    .bind(new_nc.source)
    .bind(new_nc.severity)
    .bind(&new_nc.origin)
    .bind(&new_nc.responsible_area)
    .bind(new_nc.responsible_id)
    .bind(new_nc.opened_by)
    .bind(new_nc.document_id)
    .bind(new_nc.deadline)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::from_db(e, "A non-conformity with this code already exists"))?;

    tx.commit().await?;

    tracing::info!(nc_id = %nc.id, code = %nc.code, "Non-conformity opened");

    notifications::enqueue(
        &pool,
        &DomainEvent::NonConformityOpened {
            nc_id: nc.id,
            code: nc.code.clone(),
            title: nc.title.clone(),
            responsible_id: nc.responsible_id,
        },
    )
    .await;

    Ok(Json(NonConformityResponse::from_nc(nc)))
}

/// Lists non-conformities, newest first, with optional filters.
async fn list_ncs(
    State(pool): State<PgPool>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<NonConformityResponse>>, AppError> {
    let search = query
        .search
        .as_deref()
        .map(|s| format!("%{}%", s))
        .unwrap_or_else(|| "%".to_string());

    let ncs: Vec<NonConformity> = sqlx::query_as(
        r#"
        SELECT id, code, title, description, source, severity, status, origin,
               responsible_area, responsible_id, opened_by, document_id,
               opened_at, deadline, closed_at
        FROM non_conformities
        WHERE (title ILIKE $1 OR code ILIKE $1 OR description ILIKE $1)
          AND ($2::nc_status IS NULL OR status = $2)
          AND ($3::severity IS NULL OR severity = $3)
        ORDER BY opened_at DESC
        LIMIT 100
        "#,
    )
    .bind(&search)
    .bind(query.status)
    .bind(query.severity)
    .fetch_all(&pool)
    .await?;

    Ok(Json(
        ncs.into_iter().map(NonConformityResponse::from_nc).collect(),
    ))
}

/// Returns one non-conformity.
async fn view_nc(
    State(pool): State<PgPool>,
    Path(nc_id): Path<Uuid>,
) -> Result<Json<NonConformityResponse>, AppError> {
    let nc = load_nc(&pool, nc_id).await?;
    Ok(Json(NonConformityResponse::from_nc(nc)))
}

/// Updates a non-conformity. Closing stamps `closed_at` exactly once;
/// moving away from closed clears it.
async fn update_nc(
    State(pool): State<PgPool>,
    Path(nc_id): Path<Uuid>,
    Json(request): Json<UpdateNonConformityRequest>,
) -> Result<Json<NonConformityResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    let nc = load_nc(&pool, nc_id).await?;

    if !(actor.can_admin() || nc.opened_by == actor.id) {
        return Err(AppError::Forbidden(
            "You do not have permission to edit this non-conformity".to_string(),
        ));
    }

    let next_status = request.status.unwrap_or(nc.status);
    let closed_at = match (next_status, nc.closed_at) {
        // First transition into closed stamps the timestamp.
        (NonConformityStatus::Closed, None) => Some(Utc::now()),
        // Staying closed keeps the original stamp.
        (NonConformityStatus::Closed, existing) => existing,
        // Any other status clears it.
        (_, _) => None,
    };

    let updated: NonConformity = sqlx::query_as(
        r#"
        UPDATE non_conformities
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            severity = COALESCE($4, severity),
            status = $5,
            responsible_area = COALESCE($6, responsible_area),
            responsible_id = COALESCE($7, responsible_id),
            deadline = COALESCE($8, deadline),
            closed_at = $9
        WHERE id = $1
        RETURNING id, code, title, description, source, severity, status, origin,
                  responsible_area, responsible_id, opened_by, document_id,
                  opened_at, deadline, closed_at
        "#,
    )
    .bind(nc.id)
    .bind(&request.title)
    .bind(&request.description)
    .bind(request.severity)
    .bind(next_status)
    .bind(&request.responsible_area)
    .bind(request.responsible_id)
    .bind(request.deadline)
    .bind(closed_at)
    .fetch_one(&pool)
    .await?;

    Ok(Json(NonConformityResponse::from_nc(updated)))
}

/// Files a corrective/preventive action. An open NC advances to
/// in_treatment in the same transaction.
async fn file_action(
    State(pool): State<PgPool>,
    Path(nc_id): Path<Uuid>,
    Json(request): Json<FileActionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if !actor.can_create_documents() {
        return Err(AppError::Forbidden(
            "You do not have permission to file actions".to_string(),
        ));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }

    let nc = load_nc(&pool, nc_id).await?;
    let responsible = load_user(&pool, request.responsible_id).await?;

    let new_action = NewCorrectiveAction {
        non_conformity_id: nc.id,
        category: request.category,
        description: request.description,
        justification: request.justification,
        responsible_id: responsible.id,
        created_by: actor.id,
        deadline: request.deadline,
    };

    let mut tx = pool.begin().await?;

    let action: CorrectiveAction = sqlx::query_as(
        r#"
        INSERT INTO corrective_actions
            (id, non_conformity_id, category, description, justification, status,
             responsible_id, created_by, created_at, deadline)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, 'pending', $5, $6, NOW(), $7)
        RETURNING id, non_conformity_id, category, description, justification, status,
                  responsible_id, created_by, created_at, deadline, completed_at
        "#,
    )
    .bind(new_action.non_conformity_id)
    .bind(new_action.category)
    .bind(&new_action.description)
    .bind(&new_action.justification)
    .bind(new_action.responsible_id)
    .bind(new_action.created_by)
    .bind(new_action.deadline)
    .fetch_one(&mut *tx)
    .await?;

    // Existence of an action advances an open NC to treatment. Triggered
    // once; further actions leave the status alone.
    let next_status = nc.status.after_action_filed();
    if next_status != nc.status {
        sqlx::query("UPDATE non_conformities SET status = $2 WHERE id = $1")
            .bind(nc.id)
            .bind(next_status)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(
        action_id = %action.id,
        nc_id = %nc.id,
        nc_status = next_status.as_str(),
        "Corrective action filed"
    );

    notifications::enqueue(
        &pool,
        &DomainEvent::CorrectiveActionAssigned {
            action_id: action.id,
            nc_id: nc.id,
            nc_code: nc.code.clone(),
            description: action.description.clone(),
            responsible_id: action.responsible_id,
        },
    )
    .await;

    Ok(Json(ActionResponse::from_action(action)))
}

/// Lists a non-conformity's actions, newest first.
async fn list_actions(
    State(pool): State<PgPool>,
    Path(nc_id): Path<Uuid>,
) -> Result<Json<Vec<ActionResponse>>, AppError> {
    let nc = load_nc(&pool, nc_id).await?;

    let actions: Vec<CorrectiveAction> = sqlx::query_as(
        r#"
        SELECT id, non_conformity_id, category, description, justification, status,
               responsible_id, created_by, created_at, deadline, completed_at
        FROM corrective_actions
        WHERE non_conformity_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(nc.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(
        actions.into_iter().map(ActionResponse::from_action).collect(),
    ))
}

/// Updates an action's status. Completion stamps `completed_at`.
async fn update_action_status(
    State(pool): State<PgPool>,
    Path(action_id): Path<Uuid>,
    Json(request): Json<UpdateActionStatusRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;

    let action: CorrectiveAction = sqlx::query_as(
        r#"
        SELECT id, non_conformity_id, category, description, justification, status,
               responsible_id, created_by, created_at, deadline, completed_at
        FROM corrective_actions
        WHERE id = $1
        "#,
    )
    .bind(action_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Action not found".to_string()))?;

    if !(actor.can_admin() || action.responsible_id == actor.id) {
        return Err(AppError::Forbidden(
            "You do not have permission to update this action".to_string(),
        ));
    }

    let completed_at = if request.status == ActionStatus::Completed {
        Some(Utc::now())
    } else {
        action.completed_at
    };

    let updated: CorrectiveAction = sqlx::query_as(
        r#"
        UPDATE corrective_actions
        SET status = $2, completed_at = $3
        WHERE id = $1
        RETURNING id, non_conformity_id, category, description, justification, status,
                  responsible_id, created_by, created_at, deadline, completed_at
        "#,
    )
    .bind(action.id)
    .bind(request.status)
    .bind(completed_at)
    .fetch_one(&pool)
    .await?;

    Ok(Json(ActionResponse::from_action(updated)))
}

/// Loads a non-conformity by ID.
async fn load_nc(pool: &PgPool, id: Uuid) -> Result<NonConformity, AppError> {
    sqlx::query_as::<_, NonConformity>(
        r#"
        SELECT id, code, title, description, source, severity, status, origin,
               responsible_area, responsible_id, opened_by, document_id,
               opened_at, deadline, closed_at
        FROM non_conformities
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Non-conformity not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_request_deserialization() {
        let json = r#"{
            "actorId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516",
            "title": "Unlabeled reagent",
            "description": "Bottle without lot label on bench 4",
            "source": "internal",
            "severity": "high"
        }"#;
        let request: OpenNonConformityRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.source, NonConformitySource::Internal);
        assert_eq!(request.severity, Severity::High);
        assert!(request.responsible_id.is_none());
    }

    #[test]
    fn test_file_action_request_deserialization() {
        let json = r#"{
            "actorId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516",
            "category": "preventive",
            "description": "Add label check to receiving checklist",
            "responsibleId": "0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0"
        }"#;
        let request: FileActionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.category, ActionCategory::Preventive);
        assert!(request.deadline.is_none());
    }

    #[test]
    fn test_nc_response_serialization() {
        let nc = NonConformity {
            id: Uuid::new_v4(),
            code: "NC-2026-0001".to_string(),
            title: "Unlabeled reagent".to_string(),
            description: "Bottle without lot label".to_string(),
            source: NonConformitySource::Internal,
            severity: Severity::High,
            status: NonConformityStatus::Open,
            origin: None,
            responsible_area: None,
            responsible_id: None,
            opened_by: Uuid::new_v4(),
            document_id: None,
            opened_at: Utc::now(),
            deadline: None,
            closed_at: None,
        };

        let json = serde_json::to_string(&NonConformityResponse::from_nc(nc)).unwrap();
        assert!(json.contains("\"code\":\"NC-2026-0001\""));
        assert!(json.contains("\"status\":\"open\""));
        assert!(json.contains("\"severity\":\"high\""));
        assert!(!json.contains("\"closedAt\":"));
    }
}
