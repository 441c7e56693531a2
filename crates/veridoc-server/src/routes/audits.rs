//! Internal audit endpoints: plan audits, verify checklist items, raise
//! findings, read the conformance percentage.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    conformance_percentage, format_audit_code, Audit, AuditChecklistItem, AuditFinding,
    AuditKind, AuditStatus, ChecklistStatus, FindingKind, FindingStatus, NewAudit, Severity,
};
use crate::routes::documents::load_user;

/// Request body for planning an audit.
/// Note: in production, actor_id would come from authentication.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuditRequest {
    pub actor_id: Uuid,
    pub title: String,
    pub kind: AuditKind,
    pub scope: String,
    #[serde(default)]
    pub objectives: Option<String>,
    #[serde(default)]
    pub audited_area: Option<String>,
    pub lead_auditor_id: Uuid,
}

/// Request body for moving an audit through its lifecycle.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuditStatusRequest {
    pub actor_id: Uuid,
    pub status: AuditStatus,
}

/// Request body for adding a checklist item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChecklistItemRequest {
    pub actor_id: Uuid,
    pub item: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirement: Option<String>,
}

/// Request body for verifying a checklist item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyChecklistItemRequest {
    pub actor_id: Uuid,
    pub status: ChecklistStatus,
    #[serde(default)]
    pub observations: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
}

/// Request body for raising a finding.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFindingRequest {
    pub actor_id: Uuid,
    pub kind: FindingKind,
    pub description: String,
    #[serde(default)]
    pub criterion: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub responsible_id: Option<Uuid>,
}

/// Request body for updating a finding's status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFindingStatusRequest {
    pub actor_id: Uuid,
    pub status: FindingStatus,
}

/// Response for an audit, with the derived conformance percentage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub kind: String,
    pub scope: String,
    pub status: String,
    pub lead_auditor_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_date: Option<String>,
    pub conformance_percentage: f64,
}

impl AuditResponse {
    fn from_audit(audit: Audit, conformance: f64) -> Self {
        Self {
            id: audit.id,
            code: audit.code,
            title: audit.title,
            kind: audit.kind.as_str().to_string(),
            scope: audit.scope,
            status: audit.status.as_str().to_string(),
            lead_auditor_id: audit.lead_auditor_id,
            report_date: audit.report_date.map(|d| d.to_rfc3339()),
            conformance_percentage: conformance,
        }
    }
}

/// Creates the audits router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/", post(create_audit))
        .route("/{id}", get(view_audit))
        .route("/{id}/status", put(update_status))
        .route("/{id}/checklist", post(add_checklist_item))
        .route("/checklist/{item_id}/verify", put(verify_checklist_item))
        .route("/{id}/findings", post(add_finding))
        .route("/findings/{finding_id}/status", put(update_finding_status))
        .with_state(pool)
}

/// Plans a new audit with a yearly-sequential code.
async fn create_audit(
    State(pool): State<PgPool>,
    Json(request): Json<CreateAuditRequest>,
) -> Result<Json<AuditResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if !actor.can_create_documents() {
        return Err(AppError::Forbidden(
            "You do not have permission to plan audits".to_string(),
        ));
    }
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.scope.trim().is_empty() {
        return Err(AppError::Validation("Scope is required".to_string()));
    }
    let lead = load_user(&pool, request.lead_auditor_id).await?;

    let year = Utc::now().year();
    let mut tx = pool.begin().await?;

    let issued: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audits WHERE code LIKE $1")
        .bind(format!("AUD-{}-%", year))
        .fetch_one(&mut *tx)
        .await?;

    let new_audit = NewAudit {
        code: format_audit_code(year, issued + 1),
        title: request.title,
        kind: request.kind,
        scope: request.scope,
        objectives: request.objectives,
        audited_area: request.audited_area,
        lead_auditor_id: lead.id,
        created_by: actor.id,
    };

    let audit: Audit = sqlx::query_as(
        r#"
        INSERT INTO audits
            (id, code, title, kind, scope, objectives, audited_area, status,
             lead_auditor_id, created_by, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, 'planned', $7, $8, NOW())
        RETURNING id, code, title, kind, scope, objectives, audited_area, status,
                  lead_auditor_id, created_by, created_at, started_at, ended_at,
                  report_date
        "#,
    )
    .bind(&new_audit.code)
    .bind(&new_audit.title)
    .bind(new_audit.kind)
    .bind(&new_audit.scope)
    .bind(&new_audit.objectives)
    .bind(&new_audit.audited_area)
    .bind(new_audit.lead_auditor_id)
    .bind(new_audit.created_by)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::from_db(e, "An audit with this code already exists"))?;

    tx.commit().await?;

    tracing::info!(audit_id = %audit.id, code = %audit.code, "Audit planned");

    Ok(Json(AuditResponse::from_audit(audit, 0.0)))
}

/// Returns one audit with its conformance percentage.
async fn view_audit(
    State(pool): State<PgPool>,
    Path(audit_id): Path<Uuid>,
) -> Result<Json<AuditResponse>, AppError> {
    let audit = load_audit(&pool, audit_id).await?;
    let conformance = audit_conformance(&pool, audit.id).await?;
    Ok(Json(AuditResponse::from_audit(audit, conformance)))
}

/// Moves an audit to a new status. First completion stamps the report
/// date; later updates keep the original stamp.
async fn update_status(
    State(pool): State<PgPool>,
    Path(audit_id): Path<Uuid>,
    Json(request): Json<UpdateAuditStatusRequest>,
) -> Result<Json<AuditResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    let audit = load_audit(&pool, audit_id).await?;

    if !(actor.can_create_documents() || audit.lead_auditor_id == actor.id) {
        return Err(AppError::Forbidden(
            "You do not have permission to update this audit".to_string(),
        ));
    }

    let report_date = match (request.status, audit.report_date) {
        (AuditStatus::Completed, None) => Some(Utc::now()),
        (_, existing) => existing,
    };
    let started_at = match (request.status, audit.started_at) {
        (AuditStatus::InProgress, None) => Some(Utc::now()),
        (_, existing) => existing,
    };

    let updated: Audit = sqlx::query_as(
        r#"
        UPDATE audits
        SET status = $2, report_date = $3, started_at = $4
        WHERE id = $1
        RETURNING id, code, title, kind, scope, objectives, audited_area, status,
                  lead_auditor_id, created_by, created_at, started_at, ended_at,
                  report_date
        "#,
    )
    .bind(audit.id)
    .bind(request.status)
    .bind(report_date)
    .bind(started_at)
    .fetch_one(&pool)
    .await?;

    let conformance = audit_conformance(&pool, updated.id).await?;
    Ok(Json(AuditResponse::from_audit(updated, conformance)))
}

/// Adds a checklist item in pending state.
async fn add_checklist_item(
    State(pool): State<PgPool>,
    Path(audit_id): Path<Uuid>,
    Json(request): Json<AddChecklistItemRequest>,
) -> Result<Json<AuditChecklistItem>, AppError> {
    load_user(&pool, request.actor_id).await?;
    let audit = load_audit(&pool, audit_id).await?;

    if request.item.trim().is_empty() {
        return Err(AppError::Validation("Item text is required".to_string()));
    }

    let item: AuditChecklistItem = sqlx::query_as(
        r#"
        INSERT INTO audit_checklist_items
            (id, audit_id, item, description, requirement, status)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, 'pending')
        RETURNING id, audit_id, item, description, requirement, status,
                  observations, evidence, verified_by, verified_at
        "#,
    )
    .bind(audit.id)
    .bind(&request.item)
    .bind(&request.description)
    .bind(&request.requirement)
    .fetch_one(&pool)
    .await?;

    Ok(Json(item))
}

/// Records a verification verdict for one checklist item.
async fn verify_checklist_item(
    State(pool): State<PgPool>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<VerifyChecklistItemRequest>,
) -> Result<Json<AuditChecklistItem>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;

    let item: AuditChecklistItem = sqlx::query_as(
        r#"
        UPDATE audit_checklist_items
        SET status = $2, observations = $3, evidence = $4,
            verified_by = $5, verified_at = NOW()
        WHERE id = $1
        RETURNING id, audit_id, item, description, requirement, status,
                  observations, evidence, verified_by, verified_at
        "#,
    )
    .bind(item_id)
    .bind(request.status)
    .bind(&request.observations)
    .bind(&request.evidence)
    .bind(actor.id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Checklist item not found".to_string()))?;

    Ok(Json(item))
}

/// Raises a finding against an audit.
async fn add_finding(
    State(pool): State<PgPool>,
    Path(audit_id): Path<Uuid>,
    Json(request): Json<AddFindingRequest>,
) -> Result<Json<AuditFinding>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    let audit = load_audit(&pool, audit_id).await?;

    if request.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }

    let finding: AuditFinding = sqlx::query_as(
        r#"
        INSERT INTO audit_findings
            (id, audit_id, kind, description, criterion, evidence, severity,
             status, identified_by, responsible_id, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, 'open', $7, $8, NOW())
        RETURNING id, audit_id, kind, description, criterion, evidence, severity,
                  status, identified_by, responsible_id, created_at
        "#,
    )
    .bind(audit.id)
    .bind(request.kind)
    .bind(&request.description)
    .bind(&request.criterion)
    .bind(&request.evidence)
    .bind(request.severity)
    .bind(actor.id)
    .bind(request.responsible_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(finding))
}

/// Updates a finding's status.
async fn update_finding_status(
    State(pool): State<PgPool>,
    Path(finding_id): Path<Uuid>,
    Json(request): Json<UpdateFindingStatusRequest>,
) -> Result<Json<AuditFinding>, AppError> {
    load_user(&pool, request.actor_id).await?;

    let finding: AuditFinding = sqlx::query_as(
        r#"
        UPDATE audit_findings
        SET status = $2
        WHERE id = $1
        RETURNING id, audit_id, kind, description, criterion, evidence, severity,
                  status, identified_by, responsible_id, created_at
        "#,
    )
    .bind(finding_id)
    .bind(request.status)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Finding not found".to_string()))?;

    Ok(Json(finding))
}

/// Loads an audit by ID.
async fn load_audit(pool: &PgPool, id: Uuid) -> Result<Audit, AppError> {
    sqlx::query_as::<_, Audit>(
        r#"
        SELECT id, code, title, kind, scope, objectives, audited_area, status,
               lead_auditor_id, created_by, created_at, started_at, ended_at,
               report_date
        FROM audits
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Audit not found".to_string()))
}

/// Derived conformance percentage over the audit's checklist.
async fn audit_conformance(pool: &PgPool, audit_id: Uuid) -> Result<f64, AppError> {
    let statuses: Vec<ChecklistStatus> = sqlx::query_scalar(
        "SELECT status FROM audit_checklist_items WHERE audit_id = $1",
    )
    .bind(audit_id)
    .fetch_all(pool)
    .await?;

    Ok(conformance_percentage(&statuses))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{
            "actorId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516",
            "title": "Annual internal audit",
            "kind": "internal",
            "scope": "Production and receiving",
            "leadAuditorId": "0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0"
        }"#;
        let request: CreateAuditRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.kind, AuditKind::Internal);
        assert!(request.objectives.is_none());
    }

    #[test]
    fn test_verify_item_request_deserialization() {
        let json = r#"{
            "actorId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516",
            "status": "not_applicable",
            "observations": "Line is decommissioned"
        }"#;
        let request: VerifyChecklistItemRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.status, ChecklistStatus::NotApplicable);
    }

    #[test]
    fn test_audit_response_serialization() {
        let audit = Audit {
            id: Uuid::new_v4(),
            code: "AUD-2026-0003".to_string(),
            title: "Annual internal audit".to_string(),
            kind: AuditKind::Internal,
            scope: "Production".to_string(),
            objectives: None,
            audited_area: None,
            status: AuditStatus::InProgress,
            lead_auditor_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            ended_at: None,
            report_date: None,
        };

        let json = serde_json::to_string(&AuditResponse::from_audit(audit, 66.7)).unwrap();
        assert!(json.contains("\"code\":\"AUD-2026-0003\""));
        assert!(json.contains("\"status\":\"in_progress\""));
        assert!(json.contains("\"conformancePercentage\":66.7"));
        assert!(!json.contains("\"reportDate\":"));
    }
}
