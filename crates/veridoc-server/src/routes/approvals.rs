//! Approval workflow endpoints.
//!
//! Each flow row resolves through a compare-and-swap on `status =
//! 'pending'`, and the join-barrier check (zero pending left -> document
//! approved) happens in the same transaction. Two concurrent resolutions
//! of the same row cannot both succeed, and two final approvals cannot
//! both observe "one pending left".

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ApprovalFlow, ApprovalStatus, DocumentStatus};
use crate::routes::documents::load_user;

/// Request body for resolving an approval flow.
/// Note: in production, actor_id would come from authentication.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    /// ID of the acting approver.
    pub actor_id: Uuid,
    /// Approver comments. Optional on approve, mandatory on reject.
    #[serde(default)]
    pub comments: Option<String>,
}

/// Query for listing an approver's pending queue.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuery {
    pub approver_id: Uuid,
}

/// Response for one approval flow row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalFlowResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub approver_id: Uuid,
    pub stage: String,
    pub status: String,
    pub order_index: i32,
    pub assigned_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub is_overdue: bool,
}

impl ApprovalFlowResponse {
    fn from_flow(flow: ApprovalFlow) -> Self {
        let is_overdue = flow.is_overdue();
        Self {
            id: flow.id,
            document_id: flow.document_id,
            approver_id: flow.approver_id,
            stage: flow.stage.as_str().to_string(),
            status: flow.status.as_str().to_string(),
            order_index: flow.order_index,
            assigned_at: flow.assigned_at.to_rfc3339(),
            completed_at: flow.completed_at.map(|d| d.to_rfc3339()),
            comments: flow.comments,
            deadline: flow.deadline.map(|d| d.to_rfc3339()),
            is_overdue,
        }
    }
}

/// Response for a resolved decision.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub success: bool,
    pub flow_id: Uuid,
    pub document_id: Uuid,
    /// Document status after the decision.
    pub document_status: String,
    pub message: String,
}

/// Creates the approvals router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/pending", get(list_pending))
        .route("/{id}", get(view_flow))
        .route("/{id}/approve", post(approve))
        .route("/{id}/reject", post(reject))
        .with_state(pool)
}

/// Lists an approver's pending flows, newest assignment first.
async fn list_pending(
    State(pool): State<PgPool>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<ApprovalFlowResponse>>, AppError> {
    let flows: Vec<ApprovalFlow> = sqlx::query_as(
        r#"
        SELECT id, document_id, approver_id, stage, status, order_index,
               assigned_at, completed_at, comments, deadline
        FROM approval_flows
        WHERE approver_id = $1 AND status = 'pending'
        ORDER BY assigned_at DESC
        "#,
    )
    .bind(query.approver_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(
        flows
            .into_iter()
            .map(ApprovalFlowResponse::from_flow)
            .collect(),
    ))
}

/// Returns one approval flow row.
async fn view_flow(
    State(pool): State<PgPool>,
    Path(flow_id): Path<Uuid>,
) -> Result<Json<ApprovalFlowResponse>, AppError> {
    let flow = load_flow(&pool, flow_id).await?;
    Ok(Json(ApprovalFlowResponse::from_flow(flow)))
}

/// Approves one flow row. When the last pending row clears, the document
/// advances to approved in the same transaction.
async fn approve(
    State(pool): State<PgPool>,
    Path(flow_id): Path<Uuid>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<DecisionResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    let flow = load_flow(&pool, flow_id).await?;

    if flow.approver_id != actor.id {
        return Err(AppError::Forbidden(
            "Only the assigned approver can resolve this flow".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    // Compare-and-swap: resolves only if still pending. A concurrent
    // resolution makes this return no row.
    let resolved: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE approval_flows
        SET status = 'approved', completed_at = NOW(), comments = $2
        WHERE id = $1 AND status = 'pending'
        RETURNING id
        "#,
    )
    .bind(flow.id)
    .bind(&request.comments)
    .fetch_optional(&mut *tx)
    .await?;

    if resolved.is_none() {
        tx.rollback().await?;
        return Err(AppError::AlreadyProcessed(format!(
            "This approval was already processed (status: {})",
            current_status(&pool, flow.id).await?.as_str()
        )));
    }

    let pending_left: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM approval_flows
        WHERE document_id = $1 AND status = 'pending'
        "#,
    )
    .bind(flow.document_id)
    .fetch_one(&mut *tx)
    .await?;

    let document_status = if pending_left == 0 {
        sqlx::query(
            r#"
            UPDATE documents
            SET status = 'approved', last_revision_date = NOW()
            WHERE id = $1
            "#,
        )
        .bind(flow.document_id)
        .execute(&mut *tx)
        .await?;
        DocumentStatus::Approved
    } else {
        DocumentStatus::InReview
    };

    tx.commit().await?;

    tracing::info!(
        flow_id = %flow.id,
        document_id = %flow.document_id,
        pending_left = pending_left,
        "Approval recorded"
    );

    let message = if document_status == DocumentStatus::Approved {
        "Approval recorded; all approvals cleared, document is approved".to_string()
    } else {
        format!("Approval recorded; {} approval(s) still pending", pending_left)
    };

    Ok(Json(DecisionResponse {
        success: true,
        flow_id: flow.id,
        document_id: flow.document_id,
        document_status: document_status.as_str().to_string(),
        message,
    }))
}

/// Rejects one flow row. The document drops back to draft and every
/// sibling pending row is cancelled in the same transaction.
async fn reject(
    State(pool): State<PgPool>,
    Path(flow_id): Path<Uuid>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<DecisionResponse>, AppError> {
    // Rejection requires a reason before any row is touched.
    let comments = match request.comments.as_deref().map(str::trim) {
        Some(comments) if !comments.is_empty() => comments.to_string(),
        _ => {
            return Err(AppError::Validation(
                "A rejection reason is required".to_string(),
            ))
        }
    };

    let actor = load_user(&pool, request.actor_id).await?;
    let flow = load_flow(&pool, flow_id).await?;

    if flow.approver_id != actor.id {
        return Err(AppError::Forbidden(
            "Only the assigned approver can resolve this flow".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let resolved: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE approval_flows
        SET status = 'rejected', completed_at = NOW(), comments = $2
        WHERE id = $1 AND status = 'pending'
        RETURNING id
        "#,
    )
    .bind(flow.id)
    .bind(&comments)
    .fetch_optional(&mut *tx)
    .await?;

    if resolved.is_none() {
        tx.rollback().await?;
        return Err(AppError::AlreadyProcessed(format!(
            "This approval was already processed (status: {})",
            current_status(&pool, flow.id).await?.as_str()
        )));
    }

    sqlx::query("UPDATE documents SET status = 'draft' WHERE id = $1")
        .bind(flow.document_id)
        .execute(&mut *tx)
        .await?;

    // A single rejection resets the whole round: every sibling still
    // pending is cancelled.
    let cancelled = sqlx::query(
        r#"
        UPDATE approval_flows
        SET status = 'cancelled', completed_at = NOW()
        WHERE document_id = $1 AND status = 'pending'
        "#,
    )
    .bind(flow.document_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        flow_id = %flow.id,
        document_id = %flow.document_id,
        siblings_cancelled = cancelled.rows_affected(),
        "Rejection recorded, document returned to draft"
    );

    Ok(Json(DecisionResponse {
        success: true,
        flow_id: flow.id,
        document_id: flow.document_id,
        document_status: DocumentStatus::Draft.as_str().to_string(),
        message: format!(
            "Document rejected and returned to the author; {} sibling approval(s) cancelled",
            cancelled.rows_affected()
        ),
    }))
}

/// Loads an approval flow by ID.
async fn load_flow(pool: &PgPool, id: Uuid) -> Result<ApprovalFlow, AppError> {
    sqlx::query_as::<_, ApprovalFlow>(
        r#"
        SELECT id, document_id, approver_id, stage, status, order_index,
               assigned_at, completed_at, comments, deadline
        FROM approval_flows
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Approval flow not found".to_string()))
}

/// Current status of a flow row, for the already-processed message.
async fn current_status(pool: &PgPool, id: Uuid) -> Result<ApprovalStatus, AppError> {
    let status: ApprovalStatus =
        sqlx::query_scalar("SELECT status FROM approval_flows WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApprovalStage;
    use chrono::Utc;

    #[test]
    fn test_resolve_request_deserialization() {
        let json = r#"{
            "actorId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516",
            "comments": "Looks complete"
        }"#;
        let request: ResolveRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.comments.as_deref(), Some("Looks complete"));
    }

    #[test]
    fn test_resolve_request_without_comments() {
        let json = r#"{"actorId": "7f0c0e9a-b9e5-4c6c-9d0e-111213141516"}"#;
        let request: ResolveRequest = serde_json::from_str(json).unwrap();
        assert!(request.comments.is_none());
    }

    #[test]
    fn test_flow_response_serialization() {
        let flow = ApprovalFlow {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            approver_id: Uuid::new_v4(),
            stage: ApprovalStage::Approval,
            status: ApprovalStatus::Pending,
            order_index: 2,
            assigned_at: Utc::now(),
            completed_at: None,
            comments: None,
            deadline: None,
        };

        let json = serde_json::to_string(&ApprovalFlowResponse::from_flow(flow)).unwrap();
        assert!(json.contains("\"stage\":\"approval\""));
        assert!(json.contains("\"status\":\"pending\""));
        assert!(json.contains("\"orderIndex\":2"));
        assert!(json.contains("\"isOverdue\":false"));
        assert!(!json.contains("\"completedAt\":"));
    }

    #[test]
    fn test_decision_response_serialization() {
        let response = DecisionResponse {
            success: true,
            flow_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            document_status: "approved".to_string(),
            message: "Approval recorded; all approvals cleared, document is approved"
                .to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"documentStatus\":\"approved\""));
    }
}
