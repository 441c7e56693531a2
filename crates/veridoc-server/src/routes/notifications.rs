//! Notification outbox endpoints.
//!
//! Delivery belongs to the external dispatcher; these endpoints expose the
//! queue and run the expiry sweep that feeds document_expiring_soon rows.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::events::notifications;
use crate::models::{EmailNotification, NotificationStatus};

/// Query for listing outbox rows.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<NotificationStatus>,
    #[serde(default)]
    pub recipient_id: Option<Uuid>,
}

/// Request body for the expiry sweep.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirySweepRequest {
    /// Queue warnings for documents expiring within this many days.
    pub within_days: i64,
}

/// Response for the expiry sweep.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirySweepResponse {
    pub queued: u64,
}

/// Response for one outbox row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: String,
    pub subject: String,
    pub status: String,
    pub attempts: i32,
    pub created_at: String,
}

impl NotificationResponse {
    fn from_notification(notification: EmailNotification) -> Self {
        Self {
            id: notification.id,
            recipient_id: notification.recipient_id,
            kind: notification.kind.as_str().to_string(),
            subject: notification.subject,
            status: notification.status.as_str().to_string(),
            attempts: notification.attempts,
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}

/// Creates the notifications router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/expiry-sweep", post(run_expiry_sweep))
        .with_state(pool)
}

/// Lists outbox rows, newest first.
async fn list_notifications(
    State(pool): State<PgPool>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let rows: Vec<EmailNotification> = sqlx::query_as(
        r#"
        SELECT id, recipient_id, kind, subject, body, status, entity_kind, entity_id,
               attempts, error_message, created_at, sent_at
        FROM email_notifications
        WHERE ($1::notification_status IS NULL OR status = $1)
          AND ($2::uuid IS NULL OR recipient_id = $2)
        ORDER BY created_at DESC
        LIMIT 100
        "#,
    )
    .bind(query.status)
    .bind(query.recipient_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(NotificationResponse::from_notification)
            .collect(),
    ))
}

/// Queues expiry warnings for documents nearing their validity date.
async fn run_expiry_sweep(
    State(pool): State<PgPool>,
    Json(request): Json<ExpirySweepRequest>,
) -> Result<Json<ExpirySweepResponse>, AppError> {
    if request.within_days <= 0 {
        return Err(AppError::Validation(
            "withinDays must be positive".to_string(),
        ));
    }

    let queued = notifications::enqueue_expiry_warnings(&pool, request.within_days).await?;

    tracing::info!(queued = queued, within_days = request.within_days, "Expiry sweep ran");

    Ok(Json(ExpirySweepResponse { queued }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use chrono::Utc;

    #[test]
    fn test_notification_response_serialization() {
        let notification = EmailNotification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            kind: NotificationKind::ApprovalPending,
            subject: "Approval pending: SOP-2026-AAAA1111".to_string(),
            body: "Document awaits your approval".to_string(),
            status: NotificationStatus::Pending,
            entity_kind: Some("document".to_string()),
            entity_id: Some(Uuid::new_v4()),
            attempts: 0,
            error_message: None,
            created_at: Utc::now(),
            sent_at: None,
        };

        let json =
            serde_json::to_string(&NotificationResponse::from_notification(notification))
                .unwrap();
        assert!(json.contains("\"kind\":\"approval_pending\""));
        assert!(json.contains("\"status\":\"pending\""));
        assert!(json.contains("\"attempts\":0"));
    }

    #[test]
    fn test_sweep_request_deserialization() {
        let json = r#"{"withinDays": 30}"#;
        let request: ExpirySweepRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.within_days, 30);
    }
}
