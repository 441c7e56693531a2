//! Domain events and their consumers.
//!
//! Aggregates never reach into unrelated entities from their write path.
//! Instead each operation emits `DomainEvent`s, consumed two ways:
//!
//! - [`reactions::apply`] runs inside the owning transaction for reactions
//!   that maintain cross-entity state (equipment rescheduling). A failure
//!   rolls back with the transaction.
//! - [`notifications::enqueue`] runs after commit and inserts outbox rows
//!   for the external email dispatcher. It is fire-and-forget: failures
//!   are logged and never affect the committed transition.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{NewEmailNotification, NotificationKind, ServiceKind};

/// Events raised by core operations.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A document was created in draft.
    DocumentCreated {
        document_id: Uuid,
        code: String,
        title: String,
        /// Users to notify (quality managers and administrators).
        recipients: Vec<Uuid>,
    },
    /// A document's validity date is approaching.
    DocumentExpiringSoon {
        document_id: Uuid,
        code: String,
        title: String,
        recipient_id: Uuid,
        days_left: i64,
    },
    /// An approval slot was assigned and awaits its approver.
    ApprovalPending {
        document_id: Uuid,
        code: String,
        title: String,
        approver_id: Uuid,
    },
    /// A non-conformity was opened.
    NonConformityOpened {
        nc_id: Uuid,
        code: String,
        title: String,
        /// The assigned responsible, when one was set at opening.
        responsible_id: Option<Uuid>,
    },
    /// A corrective/preventive action was filed and assigned.
    CorrectiveActionAssigned {
        action_id: Uuid,
        nc_id: Uuid,
        nc_code: String,
        description: String,
        responsible_id: Uuid,
    },
    /// A calibration/maintenance service completed with a follow-up date.
    ServiceCompleted {
        equipment_id: Uuid,
        kind: ServiceKind,
        next_service_at: Option<DateTime<Utc>>,
    },
}

impl DomainEvent {
    /// Outbox rows this event fans out to. Empty for events that only
    /// drive in-transaction reactions.
    pub fn notifications(&self) -> Vec<NewEmailNotification> {
        match self {
            DomainEvent::DocumentCreated {
                document_id,
                code,
                title,
                recipients,
            } => recipients
                .iter()
                .map(|recipient_id| {
                    NewEmailNotification::new(
                        *recipient_id,
                        NotificationKind::DocumentCreated,
                        format!("New document {}", code),
                        format!("Document \"{}\" ({}) was created.", title, code),
                        Some("document".to_string()),
                        Some(*document_id),
                    )
                })
                .collect(),
            DomainEvent::DocumentExpiringSoon {
                document_id,
                code,
                title,
                recipient_id,
                days_left,
            } => vec![NewEmailNotification::new(
                *recipient_id,
                NotificationKind::DocumentExpiringSoon,
                format!("Document {} expires in {} days", code, days_left),
                format!(
                    "Document \"{}\" ({}) expires in {} days. Review or revise it.",
                    title, code, days_left
                ),
                Some("document".to_string()),
                Some(*document_id),
            )],
            DomainEvent::ApprovalPending {
                document_id,
                code,
                title,
                approver_id,
            } => vec![NewEmailNotification::new(
                *approver_id,
                NotificationKind::ApprovalPending,
                format!("Approval pending: {}", code),
                format!(
                    "Document \"{}\" ({}) awaits your review and approval.",
                    title, code
                ),
                Some("document".to_string()),
                Some(*document_id),
            )],
            DomainEvent::NonConformityOpened {
                nc_id,
                code,
                title,
                responsible_id,
            } => responsible_id
                .map(|recipient_id| {
                    NewEmailNotification::new(
                        recipient_id,
                        NotificationKind::NonconformityOpened,
                        format!("Non-conformity {} opened", code),
                        format!(
                            "Non-conformity \"{}\" ({}) was opened and assigned to you.",
                            title, code
                        ),
                        Some("non_conformity".to_string()),
                        Some(*nc_id),
                    )
                })
                .into_iter()
                .collect(),
            DomainEvent::CorrectiveActionAssigned {
                action_id,
                nc_code,
                description,
                responsible_id,
                ..
            } => vec![NewEmailNotification::new(
                *responsible_id,
                NotificationKind::CorrectiveActionAssigned,
                format!("Action assigned under {}", nc_code),
                format!(
                    "You were assigned an action under {}: {}",
                    nc_code, description
                ),
                Some("corrective_action".to_string()),
                Some(*action_id),
            )],
            DomainEvent::ServiceCompleted { .. } => Vec::new(),
        }
    }
}

pub mod reactions {
    //! In-transaction reactions to domain events.

    use super::DomainEvent;
    use crate::error::AppError;

    /// Applies state-coupling reactions for one event within the caller's
    /// transaction.
    pub async fn apply(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event: &DomainEvent,
    ) -> Result<(), AppError> {
        match event {
            DomainEvent::ServiceCompleted {
                equipment_id,
                kind,
                next_service_at: Some(next_due),
            } if kind.reschedules_equipment() => {
                let query = if *kind == crate::models::ServiceKind::Calibration {
                    "UPDATE equipment SET next_calibration_at = $2 WHERE id = $1"
                } else {
                    "UPDATE equipment SET next_maintenance_at = $2 WHERE id = $1"
                };
                sqlx::query(query)
                    .bind(equipment_id)
                    .bind(next_due)
                    .execute(&mut **tx)
                    .await?;

                tracing::debug!(
                    equipment_id = %equipment_id,
                    kind = kind.as_str(),
                    next_due = %next_due,
                    "Rescheduled equipment from completed service"
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

pub mod notifications {
    //! Post-commit notification fan-out (outbox inserts).

    use chrono::Utc;
    use sqlx::PgPool;
    use uuid::Uuid;

    use super::DomainEvent;
    use crate::error::AppError;
    use crate::models::NewEmailNotification;

    /// Queues the outbox rows for one event. Best-effort: insert failures
    /// are logged and swallowed so they never unwind a committed
    /// transition.
    pub async fn enqueue(pool: &PgPool, event: &DomainEvent) {
        for notification in event.notifications() {
            if let Err(e) = insert(pool, &notification).await {
                tracing::warn!(
                    kind = notification.kind.as_str(),
                    recipient_id = %notification.recipient_id,
                    "Failed to queue notification: {}",
                    e
                );
            }
        }
    }

    /// Queues expiry warnings for documents whose validity date falls
    /// within the next `within_days` days. Returns how many rows were
    /// queued.
    pub async fn enqueue_expiry_warnings(
        pool: &PgPool,
        within_days: i64,
    ) -> Result<u64, AppError> {
        let horizon = Utc::now() + chrono::Duration::days(within_days);

        let expiring: Vec<(Uuid, String, String, Uuid, chrono::DateTime<Utc>)> =
            sqlx::query_as(
                r#"
                SELECT id, code, title, author_id, validity_date
                FROM documents
                WHERE active = TRUE
                  AND validity_date IS NOT NULL
                  AND validity_date > NOW()
                  AND validity_date <= $1
                "#,
            )
            .bind(horizon)
            .fetch_all(pool)
            .await?;

        let mut queued = 0;
        for (document_id, code, title, author_id, validity_date) in expiring {
            let days_left = (validity_date - Utc::now()).num_days();
            let event = DomainEvent::DocumentExpiringSoon {
                document_id,
                code,
                title,
                recipient_id: author_id,
                days_left,
            };
            for notification in event.notifications() {
                insert(pool, &notification).await?;
                queued += 1;
            }
        }
        Ok(queued)
    }

    async fn insert(pool: &PgPool, notification: &NewEmailNotification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO email_notifications
                (id, recipient_id, kind, subject, body, status, entity_kind, entity_id,
                 attempts, created_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, 'pending', $5, $6, 0, NOW())
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.kind)
        .bind(&notification.subject)
        .bind(&notification.body)
        .bind(&notification.entity_kind)
        .bind(notification.entity_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;

    #[test]
    fn test_approval_pending_targets_approver() {
        let approver_id = Uuid::new_v4();
        let event = DomainEvent::ApprovalPending {
            document_id: Uuid::new_v4(),
            code: "SOP-2026-AAAA1111".to_string(),
            title: "Incoming inspection".to_string(),
            approver_id,
        };

        let rows = event.notifications();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recipient_id, approver_id);
        assert_eq!(rows[0].kind, NotificationKind::ApprovalPending);
        assert!(rows[0].subject.contains("SOP-2026-AAAA1111"));
    }

    #[test]
    fn test_document_created_fans_out_to_all_recipients() {
        let recipients = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let event = DomainEvent::DocumentCreated {
            document_id: Uuid::new_v4(),
            code: "POL-2026-BBBB2222".to_string(),
            title: "Data retention policy".to_string(),
            recipients: recipients.clone(),
        };

        let rows = event.notifications();
        assert_eq!(rows.len(), 3);
        for (row, recipient) in rows.iter().zip(&recipients) {
            assert_eq!(row.recipient_id, *recipient);
            assert_eq!(row.kind, NotificationKind::DocumentCreated);
        }
    }

    #[test]
    fn test_nc_opened_without_responsible_queues_nothing() {
        let event = DomainEvent::NonConformityOpened {
            nc_id: Uuid::new_v4(),
            code: "NC-2026-0004".to_string(),
            title: "Missing label".to_string(),
            responsible_id: None,
        };
        assert!(event.notifications().is_empty());
    }

    #[test]
    fn test_service_completed_is_reaction_only() {
        let event = DomainEvent::ServiceCompleted {
            equipment_id: Uuid::new_v4(),
            kind: ServiceKind::Calibration,
            next_service_at: Some(Utc::now()),
        };
        assert!(event.notifications().is_empty());
    }
}
