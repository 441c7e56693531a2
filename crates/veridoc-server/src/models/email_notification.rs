//! Email notification outbox.
//!
//! Delivery is handled by an external dispatcher; the core's contract ends
//! at inserting a pending outbox row. Rows record attempts and errors so
//! the dispatcher can retry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Kind of notification being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DocumentCreated,
    DocumentExpiringSoon,
    ApprovalPending,
    NonconformityOpened,
    CorrectiveActionAssigned,
}

impl NotificationKind {
    /// Parse a kind from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "document_created" => Some(Self::DocumentCreated),
            "document_expiring_soon" => Some(Self::DocumentExpiringSoon),
            "approval_pending" => Some(Self::ApprovalPending),
            "nonconformity_opened" => Some(Self::NonconformityOpened),
            "corrective_action_assigned" => Some(Self::CorrectiveActionAssigned),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentCreated => "document_created",
            Self::DocumentExpiringSoon => "document_expiring_soon",
            Self::ApprovalPending => "approval_pending",
            Self::NonconformityOpened => "nonconformity_opened",
            Self::CorrectiveActionAssigned => "corrective_action_assigned",
        }
    }
}

/// Delivery status of an outbox row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Error,
}

impl NotificationStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Error => "error",
        }
    }
}

/// One queued notification.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailNotification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
    pub status: NotificationStatus,
    /// Kind of the entity this notification concerns (document, ...).
    pub entity_kind: Option<String>,
    pub entity_id: Option<Uuid>,
    pub attempts: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Data required to queue a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmailNotification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
    pub entity_kind: Option<String>,
    pub entity_id: Option<Uuid>,
}

impl NewEmailNotification {
    pub fn new(
        recipient_id: Uuid,
        kind: NotificationKind,
        subject: String,
        body: String,
        entity_kind: Option<String>,
        entity_id: Option<Uuid>,
    ) -> Self {
        Self {
            recipient_id,
            kind,
            subject,
            body,
            entity_kind,
            entity_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::ApprovalPending).unwrap(),
            "\"approval_pending\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationKind::DocumentExpiringSoon).unwrap(),
            "\"document_expiring_soon\""
        );
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            NotificationKind::from_str("nonconformity_opened"),
            Some(NotificationKind::NonconformityOpened)
        );
        assert_eq!(NotificationKind::from_str("sms"), None);
    }

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(
            NotificationStatus::from_str("error"),
            Some(NotificationStatus::Error)
        );
        assert_eq!(NotificationStatus::Sent.as_str(), "sent");
    }
}
