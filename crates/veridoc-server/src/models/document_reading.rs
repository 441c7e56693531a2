//! Read-confirmation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Confirmation that a user read one version of a document.
/// At most one row exists per (document, user, version).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentReading {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    /// Version label that was read.
    pub version_read: String,
    pub read_at: DateTime<Utc>,
    pub ip_address: Option<String>,
}
