//! Document model and lifecycle status machine.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Lifecycle status of a controlled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "document_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Being authored; content mutates freely.
    Draft,
    /// Submitted; pending approval flows exist.
    InReview,
    /// All approval flows cleared; content is immutable.
    Approved,
    /// Retired from use.
    Obsolete,
}

impl DocumentStatus {
    /// Parse a status from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "in_review" => Some(Self::InReview),
            "approved" => Some(Self::Approved),
            "obsolete" => Some(Self::Obsolete),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Obsolete => "obsolete",
        }
    }

    /// Whether content edits are permitted in this status.
    ///
    /// Approved content is immutable: any change goes through a new
    /// version. Obsolete documents are frozen outright.
    pub fn allows_edit(&self) -> bool {
        matches!(self, Self::Draft | Self::InReview)
    }

    /// Whether the document may be submitted for approval.
    pub fn allows_submission(&self) -> bool {
        *self == Self::Draft
    }
}

/// Represents a controlled document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Unique identifier for this document.
    pub id: Uuid,
    /// Unique human-readable code, e.g. `SOP-2026-4F2A91BC`.
    pub code: String,
    /// Document title.
    pub title: String,
    /// Semantic type tag (procedure, policy, work instruction, ...).
    pub kind: String,
    /// Optional link to a registered document type.
    pub document_type_id: Option<Uuid>,
    /// Current lifecycle status.
    pub status: DocumentStatus,
    /// Label of the active version; always references an existing
    /// version row for this document.
    pub current_version: String,
    /// Owning department.
    pub department: Option<String>,
    /// Search keywords.
    pub keywords: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// ID of the author (creator).
    pub author_id: Uuid,
    /// Date after which the document counts as expired.
    pub validity_date: Option<DateTime<Utc>>,
    /// When the content last changed.
    pub last_revision_date: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub active: bool,
    /// When this document was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub code: String,
    pub title: String,
    pub kind: String,
    pub document_type_id: Option<Uuid>,
    pub department: Option<String>,
    pub keywords: Option<String>,
    pub summary: Option<String>,
    pub author_id: Uuid,
    pub validity_date: Option<DateTime<Utc>>,
}

impl Document {
    /// Check if the document's validity date has passed.
    pub fn is_expired(&self) -> bool {
        match self.validity_date {
            Some(validity) => Utc::now() > validity,
            None => false,
        }
    }

    /// Signed number of days until expiry (negative after expiry).
    /// None when no validity date is set.
    pub fn days_to_expire(&self) -> Option<i64> {
        self.validity_date
            .map(|validity| (validity - Utc::now()).num_days())
    }
}

impl NewDocument {
    /// Create a new document input, generating its unique code.
    pub fn new(
        title: String,
        kind: String,
        author_id: Uuid,
        department: Option<String>,
        keywords: Option<String>,
        summary: Option<String>,
        document_type_id: Option<Uuid>,
        validity_date: Option<DateTime<Utc>>,
    ) -> Self {
        let code = generate_document_code(&kind);
        Self {
            code,
            title,
            kind,
            document_type_id,
            department,
            keywords,
            summary,
            author_id,
            validity_date,
        }
    }
}

/// Version label that is created first, and changelog it carries.
pub const INITIAL_VERSION: &str = "1.0";

/// Generates a document code of the form `{KIND}-{YEAR}-{8 hex chars}`.
pub fn generate_document_code(kind: &str) -> String {
    let token = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format_document_code(kind, Utc::now().year(), &token)
}

/// Formats a document code from its parts.
pub fn format_document_code(kind: &str, year: i32, token: &str) -> String {
    format!("{}-{}-{}", kind.to_uppercase(), year, token)
}

/// Computes the label of the next version: current + 0.1, one decimal.
///
/// None when the current label is not numeric.
pub fn next_version_label(current: &str) -> Option<String> {
    let numeric: f64 = current.parse().ok()?;
    Some(format!("{:.1}", numeric + 0.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_document(status: DocumentStatus) -> Document {
        Document {
            id: Uuid::new_v4(),
            code: "SOP-2026-4F2A91BC".to_string(),
            title: "Incoming inspection".to_string(),
            kind: "sop".to_string(),
            document_type_id: None,
            status,
            current_version: "1.0".to_string(),
            department: Some("Quality".to_string()),
            keywords: None,
            summary: None,
            author_id: Uuid::new_v4(),
            validity_date: None,
            last_revision_date: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&DocumentStatus::InReview).unwrap(),
            "\"in_review\""
        );
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Obsolete).unwrap(),
            "\"obsolete\""
        );
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(DocumentStatus::from_str("draft"), Some(DocumentStatus::Draft));
        assert_eq!(
            DocumentStatus::from_str("in_review"),
            Some(DocumentStatus::InReview)
        );
        assert_eq!(DocumentStatus::from_str("retired"), None);
    }

    #[test]
    fn test_edit_allowed_only_before_approval() {
        assert!(DocumentStatus::Draft.allows_edit());
        assert!(DocumentStatus::InReview.allows_edit());
        assert!(!DocumentStatus::Approved.allows_edit());
        assert!(!DocumentStatus::Obsolete.allows_edit());
    }

    #[test]
    fn test_submission_only_from_draft() {
        assert!(DocumentStatus::Draft.allows_submission());
        assert!(!DocumentStatus::InReview.allows_submission());
        assert!(!DocumentStatus::Approved.allows_submission());
    }

    #[test]
    fn test_next_version_label() {
        assert_eq!(next_version_label("1.0").as_deref(), Some("1.1"));
        assert_eq!(next_version_label("1.3").as_deref(), Some("1.4"));
        assert_eq!(next_version_label("2.9").as_deref(), Some("3.0"));
        assert_eq!(next_version_label("not-a-number"), None);
    }

    #[test]
    fn test_document_code_format() {
        let code = format_document_code("sop", 2026, "4F2A91BC");
        assert_eq!(code, "SOP-2026-4F2A91BC");

        let generated = generate_document_code("policy");
        assert!(generated.starts_with("POLICY-"));
        let token = generated.rsplit('-').next().unwrap();
        assert_eq!(token.len(), 8);
    }

    #[test]
    fn test_expiry_queries() {
        let mut document = sample_document(DocumentStatus::Approved);
        assert!(!document.is_expired());
        assert_eq!(document.days_to_expire(), None);

        document.validity_date = Some(Utc::now() + Duration::days(30));
        assert!(!document.is_expired());
        let days = document.days_to_expire().unwrap();
        assert!((29..=30).contains(&days));

        document.validity_date = Some(Utc::now() - Duration::days(3));
        assert!(document.is_expired());
        assert!(document.days_to_expire().unwrap() < 0);
    }

    #[test]
    fn test_new_document_generates_code() {
        let input = NewDocument::new(
            "Supplier audits".to_string(),
            "procedure".to_string(),
            Uuid::new_v4(),
            None,
            None,
            None,
            None,
            None,
        );
        assert!(input.code.starts_with("PROCEDURE-"));
    }
}
