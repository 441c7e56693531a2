//! Document version model.
//!
//! A version is one content snapshot of a document. Draft content mutates
//! its current version row in place; once the document is approved the row
//! is never rewritten, and later changes allocate a new version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Represents one content snapshot of a document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentVersion {
    /// Unique identifier for this version.
    pub id: Uuid,
    /// Owning document; rows cascade-delete with it.
    pub document_id: Uuid,
    /// Version label, e.g. "1.0".
    pub version: String,
    /// Full content of this snapshot.
    pub content: String,
    /// What changed relative to the previous version.
    pub changelog: Option<String>,
    /// ID of the user who created this version.
    pub created_by: Uuid,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new version row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocumentVersion {
    pub document_id: Uuid,
    pub version: String,
    pub content: String,
    pub changelog: Option<String>,
    pub created_by: Uuid,
}

impl NewDocumentVersion {
    /// First version of a freshly created document.
    pub fn initial(document_id: Uuid, content: String, created_by: Uuid) -> Self {
        Self {
            document_id,
            version: crate::models::INITIAL_VERSION.to_string(),
            content,
            changelog: Some("Initial version".to_string()),
            created_by,
        }
    }

    /// New version carrying content restored from a historical version.
    pub fn restored_from(
        document_id: Uuid,
        next_version: String,
        source: &DocumentVersion,
        created_by: Uuid,
    ) -> Self {
        Self {
            document_id,
            version: next_version,
            content: source.content.clone(),
            changelog: Some(format!("Restored version {}", source.version)),
            created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_version() {
        let document_id = Uuid::new_v4();
        let version =
            NewDocumentVersion::initial(document_id, "content".to_string(), Uuid::new_v4());
        assert_eq!(version.version, "1.0");
        assert_eq!(version.changelog.as_deref(), Some("Initial version"));
    }

    #[test]
    fn test_restored_version_copies_content() {
        let document_id = Uuid::new_v4();
        let source = DocumentVersion {
            id: Uuid::new_v4(),
            document_id,
            version: "1.0".to_string(),
            content: "original wording".to_string(),
            changelog: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let restored = NewDocumentVersion::restored_from(
            document_id,
            "1.4".to_string(),
            &source,
            Uuid::new_v4(),
        );
        assert_eq!(restored.version, "1.4");
        assert_eq!(restored.content, "original wording");
        assert_eq!(restored.changelog.as_deref(), Some("Restored version 1.0"));
    }
}
