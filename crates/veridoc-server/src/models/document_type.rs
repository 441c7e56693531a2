//! Registered document types.
//!
//! Types are a dynamic registry rather than a fixed enum: quality managers
//! add their own categories with display metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered document type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentType {
    pub id: Uuid,
    /// Unique short code, e.g. "SOP".
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Display color (hex).
    pub color: String,
    /// Display icon identifier.
    pub icon: String,
    pub active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Data required to register a new document type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocumentType {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub created_by: Uuid,
}

impl NewDocumentType {
    pub fn new(code: String, name: String, created_by: Uuid) -> Self {
        Self {
            code,
            name,
            description: None,
            color: "#007bff".to_string(),
            icon: "file-text".to_string(),
            created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_type_defaults() {
        let t = NewDocumentType::new("SOP".to_string(), "Procedure".to_string(), Uuid::new_v4());
        assert_eq!(t.color, "#007bff");
        assert_eq!(t.icon, "file-text");
        assert!(t.description.is_none());
    }
}
