//! User model and role-based capabilities.
//!
//! Authentication and session handling live outside this service; handlers
//! receive an explicit actor id and load the row to check capabilities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Role assigned to a user, gating what they may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full administrative access.
    Administrator,
    /// Manages the quality system: documents, NCs, audits, equipment.
    QualityManager,
    /// May resolve approval flows assigned to them.
    ApproverReviewer,
    /// Read-only participant; confirms document readings.
    ContributorReader,
    /// Conducts audits.
    Auditor,
}

impl UserRole {
    /// Parse a role from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "administrator" => Some(Self::Administrator),
            "quality_manager" => Some(Self::QualityManager),
            "approver_reviewer" => Some(Self::ApproverReviewer),
            "contributor_reader" => Some(Self::ContributorReader),
            "auditor" => Some(Self::Auditor),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::QualityManager => "quality_manager",
            Self::ApproverReviewer => "approver_reviewer",
            Self::ContributorReader => "contributor_reader",
            Self::Auditor => "auditor",
        }
    }
}

/// Represents a user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique identifier for this user.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Role gating capabilities.
    pub role: UserRole,
    /// Whether the account is active.
    pub active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this user may create documents and non-conformities.
    pub fn can_create_documents(&self) -> bool {
        matches!(self.role, UserRole::Administrator | UserRole::QualityManager)
    }

    /// Whether this user may resolve approval flows.
    pub fn can_approve_documents(&self) -> bool {
        matches!(
            self.role,
            UserRole::Administrator | UserRole::QualityManager | UserRole::ApproverReviewer
        )
    }

    /// Whether this user has administrative access.
    pub fn can_admin(&self) -> bool {
        self.role == UserRole::Administrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            full_name: "J. Doe".to_string(),
            role,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&UserRole::QualityManager).unwrap(),
            "\"quality_manager\""
        );
        assert_eq!(
            serde_json::to_string(&UserRole::Auditor).unwrap(),
            "\"auditor\""
        );
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(
            UserRole::from_str("approver_reviewer"),
            Some(UserRole::ApproverReviewer)
        );
        assert_eq!(UserRole::from_str("superuser"), None);
    }

    #[test]
    fn test_create_capability() {
        assert!(user_with_role(UserRole::Administrator).can_create_documents());
        assert!(user_with_role(UserRole::QualityManager).can_create_documents());
        assert!(!user_with_role(UserRole::ApproverReviewer).can_create_documents());
        assert!(!user_with_role(UserRole::ContributorReader).can_create_documents());
    }

    #[test]
    fn test_approve_capability() {
        assert!(user_with_role(UserRole::ApproverReviewer).can_approve_documents());
        assert!(user_with_role(UserRole::QualityManager).can_approve_documents());
        assert!(!user_with_role(UserRole::Auditor).can_approve_documents());
    }

    #[test]
    fn test_admin_capability() {
        assert!(user_with_role(UserRole::Administrator).can_admin());
        assert!(!user_with_role(UserRole::QualityManager).can_admin());
    }
}
