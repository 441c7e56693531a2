//! Corrective/preventive action model (the "CAPA" in CAPA tracking).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Category of a remediation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "action_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    /// Removes the cause of an existing non-conformity.
    Corrective,
    /// Prevents a potential non-conformity from occurring.
    Preventive,
}

impl ActionCategory {
    /// Parse a category from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "corrective" => Some(Self::Corrective),
            "preventive" => Some(Self::Preventive),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Corrective => "corrective",
            Self::Preventive => "preventive",
        }
    }
}

/// Status of a remediation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "action_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ActionStatus {
    /// Parse a status from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status ends the action's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Represents one corrective or preventive action under a non-conformity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CorrectiveAction {
    /// Unique identifier for this action.
    pub id: Uuid,
    /// Owning non-conformity; rows cascade-delete with it.
    pub non_conformity_id: Uuid,
    pub category: ActionCategory,
    pub description: String,
    pub justification: Option<String>,
    pub status: ActionStatus,
    /// User accountable for carrying the action out.
    pub responsible_id: Uuid,
    /// User who filed the action.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    /// Stamped when the action completes.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Data required to file a new action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCorrectiveAction {
    pub non_conformity_id: Uuid,
    pub category: ActionCategory,
    pub description: String,
    pub justification: Option<String>,
    pub responsible_id: Uuid,
    pub created_by: Uuid,
    pub deadline: Option<DateTime<Utc>>,
}

impl CorrectiveAction {
    /// Check if the deadline has passed while the action is still live.
    pub fn is_overdue(&self) -> bool {
        match self.deadline {
            Some(deadline) => !self.status.is_terminal() && Utc::now() > deadline,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_category_roundtrip() {
        assert_eq!(
            ActionCategory::from_str("preventive"),
            Some(ActionCategory::Preventive)
        );
        assert_eq!(ActionCategory::Corrective.as_str(), "corrective");
        assert_eq!(ActionCategory::from_str("mitigating"), None);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ActionStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_terminal_set() {
        assert!(ActionStatus::Completed.is_terminal());
        assert!(ActionStatus::Cancelled.is_terminal());
        assert!(!ActionStatus::Pending.is_terminal());
        assert!(!ActionStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_overdue_respects_terminal_states() {
        let mut action = CorrectiveAction {
            id: Uuid::new_v4(),
            non_conformity_id: Uuid::new_v4(),
            category: ActionCategory::Corrective,
            description: "Retrain operators on labeling".to_string(),
            justification: None,
            status: ActionStatus::InProgress,
            responsible_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            deadline: Some(Utc::now() - Duration::days(2)),
            completed_at: None,
        };
        assert!(action.is_overdue());

        action.status = ActionStatus::Completed;
        assert!(!action.is_overdue());

        action.status = ActionStatus::Cancelled;
        assert!(!action.is_overdue());
    }
}
