//! Approval flow model.
//!
//! One row per (document, approver, stage) in the current review round.
//! A row resolves exactly once: pending -> approved or pending -> rejected.
//! When any row rejects, every sibling still pending is cancelled, so a
//! rejection always resets the whole round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Stage of the review round a flow row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "approval_stage", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStage {
    /// Content review.
    Review,
    /// Final approval.
    Approval,
}

impl ApprovalStage {
    /// Parse a stage from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "review" => Some(Self::Review),
            "approval" => Some(Self::Approval),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Approval => "approval",
        }
    }
}

/// Status of one approver's decision slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting the assigned approver.
    Pending,
    /// Approved by the assigned approver.
    Approved,
    /// Rejected by the assigned approver.
    Rejected,
    /// Cancelled because a sibling rejected.
    Cancelled,
}

impl ApprovalStatus {
    /// Parse a status from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status is terminal. Resolved rows are never re-opened.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Represents one approver's decision slot for a document submission.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApprovalFlow {
    /// Unique identifier for this flow row.
    pub id: Uuid,
    /// Document under review.
    pub document_id: Uuid,
    /// Assigned approver; only they may resolve the row.
    pub approver_id: Uuid,
    /// Stage this slot belongs to.
    pub stage: ApprovalStage,
    /// Current status.
    pub status: ApprovalStatus,
    /// Position in the configured approver order. Informational only:
    /// approvers may resolve in any order.
    pub order_index: i32,
    /// When the slot was assigned.
    pub assigned_at: DateTime<Utc>,
    /// When the slot was resolved (null while pending).
    pub completed_at: Option<DateTime<Utc>>,
    /// Approver comments. Mandatory on rejection.
    pub comments: Option<String>,
    /// Advisory deadline for the decision.
    pub deadline: Option<DateTime<Utc>>,
}

/// Data required to create one flow row at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApprovalFlow {
    pub document_id: Uuid,
    pub approver_id: Uuid,
    pub stage: ApprovalStage,
    pub order_index: i32,
    pub deadline: Option<DateTime<Utc>>,
}

impl ApprovalFlow {
    /// Check if the slot is still awaiting its approver.
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    /// Check if the deadline has passed while the slot is still pending.
    pub fn is_overdue(&self) -> bool {
        match self.deadline {
            Some(deadline) => self.is_pending() && Utc::now() > deadline,
            None => false,
        }
    }
}

impl NewApprovalFlow {
    /// Build the ordered set of flow rows for one submission.
    ///
    /// Order indices are assigned from the caller's approver ordering,
    /// starting at 1.
    pub fn for_submission(
        document_id: Uuid,
        approver_ids: &[Uuid],
        stage: ApprovalStage,
        deadline: Option<DateTime<Utc>>,
    ) -> Vec<Self> {
        approver_ids
            .iter()
            .enumerate()
            .map(|(index, approver_id)| Self {
                document_id,
                approver_id: *approver_id,
                stage,
                order_index: index as i32 + 1,
                deadline,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending_flow() -> ApprovalFlow {
        ApprovalFlow {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            approver_id: Uuid::new_v4(),
            stage: ApprovalStage::Approval,
            status: ApprovalStatus::Pending,
            order_index: 1,
            assigned_at: Utc::now(),
            completed_at: None,
            comments: None,
            deadline: None,
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ApprovalStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&ApprovalStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            ApprovalStatus::from_str("rejected"),
            Some(ApprovalStatus::Rejected)
        );
        assert_eq!(ApprovalStatus::from_str("vetoed"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Rejected.is_terminal());
        assert!(ApprovalStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_stage_roundtrip() {
        assert_eq!(ApprovalStage::from_str("review"), Some(ApprovalStage::Review));
        assert_eq!(ApprovalStage::Approval.as_str(), "approval");
    }

    #[test]
    fn test_for_submission_orders_approvers() {
        let document_id = Uuid::new_v4();
        let approvers = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        let flows = NewApprovalFlow::for_submission(
            document_id,
            &approvers,
            ApprovalStage::Approval,
            None,
        );

        assert_eq!(flows.len(), 3);
        for (index, flow) in flows.iter().enumerate() {
            assert_eq!(flow.document_id, document_id);
            assert_eq!(flow.approver_id, approvers[index]);
            assert_eq!(flow.order_index, index as i32 + 1);
        }
    }

    #[test]
    fn test_overdue_only_while_pending() {
        let mut flow = pending_flow();
        flow.deadline = Some(Utc::now() - Duration::hours(2));
        assert!(flow.is_overdue());

        flow.status = ApprovalStatus::Approved;
        assert!(!flow.is_overdue());

        flow.status = ApprovalStatus::Pending;
        flow.deadline = Some(Utc::now() + Duration::hours(2));
        assert!(!flow.is_overdue());
    }
}
