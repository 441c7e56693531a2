//! Non-conformity model (CAPA tracking).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Where a non-conformity was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "nc_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NonConformitySource {
    /// Found in an internal process.
    Internal,
    /// Reported from outside the organization.
    External,
    /// Raised by an audit.
    Audit,
    /// Raised by a customer.
    Customer,
}

impl NonConformitySource {
    /// Parse a source from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(Self::Internal),
            "external" => Some(Self::External),
            "audit" => Some(Self::Audit),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::Audit => "audit",
            Self::Customer => "customer",
        }
    }
}

/// Severity of a non-conformity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse a severity from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Status of a non-conformity in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "nc_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NonConformityStatus {
    /// Logged, no action filed yet.
    Open,
    /// Under root-cause analysis.
    Analyzing,
    /// At least one corrective/preventive action filed.
    InTreatment,
    /// Closed; terminal in the modeled flow.
    Closed,
}

impl NonConformityStatus {
    /// Parse a status from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "analyzing" => Some(Self::Analyzing),
            "in_treatment" => Some(Self::InTreatment),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Analyzing => "analyzing",
            Self::InTreatment => "in_treatment",
            Self::Closed => "closed",
        }
    }

    /// Status after a corrective action is filed: open advances to
    /// in_treatment, anything else is left as-is. One-directional and
    /// triggered by the action's existence, not its completion.
    pub fn after_action_filed(&self) -> Self {
        match self {
            Self::Open => Self::InTreatment,
            other => *other,
        }
    }
}

/// Represents a logged non-conformity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NonConformity {
    /// Unique identifier for this NC.
    pub id: Uuid,
    /// Yearly-sequential code, e.g. `NC-2026-0007`.
    pub code: String,
    pub title: String,
    pub description: String,
    /// Where it was detected.
    pub source: NonConformitySource,
    pub severity: Severity,
    pub status: NonConformityStatus,
    /// Free-form origin detail (process, customer name, ...).
    pub origin: Option<String>,
    /// Area accountable for treatment.
    pub responsible_area: Option<String>,
    /// User accountable for treatment, when assigned.
    pub responsible_id: Option<Uuid>,
    /// User who opened the NC.
    pub opened_by: Uuid,
    /// Optional link to the document the NC concerns.
    pub document_id: Option<Uuid>,
    pub opened_at: DateTime<Utc>,
    /// Target date for closure.
    pub deadline: Option<DateTime<Utc>>,
    /// Stamped exactly once when the NC closes; cleared on reopen.
    pub closed_at: Option<DateTime<Utc>>,
}

/// Data required to open a new non-conformity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNonConformity {
    pub code: String,
    pub title: String,
    pub description: String,
    pub source: NonConformitySource,
    pub severity: Severity,
    pub origin: Option<String>,
    pub responsible_area: Option<String>,
    pub responsible_id: Option<Uuid>,
    pub opened_by: Uuid,
    pub document_id: Option<Uuid>,
    pub deadline: Option<DateTime<Utc>>,
}

impl NonConformity {
    /// Check if the NC is closed.
    pub fn is_closed(&self) -> bool {
        self.status == NonConformityStatus::Closed
    }

    /// Check if the deadline has passed while the NC is not closed.
    pub fn is_overdue(&self) -> bool {
        match self.deadline {
            Some(deadline) => !self.is_closed() && Utc::now() > deadline,
            None => false,
        }
    }

    /// Signed days until the deadline; None when closed or no deadline.
    pub fn days_to_deadline(&self) -> Option<i64> {
        if self.is_closed() {
            return None;
        }
        self.deadline.map(|deadline| (deadline - Utc::now()).num_days())
    }
}

/// Formats a yearly-sequential NC code, e.g. `NC-2026-0007`.
pub fn format_nc_code(year: i32, sequence: i64) -> String {
    format!("NC-{}-{:04}", year, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_nc() -> NonConformity {
        NonConformity {
            id: Uuid::new_v4(),
            code: "NC-2026-0001".to_string(),
            title: "Unlabeled reagent bottle".to_string(),
            description: "Bottle on bench 4 without lot label".to_string(),
            source: NonConformitySource::Internal,
            severity: Severity::Medium,
            status: NonConformityStatus::Open,
            origin: None,
            responsible_area: Some("Lab".to_string()),
            responsible_id: None,
            opened_by: Uuid::new_v4(),
            document_id: None,
            opened_at: Utc::now(),
            deadline: None,
            closed_at: None,
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&NonConformityStatus::InTreatment).unwrap(),
            "\"in_treatment\""
        );
        assert_eq!(
            serde_json::to_string(&NonConformityStatus::Open).unwrap(),
            "\"open\""
        );
    }

    #[test]
    fn test_after_action_filed_advances_only_open() {
        assert_eq!(
            NonConformityStatus::Open.after_action_filed(),
            NonConformityStatus::InTreatment
        );
        assert_eq!(
            NonConformityStatus::InTreatment.after_action_filed(),
            NonConformityStatus::InTreatment
        );
        assert_eq!(
            NonConformityStatus::Analyzing.after_action_filed(),
            NonConformityStatus::Analyzing
        );
        assert_eq!(
            NonConformityStatus::Closed.after_action_filed(),
            NonConformityStatus::Closed
        );
    }

    #[test]
    fn test_nc_code_format() {
        assert_eq!(format_nc_code(2026, 7), "NC-2026-0007");
        assert_eq!(format_nc_code(2026, 1234), "NC-2026-1234");
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!(Severity::from_str("critical"), Some(Severity::Critical));
        assert_eq!(Severity::from_str("urgent"), None);
    }

    #[test]
    fn test_overdue_ignores_closed() {
        let mut nc = open_nc();
        nc.deadline = Some(Utc::now() - Duration::days(1));
        assert!(nc.is_overdue());

        nc.status = NonConformityStatus::Closed;
        assert!(!nc.is_overdue());
        assert_eq!(nc.days_to_deadline(), None);
    }

    #[test]
    fn test_days_to_deadline() {
        let mut nc = open_nc();
        nc.deadline = Some(Utc::now() + Duration::days(10));
        let days = nc.days_to_deadline().unwrap();
        assert!((9..=10).contains(&days));
    }
}
