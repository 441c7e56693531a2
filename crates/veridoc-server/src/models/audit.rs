//! Internal audit models: the audit itself, its checklist items, and the
//! findings raised against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::models::Severity;

/// Kind of audit being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "audit_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
    Internal,
    External,
    Certification,
}

impl AuditKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(Self::Internal),
            "external" => Some(Self::External),
            "certification" => Some(Self::Certification),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::Certification => "certification",
        }
    }
}

/// Status of an audit in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "audit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl AuditStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(Self::Planned),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Conformance verdict for one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "checklist_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStatus {
    /// Not yet verified.
    Pending,
    Conforming,
    Nonconforming,
    NotApplicable,
}

impl ChecklistStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "conforming" => Some(Self::Conforming),
            "nonconforming" => Some(Self::Nonconforming),
            "not_applicable" => Some(Self::NotApplicable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Conforming => "conforming",
            Self::Nonconforming => "nonconforming",
            Self::NotApplicable => "not_applicable",
        }
    }
}

/// Kind of finding an audit raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "finding_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Nonconformity,
    Observation,
    ImprovementOpportunity,
}

impl FindingKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "nonconformity" => Some(Self::Nonconformity),
            "observation" => Some(Self::Observation),
            "improvement_opportunity" => Some(Self::ImprovementOpportunity),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nonconformity => "nonconformity",
            Self::Observation => "observation",
            Self::ImprovementOpportunity => "improvement_opportunity",
        }
    }
}

/// Status of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "finding_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    Open,
    InTreatment,
    Closed,
}

impl FindingStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_treatment" => Some(Self::InTreatment),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InTreatment => "in_treatment",
            Self::Closed => "closed",
        }
    }
}

/// Represents an audit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Audit {
    /// Unique identifier for this audit.
    pub id: Uuid,
    /// Yearly-sequential code, e.g. `AUD-2026-0003`.
    pub code: String,
    pub title: String,
    pub kind: AuditKind,
    pub scope: String,
    pub objectives: Option<String>,
    pub audited_area: Option<String>,
    pub status: AuditStatus,
    pub lead_auditor_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Stamped once when the audit first completes.
    pub report_date: Option<DateTime<Utc>>,
}

/// Data required to plan a new audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAudit {
    pub code: String,
    pub title: String,
    pub kind: AuditKind,
    pub scope: String,
    pub objectives: Option<String>,
    pub audited_area: Option<String>,
    pub lead_auditor_id: Uuid,
    pub created_by: Uuid,
}

/// One checklist item verified during an audit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditChecklistItem {
    pub id: Uuid,
    /// Owning audit; rows cascade-delete with it.
    pub audit_id: Uuid,
    pub item: String,
    pub description: Option<String>,
    /// Standard clause the item checks, e.g. "ISO 9001 7.5".
    pub requirement: Option<String>,
    pub status: ChecklistStatus,
    pub observations: Option<String>,
    pub evidence: Option<String>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// One finding raised by an audit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditFinding {
    pub id: Uuid,
    /// Owning audit; rows cascade-delete with it.
    pub audit_id: Uuid,
    pub kind: FindingKind,
    pub description: String,
    pub criterion: Option<String>,
    pub evidence: Option<String>,
    pub severity: Severity,
    pub status: FindingStatus,
    pub identified_by: Uuid,
    pub responsible_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Formats a yearly-sequential audit code, e.g. `AUD-2026-0003`.
pub fn format_audit_code(year: i32, sequence: i64) -> String {
    format!("AUD-{}-{:04}", year, sequence)
}

/// Conformance percentage: conforming items over all items, one decimal.
/// Zero items yields 0.0.
pub fn conformance_percentage(statuses: &[ChecklistStatus]) -> f64 {
    if statuses.is_empty() {
        return 0.0;
    }
    let conforming = statuses
        .iter()
        .filter(|s| **s == ChecklistStatus::Conforming)
        .count();
    (conforming as f64 / statuses.len() as f64 * 1000.0).round() / 10.0
}
