//! Equipment service records.
//!
//! A completed calibration or maintenance record carrying a next-service
//! date pushes that date back onto the equipment. That write is not done
//! here or in the route: the route emits a `ServiceCompleted` domain event
//! and the reaction layer applies the update.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Kind of service performed on equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "service_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Maintenance,
    Calibration,
    Repair,
    Inspection,
}

impl ServiceKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "maintenance" => Some(Self::Maintenance),
            "calibration" => Some(Self::Calibration),
            "repair" => Some(Self::Repair),
            "inspection" => Some(Self::Inspection),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Calibration => "calibration",
            Self::Repair => "repair",
            Self::Inspection => "inspection",
        }
    }

    /// Whether completed records of this kind reschedule the equipment.
    pub fn reschedules_equipment(&self) -> bool {
        matches!(self, Self::Maintenance | Self::Calibration)
    }
}

/// Status of a service record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "service_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Represents one service performed on a piece of equipment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceRecord {
    /// Unique identifier for this record.
    pub id: Uuid,
    /// Owning equipment; rows cascade-delete with it.
    pub equipment_id: Uuid,
    pub kind: ServiceKind,
    pub serviced_at: DateTime<Utc>,
    /// Company or person who performed the service.
    pub provider: Option<String>,
    pub description: String,
    pub notes: Option<String>,
    pub status: ServiceStatus,
    pub cost: Option<BigDecimal>,
    /// When the next service of this kind is due.
    pub next_service_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub responsible_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Data required to record a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceRecord {
    pub equipment_id: Uuid,
    pub kind: ServiceKind,
    pub serviced_at: DateTime<Utc>,
    pub provider: Option<String>,
    pub description: String,
    pub notes: Option<String>,
    pub status: ServiceStatus,
    pub cost: Option<BigDecimal>,
    pub next_service_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub responsible_id: Option<Uuid>,
}

impl ServiceRecord {
    /// Check if the follow-up service is overdue.
    pub fn is_overdue(&self) -> bool {
        match self.next_service_at {
            Some(due) => self.status == ServiceStatus::Completed && Utc::now() > due,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    #[test]
    fn test_kind_reschedules_equipment() {
        assert!(ServiceKind::Calibration.reschedules_equipment());
        assert!(ServiceKind::Maintenance.reschedules_equipment());
        assert!(!ServiceKind::Repair.reschedules_equipment());
        assert!(!ServiceKind::Inspection.reschedules_equipment());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ServiceStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_overdue_requires_completed() {
        let mut record = ServiceRecord {
            id: Uuid::new_v4(),
            equipment_id: Uuid::new_v4(),
            kind: ServiceKind::Calibration,
            serviced_at: Utc::now() - Duration::days(400),
            provider: None,
            description: "Annual calibration".to_string(),
            notes: None,
            status: ServiceStatus::Completed,
            cost: Some(BigDecimal::from_str("150.00").unwrap()),
            next_service_at: Some(Utc::now() - Duration::days(30)),
            created_by: Uuid::new_v4(),
            responsible_id: None,
            created_at: Utc::now(),
        };
        assert!(record.is_overdue());

        record.status = ServiceStatus::Scheduled;
        assert!(!record.is_overdue());
    }
}
