//! Equipment model with calibration/maintenance schedules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Operational status of a piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "equipment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EquipmentStatus {
    Active,
    Inactive,
    /// Out of service for maintenance.
    Maintenance,
    /// Out of service for calibration.
    Calibration,
}

impl EquipmentStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "maintenance" => Some(Self::Maintenance),
            "calibration" => Some(Self::Calibration),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Maintenance => "maintenance",
            Self::Calibration => "calibration",
        }
    }
}

/// Represents a tracked piece of equipment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Equipment {
    /// Unique identifier for this equipment.
    pub id: Uuid,
    /// Unique inventory code.
    pub code: String,
    pub name: String,
    /// Category tag (measurement, test, production, safety, ...).
    pub kind: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub responsible_id: Option<Uuid>,
    pub status: EquipmentStatus,
    pub acquired_at: Option<DateTime<Utc>>,
    /// Next calibration due date; pushed forward by completed
    /// calibration service records.
    pub next_calibration_at: Option<DateTime<Utc>>,
    /// Next maintenance due date; pushed forward by completed
    /// maintenance service records.
    pub next_maintenance_at: Option<DateTime<Utc>>,
    /// Calibration interval in months.
    pub calibration_frequency_months: Option<i32>,
    /// Maintenance interval in months.
    pub maintenance_frequency_months: Option<i32>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Data required to register new equipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEquipment {
    pub code: String,
    pub name: String,
    pub kind: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub responsible_id: Option<Uuid>,
    pub acquired_at: Option<DateTime<Utc>>,
    pub next_calibration_at: Option<DateTime<Utc>>,
    pub next_maintenance_at: Option<DateTime<Utc>>,
    pub calibration_frequency_months: Option<i32>,
    pub maintenance_frequency_months: Option<i32>,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

impl Equipment {
    /// Check if calibration is overdue.
    pub fn is_calibration_due(&self) -> bool {
        match self.next_calibration_at {
            Some(due) => Utc::now() > due,
            None => false,
        }
    }

    /// Check if maintenance is overdue.
    pub fn is_maintenance_due(&self) -> bool {
        match self.next_maintenance_at {
            Some(due) => Utc::now() > due,
            None => false,
        }
    }

    /// Signed days until the next calibration.
    pub fn days_to_calibration(&self) -> Option<i64> {
        self.next_calibration_at.map(|due| (due - Utc::now()).num_days())
    }

    /// Signed days until the next maintenance.
    pub fn days_to_maintenance(&self) -> Option<i64> {
        self.next_maintenance_at.map(|due| (due - Utc::now()).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn gauge() -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            code: "EQ-0042".to_string(),
            name: "Pressure gauge".to_string(),
            kind: "measurement".to_string(),
            manufacturer: None,
            model: None,
            serial_number: None,
            location: Some("Line 2".to_string()),
            responsible_id: None,
            status: EquipmentStatus::Active,
            acquired_at: None,
            next_calibration_at: None,
            next_maintenance_at: None,
            calibration_frequency_months: Some(12),
            maintenance_frequency_months: None,
            notes: None,
            active: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(
            EquipmentStatus::from_str("calibration"),
            Some(EquipmentStatus::Calibration)
        );
        assert_eq!(EquipmentStatus::Inactive.as_str(), "inactive");
    }

    #[test]
    fn test_due_checks_without_dates() {
        let equipment = gauge();
        assert!(!equipment.is_calibration_due());
        assert!(!equipment.is_maintenance_due());
        assert_eq!(equipment.days_to_calibration(), None);
    }

    #[test]
    fn test_calibration_due() {
        let mut equipment = gauge();
        equipment.next_calibration_at = Some(Utc::now() - Duration::days(5));
        assert!(equipment.is_calibration_due());
        assert!(equipment.days_to_calibration().unwrap() < 0);

        equipment.next_calibration_at = Some(Utc::now() + Duration::days(90));
        assert!(!equipment.is_calibration_due());
    }
}
