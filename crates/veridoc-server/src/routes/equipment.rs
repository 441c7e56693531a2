//! Equipment endpoints: registry, schedules, and service records.
//!
//! Completed calibration/maintenance services never write the equipment
//! row from here; they raise a `ServiceCompleted` event and the reaction
//! layer applies the rescheduling inside the same transaction.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::events::{reactions, DomainEvent};
use crate::models::{
    Equipment, NewEquipment, NewServiceRecord, ServiceKind, ServiceRecord, ServiceStatus,
};
use crate::routes::documents::load_user;

/// Request body for registering equipment.
/// Note: in production, actor_id would come from authentication.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipmentRequest {
    pub actor_id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub responsible_id: Option<Uuid>,
    #[serde(default)]
    pub acquired_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub next_calibration_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub next_maintenance_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub calibration_frequency_months: Option<i32>,
    #[serde(default)]
    pub maintenance_frequency_months: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for recording a service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordServiceRequest {
    pub actor_id: Uuid,
    pub kind: ServiceKind,
    pub serviced_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub provider: Option<String>,
    pub description: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<ServiceStatus>,
    #[serde(default)]
    pub cost: Option<BigDecimal>,
    #[serde(default)]
    pub next_service_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub responsible_id: Option<Uuid>,
}

/// Response for equipment, with derived schedule reads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_calibration_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_maintenance_at: Option<String>,
    pub is_calibration_due: bool,
    pub is_maintenance_due: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_to_calibration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_to_maintenance: Option<i64>,
}

impl EquipmentResponse {
    fn from_equipment(equipment: Equipment) -> Self {
        let is_calibration_due = equipment.is_calibration_due();
        let is_maintenance_due = equipment.is_maintenance_due();
        let days_to_calibration = equipment.days_to_calibration();
        let days_to_maintenance = equipment.days_to_maintenance();
        Self {
            id: equipment.id,
            code: equipment.code,
            name: equipment.name,
            kind: equipment.kind,
            status: equipment.status.as_str().to_string(),
            location: equipment.location,
            next_calibration_at: equipment.next_calibration_at.map(|d| d.to_rfc3339()),
            next_maintenance_at: equipment.next_maintenance_at.map(|d| d.to_rfc3339()),
            is_calibration_due,
            is_maintenance_due,
            days_to_calibration,
            days_to_maintenance,
        }
    }
}

/// Response for a service record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecordResponse {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub kind: String,
    pub status: String,
    pub serviced_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_service_at: Option<String>,
}

impl ServiceRecordResponse {
    fn from_record(record: ServiceRecord) -> Self {
        Self {
            id: record.id,
            equipment_id: record.equipment_id,
            kind: record.kind.as_str().to_string(),
            status: record.status.as_str().to_string(),
            serviced_at: record.serviced_at.to_rfc3339(),
            cost: record.cost.as_ref().map(|c| c.to_string()),
            next_service_at: record.next_service_at.map(|d| d.to_rfc3339()),
        }
    }
}

/// Creates the equipment router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/", post(create_equipment))
        .route("/{id}", get(view_equipment))
        .route("/{id}/services", get(list_services).post(record_service))
        .route("/{id}/status", put(update_equipment_status))
        .with_state(pool)
}

/// Request body for changing equipment status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipmentStatusRequest {
    pub actor_id: Uuid,
    pub status: crate::models::EquipmentStatus,
}

/// Registers new equipment.
async fn create_equipment(
    State(pool): State<PgPool>,
    Json(request): Json<CreateEquipmentRequest>,
) -> Result<Json<EquipmentResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if !actor.can_create_documents() {
        return Err(AppError::Forbidden(
            "You do not have permission to register equipment".to_string(),
        ));
    }
    if request.code.trim().is_empty() || request.name.trim().is_empty() {
        return Err(AppError::Validation("Code and name are required".to_string()));
    }

    let new_equipment = NewEquipment {
        code: request.code,
        name: request.name,
        kind: request.kind,
        manufacturer: request.manufacturer,
        model: request.model,
        serial_number: request.serial_number,
        location: request.location,
        responsible_id: request.responsible_id,
        acquired_at: request.acquired_at,
        next_calibration_at: request.next_calibration_at,
        next_maintenance_at: request.next_maintenance_at,
        calibration_frequency_months: request.calibration_frequency_months,
        maintenance_frequency_months: request.maintenance_frequency_months,
        notes: request.notes,
        created_by: actor.id,
    };

    let equipment: Equipment = sqlx::query_as(
        r#"
        INSERT INTO equipment
            (id, code, name, kind, manufacturer, model, serial_number, location,
             responsible_id, status, acquired_at, next_calibration_at,
             next_maintenance_at, calibration_frequency_months,
             maintenance_frequency_months, notes, active, created_by, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, 'active', $9,
                $10, $11, $12, $13, $14, TRUE, $15, NOW())
        RETURNING id, code, name, kind, manufacturer, model, serial_number, location,
                  responsible_id, status, acquired_at, next_calibration_at,
                  next_maintenance_at, calibration_frequency_months,
                  maintenance_frequency_months, notes, active, created_by, created_at
        "#,
    )
    .bind(&new_equipment.code)
    .bind(&new_equipment.name)
    .bind(&new_equipment.kind)
    .bind(&new_equipment.manufacturer)
    .bind(&new_equipment.model)
    .bind(&new_equipment.serial_number)
    .bind(&new_equipment.location)
    .bind(new_equipment.responsible_id)
    .bind(new_equipment.acquired_at)
    .bind(new_equipment.next_calibration_at)
    .bind(new_equipment.next_maintenance_at)
    .bind(new_equipment.calibration_frequency_months)
    .bind(new_equipment.maintenance_frequency_months)
    .bind(&new_equipment.notes)
    .bind(new_equipment.created_by)
    .fetch_one(&pool)
    .await
    .map_err(|e| AppError::from_db(e, "Equipment with this code already exists"))?;

    tracing::info!(equipment_id = %equipment.id, code = %equipment.code, "Equipment registered");

    Ok(Json(EquipmentResponse::from_equipment(equipment)))
}

/// Returns one piece of equipment with schedule reads.
async fn view_equipment(
    State(pool): State<PgPool>,
    Path(equipment_id): Path<Uuid>,
) -> Result<Json<EquipmentResponse>, AppError> {
    let equipment = load_equipment(&pool, equipment_id).await?;
    Ok(Json(EquipmentResponse::from_equipment(equipment)))
}

/// Changes equipment operational status.
async fn update_equipment_status(
    State(pool): State<PgPool>,
    Path(equipment_id): Path<Uuid>,
    Json(request): Json<UpdateEquipmentStatusRequest>,
) -> Result<Json<EquipmentResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if !actor.can_create_documents() {
        return Err(AppError::Forbidden(
            "You do not have permission to update equipment".to_string(),
        ));
    }
    let equipment = load_equipment(&pool, equipment_id).await?;

    let updated: Equipment = sqlx::query_as(
        r#"
        UPDATE equipment
        SET status = $2
        WHERE id = $1
        RETURNING id, code, name, kind, manufacturer, model, serial_number, location,
                  responsible_id, status, acquired_at, next_calibration_at,
                  next_maintenance_at, calibration_frequency_months,
                  maintenance_frequency_months, notes, active, created_by, created_at
        "#,
    )
    .bind(equipment.id)
    .bind(request.status)
    .fetch_one(&pool)
    .await?;

    Ok(Json(EquipmentResponse::from_equipment(updated)))
}

/// Records a service. A completed calibration/maintenance with a
/// follow-up date reschedules the equipment through the reaction layer,
/// inside this transaction.
async fn record_service(
    State(pool): State<PgPool>,
    Path(equipment_id): Path<Uuid>,
    Json(request): Json<RecordServiceRequest>,
) -> Result<Json<ServiceRecordResponse>, AppError> {
    let actor = load_user(&pool, request.actor_id).await?;
    if !actor.can_create_documents() {
        return Err(AppError::Forbidden(
            "You do not have permission to record services".to_string(),
        ));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }

    let equipment = load_equipment(&pool, equipment_id).await?;

    let new_record = NewServiceRecord {
        equipment_id: equipment.id,
        kind: request.kind,
        serviced_at: request.serviced_at,
        provider: request.provider,
        description: request.description,
        notes: request.notes,
        status: request.status.unwrap_or(ServiceStatus::Completed),
        cost: request.cost,
        next_service_at: request.next_service_at,
        created_by: actor.id,
        responsible_id: request.responsible_id,
    };

    let mut tx = pool.begin().await?;

    let record: ServiceRecord = sqlx::query_as(
        r#"
        INSERT INTO service_records
            (id, equipment_id, kind, serviced_at, provider, description, notes,
             status, cost, next_service_at, created_by, responsible_id, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
        RETURNING id, equipment_id, kind, serviced_at, provider, description, notes,
                  status, cost, next_service_at, created_by, responsible_id, created_at
        "#,
    )
    .bind(new_record.equipment_id)
    .bind(new_record.kind)
    .bind(new_record.serviced_at)
    .bind(&new_record.provider)
    .bind(&new_record.description)
    .bind(&new_record.notes)
    .bind(new_record.status)
    .bind(&new_record.cost)
    .bind(new_record.next_service_at)
    .bind(new_record.created_by)
    .bind(new_record.responsible_id)
    .fetch_one(&mut *tx)
    .await?;

    if record.status == ServiceStatus::Completed {
        let event = DomainEvent::ServiceCompleted {
            equipment_id: equipment.id,
            kind: record.kind,
            next_service_at: record.next_service_at,
        };
        reactions::apply(&mut tx, &event).await?;
    }

    tx.commit().await?;

    tracing::info!(
        record_id = %record.id,
        equipment_id = %equipment.id,
        kind = record.kind.as_str(),
        "Service recorded"
    );

    Ok(Json(ServiceRecordResponse::from_record(record)))
}

/// Lists an equipment's service records, newest first.
async fn list_services(
    State(pool): State<PgPool>,
    Path(equipment_id): Path<Uuid>,
) -> Result<Json<Vec<ServiceRecordResponse>>, AppError> {
    let equipment = load_equipment(&pool, equipment_id).await?;

    let records: Vec<ServiceRecord> = sqlx::query_as(
        r#"
        SELECT id, equipment_id, kind, serviced_at, provider, description, notes,
               status, cost, next_service_at, created_by, responsible_id, created_at
        FROM service_records
        WHERE equipment_id = $1
        ORDER BY serviced_at DESC
        "#,
    )
    .bind(equipment.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(
        records
            .into_iter()
            .map(ServiceRecordResponse::from_record)
            .collect(),
    ))
}

/// Loads equipment by ID.
async fn load_equipment(pool: &PgPool, id: Uuid) -> Result<Equipment, AppError> {
    sqlx::query_as::<_, Equipment>(
        r#"
        SELECT id, code, name, kind, manufacturer, model, serial_number, location,
               responsible_id, status, acquired_at, next_calibration_at,
               next_maintenance_at, calibration_frequency_months,
               maintenance_frequency_months, notes, active, created_by, created_at
        FROM equipment
        WHERE id = $1 AND active = TRUE
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))
}
