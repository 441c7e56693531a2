//! Database models for VeriDoc.

pub mod approval_flow;
pub mod audit;
pub mod corrective_action;
pub mod document;
pub mod document_reading;
pub mod document_signature;
pub mod document_type;
pub mod document_version;
pub mod email_notification;
pub mod equipment;
pub mod non_conformity;
pub mod service_record;
pub mod user;

pub use approval_flow::{ApprovalFlow, ApprovalStage, ApprovalStatus, NewApprovalFlow};
pub use audit::{
    conformance_percentage, format_audit_code, Audit, AuditChecklistItem, AuditFinding,
    AuditKind, AuditStatus, ChecklistStatus, FindingKind, FindingStatus, NewAudit,
};
pub use corrective_action::{
    ActionCategory, ActionStatus, CorrectiveAction, NewCorrectiveAction,
};
pub use document::{
    format_document_code, generate_document_code, next_version_label, Document,
    DocumentStatus, NewDocument, INITIAL_VERSION,
};
pub use document_reading::DocumentReading;
pub use document_signature::{
    DocumentSignature, NewDocumentSignature, SignatureKind, VerificationOutcome,
};
pub use document_type::{DocumentType, NewDocumentType};
pub use document_version::{DocumentVersion, NewDocumentVersion};
pub use email_notification::{
    EmailNotification, NewEmailNotification, NotificationKind, NotificationStatus,
};
pub use equipment::{Equipment, EquipmentStatus, NewEquipment};
pub use non_conformity::{
    format_nc_code, NewNonConformity, NonConformity, NonConformitySource,
    NonConformityStatus, Severity,
};
pub use service_record::{NewServiceRecord, ServiceKind, ServiceRecord, ServiceStatus};
pub use user::{User, UserRole};
