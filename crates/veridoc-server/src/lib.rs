//! VeriDoc Server - controlled-document and quality management API
//!
//! This crate provides the REST API server for VeriDoc's document
//! lifecycle, approval workflow, CAPA tracking, audits, equipment
//! schedules, and digital signatures.

pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod routes;

pub use error::AppError;
pub use routes::create_router;
