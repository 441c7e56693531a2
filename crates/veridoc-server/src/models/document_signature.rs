//! Document signature records.
//!
//! A signature binds a signer to one version's content through a SHA-256
//! hash captured at signing time. The `valid` flag only ever moves from
//! true to false: once verification detects content drift the signature
//! stays invalid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Tier of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "signature_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    /// Hash binding plus an Ed25519 certificate envelope.
    Digital,
    /// Hash binding with signer metadata only.
    Electronic,
    /// Scanned/physical signature recorded for traceability.
    Handwritten,
}

impl SignatureKind {
    /// Parse a kind from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "digital" => Some(Self::Digital),
            "electronic" => Some(Self::Electronic),
            "handwritten" => Some(Self::Handwritten),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "digital",
            Self::Electronic => "electronic",
            Self::Handwritten => "handwritten",
        }
    }
}

/// Represents one signature over one version of a document.
/// At most one row exists per (document, version, signer).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentSignature {
    /// Unique identifier for this signature.
    pub id: Uuid,
    pub document_id: Uuid,
    /// Version label that was signed.
    pub document_version: String,
    pub signer_id: Uuid,
    pub kind: SignatureKind,
    /// SHA-256 hex of the version content at signing time.
    pub content_hash: String,
    /// Canonical certificate payload; for digital signatures, the full
    /// Ed25519 envelope.
    pub certificate_info: serde_json::Value,
    pub ip_address: Option<String>,
    pub signed_at: DateTime<Utc>,
    /// One-way flag: flips to false when verification detects drift.
    pub valid: bool,
}

/// Data required to create a new signature row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocumentSignature {
    pub document_id: Uuid,
    pub document_version: String,
    pub signer_id: Uuid,
    pub kind: SignatureKind,
    pub content_hash: String,
    pub certificate_info: serde_json::Value,
    pub ip_address: Option<String>,
}

impl DocumentSignature {
    /// Check if the signature has not been invalidated.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Outcome of verifying a stored signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum VerificationOutcome {
    /// Hash (and envelope, when present) still match.
    Valid,
    /// The version content no longer matches the stored hash.
    ContentChanged,
    /// The signature was already flagged invalid.
    Revoked,
    /// The signed document no longer exists.
    DocumentMissing,
    /// The signed version no longer exists.
    VersionMissing,
    /// The digital envelope failed cryptographic verification.
    EnvelopeInvalid,
}

impl VerificationOutcome {
    /// Whether the outcome counts as a valid signature.
    pub fn is_valid(&self) -> bool {
        *self == Self::Valid
    }

    /// Human-readable reason, surfaced to the caller.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Valid => "signature is valid",
            Self::ContentChanged => "document content was changed after signing",
            Self::Revoked => "signature was invalidated",
            Self::DocumentMissing => "signed document no longer exists",
            Self::VersionMissing => "signed version no longer exists",
            Self::EnvelopeInvalid => "certificate envelope failed verification",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        assert_eq!(SignatureKind::from_str("digital"), Some(SignatureKind::Digital));
        assert_eq!(
            SignatureKind::from_str("electronic"),
            Some(SignatureKind::Electronic)
        );
        assert_eq!(SignatureKind::from_str("wet-ink"), None);
        assert_eq!(SignatureKind::Handwritten.as_str(), "handwritten");
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&SignatureKind::Electronic).unwrap(),
            "\"electronic\""
        );
    }

    #[test]
    fn test_outcome_validity() {
        assert!(VerificationOutcome::Valid.is_valid());
        assert!(!VerificationOutcome::ContentChanged.is_valid());
        assert!(!VerificationOutcome::DocumentMissing.is_valid());
    }

    #[test]
    fn test_outcome_reasons_are_distinct() {
        let outcomes = [
            VerificationOutcome::Valid,
            VerificationOutcome::ContentChanged,
            VerificationOutcome::Revoked,
            VerificationOutcome::DocumentMissing,
            VerificationOutcome::VersionMissing,
            VerificationOutcome::EnvelopeInvalid,
        ];
        for (i, a) in outcomes.iter().enumerate() {
            for b in outcomes.iter().skip(i + 1) {
                assert_ne!(a.reason(), b.reason());
            }
        }
    }
}
