//! Signature certificate payloads.
//!
//! Every signature stores a certificate describing who signed which version
//! of which document, and when. The payload is canonicalized with JCS
//! (RFC 8785) before hashing or Ed25519 signing, so field order in storage
//! or transport never changes what was signed.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and context captured at signing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    /// ID of the signing user.
    pub signer_id: Uuid,
    /// Full name of the signer at signing time.
    pub signer_name: String,
    /// Email of the signer at signing time.
    pub signer_email: String,
    /// Code of the signed document.
    pub document_code: String,
    /// Version label that was signed.
    pub document_version: String,
    /// When the signature was created.
    pub signed_at: DateTime<Utc>,
    /// Client address the signature request came from, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl SignerInfo {
    /// Canonical JCS bytes of this payload, suitable for signing.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let canonical = serde_jcs::to_string(self)?;
        Ok(canonical.into_bytes())
    }
}

/// Exportable certificate for external verification of a stored signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureCertificate {
    pub signature_id: Uuid,
    pub document_code: String,
    pub document_title: String,
    pub document_version: String,
    pub signer_name: String,
    pub signer_email: String,
    pub signed_at: DateTime<Utc>,
    pub signature_kind: String,
    pub content_hash: String,
    pub is_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_signer() -> SignerInfo {
        SignerInfo {
            signer_id: Uuid::new_v4(),
            signer_name: "Dana Quality".to_string(),
            signer_email: "dana@example.com".to_string(),
            document_code: "SOP-2026-AB12CD34".to_string(),
            document_version: "1.0".to_string(),
            signed_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            ip_address: Some("10.0.0.7".to_string()),
        }
    }

    #[test]
    fn test_canonical_bytes_are_deterministic() {
        let signer = sample_signer();
        let first = signer.canonical_bytes().unwrap();
        let second = signer.canonical_bytes().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_canonical_bytes_sort_keys() {
        let signer = sample_signer();
        let canonical = String::from_utf8(signer.canonical_bytes().unwrap()).unwrap();
        // JCS sorts object keys lexicographically.
        let doc_code = canonical.find("document_code").unwrap();
        let signer_name = canonical.find("signer_name").unwrap();
        assert!(doc_code < signer_name);
    }

    #[test]
    fn test_canonical_bytes_omit_missing_ip() {
        let mut signer = sample_signer();
        signer.ip_address = None;
        let canonical = String::from_utf8(signer.canonical_bytes().unwrap()).unwrap();
        assert!(!canonical.contains("ip_address"));
    }

    #[test]
    fn test_payload_changes_with_version() {
        let signer = sample_signer();
        let mut bumped = signer.clone();
        bumped.document_version = "1.1".to_string();
        assert_ne!(
            signer.canonical_bytes().unwrap(),
            bumped.canonical_bytes().unwrap()
        );
    }

    #[test]
    fn test_signer_info_roundtrip() {
        let signer = sample_signer();
        let json = serde_json::to_string(&signer).unwrap();
        let parsed: SignerInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(signer, parsed);
    }
}
