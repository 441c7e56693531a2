// Certificate envelopes for the digital signature tier.
//
// Electronic signatures bind to content through the stored hash alone.
// Digital signatures additionally wrap the certificate payload in an
// Ed25519-signed envelope, so the signer metadata itself is tamper-evident.

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::certificate::SignerInfo;
use crate::content::content_hash;

/// Reference to a hash of some content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashRef {
    /// Hash algorithm used (e.g., "sha-256")
    pub algo: String,
    /// Hex-encoded hash value
    pub value: String,
}

/// Ed25519-signed wrapper around a signature certificate payload.
///
/// The `signature` field is set to the empty string during canonicalization,
/// then populated with the base64-encoded Ed25519 signature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateEnvelope {
    /// Envelope version, always "1.0"
    pub version: String,

    /// Signature algorithm, always "ed25519"
    pub algo: String,

    /// Hash reference of the signed version content
    pub content_hash: HashRef,

    /// The certificate payload being attested
    pub signer: SignerInfo,

    /// Base64-encoded signature (empty string during canonicalization)
    pub signature: String,
}

impl CertificateEnvelope {
    fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let canonical = serde_jcs::to_string(self)?;
        Ok(canonical.into_bytes())
    }
}

/// Signs a certificate payload over the given version content.
///
/// The content hash is computed here rather than taken from the caller, so
/// an envelope can never attest a hash that was not derived from the content
/// handed in at signing time.
pub fn sign_certificate(
    signing_key: &SigningKey,
    signer: SignerInfo,
    content: &str,
) -> Result<CertificateEnvelope> {
    let mut envelope = CertificateEnvelope {
        version: "1.0".to_string(),
        algo: "ed25519".to_string(),
        content_hash: HashRef {
            algo: "sha-256".to_string(),
            value: content_hash(content),
        },
        signer,
        signature: String::new(),
    };

    let canonical = envelope.canonical_bytes()?;
    let signature = signing_key.sign(&canonical);
    envelope.signature = BASE64_STANDARD.encode(signature.to_bytes());

    Ok(envelope)
}

/// Verifies a certificate envelope against the current version content.
///
/// Checks, in order: envelope version and algorithm, hash binding to the
/// content, and the Ed25519 signature over the canonical payload. Each
/// failure carries a distinct reason.
pub fn verify_certificate(
    verifying_key: &VerifyingKey,
    content: &str,
    envelope: &CertificateEnvelope,
) -> Result<()> {
    if envelope.version != "1.0" {
        return Err(anyhow!(
            "unsupported envelope version '{}' (expected '1.0')",
            envelope.version
        ));
    }

    if envelope.algo != "ed25519" {
        return Err(anyhow!(
            "unsupported signature algorithm '{}' (expected 'ed25519')",
            envelope.algo
        ));
    }

    if envelope.content_hash.algo != "sha-256" {
        return Err(anyhow!(
            "unsupported hash algorithm '{}' (expected 'sha-256')",
            envelope.content_hash.algo
        ));
    }

    let computed = content_hash(content);
    if envelope.content_hash.value != computed {
        return Err(anyhow!(
            "content hash mismatch: stored {}, computed {}",
            envelope.content_hash.value,
            computed
        ));
    }

    let mut unsigned = envelope.clone();
    unsigned.signature = String::new();
    let canonical = unsigned.canonical_bytes()?;

    let signature_bytes = BASE64_STANDARD
        .decode(&envelope.signature)
        .map_err(|e| anyhow!("invalid base64 signature: {}", e))?;
    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| anyhow!("invalid signature length: expected 64 bytes"))?;
    let signature = Signature::from_bytes(&signature_array);

    verifying_key
        .verify(&canonical, &signature)
        .map_err(|_| anyhow!("envelope signature verification failed"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn test_signer() -> SignerInfo {
        SignerInfo {
            signer_id: Uuid::new_v4(),
            signer_name: "Rene Auditor".to_string(),
            signer_email: "rene@example.com".to_string(),
            document_code: "POL-2026-11FF22AA".to_string(),
            document_version: "2.0".to_string(),
            signed_at: Utc.with_ymd_and_hms(2026, 5, 2, 15, 4, 11).unwrap(),
            ip_address: None,
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let seed: [u8; 32] = [0x1f; 32];
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();

        let content = "All deviations must be recorded within 24 hours.";
        let envelope = sign_certificate(&signing_key, test_signer(), content).unwrap();

        assert_eq!(envelope.version, "1.0");
        assert_eq!(envelope.algo, "ed25519");
        assert_eq!(envelope.content_hash.value, content_hash(content));
        assert!(!envelope.signature.is_empty());

        verify_certificate(&verifying_key, content, &envelope).unwrap();
    }

    #[test]
    fn test_verify_rejects_changed_content() {
        let seed: [u8; 32] = [0x1f; 32];
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();

        let envelope =
            sign_certificate(&signing_key, test_signer(), "original content").unwrap();

        let err = verify_certificate(&verifying_key, "tampered content", &envelope)
            .unwrap_err();
        assert!(err.to_string().contains("content hash mismatch"));
    }

    #[test]
    fn test_verify_rejects_tampered_signer() {
        let seed: [u8; 32] = [0x1f; 32];
        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();

        let content = "Section 7: supplier evaluation criteria.";
        let mut envelope = sign_certificate(&signing_key, test_signer(), content).unwrap();
        envelope.signer.signer_name = "Someone Else".to_string();

        let err = verify_certificate(&verifying_key, content, &envelope).unwrap_err();
        assert!(err.to_string().contains("verification failed"));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let signing_key = SigningKey::from_bytes(&[0x1f; 32]);
        let other_key = SigningKey::from_bytes(&[0x2e; 32]);

        let content = "Training records are reviewed yearly.";
        let envelope = sign_certificate(&signing_key, test_signer(), content).unwrap();

        assert!(verify_certificate(&other_key.verifying_key(), content, &envelope).is_err());
    }

    #[test]
    fn test_verify_rejects_unknown_version() {
        let signing_key = SigningKey::from_bytes(&[0x1f; 32]);
        let content = "Change requests require impact analysis.";
        let mut envelope = sign_certificate(&signing_key, test_signer(), content).unwrap();
        envelope.version = "2.0".to_string();

        let err = verify_certificate(&signing_key.verifying_key(), content, &envelope)
            .unwrap_err();
        assert!(err.to_string().contains("unsupported envelope version"));
    }
}
