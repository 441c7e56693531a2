//! Round-trip tests: a certificate envelope survives JSON storage and
//! still verifies, and stops verifying once the underlying content drifts.

use chrono::{TimeZone, Utc};
use ed25519_dalek::SigningKey;
use uuid::Uuid;
use veridoc_signing::{
    content_hash, sign_certificate, verify_certificate, CertificateEnvelope, SignerInfo,
};

fn signer_for(version: &str) -> SignerInfo {
    SignerInfo {
        signer_id: Uuid::new_v4(),
        signer_name: "Morgan Lead".to_string(),
        signer_email: "morgan@example.com".to_string(),
        document_code: "WI-2026-0C0FFEE0".to_string(),
        document_version: version.to_string(),
        signed_at: Utc.with_ymd_and_hms(2026, 6, 30, 8, 12, 44).unwrap(),
        ip_address: Some("192.168.4.21".to_string()),
    }
}

#[test]
fn envelope_survives_json_storage() {
    let signing_key = SigningKey::from_bytes(&[0x77; 32]);
    let content = "Work instruction: torque to 4.5 Nm, record on form F-112.";

    let envelope = sign_certificate(&signing_key, signer_for("1.0"), content).unwrap();

    // Store and reload the way the server persists certificate_info.
    let stored = serde_json::to_string(&envelope).unwrap();
    let reloaded: CertificateEnvelope = serde_json::from_str(&stored).unwrap();

    assert_eq!(envelope, reloaded);
    verify_certificate(&signing_key.verifying_key(), content, &reloaded).unwrap();
}

#[test]
fn reloaded_envelope_rejects_drifted_content() {
    let signing_key = SigningKey::from_bytes(&[0x77; 32]);
    let content = "Inspection step 3: visual check under 10x magnification.";

    let envelope = sign_certificate(&signing_key, signer_for("1.1"), content).unwrap();
    let stored = serde_json::to_string(&envelope).unwrap();
    let reloaded: CertificateEnvelope = serde_json::from_str(&stored).unwrap();

    let drifted = "Inspection step 3: visual check under 5x magnification.";
    assert!(verify_certificate(&signing_key.verifying_key(), drifted, &reloaded).is_err());
}

#[test]
fn envelope_hash_matches_plain_content_hash() {
    let signing_key = SigningKey::from_bytes(&[0x31; 32]);
    let content = "Retain calibration certificates with the equipment file.";

    let envelope = sign_certificate(&signing_key, signer_for("3.2"), content).unwrap();

    // The electronic tier stores content_hash() directly; the digital tier
    // must bind to the identical value.
    assert_eq!(envelope.content_hash.value, content_hash(content));
}
