// VeriDoc Signing - content hashing and signature certificates for
// controlled documents.

pub mod certificate;
pub mod content;
pub mod envelope;
pub mod keys;

pub use certificate::{SignatureCertificate, SignerInfo};
pub use content::{content_hash, hash_matches};
pub use envelope::{sign_certificate, verify_certificate, CertificateEnvelope, HashRef};
pub use keys::{generate_signing_key, signing_key_from_seed_hex};
