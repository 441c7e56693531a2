// Content hashing for document versions.
//
// A signature binds to the exact content of one document version. The hash
// is recomputed from the stored content on every verification, so any edit
// to a signed version is detectable.

use sha2::{Digest, Sha256};

/// Computes the SHA-256 hash of a version's content, lowercase hex encoded.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks whether a stored hash still matches the given content.
pub fn hash_matches(stored_hash: &str, content: &str) -> bool {
    content_hash(content) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash("5.1 All records shall be retained for five years.");
        let b = content_hash("5.1 All records shall be retained for five years.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn test_content_hash_detects_edits() {
        let original = content_hash("Calibrate annually.");
        let edited = content_hash("Calibrate quarterly.");
        assert_ne!(original, edited);
    }

    #[test]
    fn test_hash_matches() {
        let content = "Scope: incoming inspection of raw material.";
        let stored = content_hash(content);
        assert!(hash_matches(&stored, content));
        assert!(!hash_matches(&stored, "Scope: final inspection only."));
    }
}
