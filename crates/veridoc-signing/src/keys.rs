// Ed25519 key handling for the server's digital-signature tier.

use anyhow::{anyhow, Result};
use ed25519_dalek::SigningKey;
use rand_core::OsRng;

/// Generates a fresh Ed25519 signing key from the OS RNG.
pub fn generate_signing_key() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// Builds a signing key from a 64-character hex seed.
///
/// The seed is expected from configuration; anything other than exactly
/// 32 bytes of hex is rejected.
pub fn signing_key_from_seed_hex(seed_hex: &str) -> Result<SigningKey> {
    let bytes = hex::decode(seed_hex.trim())
        .map_err(|e| anyhow!("invalid signing seed hex: {}", e))?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow!("signing seed must be exactly 32 bytes"))?;
    Ok(SigningKey::from_bytes(&seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_roundtrip() {
        let seed_hex = "4a".repeat(32);
        let key = signing_key_from_seed_hex(&seed_hex).unwrap();
        let again = signing_key_from_seed_hex(&seed_hex).unwrap();
        assert_eq!(key.verifying_key(), again.verifying_key());
    }

    #[test]
    fn test_seed_rejects_short_hex() {
        assert!(signing_key_from_seed_hex("abcd").is_err());
    }

    #[test]
    fn test_seed_rejects_non_hex() {
        let bad = "zz".repeat(32);
        assert!(signing_key_from_seed_hex(&bad).is_err());
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = generate_signing_key();
        let b = generate_signing_key();
        assert_ne!(a.verifying_key(), b.verifying_key());
    }
}
