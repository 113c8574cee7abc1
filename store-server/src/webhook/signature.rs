//! Webhook signature verification and content hashing
//!
//! The gateway signs the exact raw request body with HMAC-SHA512 over a
//! shared secret; the hex digest arrives in `x-provider-signature`.
//! Verification happens before any parsing and uses a constant-time
//! comparison. The SHA-256 content hash of the same raw body is the
//! dedup key for delivered events.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,

    #[error("signature is not valid hex")]
    InvalidHex,

    #[error("signature mismatch")]
    Mismatch,
}

/// Verify `signature` (hex HMAC-SHA512) over the raw payload
pub fn verify_signature(
    payload: &[u8],
    signature: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(payload);

    let sig_bytes = hex::decode(signature.trim()).map_err(|_| SignatureError::InvalidHex)?;
    // Constant-time comparison
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SignatureError::Mismatch)
}

/// Hex HMAC-SHA512 of a payload (test helper and outbound signing)
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// SHA-256 hex of the exact raw body — the event dedup key
pub fn content_hash(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-webhook-secret";

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"payment_id":1,"payment_status":"finished"}"#;
        let sig = sign(body, SECRET);
        assert_eq!(verify_signature(body, &sig, SECRET), Ok(()));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let body = br#"{"payment_id":1,"payment_status":"finished"}"#;
        let sig = sign(body, SECRET);
        let tampered = br#"{"payment_id":2,"payment_status":"finished"}"#;
        assert_eq!(
            verify_signature(tampered, &sig, SECRET),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = b"{}";
        let sig = sign(body, "other-secret");
        assert_eq!(
            verify_signature(body, &sig, SECRET),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn garbage_hex_is_rejected() {
        assert_eq!(
            verify_signature(b"{}", "not-hex!", SECRET),
            Err(SignatureError::InvalidHex)
        );
    }

    #[test]
    fn content_hash_is_stable_per_body() {
        let a = content_hash(b"{\"x\":1}");
        let b = content_hash(b"{\"x\":1}");
        let c = content_hash(b"{\"x\":2}");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
