//! HMAC-SHA256 signatures over raw webhook payloads.
//!
//! The payment provider signs the exact bytes it POSTs; verification
//! therefore runs on the raw, unparsed body. Parsing before verifying
//! would let an attacker pick which bytes get checked.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Why a signature was rejected. Collapsed to a 401 at the endpoint;
/// the distinction only matters for logs.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The signature header was not valid hex.
    #[error("signature header is not valid hex")]
    MalformedSignature,

    /// The HMAC could not be initialized from the shared secret.
    #[error("failed to initialize hmac")]
    Key,

    /// The signature does not match the payload.
    #[error("signature mismatch")]
    Mismatch,
}

/// Computes the hex signature the provider would send for `payload`.
///
/// Used by tests and fixtures; production only verifies.
#[must_use]
pub fn sign(secret: &[u8], payload: &[u8]) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        // Hmac accepts keys of any length; this arm is unreachable but
        // the fallible constructor forces it to exist.
        return String::new();
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a hex HMAC-SHA256 signature over `payload` in constant
/// time.
///
/// # Errors
///
/// Returns a [`SignatureError`] when the header is malformed or the
/// signature does not match; the caller must not touch any payload
/// field in either case.
pub fn verify(secret: &[u8], payload: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
    let signature = hex::decode(signature_hex).map_err(|_| SignatureError::MalformedSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Key)?;
    mac.update(payload);
    mac.verify_slice(&signature)
        .map_err(|_| SignatureError::Mismatch)
}
