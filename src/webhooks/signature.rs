//! Webhook signature verification using HMAC.
//!
//! Forges sign webhook payloads with a shared secret and ship the signature
//! in a header shaped as `<algorithm>=<hexdigest>`. GitHub-style senders use
//! `sha256=` (`X-Hub-Signature-256`) or the legacy `sha1=`
//! (`X-Hub-Signature`); the algorithm is selected by the prefix.
//!
//! Verification runs over the exact raw body bytes, before any parsing, and
//! compares in constant time.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// HMAC algorithm declared by a signature header's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// Legacy `sha1=` signatures.
    Sha1,
    /// `sha256=` signatures.
    Sha256,
}

impl SignatureAlgorithm {
    /// The header-value prefix for this algorithm, including the `=`.
    pub fn prefix(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1=",
            SignatureAlgorithm::Sha256 => "sha256=",
        }
    }
}

/// Parses a signature header (e.g. `"sha1=abc123..."`) into its algorithm
/// and raw signature bytes.
///
/// Returns `None` for malformed headers (unknown prefix, invalid hex).
/// Never panics.
pub fn parse_signature_header(header: &str) -> Option<(SignatureAlgorithm, Vec<u8>)> {
    for algorithm in [SignatureAlgorithm::Sha256, SignatureAlgorithm::Sha1] {
        if let Some(hex_sig) = header.strip_prefix(algorithm.prefix()) {
            return hex::decode(hex_sig).ok().map(|sig| (algorithm, sig));
        }
    }
    None
}

/// Computes the HMAC signature of a payload under the given secret.
///
/// Used by senders and by tests generating expected signatures.
pub fn compute_signature(
    algorithm: SignatureAlgorithm,
    payload: &[u8],
    secret: &[u8],
) -> Vec<u8> {
    match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut mac =
                HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureAlgorithm::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Formats a signature as a header value, `<algorithm>=<hex>`.
pub fn format_signature_header(algorithm: SignatureAlgorithm, signature: &[u8]) -> String {
    format!("{}{}", algorithm.prefix(), hex::encode(signature))
}

/// Verifies a webhook signature header against the payload and secret.
///
/// Returns `true` if the signature is valid, `false` otherwise. The
/// comparison is constant-time via the HMAC library.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let (algorithm, expected) = match parse_signature_header(signature_header) {
        Some(parsed) => parsed,
        None => return false,
    };

    match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut mac = match HmacSha1::new_from_slice(secret) {
                Ok(mac) => mac,
                Err(_) => return false,
            };
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        }
        SignatureAlgorithm::Sha256 => {
            let mut mac = match HmacSha256::new_from_slice(secret) {
                Ok(mac) => mac,
                Err(_) => return false,
            };
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        }
    }
}
