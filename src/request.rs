//! Inbound request capture.
//!
//! An [`InboundRequest`] is the immutable snapshot of one HTTP delivery:
//! method, path, headers, the fully-buffered body, and the remote address
//! used for logging. It is created once per request and carried through the
//! gate, verifier, and parser; parsed events retain a copy so subscribers can
//! inspect headers or the sender address.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};

/// Header consulted first when deriving the remote address, so deployments
/// behind a reverse proxy log the real client rather than the proxy.
const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";

/// One captured HTTP delivery.
///
/// Cloning is cheap: the body is a refcounted [`Bytes`] buffer.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// HTTP method of the delivery.
    pub method: Method,
    /// Request path (no query string).
    pub path: String,
    /// All request headers; lookup is case-insensitive.
    pub headers: HeaderMap,
    /// The complete raw body. Signature verification runs over exactly
    /// these bytes.
    pub body: Bytes,
    /// Remote address for logging, derived via [`remote_address`].
    pub remote: String,
}

impl InboundRequest {
    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Derives the remote address to log for a delivery.
///
/// Prefers the first `X-Forwarded-For` entry, then the peer socket address,
/// then `"unknown"`.
pub fn remote_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get(HEADER_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    match peer {
        Some(addr) => addr.to_string(),
        None => "unknown".to_string(),
    }
}
