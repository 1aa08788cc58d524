//! Transport preconditions.
//!
//! The gate runs before the request body is read. It rejects deliveries on
//! the wrong path (404), with the wrong method (405), or without any
//! provider event-type header (400). The checks short-circuit in that order.

use axum::http::{HeaderMap, Method, StatusCode};
use thiserror::Error;

use crate::config::ServerConfig;
use crate::webhooks::parser::{HEADER_GITHUB_EVENT, HEADER_GITLAB_EVENT};

/// A transport-level rejection.
#[derive(Debug, Error)]
pub enum GateError {
    /// Request path does not match the configured webhook path.
    #[error("invalid path")]
    InvalidPath,

    /// Only POST is accepted.
    #[error("invalid method")]
    InvalidMethod,

    /// Neither provider event-type header is present.
    #[error("missing {HEADER_GITHUB_EVENT} or {HEADER_GITLAB_EVENT} header")]
    MissingEventHeader,
}

impl GateError {
    /// The HTTP status this rejection maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::InvalidPath => StatusCode::NOT_FOUND,
            GateError::InvalidMethod => StatusCode::METHOD_NOT_ALLOWED,
            GateError::MissingEventHeader => StatusCode::BAD_REQUEST,
        }
    }
}

/// Checks the transport preconditions for one delivery.
pub fn check(
    config: &ServerConfig,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> Result<(), GateError> {
    if !path_matches(config, path) {
        return Err(GateError::InvalidPath);
    }

    if method != Method::POST {
        return Err(GateError::InvalidMethod);
    }

    if !headers.contains_key(HEADER_GITHUB_EVENT) && !headers.contains_key(HEADER_GITLAB_EVENT) {
        return Err(GateError::MissingEventHeader);
    }

    Ok(())
}

/// Whether a request path matches the configured webhook path: exact match,
/// or `path + "/"` prefix when wildcard mode is enabled.
fn path_matches(config: &ServerConfig, path: &str) -> bool {
    if path == config.path {
        return true;
    }
    config.wildcard && path.starts_with(&format!("{}/", config.path))
}
