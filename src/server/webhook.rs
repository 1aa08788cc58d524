//! The per-request webhook pipeline.
//!
//! Every inbound request runs, in order: the transport gate, signature
//! verification, payload parsing, and event dispatch. Exactly one JSON reply
//! is written per request, `{"message": <status phrase>, "result":
//! "ok"|"error"}`, with one of the statuses 200, 400, 403, 404, or 405.
//! Listener failures during dispatch never change the response: once routing
//! fields validate, the delivery has been accepted.

use std::net::SocketAddr;

use axum::body::to_bytes;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info};

use super::gate;
use super::AppState;
use crate::request::{remote_address, InboundRequest};
use crate::webhooks::{parse_event, verify_signature, HookEvent};

/// GitHub-style signature header, preferred.
const HEADER_SIGNATURE_256: &str = "x-hub-signature-256";
/// Legacy signature header.
const HEADER_SIGNATURE: &str = "x-hub-signature";

/// Upper bound on buffered body size. Matches the upstream providers'
/// payload cap, so a conforming sender never hits it.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// The JSON reply envelope sent for every response.
#[derive(Debug, Serialize)]
struct Reply {
    message: String,
    result: &'static str,
}

/// Builds the uniform JSON response for a status code.
///
/// The message is the lowercase status phrase (`"ok"`, `"forbidden"`, ...);
/// the result is `"error"` for 4xx/5xx and `"ok"` otherwise.
pub(crate) fn reply(status: StatusCode) -> Response {
    let message = status
        .canonical_reason()
        .unwrap_or("unknown")
        .to_lowercase();
    let result = if status.is_client_error() || status.is_server_error() {
        "error"
    } else {
        "ok"
    };
    (status, Json(Reply { message, result })).into_response()
}

/// Handles one inbound request end to end.
///
/// Registered as the service fallback so the gate, not the HTTP router,
/// decides 404 and 405 and every rejection carries the JSON reply envelope.
pub(crate) async fn hook_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let remote = remote_address(&parts.headers, peer);
    let path = parts.uri.path().to_string();

    info!(method = %parts.method, path = %path, remote = %remote, "request received");

    if let Err(err) = gate::check(state.config(), &parts.method, &path, &parts.headers) {
        error!(remote = %remote, cause = %err, status = err.status().as_u16(), "rejecting request");
        return reply(err.status());
    }

    // Buffer the complete body before anything reads it; partial bodies are
    // never verified or parsed.
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(remote = %remote, cause = %err, "failed to read request body, returning 400");
            return reply(StatusCode::BAD_REQUEST);
        }
    };
    info!(bytes = body.len(), remote = %remote, "received payload");

    let inbound = InboundRequest {
        method: parts.method,
        path,
        headers: parts.headers,
        body,
        remote: remote.clone(),
    };

    // Secret resolution happens once per request and may consult the
    // request itself (dynamic resolvers).
    let secret = match state.config().secret.resolve(&inbound).await {
        Ok(secret) => secret,
        Err(err) => {
            let cause = format!("{err:#}");
            error!(remote = %remote, cause = %cause, "error getting secret, returning 403");
            return reply(StatusCode::FORBIDDEN);
        }
    };

    if let Some(secret) = secret {
        let signature = inbound
            .header(HEADER_SIGNATURE_256)
            .or_else(|| inbound.header(HEADER_SIGNATURE));

        match signature {
            None => {
                error!(remote = %remote, "secret configured, but missing signature, returning 403");
                return reply(StatusCode::FORBIDDEN);
            }
            Some(signature) => {
                if !verify_signature(&inbound.body, signature, &secret) {
                    error!(remote = %remote, "got invalid signature, returning 403");
                    return reply(StatusCode::FORBIDDEN);
                }
            }
        }
    }

    let event = match parse_event(&inbound) {
        Ok(event) => event,
        Err(err) => {
            error!(remote = %remote, cause = %err, "received invalid data, returning 400");
            return reply(StatusCode::BAD_REQUEST);
        }
    };

    match &event {
        HookEvent::Repository(event) => info!(
            event = %event.event_type,
            repository = %event.repository,
            git_ref = event.git_ref.as_deref().unwrap_or(""),
            remote = %remote,
            "got event"
        ),
        HookEvent::System(event) => info!(
            event = %event.event_type,
            subtype = %event.subtype,
            remote = %remote,
            "got system event"
        ),
    }

    // The response is decided before dispatch; listener outcomes are the
    // router's concern.
    state.router().dispatch(&event);

    reply(StatusCode::OK)
}
