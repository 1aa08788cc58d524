//! Webhook payload parsing.
//!
//! Turns the verified raw body of a delivery into a [`HookEvent`].
//!
//! # Parsing strategy
//!
//! 1. Decode the body: form-encoded deliveries carry the JSON document in a
//!    `payload` field; everything else is treated as JSON directly.
//! 2. Derive the event type from the `X-GitHub-Event` header, falling back
//!    to the first token of `X-GitLab-Event` lowercased, then `"unknown"`.
//! 3. Validate routing fields: repository events need a non-empty
//!    `repository.name`; system events need a non-empty `event_name`.
//!
//! Malformed bodies and missing routing fields are errors; the caller maps
//! them to a 400 response.

use axum::http::header::CONTENT_TYPE;
use thiserror::Error;

use crate::request::InboundRequest;

use super::events::{HookEvent, RepositoryEvent, SystemEvent};

/// GitHub-style event type header.
pub const HEADER_GITHUB_EVENT: &str = "x-github-event";
/// GitLab-style event type header, used as a fallback.
pub const HEADER_GITLAB_EVENT: &str = "x-gitlab-event";

/// Event type reserved for provider system hooks.
const SYSTEM_EVENT_TYPE: &str = "system";
/// Form field carrying the JSON document in form-encoded deliveries.
const FORM_PAYLOAD_FIELD: &str = "payload";

/// Error type for payload parsing failures. All map to 400 responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Body declared form-encoded but not decodable as a query string.
    #[error("invalid form-encoded body: {0}")]
    InvalidForm(#[from] serde_urlencoded::de::Error),

    /// Form-encoded body without a `payload` field.
    #[error("form-encoded body missing the payload field")]
    MissingFormPayload,

    /// The JSON document failed to parse.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Repository event without a non-empty `repository.name`.
    #[error("incomplete data: missing repository name")]
    MissingRepository,

    /// System event without a non-empty `event_name`.
    #[error("incomplete data: missing system event type")]
    MissingSystemEventType,
}

/// Derives the event type from the provider headers.
///
/// The GitHub header wins verbatim; otherwise the first whitespace-delimited
/// token of the GitLab header, lowercased (so `"System Hook"` becomes
/// `"system"`); otherwise `"unknown"`.
pub fn event_type_from_headers(request: &InboundRequest) -> String {
    if let Some(event) = request.header(HEADER_GITHUB_EVENT) {
        return event.to_string();
    }
    if let Some(event) = request.header(HEADER_GITLAB_EVENT) {
        if let Some(first) = event.split_whitespace().next() {
            return first.to_lowercase();
        }
    }
    "unknown".to_string()
}

/// Parses a verified delivery into a [`HookEvent`].
///
/// The request is cloned into the event so subscribers keep access to
/// headers and the remote address.
pub fn parse_event(request: &InboundRequest) -> Result<HookEvent, ParseError> {
    let payload = decode_body(request)?;
    let event_type = event_type_from_headers(request);

    if event_type == SYSTEM_EVENT_TYPE {
        let subtype = nonempty_str(payload.get("event_name"))
            .ok_or(ParseError::MissingSystemEventType)?
            .to_string();

        return Ok(HookEvent::System(SystemEvent {
            event_type,
            subtype,
            payload,
            request: request.clone(),
        }));
    }

    let repository = nonempty_str(payload.get("repository").and_then(|r| r.get("name")))
        .ok_or(ParseError::MissingRepository)?
        .to_string();
    let git_ref = nonempty_str(payload.get("ref")).map(str::to_string);

    Ok(HookEvent::Repository(RepositoryEvent {
        event_type,
        repository,
        git_ref,
        payload,
        request: request.clone(),
    }))
}

/// Decodes the body into a JSON document, honouring the content type.
fn decode_body(request: &InboundRequest) -> Result<serde_json::Value, ParseError> {
    if is_form_encoded(request) {
        let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(&request.body)?;
        let json_text = fields
            .into_iter()
            .find(|(name, _)| name == FORM_PAYLOAD_FIELD)
            .map(|(_, value)| value)
            .ok_or(ParseError::MissingFormPayload)?;
        Ok(serde_json::from_str(&json_text)?)
    } else {
        Ok(serde_json::from_slice(&request.body)?)
    }
}

/// Whether the delivery declares a form-encoded body. Media type parameters
/// (e.g. `; charset=utf-8`) are ignored.
fn is_form_encoded(request: &InboundRequest) -> bool {
    request
        .header(CONTENT_TYPE.as_str())
        .map(|value| value.split(';').next().unwrap_or("").trim())
        .is_some_and(|media_type| media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

fn nonempty_str(value: Option<&serde_json::Value>) -> Option<&str> {
    value.and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method};
    use serde_json::json;

    fn request_with(headers: Vec<(&str, &str)>, body: &str) -> InboundRequest {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            header_map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        InboundRequest {
            method: Method::POST,
            path: "/hook".to_string(),
            headers: header_map,
            body: Bytes::from(body.to_string()),
            remote: "203.0.113.7".to_string(),
        }
    }

    #[test]
    fn parses_repository_event_from_json_body() {
        let body = json!({
            "ref": "refs/heads/main",
            "repository": { "name": "demo", "owner": { "login": "me" } }
        });
        let request = request_with(
            vec![("x-github-event", "push"), ("content-type", "application/json")],
            &body.to_string(),
        );

        let event = parse_event(&request).unwrap();
        match event {
            HookEvent::Repository(event) => {
                assert_eq!(event.event_type, "push");
                assert_eq!(event.repository, "demo");
                assert_eq!(event.git_ref.as_deref(), Some("refs/heads/main"));
                assert_eq!(event.payload, body);
                assert_eq!(event.request.remote, "203.0.113.7");
            }
            other => panic!("expected repository event, got {other:?}"),
        }
    }

    #[test]
    fn ref_is_optional() {
        let body = json!({ "repository": { "name": "demo" } });
        let request = request_with(vec![("x-github-event", "issue_comment")], &body.to_string());

        match parse_event(&request).unwrap() {
            HookEvent::Repository(event) => assert!(event.git_ref.is_none()),
            other => panic!("expected repository event, got {other:?}"),
        }
    }

    #[test]
    fn empty_ref_is_treated_as_absent() {
        let body = json!({ "ref": "", "repository": { "name": "demo" } });
        let request = request_with(vec![("x-github-event", "push")], &body.to_string());

        match parse_event(&request).unwrap() {
            HookEvent::Repository(event) => assert!(event.git_ref.is_none()),
            other => panic!("expected repository event, got {other:?}"),
        }
    }

    #[test]
    fn form_encoded_body_parses_identically_to_json() {
        let body = json!({ "repository": { "name": "demo" }, "action": "created" });

        let json_request = request_with(
            vec![("x-github-event", "issue_comment"), ("content-type", "application/json")],
            &body.to_string(),
        );
        let form_body = serde_urlencoded::to_string([("payload", body.to_string())]).unwrap();
        let form_request = request_with(
            vec![
                ("x-github-event", "issue_comment"),
                ("content-type", "application/x-www-form-urlencoded"),
            ],
            &form_body,
        );

        let from_json = parse_event(&json_request).unwrap();
        let from_form = parse_event(&form_request).unwrap();

        match (from_json, from_form) {
            (HookEvent::Repository(a), HookEvent::Repository(b)) => {
                assert_eq!(a.event_type, b.event_type);
                assert_eq!(a.repository, b.repository);
                assert_eq!(a.git_ref, b.git_ref);
                assert_eq!(a.payload, b.payload);
            }
            other => panic!("expected repository events, got {other:?}"),
        }
    }

    #[test]
    fn form_content_type_with_charset_still_decodes_as_form() {
        let body = json!({ "repository": { "name": "demo" } });
        let form_body = serde_urlencoded::to_string([("payload", body.to_string())]).unwrap();
        let request = request_with(
            vec![
                ("x-github-event", "push"),
                ("content-type", "application/x-www-form-urlencoded; charset=utf-8"),
            ],
            &form_body,
        );

        assert!(parse_event(&request).is_ok());
    }

    #[test]
    fn form_body_without_payload_field_is_rejected() {
        let request = request_with(
            vec![
                ("x-github-event", "push"),
                ("content-type", "application/x-www-form-urlencoded"),
            ],
            "other=value",
        );

        assert!(matches!(
            parse_event(&request),
            Err(ParseError::MissingFormPayload)
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let request = request_with(vec![("x-github-event", "push")], "{not json");
        assert!(matches!(parse_event(&request), Err(ParseError::InvalidJson(_))));
    }

    #[test]
    fn missing_repository_name_is_rejected() {
        let request = request_with(
            vec![("x-github-event", "push")],
            &json!({ "action": "opened" }).to_string(),
        );
        assert!(matches!(
            parse_event(&request),
            Err(ParseError::MissingRepository)
        ));

        let empty_name = request_with(
            vec![("x-github-event", "push")],
            &json!({ "repository": { "name": "" } }).to_string(),
        );
        assert!(matches!(
            parse_event(&empty_name),
            Err(ParseError::MissingRepository)
        ));
    }

    #[test]
    fn gitlab_header_takes_first_token_lowercased() {
        let body = json!({ "repository": { "name": "demo" } });
        let request = request_with(
            vec![("x-gitlab-event", "Push Hook")],
            &body.to_string(),
        );

        match parse_event(&request).unwrap() {
            HookEvent::Repository(event) => assert_eq!(event.event_type, "push"),
            other => panic!("expected repository event, got {other:?}"),
        }
    }

    #[test]
    fn github_header_wins_over_gitlab_header() {
        let body = json!({ "repository": { "name": "demo" } });
        let request = request_with(
            vec![
                ("x-github-event", "issue_comment"),
                ("x-gitlab-event", "Push Hook"),
            ],
            &body.to_string(),
        );

        match parse_event(&request).unwrap() {
            HookEvent::Repository(event) => assert_eq!(event.event_type, "issue_comment"),
            other => panic!("expected repository event, got {other:?}"),
        }
    }

    #[test]
    fn missing_event_headers_yield_unknown_type() {
        let body = json!({ "repository": { "name": "demo" } });
        let request = request_with(vec![], &body.to_string());

        match parse_event(&request).unwrap() {
            HookEvent::Repository(event) => assert_eq!(event.event_type, "unknown"),
            other => panic!("expected repository event, got {other:?}"),
        }
    }

    #[test]
    fn gitlab_system_hook_parses_as_system_event() {
        let body = json!({ "event_name": "project_create", "name": "demo" });
        let request = request_with(vec![("x-gitlab-event", "System Hook")], &body.to_string());

        match parse_event(&request).unwrap() {
            HookEvent::System(event) => {
                assert_eq!(event.event_type, "system");
                assert_eq!(event.subtype, "project_create");
            }
            other => panic!("expected system event, got {other:?}"),
        }
    }

    #[test]
    fn system_event_without_event_name_is_rejected() {
        let request = request_with(
            vec![("x-gitlab-event", "System Hook")],
            &json!({ "name": "demo" }).to_string(),
        );
        assert!(matches!(
            parse_event(&request),
            Err(ParseError::MissingSystemEventType)
        ));

        let empty = request_with(
            vec![("x-gitlab-event", "System Hook")],
            &json!({ "event_name": "" }).to_string(),
        );
        assert!(matches!(
            parse_event(&empty),
            Err(ParseError::MissingSystemEventType)
        ));
    }

    #[test]
    fn system_events_do_not_require_repository() {
        // A system payload has no repository object; it must still parse.
        let body = json!({ "event_name": "user_create", "username": "me" });
        let request = request_with(vec![("x-gitlab-event", "System Hook")], &body.to_string());

        assert!(matches!(
            parse_event(&request).unwrap(),
            HookEvent::System(_)
        ));
    }
}
