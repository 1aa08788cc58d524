//! Parsed webhook events.
//!
//! A delivery parses into a [`HookEvent`]: either a repository event (routed
//! by event type, repository name, and optional git ref) or a system event
//! (routed by a subtype field, GitLab system-hook style). Each event carries
//! the full parsed JSON document plus the originating [`InboundRequest`] so
//! subscribers can reach headers and the remote address.

use crate::request::InboundRequest;

/// Sentinel subscription key that receives every event.
pub const WILDCARD_KEY: &str = "*";

/// An event tied to a repository.
#[derive(Debug, Clone)]
pub struct RepositoryEvent {
    /// Event type from the provider header (e.g. `issue_comment`, `push`).
    pub event_type: String,
    /// Repository name from the payload. Always non-empty.
    pub repository: String,
    /// Git ref from the payload, when the event carries one.
    pub git_ref: Option<String>,
    /// The full parsed payload.
    pub payload: serde_json::Value,
    /// The originating delivery.
    pub request: InboundRequest,
}

/// A provider system event, routed by its subtype rather than a repository.
#[derive(Debug, Clone)]
pub struct SystemEvent {
    /// Event type from the provider header (always `system` in practice).
    pub event_type: String,
    /// Subtype from the payload's `event_name` field. Always non-empty.
    pub subtype: String,
    /// The full parsed payload.
    pub payload: serde_json::Value,
    /// The originating delivery.
    pub request: InboundRequest,
}

/// A parsed webhook delivery.
#[derive(Debug, Clone)]
pub enum HookEvent {
    Repository(RepositoryEvent),
    System(SystemEvent),
}

impl RepositoryEvent {
    /// The subscription keys this event is delivered to, in order.
    ///
    /// The fixed sequence is: wildcard, `repo`, `repo:ref`, `event`,
    /// `event:repo`, `event:repo:ref`. The two ref-bearing keys are skipped
    /// when the event has no ref, so the key namespace never contains
    /// placeholder refs.
    pub fn dispatch_keys(&self) -> Vec<String> {
        let mut keys = vec![WILDCARD_KEY.to_string(), self.repository.clone()];
        if let Some(git_ref) = &self.git_ref {
            keys.push(format!("{}:{}", self.repository, git_ref));
        }
        keys.push(self.event_type.clone());
        keys.push(format!("{}:{}", self.event_type, self.repository));
        if let Some(git_ref) = &self.git_ref {
            keys.push(format!("{}:{}:{}", self.event_type, self.repository, git_ref));
        }
        keys
    }
}

impl SystemEvent {
    /// The subscription keys this event is delivered to: wildcard, then the
    /// subtype.
    pub fn dispatch_keys(&self) -> Vec<String> {
        vec![WILDCARD_KEY.to_string(), self.subtype.clone()]
    }
}

impl HookEvent {
    /// The subscription keys this event is delivered to, in order.
    pub fn dispatch_keys(&self) -> Vec<String> {
        match self {
            HookEvent::Repository(event) => event.dispatch_keys(),
            HookEvent::System(event) => event.dispatch_keys(),
        }
    }

    /// The provider event type.
    pub fn event_type(&self) -> &str {
        match self {
            HookEvent::Repository(event) => &event.event_type,
            HookEvent::System(event) => &event.event_type,
        }
    }

    /// The originating delivery.
    pub fn request(&self) -> &InboundRequest {
        match self {
            HookEvent::Repository(event) => &event.request,
            HookEvent::System(event) => &event.request,
        }
    }
}
